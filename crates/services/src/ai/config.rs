use std::env;

use exam_core::model::AppSettings;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "models/gemini-flash-lite-latest";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl TutorConfig {
    /// Read `EXAM_AI_API_KEY`, `EXAM_AI_MODEL` and `EXAM_AI_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("EXAM_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("EXAM_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("EXAM_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            model,
        })
    }

    /// Stored settings win over the environment, field by field.
    #[must_use]
    pub fn resolve(settings: Option<&AppSettings>, env_config: Option<&TutorConfig>) -> Option<Self> {
        let api_key = settings
            .and_then(AppSettings::api_key)
            .map(str::to_string)
            .or_else(|| env_config.map(|cfg| cfg.api_key.clone()))?;
        let model = settings
            .and_then(AppSettings::api_model)
            .map(str::to_string)
            .or_else(|| env_config.map(|cfg| cfg.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.into());
        let base_url = settings
            .and_then(AppSettings::api_base_url)
            .map(str::to_string)
            .or_else(|| env_config.map(|cfg| cfg.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }

    /// `generateContent` endpoint for the configured model.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches('/');
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!(
            "{}/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }
}
