use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use exam_core::model::{
    AiAnalysis, ChatMessage, ChatRole, Question, QuestionDraft, Subject,
};
use storage::repository::AppSettingsRepository;

use super::config::TutorConfig;
use super::json::{parse_object, parse_question_batch};
use super::{MAX_QUESTIONS_PER_REQUEST, Tutor, prompts};
use crate::error::TutorError;

/// Minimum spacing between two requests from the same client.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

//
// ─── RATE LIMIT & RETRY ────────────────────────────────────────────────────────
//

/// Spaces requests at least `min_interval` apart.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until a request may be sent, then claim the slot.
    pub async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis(), "throttling tutor request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Exponential backoff for transient tutor failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying errors for which [`TutorError::is_retryable`] holds.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retryable error.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, TutorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TutorError>>,
    {
        let mut attempt = 0_u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.base_delay * 2_u32.pow(attempt);
                    warn!(attempt, delay_ms = delay.as_millis(), error = %err, "tutor request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// Tutor backed by the Gemini `generateContent` API.
///
/// Credentials are resolved on every call so a key saved in settings takes
/// effect without rebuilding the client.
#[derive(Clone)]
pub struct GeminiTutor {
    client: Client,
    settings: Arc<dyn AppSettingsRepository>,
    env_config: Option<TutorConfig>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl GeminiTutor {
    #[must_use]
    pub fn from_env(settings: Arc<dyn AppSettingsRepository>) -> Self {
        Self::new(settings, TutorConfig::from_env())
    }

    #[must_use]
    pub fn new(settings: Arc<dyn AppSettingsRepository>, env_config: Option<TutorConfig>) -> Self {
        Self {
            client: Client::new(),
            settings,
            env_config,
            limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn config(&self) -> Result<TutorConfig, TutorError> {
        let settings = match self.settings.get_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "could not read tutor settings, using environment");
                None
            }
        };
        TutorConfig::resolve(settings.as_ref(), self.env_config.as_ref())
            .ok_or(TutorError::MissingApiKey)
    }

    async fn send_once(
        &self,
        config: &TutorConfig,
        request: &GenerateRequest,
    ) -> Result<String, TutorError> {
        self.limiter.wait_turn().await;

        let response = self
            .client
            .post(config.endpoint())
            .header("x-goog-api-key", &config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "tutor HTTP request failed");
                TutorError::Http(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_failure(status, &body);
            error!(status = %status, error = %err, "tutor API error");
            return Err(err);
        }

        let body: GenerateResponse = response.json().await?;
        body.text().ok_or(TutorError::EmptyResponse)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, TutorError> {
        let config = self.config().await?;
        self.retry
            .run(|| self.send_once(&config, request))
            .await
    }
}

#[async_trait]
impl Tutor for GeminiTutor {
    #[instrument(skip_all, fields(subject = %subject, count = count, hots = hots))]
    async fn generate_questions(
        &self,
        subject: Subject,
        count: usize,
        hots: bool,
    ) -> Result<Vec<QuestionDraft>, TutorError> {
        let count = count.clamp(1, MAX_QUESTIONS_PER_REQUEST);
        let request = GenerateRequest::single(
            prompts::question_batch(subject, count, hots),
            None,
            GenerationConfig::json(Some(0.8), Some(12_000)),
        );
        let text = self.generate(&request).await?;
        let drafts = parse_question_batch(&text);
        info!(requested = count, received = drafts.len(), "generated question drafts");
        Ok(drafts)
    }

    #[instrument(skip_all, fields(turns = history.len()))]
    async fn chat(
        &self,
        history: &[ChatMessage],
        context: Option<&str>,
    ) -> Result<String, TutorError> {
        let contents = chat_contents(history).ok_or(TutorError::EmptyConversation)?;
        let request = GenerateRequest {
            contents,
            system_instruction: Some(Content::system(prompts::system_instruction(context))),
            generation_config: None,
        };
        self.generate(&request).await
    }

    #[instrument(skip_all, fields(question = %question.id()))]
    async fn deep_analysis(&self, question: &Question) -> Result<AiAnalysis, TutorError> {
        let config = self.config().await?;
        let request = GenerateRequest::single(
            prompts::deep_analysis(question),
            None,
            GenerationConfig::json(Some(0.7), Some(3072)),
        );
        let (config, request) = (&config, &request);
        self.retry
            .run(move || async move {
                let text = self.send_once(config, request).await?;
                parse_object::<AiAnalysis>(&text)
            })
            .await
    }

    #[instrument(skip_all, fields(subject = %subject, topic = topic))]
    async fn topic_explanation(
        &self,
        topic: &str,
        subject: Subject,
    ) -> Result<AiAnalysis, TutorError> {
        let config = self.config().await?;
        let request = GenerateRequest::single(
            prompts::topic_explanation(topic, subject),
            None,
            GenerationConfig::json(None, None),
        );
        let (config, request) = (&config, &request);
        self.retry
            .run(move || async move {
                let text = self.send_once(config, request).await?;
                parse_object::<AiAnalysis>(&text)
            })
            .await
    }

    async fn is_configured(&self) -> bool {
        self.config().await.is_ok()
    }
}

/// Map a non-success reply to the failure the student should see.
fn classify_failure(status: StatusCode, body: &str) -> TutorError {
    let body = body.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("quota")
        || body.contains("resource_exhausted")
    {
        TutorError::QuotaExceeded
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("api key not valid")
        || body.contains("api_key_invalid")
    {
        TutorError::InvalidApiKey
    } else {
        TutorError::HttpStatus(status)
    }
}

/// Conversation turns for the request: everything but the last message is
/// history, leading model turns are dropped, and the last message is sent as
/// the user's turn. `None` for an empty conversation.
fn chat_contents(history: &[ChatMessage]) -> Option<Vec<Content>> {
    let (last, earlier) = history.split_last()?;
    let mut contents: Vec<Content> = earlier
        .iter()
        .skip_while(|msg| msg.role == ChatRole::Model)
        .map(|msg| Content::turn(msg.role, msg.text.clone()))
        .collect();
    contents.push(Content::turn(ChatRole::User, last.text.clone()));
    Some(contents)
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    fn single(prompt: String, context: Option<&str>, config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content::turn(ChatRole::User, prompt)],
            system_instruction: Some(Content::system(prompts::system_instruction(context))),
            generation_config: Some(config),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn turn(role: ChatRole, text: String) -> Self {
        let role = match role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Self {
            role: Some(role),
            parts: vec![Part { text }],
        }
    }

    fn system(text: String) -> Self {
        Self {
            role: None,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

impl GenerationConfig {
    fn json(temperature: Option<f32>, max_output_tokens: Option<u32>) -> Self {
        Self {
            temperature,
            max_output_tokens,
            response_mime_type: Some("application/json"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|part| part.text).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}
