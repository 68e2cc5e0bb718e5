use std::sync::Arc;

use exam_core::model::{AppSettings, AppSettingsDraft};
use storage::repository::AppSettingsRepository;
use tracing::info;

use crate::error::AppSettingsServiceError;

/// Reads and writes the tutor connection settings.
#[derive(Clone)]
pub struct AppSettingsService {
    repo: Arc<dyn AppSettingsRepository>,
}

impl AppSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn AppSettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings. A blank key disconnects the tutor.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: AppSettingsDraft,
    ) -> Result<AppSettings, AppSettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        info!(has_key = settings.has_api_key(), "tutor settings saved");
        Ok(settings)
    }

    /// Replace only the API key, keeping model and base URL.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsServiceError` if the key is malformed or storage fails.
    pub async fn save_api_key(
        &self,
        api_key: Option<String>,
    ) -> Result<AppSettings, AppSettingsServiceError> {
        let mut draft = self.load().await?.to_draft();
        draft.api_key = api_key;
        self.save(draft).await
    }
}
