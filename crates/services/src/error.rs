//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{AppSettingsError, Subject};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the tutor client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutorError {
    #[error("tutor API key is not configured")]
    MissingApiKey,
    #[error("tutor API key was rejected")]
    InvalidApiKey,
    #[error("tutor quota exceeded")]
    QuotaExceeded,
    #[error("conversation has no message to answer")]
    EmptyConversation,
    #[error("tutor request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("tutor returned an empty response")]
    EmptyResponse,
    #[error("tutor returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl TutorError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Quota and credential failures are final; retrying only burns quota.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            TutorError::Http(_) | TutorError::EmptyResponse | TutorError::InvalidResponse(_) => {
                true
            }
            TutorError::HttpStatus(status) => status.is_server_error(),
            TutorError::MissingApiKey
            | TutorError::InvalidApiKey
            | TutorError::QuotaExceeded
            | TutorError::EmptyConversation => false,
        }
    }

    /// Static text shown to the student in place of a tutor reply.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            TutorError::MissingApiKey => {
                "⚠️ **API Key Belum Diatur**.\n\nSilakan buka menu **API Settings** di sidebar dan masukkan API Key Anda."
            }
            TutorError::InvalidApiKey => "⚠️ API Key Invalid.",
            TutorError::QuotaExceeded => "⚠️ Kuota Habis.",
            TutorError::EmptyConversation => "⚠️ Pesan kosong.",
            TutorError::InvalidResponse(_) | TutorError::EmptyResponse => {
                "⚠️ Respon AI tidak valid. Coba lagi."
            }
            TutorError::HttpStatus(_) | TutorError::Http(_) => "⚠️ Error koneksi.",
        }
    }
}

/// Errors emitted by practice services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("only {available} questions available for {subject}, at least 10 are needed")]
    InsufficientQuestions { subject: Subject, available: usize },
    #[error("no question is waiting for an answer")]
    NotAnswerable,
    #[error("answer index {index} is out of range")]
    InvalidAnswer { index: usize },
    #[error("session already finished")]
    Finished,
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress state lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("tutor API key is not configured")]
    MissingApiKey,
    #[error(transparent)]
    Tutor(#[from] TutorError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AppSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsServiceError {
    #[error(transparent)]
    Settings(#[from] AppSettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
