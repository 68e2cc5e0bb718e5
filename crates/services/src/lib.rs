#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod app_settings_service;
pub mod error;
pub mod lesson_service;
pub mod practice;
pub mod progress_service;
pub mod question_bank_service;
pub mod tutor_service;

pub use exam_core::Clock;

pub use ai::{GeminiTutor, Tutor, TutorConfig};
pub use app_services::AppServices;
pub use app_settings_service::AppSettingsService;
pub use error::{
    AppServicesError, AppSettingsServiceError, BankError, PracticeError, ProgressError,
    TutorError,
};
pub use lesson_service::{LessonEntry, LessonService};
pub use practice::{
    AnswerFeedback, PracticePlan, PracticeService, PracticeSession, PracticeStep, SessionOutcome,
    SessionPhase, SessionResult, TimerMode,
};
pub use progress_service::ProgressService;
pub use question_bank_service::{BankConfig, DownloadReport, QuestionBankService, SyncReport};
pub use tutor_service::TutorService;
