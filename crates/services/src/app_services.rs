use std::sync::Arc;

use storage::repository::{BankStats, Storage};
use tracing::info;

use crate::Clock;
use crate::ai::{GeminiTutor, Tutor};
use crate::app_settings_service::AppSettingsService;
use crate::error::AppServicesError;
use crate::lesson_service::LessonService;
use crate::practice::PracticeService;
use crate::progress_service::ProgressService;
use crate::question_bank_service::QuestionBankService;
use crate::tutor_service::TutorService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    progress: Arc<ProgressService>,
    practice: Arc<PracticeService>,
    lessons: Arc<LessonService>,
    tutor: Arc<TutorService>,
    question_bank: Arc<QuestionBankService>,
    app_settings: Arc<AppSettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the Gemini tutor.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the progress load fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let tutor = Arc::new(GeminiTutor::from_env(Arc::clone(&storage.app_settings)));
        Self::assemble(storage, clock, tutor).await
    }

    /// Build services over in-memory storage with the given tutor.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the progress load fails.
    pub async fn in_memory(clock: Clock, tutor: Arc<dyn Tutor>) -> Result<Self, AppServicesError> {
        Self::assemble(Storage::in_memory(), clock, tutor).await
    }

    /// Wire every service on top of `storage`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the progress load fails.
    pub async fn assemble(
        storage: Storage,
        clock: Clock,
        tutor: Arc<dyn Tutor>,
    ) -> Result<Self, AppServicesError> {
        let progress =
            Arc::new(ProgressService::load(clock, Arc::clone(&storage.progress)).await?);
        let practice = Arc::new(PracticeService::new(
            Arc::clone(&storage.questions),
            Arc::clone(&progress),
        ));
        let lessons = Arc::new(LessonService::new(
            Arc::clone(&storage.lessons),
            Arc::clone(&progress),
        ));
        let question_bank = Arc::new(QuestionBankService::new(
            clock,
            Arc::clone(&tutor),
            Arc::clone(&storage.questions),
        ));
        let tutor = Arc::new(TutorService::new(tutor));
        let app_settings = Arc::new(AppSettingsService::new(Arc::clone(&storage.app_settings)));

        Ok(Self {
            storage,
            progress,
            practice,
            lessons,
            tutor,
            question_bank,
            app_settings,
        })
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorService> {
        Arc::clone(&self.tutor)
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBankService> {
        Arc::clone(&self.question_bank)
    }

    #[must_use]
    pub fn app_settings(&self) -> Arc<AppSettingsService> {
        Arc::clone(&self.app_settings)
    }

    /// Question and lesson counts per subject.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if either bank cannot be read.
    pub async fn bank_stats(&self) -> Result<BankStats, AppServicesError> {
        Ok(self.storage.bank_stats().await?)
    }

    /// Wipe all stored data and reset in-memory progress to defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage cannot be cleared or re-read.
    pub async fn clear_all_data(&self) -> Result<(), AppServicesError> {
        self.storage.clear_all().await?;
        self.progress.reload().await?;
        info!("app data reset");
        Ok(())
    }
}
