use async_trait::async_trait;
use exam_core::model::{
    AppSettings, AppSettingsDraft, Lesson, ProgressRecord, Question, Subject,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bundled;
use crate::kv::{InMemoryStore, KeyValueStore};

/// Key under which the learner's progress is stored.
pub const PROGRESS_KEY: &str = "lulus_snbt_progress_v1";
/// Key under which the full question bank is stored.
pub const QUESTIONS_KEY: &str = "lulus_snbt_questions_v1";
/// Key under which the lesson bank is stored.
pub const LESSONS_KEY: &str = "lulus_snbt_lessons_v1";
/// Key holding the raw tutor API key.
pub const API_KEY_KEY: &str = "user_gemini_api_key";
/// Key holding the remaining tutor settings (model, base URL).
pub const AI_SETTINGS_KEY: &str = "lulus_snbt_ai_settings_v1";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Repository contract for the learner's progress record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the stored progress, or the default record when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store fails or holds malformed data.
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError>;

    /// Replace the stored progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError>;
}

/// Repository contract for the question pool.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Load every stored question, seeding the bundled bank on first use.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store fails or holds malformed data.
    async fn load_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Replace the whole question bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be written.
    async fn save_questions(&self, questions: &[Question]) -> Result<(), StorageError>;

    /// Merge new questions, skipping any whose text already exists.
    ///
    /// Returns how many questions were actually added.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if loading or saving the bank fails.
    async fn add_questions(&self, questions: Vec<Question>) -> Result<usize, StorageError>;

    /// Throw away downloaded questions and restore the bundled bank.
    ///
    /// Returns the size of the restored bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be written.
    async fn reset_questions(&self) -> Result<usize, StorageError>;
}

/// Repository contract for the lesson bank.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Load every stored lesson, seeding the bundled lessons on first use.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store fails or holds malformed data.
    async fn load_lessons(&self) -> Result<Vec<Lesson>, StorageError>;

    /// Merge new lessons, skipping any whose title already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if loading or saving the bank fails.
    async fn add_lessons(&self, lessons: Vec<Lesson>) -> Result<usize, StorageError>;
}

/// Repository contract for tutor settings.
#[async_trait]
pub trait AppSettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store fails or the stored values no longer validate.
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be written.
    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAiSettings {
    api_model: Option<String>,
    api_base_url: Option<String>,
}

/// Counts per subject, used by the seed tool and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankStats {
    pub questions: usize,
    pub lessons: usize,
    pub questions_by_subject: BTreeMap<Subject, usize>,
    pub lessons_by_subject: BTreeMap<Subject, usize>,
}

/// JSON documents on top of any [`KeyValueStore`].
///
/// Read-modify-write operations on the banks are serialized through an async
/// lock so concurrent merges cannot drop each other's questions.
#[derive(Clone)]
pub struct JsonRepository {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl JsonRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).await
    }

    /// Question and lesson counts per subject.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either bank cannot be loaded.
    pub async fn bank_stats(&self) -> Result<BankStats, StorageError> {
        let questions = self.load_questions().await?;
        let lessons = self.load_lessons().await?;

        let mut stats = BankStats {
            questions: questions.len(),
            lessons: lessons.len(),
            ..BankStats::default()
        };
        for question in &questions {
            *stats
                .questions_by_subject
                .entry(question.subject())
                .or_default() += 1;
        }
        for lesson in &lessons {
            *stats.lessons_by_subject.entry(lesson.subject).or_default() += 1;
        }
        Ok(stats)
    }
}

#[async_trait]
impl ProgressRepository for JsonRepository {
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        Ok(self.read_json(PROGRESS_KEY).await?.unwrap_or_default())
    }

    async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError> {
        self.write_json(PROGRESS_KEY, progress).await
    }
}

#[async_trait]
impl QuestionRepository for JsonRepository {
    async fn load_questions(&self) -> Result<Vec<Question>, StorageError> {
        if let Some(questions) = self.read_json::<Vec<Question>>(QUESTIONS_KEY).await? {
            debug!(count = questions.len(), "loaded question bank");
            return Ok(questions);
        }
        let seeded = bundled::default_questions()?;
        info!(count = seeded.len(), "seeding question bank from bundled set");
        self.write_json(QUESTIONS_KEY, &seeded).await?;
        Ok(seeded)
    }

    async fn save_questions(&self, questions: &[Question]) -> Result<(), StorageError> {
        self.write_json(QUESTIONS_KEY, questions).await
    }

    async fn add_questions(&self, questions: Vec<Question>) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut bank = self.load_questions().await?;
        let mut seen: HashSet<String> = bank.iter().map(|q| q.text().to_string()).collect();

        let before = bank.len();
        bank.extend(
            questions
                .into_iter()
                .filter(|q| seen.insert(q.text().to_string())),
        );
        let added = bank.len() - before;

        if added > 0 {
            self.write_json(QUESTIONS_KEY, &bank).await?;
        }
        info!(added, total = bank.len(), "merged questions into bank");
        Ok(added)
    }

    async fn reset_questions(&self) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        let seeded = bundled::default_questions()?;
        self.write_json(QUESTIONS_KEY, &seeded).await?;
        info!(count = seeded.len(), "question bank reset to bundled set");
        Ok(seeded.len())
    }
}

#[async_trait]
impl LessonRepository for JsonRepository {
    async fn load_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        if let Some(lessons) = self.read_json::<Vec<Lesson>>(LESSONS_KEY).await? {
            return Ok(lessons);
        }
        let seeded = bundled::default_lessons()?;
        info!(count = seeded.len(), "seeding lesson bank from bundled set");
        self.write_json(LESSONS_KEY, &seeded).await?;
        Ok(seeded)
    }

    async fn add_lessons(&self, lessons: Vec<Lesson>) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut bank = self.load_lessons().await?;
        let mut seen: HashSet<String> = bank.iter().map(|l| l.title.clone()).collect();

        let before = bank.len();
        bank.extend(lessons.into_iter().filter(|l| seen.insert(l.title.clone())));
        let added = bank.len() - before;

        if added > 0 {
            self.write_json(LESSONS_KEY, &bank).await?;
        }
        Ok(added)
    }
}

#[async_trait]
impl AppSettingsRepository for JsonRepository {
    async fn get_settings(&self) -> Result<Option<AppSettings>, StorageError> {
        let api_key = self.store.get(API_KEY_KEY).await?;
        let extra: Option<StoredAiSettings> = self.read_json(AI_SETTINGS_KEY).await?;
        if api_key.is_none() && extra.is_none() {
            return Ok(None);
        }
        let extra = extra.unwrap_or_default();

        AppSettings::from_persisted(AppSettingsDraft {
            api_key,
            api_model: extra.api_model,
            api_base_url: extra.api_base_url,
        })
        .map(Some)
        .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<(), StorageError> {
        match settings.api_key() {
            Some(key) => self.store.set(API_KEY_KEY, key).await?,
            None => self.store.remove(API_KEY_KEY).await?,
        }
        self.write_json(
            AI_SETTINGS_KEY,
            &StoredAiSettings {
                api_model: settings.api_model().map(str::to_string),
                api_base_url: settings.api_base_url().map(str::to_string),
            },
        )
        .await
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub app_settings: Arc<dyn AppSettingsRepository>,
    repo: JsonRepository,
    store: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()))
    }

    /// Build every repository on top of a single key-value backend.
    #[must_use]
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = JsonRepository::new(Arc::clone(&store));
        Self {
            progress: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            app_settings: Arc::new(repo.clone()),
            repo,
            store,
        }
    }

    /// Question and lesson counts per subject.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either bank cannot be loaded.
    pub async fn bank_stats(&self) -> Result<BankStats, StorageError> {
        self.repo.bank_stats().await
    }

    /// Wipe every stored document: progress, banks, and settings.
    ///
    /// The next load re-seeds the bundled banks and starts from default progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be cleared.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.store.clear().await?;
        info!("all stored data cleared");
        Ok(())
    }
}
