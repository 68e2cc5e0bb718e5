use std::sync::{Arc, Mutex};

use exam_core::analytics::PerformanceReport;
use exam_core::model::{LessonId, ProgressRecord, ProgressUpdate, QuestionId};
use storage::repository::ProgressRepository;
use tokio::sync::Mutex as WriteLock;
use tracing::{debug, warn};

use crate::Clock;
use crate::error::ProgressError;
use crate::practice::recorder::{SessionOutcome, record_result};
use crate::practice::session::SessionResult;

/// Owns the learner's progress for the lifetime of the app.
///
/// Mutations hold `write_lock` from the change until the write returns, so
/// stored snapshots land in the order they were taken. `state` is only ever
/// locked briefly and never across an `.await`.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    state: Arc<Mutex<ProgressRecord>>,
    write_lock: Arc<WriteLock<()>>,
}

impl ProgressService {
    /// Load the stored record into a new controller.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be read.
    pub async fn load(
        clock: Clock,
        repo: Arc<dyn ProgressRepository>,
    ) -> Result<Self, ProgressError> {
        let record = repo.load_progress().await?;
        Ok(Self {
            clock,
            repo,
            state: Arc::new(Mutex::new(record)),
            write_lock: Arc::new(WriteLock::new(())),
        })
    }

    /// Snapshot of the current record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if a writer panicked while holding the lock.
    pub fn get_progress(&self) -> Result<ProgressRecord, ProgressError> {
        let guard = self.state.lock().map_err(|_| ProgressError::Poisoned)?;
        Ok(guard.clone())
    }

    /// Per-subject averages for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the state lock is poisoned.
    pub fn performance_report(&self) -> Result<PerformanceReport, ProgressError> {
        let guard = self.state.lock().map_err(|_| ProgressError::Poisoned)?;
        Ok(PerformanceReport::from_progress(&guard))
    }

    /// Replace any subset of the record's fields and persist. Solved ids are merged.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the lock is poisoned or the write fails.
    pub async fn update_progress(
        &self,
        update: ProgressUpdate,
    ) -> Result<ProgressRecord, ProgressError> {
        let _write = self.write_lock.lock().await;
        let snapshot = self.mutate(|record| update.apply_to(record))?.1;
        self.repo.save_progress(&snapshot).await?;
        Ok(snapshot)
    }

    /// Flip a lesson's completed flag; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the lock is poisoned or the write fails.
    pub async fn toggle_lesson(&self, id: LessonId) -> Result<bool, ProgressError> {
        let _write = self.write_lock.lock().await;
        let (completed, snapshot) = self.mutate(|record| record.toggle_lesson(id))?;
        self.repo.save_progress(&snapshot).await?;
        Ok(completed)
    }

    /// Mark one question solved; returns `false` if it already was.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the lock is poisoned or the write fails.
    pub async fn mark_solved(&self, id: QuestionId) -> Result<bool, ProgressError> {
        let _write = self.write_lock.lock().await;
        let (added, snapshot) = self.mutate(|record| record.mark_solved(id))?;
        if added {
            self.repo.save_progress(&snapshot).await?;
        }
        Ok(added)
    }

    /// Apply a finished session to the record.
    ///
    /// A failed write is logged and reported through
    /// [`SessionOutcome::persisted`]; the in-memory record keeps the result.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Poisoned` if the state lock is poisoned.
    pub async fn record_session(
        &self,
        result: &SessionResult,
    ) -> Result<SessionOutcome, ProgressError> {
        let date = self.clock.today();
        let _write = self.write_lock.lock().await;
        let (newly_solved, snapshot) =
            self.mutate(|record| record_result(record, result, date))?;

        let persisted = match self.repo.save_progress(&snapshot).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, subject = %result.subject, "failed to persist session result");
                false
            }
        };
        debug!(
            subject = %result.subject,
            score = result.score,
            newly_solved,
            persisted,
            "recorded practice session"
        );

        Ok(SessionOutcome {
            subject: result.subject,
            date,
            score: result.score,
            correct: result.correct,
            total: result.total,
            newly_solved,
            persisted,
        })
    }

    /// Re-read the stored record, dropping in-memory state. Used after a full reset.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the read fails or the lock is poisoned.
    pub async fn reload(&self) -> Result<ProgressRecord, ProgressError> {
        let _write = self.write_lock.lock().await;
        let record = self.repo.load_progress().await?;
        let mut guard = self.state.lock().map_err(|_| ProgressError::Poisoned)?;
        *guard = record.clone();
        Ok(record)
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut ProgressRecord) -> T,
    ) -> Result<(T, ProgressRecord), ProgressError> {
        let mut guard = self.state.lock().map_err(|_| ProgressError::Poisoned)?;
        let out = f(&mut guard);
        Ok((out, guard.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use exam_core::model::Subject;
    use exam_core::time::fixed_clock;
    use storage::repository::{Storage, StorageError};

    struct FailingRepo;

    #[async_trait]
    impl ProgressRepository for FailingRepo {
        async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
            Ok(ProgressRecord::default())
        }

        async fn save_progress(&self, _progress: &ProgressRecord) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }
    }

    /// Holds the first save for a while so a second writer can overtake it.
    #[derive(Default)]
    struct SlowFirstSave {
        saves: std::sync::atomic::AtomicUsize,
        stored: Mutex<Option<ProgressRecord>>,
    }

    #[async_trait]
    impl ProgressRepository for SlowFirstSave {
        async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
            Ok(ProgressRecord::default())
        }

        async fn save_progress(&self, progress: &ProgressRecord) -> Result<(), StorageError> {
            let nth = self
                .saves
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if nth == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            *self.stored.lock().unwrap() = Some(progress.clone());
            Ok(())
        }
    }

    fn result() -> SessionResult {
        SessionResult {
            subject: Subject::PenalaranMatematika,
            correct: 9,
            total: 12,
            score: 750,
            seen_question_ids: vec![QuestionId::new("pm-1"), QuestionId::new("pm-2")],
            timed_out: false,
        }
    }

    #[tokio::test]
    async fn updates_are_persisted() {
        let storage = Storage::in_memory();
        let service = ProgressService::load(fixed_clock(), storage.progress.clone())
            .await
            .unwrap();

        assert!(service.toggle_lesson(LessonId::new("pu-logic")).await.unwrap());
        assert!(service.mark_solved(QuestionId::new("pu-1")).await.unwrap());
        assert!(!service.mark_solved(QuestionId::new("pu-1")).await.unwrap());

        let stored = storage.progress.load_progress().await.unwrap();
        assert!(stored.is_lesson_completed(&LessonId::new("pu-logic")));
        assert!(stored.is_solved(&QuestionId::new("pu-1")));
        assert_eq!(stored, service.get_progress().unwrap());
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let storage = Storage::in_memory();
        let service = ProgressService::load(fixed_clock(), storage.progress.clone())
            .await
            .unwrap();
        service.record_session(&result()).await.unwrap();

        let updated = service
            .update_progress(ProgressUpdate {
                solved_question_ids: Some(Default::default()),
                completed_lesson_ids: Some([LessonId::new("pm-1")].into_iter().collect()),
                ..ProgressUpdate::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.solved_question_ids().len(), 2);
        assert!(updated.is_lesson_completed(&LessonId::new("pm-1")));
        assert_eq!(updated.scores_for(Subject::PenalaranMatematika), &[750]);
        assert_eq!(updated.history().len(), 1);
        assert_eq!(storage.progress.load_progress().await.unwrap(), updated);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_writes_keep_latest_state() {
        let repo = Arc::new(SlowFirstSave::default());
        let service = ProgressService::load(fixed_clock(), repo.clone())
            .await
            .unwrap();

        let session = result();
        let (toggled, outcome) = tokio::join!(
            service.toggle_lesson(LessonId::new("pm-1")),
            service.record_session(&session),
        );
        assert!(toggled.unwrap());
        assert!(outcome.unwrap().persisted);

        let stored = repo.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored, service.get_progress().unwrap());
        assert_eq!(stored.history().len(), 1);
        assert!(stored.is_lesson_completed(&LessonId::new("pm-1")));
    }

    #[tokio::test]
    async fn failed_write_still_returns_outcome() {
        let service = ProgressService::load(fixed_clock(), Arc::new(FailingRepo))
            .await
            .unwrap();

        let outcome = service.record_session(&result()).await.unwrap();

        assert!(!outcome.persisted);
        assert_eq!(outcome.score, 750);
        assert_eq!(outcome.newly_solved, 2);
        let progress = service.get_progress().unwrap();
        assert_eq!(progress.scores_for(Subject::PenalaranMatematika), &[750]);
    }

    #[tokio::test]
    async fn report_reflects_recorded_sessions() {
        let storage = Storage::in_memory();
        let service = ProgressService::load(fixed_clock(), storage.progress.clone())
            .await
            .unwrap();
        service.record_session(&result()).await.unwrap();

        let report = service.performance_report().unwrap();
        assert_eq!(report.strongest().unwrap().subject, Subject::PenalaranMatematika);
        assert!(report.get(Subject::PenalaranMatematika).unwrap().is_on_target());
    }
}
