use rand::Rng;
use std::sync::Arc;

use exam_core::model::{Question, Subject};
use storage::repository::QuestionRepository;
use tracing::{info, warn};

use super::plan::PracticeSelector;
use super::recorder::SessionOutcome;
use super::session::{Advance, PracticeSession, QuestionToken, TimerMode};
use crate::error::PracticeError;
use crate::progress_service::ProgressService;

/// Result of moving past an answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeStep {
    Next(QuestionToken),
    Finished(SessionOutcome),
}

/// Orchestrates session start and persisted progress.
#[derive(Clone)]
pub struct PracticeService {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<ProgressService>,
}

impl PracticeService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, progress: Arc<ProgressService>) -> Self {
        Self {
            questions,
            progress,
        }
    }

    /// Build and start a session for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InsufficientQuestions` when the pool is too small,
    /// or a storage/progress error if the pool cannot be read.
    pub async fn start_practice(
        &self,
        subject: Subject,
        timer: TimerMode,
    ) -> Result<PracticeSession, PracticeError> {
        let pool = self.questions.load_questions().await?;
        self.start_from_pool(subject, timer, &pool, &mut rand::rng())
    }

    /// Same as [`PracticeService::start_practice`] with caller-provided randomness.
    ///
    /// # Errors
    ///
    /// See [`PracticeService::start_practice`].
    pub async fn start_practice_with_rng<R: Rng + Send + ?Sized>(
        &self,
        subject: Subject,
        timer: TimerMode,
        rng: &mut R,
    ) -> Result<PracticeSession, PracticeError> {
        let pool = self.questions.load_questions().await?;
        self.start_from_pool(subject, timer, &pool, rng)
    }

    fn start_from_pool<R: Rng + ?Sized>(
        &self,
        subject: Subject,
        timer: TimerMode,
        pool: &[Question],
        rng: &mut R,
    ) -> Result<PracticeSession, PracticeError> {
        let progress = self.progress.get_progress()?;
        let plan =
            PracticeSelector::new(subject, progress.solved_question_ids()).build(pool, rng)?;
        info!(
            subject = %subject,
            total = plan.total(),
            unsolved = plan.unsolved_selected,
            solved = plan.solved_selected,
            "starting practice session"
        );

        let mut session = PracticeSession::new(plan);
        session.start(timer);
        Ok(session)
    }

    /// Move past the current answered question, marking it solved.
    ///
    /// Leaving the last question finishes the session and records it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError` if the session cannot advance or the progress
    /// lock is poisoned.
    pub async fn advance(
        &self,
        session: &mut PracticeSession,
    ) -> Result<PracticeStep, PracticeError> {
        let current_id = session.current_question().map(|q| q.id().clone());
        let step = session.advance()?;

        if let Some(id) = current_id {
            if let Err(err) = self.progress.mark_solved(id).await {
                warn!(error = %err, "failed to mark question solved");
            }
        }

        match step {
            Advance::Next(token) => Ok(PracticeStep::Next(token)),
            Advance::Finished => match self.finish(session).await? {
                Some(outcome) => Ok(PracticeStep::Finished(outcome)),
                None => Err(PracticeError::Finished),
            },
        }
    }

    /// Drive the countdown by one second, recording the session if time ran out.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError` if the progress lock is poisoned.
    pub async fn tick(
        &self,
        session: &mut PracticeSession,
    ) -> Result<Option<SessionOutcome>, PracticeError> {
        if session.is_finished() {
            return Ok(None);
        }
        session.tick();
        if session.is_finished() {
            info!(subject = %session.subject(), "practice timer expired");
            return self.finish(session).await;
        }
        Ok(None)
    }

    /// End the session and record it. `None` if it was already recorded.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError` if the progress lock is poisoned.
    pub async fn finish(
        &self,
        session: &mut PracticeSession,
    ) -> Result<Option<SessionOutcome>, PracticeError> {
        let Some(result) = session.finish() else {
            return Ok(None);
        };
        let outcome = self.progress.record_session(&result).await?;
        info!(
            subject = %outcome.subject,
            score = outcome.score,
            correct = outcome.correct,
            total = outcome.total,
            "practice session finished"
        );
        Ok(Some(outcome))
    }
}
