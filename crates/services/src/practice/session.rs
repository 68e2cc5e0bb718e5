use exam_core::model::{Question, QuestionId, Subject, session_score};

use super::plan::PracticePlan;
use crate::error::PracticeError;

/// Seconds granted per question in timed mode.
pub const SECONDS_PER_QUESTION: u32 = 60;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Answered,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerMode {
    #[default]
    Untimed,
    Timed,
}

/// Identifies which question was on screen when an async request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuestionToken(u64);

/// Grading of a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub selected: usize,
    pub correct_option: usize,
    pub is_correct: bool,
}

/// What `advance` moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(QuestionToken),
    Finished,
}

/// Final tally of a session, produced once by [`PracticeSession::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub subject: Subject,
    pub correct: usize,
    pub total: usize,
    pub score: u32,
    pub seen_question_ids: Vec<QuestionId>,
    pub timed_out: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory practice run over a fixed list of questions.
///
/// Owned by a single driver; the timer and answer handling are plain method
/// calls, so transitions never race.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    subject: Subject,
    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    correct_count: usize,
    timer: TimerMode,
    remaining_seconds: u32,
    phase: SessionPhase,
    token: u64,
    timed_out: bool,
    reported: bool,
}

impl PracticeSession {
    #[must_use]
    pub fn new(plan: PracticePlan) -> Self {
        Self {
            subject: plan.subject,
            questions: plan.questions,
            current: 0,
            selected: None,
            correct_count: 0,
            timer: TimerMode::Untimed,
            remaining_seconds: 0,
            phase: SessionPhase::NotStarted,
            token: 0,
            timed_out: false,
            reported: false,
        }
    }

    /// Begin answering. Timed sessions get one minute per question.
    ///
    /// Returns `false` if the session was already started.
    pub fn start(&mut self, timer: TimerMode) -> bool {
        if self.phase != SessionPhase::NotStarted {
            return false;
        }
        self.timer = timer;
        if timer == TimerMode::Timed {
            let count = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
            self.remaining_seconds = count.saturating_mul(SECONDS_PER_QUESTION);
        }
        self.phase = SessionPhase::InProgress;
        self.token += 1;
        true
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn timer(&self) -> TimerMode {
        self.timer
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u32> {
        (self.timer == TimerMode::Timed).then_some(self.remaining_seconds)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Zero-based index of the question on screen.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::InProgress | SessionPhase::Answered => self.questions.get(self.current),
            SessionPhase::NotStarted | SessionPhase::Finished => None,
        }
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    #[must_use]
    pub fn token(&self) -> QuestionToken {
        QuestionToken(self.token)
    }

    /// Whether a reply requested under `token` still belongs on screen.
    #[must_use]
    pub fn accepts(&self, token: QuestionToken) -> bool {
        token.0 == self.token
    }

    /// Every question presented so far, including the current one.
    #[must_use]
    pub fn seen_question_ids(&self) -> Vec<QuestionId> {
        if self.phase == SessionPhase::NotStarted {
            return Vec::new();
        }
        let end = (self.current + 1).min(self.questions.len());
        self.questions[..end]
            .iter()
            .map(|q| q.id().clone())
            .collect()
    }

    /// Grade an answer for the current question.
    ///
    /// Submitting again after an answer was recorded returns the original
    /// feedback and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InvalidAnswer` for an index outside the
    /// options, `PracticeError::NotAnswerable` before the session starts and
    /// `PracticeError::Finished` once it has ended.
    pub fn submit_answer(&mut self, index: usize) -> Result<AnswerFeedback, PracticeError> {
        match self.phase {
            SessionPhase::NotStarted => return Err(PracticeError::NotAnswerable),
            SessionPhase::Finished => return Err(PracticeError::Finished),
            SessionPhase::Answered | SessionPhase::InProgress => {}
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(PracticeError::NotAnswerable)?;

        if let (SessionPhase::Answered, Some(selected)) = (self.phase, self.selected) {
            return Ok(feedback(question, selected));
        }
        if index >= question.options().len() {
            return Err(PracticeError::InvalidAnswer { index });
        }

        let result = feedback(question, index);
        if result.is_correct {
            self.correct_count += 1;
        }
        self.selected = Some(index);
        self.phase = SessionPhase::Answered;
        Ok(result)
    }

    /// Move past an answered question.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::NotAnswerable` while the current question has
    /// no answer and `PracticeError::Finished` once the session has ended.
    pub fn advance(&mut self) -> Result<Advance, PracticeError> {
        match self.phase {
            SessionPhase::Answered => {}
            SessionPhase::Finished => return Err(PracticeError::Finished),
            SessionPhase::NotStarted | SessionPhase::InProgress => {
                return Err(PracticeError::NotAnswerable);
            }
        }

        if self.current + 1 >= self.questions.len() {
            self.end();
            return Ok(Advance::Finished);
        }
        self.current += 1;
        self.selected = None;
        self.phase = SessionPhase::InProgress;
        self.token += 1;
        Ok(Advance::Next(self.token()))
    }

    /// One second of wall time in timed mode. Running out ends the session.
    pub fn tick(&mut self) -> SessionPhase {
        let running = matches!(
            self.phase,
            SessionPhase::InProgress | SessionPhase::Answered
        );
        if self.timer != TimerMode::Timed || !running {
            return self.phase;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.timed_out = true;
            self.end();
        }
        self.phase
    }

    /// End the session and compute its score.
    ///
    /// Returns `None` if the result was already produced.
    pub fn finish(&mut self) -> Option<SessionResult> {
        if self.reported {
            return None;
        }
        let seen_question_ids = self.seen_question_ids();
        self.end();
        self.reported = true;

        let total = self.questions.len();
        Some(SessionResult {
            subject: self.subject,
            correct: self.correct_count,
            total,
            score: session_score(self.correct_count, total),
            seen_question_ids,
            timed_out: self.timed_out,
        })
    }

    fn end(&mut self) {
        if self.phase != SessionPhase::Finished {
            self.phase = SessionPhase::Finished;
            self.token += 1;
        }
    }
}

fn feedback(question: &Question, selected: usize) -> AnswerFeedback {
    AnswerFeedback {
        question_id: question.id().clone(),
        selected,
        correct_option: question.correct_answer(),
        is_correct: question.is_correct(selected),
    }
}
