pub mod plan;
pub mod recorder;
pub mod session;
mod workflow;

pub use crate::error::PracticeError;
pub use plan::{MIN_SESSION_SIZE, PracticePlan, PracticeSelector, SESSION_SIZE};
pub use recorder::SessionOutcome;
pub use session::{
    Advance, AnswerFeedback, PracticeSession, QuestionToken, SECONDS_PER_QUESTION, SessionPhase,
    SessionResult, TimerMode,
};
pub use workflow::{PracticeService, PracticeStep};
