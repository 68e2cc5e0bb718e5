mod app_settings;
mod chat;
mod ids;
mod lesson;
mod progress;
mod question;
mod subject;

pub use app_settings::{API_KEY_PREFIX, AppSettings, AppSettingsDraft, AppSettingsError};
pub use chat::{AiAnalysis, AnalysisExample, ChatMessage, ChatRole, ExplanationMode};
pub use ids::{LessonId, ParseIdError, QuestionId};
pub use lesson::{Lesson, LessonExample, QuickTrick};
pub use progress::{HistoryEntry, MAX_SCORE, ProgressRecord, ProgressUpdate, session_score};
pub use question::{
    MIN_EXPLANATION_CHARS, OPTION_COUNT, Question, QuestionDraft, QuestionError,
    ValidatedQuestion, option_letter,
};
pub use subject::{ParseSubjectError, Subject};
