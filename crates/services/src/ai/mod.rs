//! Text-completion tutor: the trait the rest of the crate talks to, plus the
//! Gemini-backed implementation.

use async_trait::async_trait;

use exam_core::model::{AiAnalysis, ChatMessage, Question, QuestionDraft, Subject};

use crate::error::TutorError;

pub mod config;
pub mod gemini;
pub mod json;
pub mod prompts;

pub use config::TutorConfig;
pub use gemini::{GeminiTutor, RetryPolicy};
pub use json::{clean_model_json, parse_question_batch, repair_truncated_json_array};

/// Most questions requested from the model in one call.
pub const MAX_QUESTIONS_PER_REQUEST: usize = 10;

#[async_trait]
pub trait Tutor: Send + Sync {
    /// Ask for up to [`MAX_QUESTIONS_PER_REQUEST`] new questions. Drafts are
    /// unvalidated; callers validate and deduplicate them.
    async fn generate_questions(
        &self,
        subject: Subject,
        count: usize,
        hots: bool,
    ) -> Result<Vec<QuestionDraft>, TutorError>;

    /// Reply to the last message of `history`. `context` is extra instruction
    /// for this reply only.
    async fn chat(
        &self,
        history: &[ChatMessage],
        context: Option<&str>,
    ) -> Result<String, TutorError>;

    async fn deep_analysis(&self, question: &Question) -> Result<AiAnalysis, TutorError>;

    async fn topic_explanation(
        &self,
        topic: &str,
        subject: Subject,
    ) -> Result<AiAnalysis, TutorError>;

    /// Whether a call right now would be attempted at all.
    async fn is_configured(&self) -> bool;
}
