#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use exam_core::model::{AiAnalysis, ChatMessage, Question, QuestionDraft, QuestionId, Subject};
use services::{Tutor, TutorError};

/// Tutor that replays queued question batches and echoes chat.
#[derive(Default)]
pub struct ScriptedTutor {
    pub batches: Mutex<VecDeque<Result<Vec<QuestionDraft>, TutorError>>>,
}

impl ScriptedTutor {
    pub fn with_batches(batches: Vec<Result<Vec<QuestionDraft>, TutorError>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl Tutor for ScriptedTutor {
    async fn generate_questions(
        &self,
        _subject: Subject,
        _count: usize,
        _hots: bool,
    ) -> Result<Vec<QuestionDraft>, TutorError> {
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(TutorError::EmptyResponse))
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        _context: Option<&str>,
    ) -> Result<String, TutorError> {
        Ok(format!("echo: {}", history.len()))
    }

    async fn deep_analysis(&self, _question: &Question) -> Result<AiAnalysis, TutorError> {
        Err(TutorError::QuotaExceeded)
    }

    async fn topic_explanation(
        &self,
        _topic: &str,
        _subject: Subject,
    ) -> Result<AiAnalysis, TutorError> {
        Err(TutorError::QuotaExceeded)
    }

    async fn is_configured(&self) -> bool {
        true
    }
}

pub fn draft(text: &str, correct_answer: i64) -> QuestionDraft {
    QuestionDraft {
        text: text.into(),
        options: ["A", "B", "C", "D", "E"].map(String::from).to_vec(),
        correct_answer,
        explanation: "Uraian langkah demi langkah untuk soal ini.".into(),
        quick_trick: None,
        context: None,
    }
}

pub fn question(id: &str, subject: Subject, text: &str, correct_answer: i64) -> Question {
    draft(text, correct_answer)
        .validate()
        .unwrap()
        .assign(QuestionId::new(id), subject)
}
