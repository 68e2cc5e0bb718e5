use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a tutor conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Worked example attached to a topic explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisExample {
    pub question: String,
    pub answer: String,
    pub step_by_step: String,
}

/// The same explanation written four ways, so a student can pick the register
/// that clicks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub quick: String,
    pub simple: String,
    pub complex: String,
    pub interactive: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<AnalysisExample>,
}

/// Which of the four explanation styles to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplanationMode {
    #[default]
    Quick,
    Simple,
    Complex,
    Interactive,
}

impl AiAnalysis {
    #[must_use]
    pub fn text_for(&self, mode: ExplanationMode) -> &str {
        match mode {
            ExplanationMode::Quick => &self.quick,
            ExplanationMode::Simple => &self.simple,
            ExplanationMode::Complex => &self.complex,
            ExplanationMode::Interactive => &self.interactive,
        }
    }
}
