use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuestionId, Subject};

/// Every question carries exactly this many options (A–E).
pub const OPTION_COUNT: usize = 5;

/// Explanations shorter than this (after trimming) are treated as placeholders.
pub const MIN_EXPLANATION_CHARS: usize = 20;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Candidate question as produced by the tutor, before it has an id or subject.
///
/// Every field defaults so a partially formed object still deserializes and is
/// rejected by [`QuestionDraft::validate`] instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    pub explanation: String,
    pub quick_trick: Option<String>,
    pub context: Option<String>,
}

impl QuestionDraft {
    /// Check shape and content of a generated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, the option count is not
    /// five, an option is blank, the answer index is out of range, or the
    /// explanation is too short to be useful.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        if self.options.len() != OPTION_COUNT {
            return Err(QuestionError::OptionCount {
                found: self.options.len(),
            });
        }
        let mut options = Vec::with_capacity(OPTION_COUNT);
        for (index, option) in self.options.into_iter().enumerate() {
            let option = option.trim().to_string();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            options.push(option);
        }

        let correct_answer = usize::try_from(self.correct_answer)
            .ok()
            .filter(|idx| *idx < OPTION_COUNT)
            .ok_or(QuestionError::AnswerOutOfRange {
                index: self.correct_answer,
            })?;

        let explanation = self.explanation.trim().to_string();
        let explanation_len = explanation.chars().count();
        if explanation_len < MIN_EXPLANATION_CHARS {
            return Err(QuestionError::ExplanationTooShort {
                len: explanation_len,
            });
        }

        Ok(ValidatedQuestion {
            text,
            options,
            correct_answer,
            explanation,
            quick_trick: normalize_optional(self.quick_trick),
            context: normalize_optional(self.context),
        })
    }
}

/// A draft that passed validation and only lacks identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    text: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    quick_trick: Option<String>,
    context: Option<String>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn assign(self, id: QuestionId, subject: Subject) -> Question {
        Question {
            id,
            subject,
            text: self.text,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            quick_trick: self.quick_trick,
            context: self.context,
        }
    }
}

/// A question in the bank. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "subtest")]
    subject: Subject,
    text: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quick_trick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    /// Text of the correct option, if the stored index is in range.
    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn quick_trick(&self) -> Option<&str> {
        self.quick_trick.as_deref()
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_answer
    }

    /// Options rendered as `A. …` lines, the way prompts and exports show them.
    #[must_use]
    pub fn lettered_options(&self) -> Vec<String> {
        self.options
            .iter()
            .enumerate()
            .map(|(idx, opt)| format!("{}. {opt}", option_letter(idx)))
            .collect()
    }
}

/// Letter label (`A`, `B`, …) for an option index.
#[must_use]
pub fn option_letter(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|idx| b'A'.checked_add(idx))
        .map_or('?', char::from)
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("expected {OPTION_COUNT} options, found {found}")]
    OptionCount { found: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct answer index {index} is out of range")]
    AnswerOutOfRange { index: i64 },

    #[error("explanation too short ({len} chars)")]
    ExplanationTooShort { len: usize },
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            text: "Jika semua A adalah B, maka ...".into(),
            options: ["satu", "dua", "tiga", "empat", "lima"]
                .map(String::from)
                .to_vec(),
            correct_answer: 2,
            explanation: "Karena premis pertama berlaku untuk semua anggota A.".into(),
            quick_trick: Some("  ".into()),
            context: None,
        }
    }

    #[test]
    fn valid_draft_assigns_identity() {
        let question = draft()
            .validate()
            .unwrap()
            .assign(QuestionId::new("dyn-1"), Subject::PenalaranUmum);

        assert_eq!(question.id().as_str(), "dyn-1");
        assert_eq!(question.subject(), Subject::PenalaranUmum);
        assert_eq!(question.correct_option(), Some("tiga"));
        assert!(question.is_correct(2));
        assert_eq!(question.quick_trick(), None);
    }

    #[test]
    fn rejects_wrong_option_count() {
        let mut d = draft();
        d.options.pop();
        assert_eq!(d.validate().unwrap_err(), QuestionError::OptionCount { found: 4 });
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let mut d = draft();
        d.correct_answer = 5;
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::AnswerOutOfRange { index: 5 }
        ));

        let mut d = draft();
        d.correct_answer = -1;
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::AnswerOutOfRange { .. }
        ));
    }

    #[test]
    fn rejects_trivial_explanation() {
        let mut d = draft();
        d.explanation = "Jelas.".into();
        assert!(matches!(
            d.validate().unwrap_err(),
            QuestionError::ExplanationTooShort { .. }
        ));
    }

    #[test]
    fn missing_fields_still_deserialize() {
        let d: QuestionDraft = serde_json::from_str(r#"{"text":"Soal"}"#).unwrap();
        assert!(d.options.is_empty());
        assert!(d.validate().is_err());
    }

    #[test]
    fn stored_json_uses_original_field_names() {
        let question = draft()
            .validate()
            .unwrap()
            .assign(QuestionId::new("pu-9"), Subject::PenalaranUmum);
        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["subtest"], "Penalaran Umum");
        assert_eq!(json["correctAnswer"], 2);
        assert!(json.get("quickTrick").is_none());
    }

    #[test]
    fn lettered_options_start_at_a() {
        let question = draft()
            .validate()
            .unwrap()
            .assign(QuestionId::new("x"), Subject::PenalaranUmum);
        assert_eq!(question.lettered_options()[0], "A. satu");
        assert_eq!(option_letter(4), 'E');
    }
}
