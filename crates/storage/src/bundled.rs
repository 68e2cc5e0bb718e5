//! Question and lesson banks compiled into the binary. They seed an empty
//! store and are what `reset_questions` restores.

use exam_core::model::{Lesson, Question};

use crate::repository::StorageError;

const QUESTIONS_JSON: &str = include_str!("../data/questions.json");
const LESSONS_JSON: &str = include_str!("../data/lessons.json");

/// # Errors
///
/// Returns `StorageError::Serialization` if the bundled file is malformed.
pub fn default_questions() -> Result<Vec<Question>, StorageError> {
    Ok(serde_json::from_str(QUESTIONS_JSON)?)
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the bundled file is malformed.
pub fn default_lessons() -> Result<Vec<Lesson>, StorageError> {
    Ok(serde_json::from_str(LESSONS_JSON)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{QuestionDraft, Subject};
    use std::collections::HashSet;

    #[test]
    fn bundled_questions_are_valid() {
        let questions = default_questions().unwrap();
        assert!(!questions.is_empty());

        let mut ids = HashSet::new();
        for question in &questions {
            assert!(ids.insert(question.id().clone()), "duplicate id {}", question.id());
            let draft = QuestionDraft {
                text: question.text().to_string(),
                options: question.options().to_vec(),
                correct_answer: i64::try_from(question.correct_answer()).unwrap(),
                explanation: question.explanation().to_string(),
                quick_trick: question.quick_trick().map(str::to_string),
                context: question.context().map(str::to_string),
            };
            draft.validate().unwrap();
        }
    }

    #[test]
    fn bundled_lessons_cover_every_subject() {
        let lessons = default_lessons().unwrap();
        for subject in Subject::ALL {
            assert!(
                Lesson::for_subject(&lessons, subject).next().is_some(),
                "no lessons for {subject}"
            );
        }
    }
}
