use serde::{Deserialize, Serialize};

use crate::model::{LessonId, Subject};

/// A named shortcut formula attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickTrick {
    pub name: String,
    pub formula: String,
    pub description: String,
}

/// Worked example shown at the end of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonExample {
    pub question: String,
    pub solution: Vec<String>,
    pub formulas: Vec<String>,
}

/// Static study material for one topic of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    #[serde(rename = "subtest")]
    pub subject: Subject,
    pub summary: String,
    pub points: Vec<String>,
    pub trap_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_tricks: Option<Vec<QuickTrick>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<LessonExample>,
}

impl Lesson {
    /// Lessons belonging to `subject`, in bank order.
    pub fn for_subject(lessons: &[Lesson], subject: Subject) -> impl Iterator<Item = &Lesson> {
        lessons.iter().filter(move |lesson| lesson.subject == subject)
    }
}
