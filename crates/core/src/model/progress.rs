use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{LessonId, QuestionId, Subject};

/// Highest score a single practice session can reach.
pub const MAX_SCORE: u32 = 1000;

/// Score of a session on the 0..=1000 scale: `round(correct / total × 1000)`.
///
/// Returns 0 for an empty session.
#[must_use]
pub fn session_score(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    // Integer round-half-up of correct * 1000 / total.
    let scaled = (correct as u64 * u64::from(MAX_SCORE) * 2 + total as u64) / (total as u64 * 2);
    u32::try_from(scaled).unwrap_or(MAX_SCORE)
}

/// One finished practice session in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    #[serde(rename = "subtest")]
    pub subject: Subject,
    pub score: u32,
}

/// Everything the app remembers about a learner between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "scores", default = "empty_scores")]
    scores_by_subject: BTreeMap<Subject, Vec<u32>>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(rename = "solvedQuestionIds", default)]
    solved_question_ids: BTreeSet<QuestionId>,
    #[serde(rename = "completedLessons", default)]
    completed_lesson_ids: BTreeSet<LessonId>,
}

fn empty_scores() -> BTreeMap<Subject, Vec<u32>> {
    Subject::ALL
        .into_iter()
        .map(|subject| (subject, Vec::new()))
        .collect()
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            scores_by_subject: empty_scores(),
            history: Vec::new(),
            solved_question_ids: BTreeSet::new(),
            completed_lesson_ids: BTreeSet::new(),
        }
    }
}

impl ProgressRecord {
    #[must_use]
    pub fn scores_for(&self, subject: Subject) -> &[u32] {
        self.scores_by_subject
            .get(&subject)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn scores_by_subject(&self) -> &BTreeMap<Subject, Vec<u32>> {
        &self.scores_by_subject
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn solved_question_ids(&self) -> &BTreeSet<QuestionId> {
        &self.solved_question_ids
    }

    #[must_use]
    pub fn completed_lesson_ids(&self) -> &BTreeSet<LessonId> {
        &self.completed_lesson_ids
    }

    #[must_use]
    pub fn is_solved(&self, id: &QuestionId) -> bool {
        self.solved_question_ids.contains(id)
    }

    #[must_use]
    pub fn is_lesson_completed(&self, id: &LessonId) -> bool {
        self.completed_lesson_ids.contains(id)
    }

    /// Append a finished session to both the history log and the subject's scores.
    pub fn record_score(&mut self, date: NaiveDate, subject: Subject, score: u32) {
        let score = score.min(MAX_SCORE);
        self.history.push(HistoryEntry {
            date,
            subject,
            score,
        });
        self.scores_by_subject
            .entry(subject)
            .or_default()
            .push(score);
    }

    /// Returns `true` when the id was not already marked.
    pub fn mark_solved(&mut self, id: QuestionId) -> bool {
        self.solved_question_ids.insert(id)
    }

    /// Mark every id, returning how many were newly added.
    pub fn mark_all_solved<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = QuestionId>,
    {
        ids.into_iter()
            .filter(|id| self.solved_question_ids.insert(id.clone()))
            .count()
    }

    /// Flip the completion flag of a lesson; returns the new state.
    pub fn toggle_lesson(&mut self, id: LessonId) -> bool {
        if self.completed_lesson_ids.remove(&id) {
            false
        } else {
            self.completed_lesson_ids.insert(id);
            true
        }
    }
}

/// Partial replacement of a [`ProgressRecord`]; `None` fields are left as-is.
///
/// Solved ids are merged into the existing set, never replaced: the set only
/// shrinks through a full reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub scores_by_subject: Option<BTreeMap<Subject, Vec<u32>>>,
    pub history: Option<Vec<HistoryEntry>>,
    pub solved_question_ids: Option<BTreeSet<QuestionId>>,
    pub completed_lesson_ids: Option<BTreeSet<LessonId>>,
}

impl ProgressUpdate {
    pub fn apply_to(self, record: &mut ProgressRecord) {
        if let Some(scores) = self.scores_by_subject {
            record.scores_by_subject = scores;
        }
        if let Some(history) = self.history {
            record.history = history;
        }
        if let Some(solved) = self.solved_question_ids {
            record.mark_all_solved(solved);
        }
        if let Some(completed) = self.completed_lesson_ids {
            record.completed_lesson_ids = completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn score_formula_rounds_half_up() {
        assert_eq!(session_score(15, 20), 750);
        assert_eq!(session_score(9, 12), 750);
        assert_eq!(session_score(1, 3), 333);
        assert_eq!(session_score(2, 3), 667);
        assert_eq!(session_score(1, 8), 125);
        assert_eq!(session_score(20, 20), 1000);
        assert_eq!(session_score(0, 0), 0);
    }

    #[test]
    fn default_has_every_subject() {
        let record = ProgressRecord::default();
        assert_eq!(record.scores_by_subject().len(), Subject::ALL.len());
        assert!(record.scores_for(Subject::PenalaranMatematika).is_empty());
    }

    #[test]
    fn record_score_appends_history_and_scores() {
        let mut record = ProgressRecord::default();
        record.record_score(date(), Subject::LiterasiInggris, 800);
        record.record_score(date(), Subject::LiterasiInggris, 600);

        assert_eq!(record.scores_for(Subject::LiterasiInggris), &[800, 600]);
        assert_eq!(record.history().len(), 2);
        assert_eq!(record.history()[1].score, 600);
    }

    #[test]
    fn solved_ids_never_duplicate() {
        let mut record = ProgressRecord::default();
        assert!(record.mark_solved(QuestionId::new("a")));
        assert!(!record.mark_solved(QuestionId::new("a")));
        let added = record.mark_all_solved(["a", "b", "c"].map(QuestionId::new));
        assert_eq!(added, 2);
        assert_eq!(record.solved_question_ids().len(), 3);
    }

    #[test]
    fn toggle_lesson_flips() {
        let mut record = ProgressRecord::default();
        assert!(record.toggle_lesson(LessonId::new("pu-1")));
        assert!(record.is_lesson_completed(&LessonId::new("pu-1")));
        assert!(!record.toggle_lesson(LessonId::new("pu-1")));
        assert!(record.completed_lesson_ids().is_empty());
    }

    #[test]
    fn legacy_record_without_solved_ids_loads() {
        let json = r#"{
            "scores": {"Penalaran Umum": [500]},
            "completedLessons": ["pu-1"],
            "history": []
        }"#;
        let record: ProgressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.scores_for(Subject::PenalaranUmum), &[500]);
        assert!(record.solved_question_ids().is_empty());
        assert!(record.is_lesson_completed(&LessonId::new("pu-1")));
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let mut record = ProgressRecord::default();
        record.record_score(date(), Subject::PenalaranUmum, 400);

        ProgressUpdate {
            completed_lesson_ids: Some([LessonId::new("pk-1")].into_iter().collect()),
            ..ProgressUpdate::default()
        }
        .apply_to(&mut record);

        assert_eq!(record.history().len(), 1);
        assert!(record.is_lesson_completed(&LessonId::new("pk-1")));
    }

    #[test]
    fn update_merges_solved_ids() {
        let mut record = ProgressRecord::default();
        record.mark_solved(QuestionId::new("a"));

        ProgressUpdate {
            solved_question_ids: Some(BTreeSet::new()),
            ..ProgressUpdate::default()
        }
        .apply_to(&mut record);
        assert!(record.is_solved(&QuestionId::new("a")));

        ProgressUpdate {
            solved_question_ids: Some(["b"].map(QuestionId::new).into_iter().collect()),
            ..ProgressUpdate::default()
        }
        .apply_to(&mut record);
        assert_eq!(record.solved_question_ids().len(), 2);
    }
}
