use chrono::NaiveDate;

use exam_core::model::{ProgressRecord, Subject};

use super::session::SessionResult;

/// What a finished session left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub subject: Subject,
    pub date: NaiveDate,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub newly_solved: usize,
    /// `false` when the progress write failed; the score still stands for this run.
    pub persisted: bool,
}

/// Fold a session result into the progress record.
///
/// Appends the score and history entry and marks every presented question
/// solved. Returns how many ids were new to the solved set.
pub fn record_result(progress: &mut ProgressRecord, result: &SessionResult, date: NaiveDate) -> usize {
    progress.record_score(date, result.subject, result.score);
    progress.mark_all_solved(result.seen_question_ids.iter().cloned())
}
