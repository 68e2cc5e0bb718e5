//! Per-subject score aggregation for the progress dashboard.

use crate::model::{ProgressRecord, Subject};

/// Averages above this are highlighted as on target.
pub const TARGET_SCORE: u32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectStats {
    pub subject: Subject,
    /// Rounded mean of all session scores, 0 when never practiced.
    pub average: u32,
    pub sessions: usize,
}

impl SubjectStats {
    #[must_use]
    pub fn is_on_target(&self) -> bool {
        self.average > TARGET_SCORE
    }
}

/// Snapshot of every subject's performance, in canonical subject order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceReport {
    subjects: Vec<SubjectStats>,
}

impl PerformanceReport {
    #[must_use]
    pub fn from_progress(progress: &ProgressRecord) -> Self {
        let subjects = Subject::ALL
            .into_iter()
            .map(|subject| {
                let scores = progress.scores_for(subject);
                SubjectStats {
                    subject,
                    average: rounded_mean(scores),
                    sessions: scores.len(),
                }
            })
            .collect();
        Self { subjects }
    }

    #[must_use]
    pub fn subjects(&self) -> &[SubjectStats] {
        &self.subjects
    }

    #[must_use]
    pub fn get(&self, subject: Subject) -> Option<&SubjectStats> {
        self.subjects.iter().find(|stats| stats.subject == subject)
    }

    /// Lowest average; ties resolve to the earliest subject.
    #[must_use]
    pub fn weakest(&self) -> Option<&SubjectStats> {
        self.subjects
            .iter()
            .reduce(|best, next| if next.average < best.average { next } else { best })
    }

    /// Highest average; ties resolve to the earliest subject.
    #[must_use]
    pub fn strongest(&self) -> Option<&SubjectStats> {
        self.subjects
            .iter()
            .reduce(|best, next| if next.average > best.average { next } else { best })
    }

    /// Mean of the per-subject averages over subjects practiced at least once.
    #[must_use]
    pub fn overall_average(&self) -> u32 {
        let practiced: Vec<u32> = self
            .subjects
            .iter()
            .filter(|stats| stats.sessions > 0)
            .map(|stats| stats.average)
            .collect();
        rounded_mean(&practiced)
    }
}

fn rounded_mean(scores: &[u32]) -> u32 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u64 = scores.iter().map(|s| u64::from(*s)).sum();
    let len = scores.len() as u64;
    u32::try_from((sum * 2 + len) / (len * 2)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_clock;

    fn progress_with(scores: &[(Subject, u32)]) -> ProgressRecord {
        let mut record = ProgressRecord::default();
        let today = fixed_clock().today();
        for (subject, score) in scores {
            record.record_score(today, *subject, *score);
        }
        record
    }

    #[test]
    fn averages_round_and_default_to_zero() {
        let record = progress_with(&[
            (Subject::PenalaranUmum, 500),
            (Subject::PenalaranUmum, 751),
        ]);
        let report = PerformanceReport::from_progress(&record);

        let pu = report.get(Subject::PenalaranUmum).unwrap();
        assert_eq!(pu.average, 626);
        assert_eq!(pu.sessions, 2);
        assert_eq!(report.get(Subject::LiterasiInggris).unwrap().average, 0);
    }

    #[test]
    fn weakest_and_strongest() {
        let record = progress_with(&[
            (Subject::PenalaranUmum, 900),
            (Subject::PengetahuanKuantitatif, 300),
            (Subject::LiterasiIndonesia, 650),
            (Subject::LiterasiInggris, 400),
            (Subject::PenalaranMatematika, 800),
            (Subject::PengetahuanPemahamanUmum, 720),
            (Subject::PemahamanBacaanMenulis, 550),
        ]);
        let report = PerformanceReport::from_progress(&record);

        assert_eq!(report.weakest().unwrap().subject, Subject::PengetahuanKuantitatif);
        assert_eq!(report.strongest().unwrap().subject, Subject::PenalaranUmum);
        assert!(report.get(Subject::PengetahuanPemahamanUmum).unwrap().is_on_target());
        assert!(!report.get(Subject::LiterasiIndonesia).unwrap().is_on_target());
    }

    #[test]
    fn ties_prefer_canonical_order() {
        let report = PerformanceReport::from_progress(&ProgressRecord::default());
        assert_eq!(report.weakest().unwrap().subject, Subject::PenalaranUmum);
        assert_eq!(report.strongest().unwrap().subject, Subject::PenalaranUmum);
        assert_eq!(report.overall_average(), 0);
    }
}
