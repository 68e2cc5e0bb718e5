use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use exam_core::model::{Question, QuestionDraft, QuestionId, Subject};
use exam_core::similarity::{DEFAULT_SIMILARITY_THRESHOLD, is_near_duplicate};
use storage::repository::QuestionRepository;
use tracing::{debug, info, warn};

use crate::Clock;
use crate::ai::{MAX_QUESTIONS_PER_REQUEST, Tutor};
use crate::error::{BankError, TutorError};

/// Tuning for question downloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankConfig {
    /// Word-overlap score at or above which a new question counts as a duplicate.
    pub similarity_threshold: f64,
    pub batch_size: usize,
    pub batches: usize,
    pub batch_delay: Duration,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            batch_size: MAX_QUESTIONS_PER_REQUEST,
            batches: 2,
            batch_delay: Duration::from_millis(1500),
        }
    }
}

/// Outcome of downloading questions for one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub subject: Option<Subject>,
    pub requested_batches: usize,
    pub failed_batches: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub added: usize,
    /// At least one batch failed because the quota ran out.
    pub quota_exceeded: bool,
}

impl DownloadReport {
    fn record_failure(&mut self, err: &TutorError) {
        self.failed_batches += 1;
        if matches!(err, TutorError::QuotaExceeded) {
            self.quota_exceeded = true;
        }
    }
}

/// Outcome of a sync across every subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub subjects: Vec<DownloadReport>,
}

impl SyncReport {
    #[must_use]
    pub fn total_added(&self) -> usize {
        self.subjects.iter().map(|r| r.added).sum()
    }

    #[must_use]
    pub fn failed_batches(&self) -> usize {
        self.subjects.iter().map(|r| r.failed_batches).sum()
    }

    #[must_use]
    pub fn quota_exceeded(&self) -> bool {
        self.subjects.iter().any(|r| r.quota_exceeded)
    }
}

/// Grows the question pool with tutor-generated questions.
#[derive(Clone)]
pub struct QuestionBankService {
    clock: Clock,
    tutor: Arc<dyn Tutor>,
    questions: Arc<dyn QuestionRepository>,
    config: BankConfig,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tutor: Arc<dyn Tutor>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            tutor,
            questions,
            config: BankConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: BankConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Fetch, validate, deduplicate and store new questions for `subject`.
    ///
    /// Failed batches are counted in the report, not returned as errors.
    ///
    /// # Errors
    ///
    /// Returns `BankError::MissingApiKey` when no key is configured and
    /// `BankError::Storage` if the pool cannot be read or written.
    pub async fn download_subject(
        &self,
        subject: Subject,
        hots: bool,
    ) -> Result<DownloadReport, BankError> {
        if !self.tutor.is_configured().await {
            return Err(BankError::MissingApiKey);
        }

        let mut known: Vec<String> = self
            .questions
            .load_questions()
            .await?
            .into_iter()
            .filter(|q| q.subject() == subject)
            .map(|q| q.text().to_string())
            .collect();

        let mut report = DownloadReport {
            subject: Some(subject),
            requested_batches: self.config.batches,
            ..DownloadReport::default()
        };

        for batch in 0..self.config.batches {
            if batch > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let drafts = match self
                .tutor
                .generate_questions(subject, self.config.batch_size, hots)
                .await
            {
                Ok(drafts) => drafts,
                Err(TutorError::MissingApiKey) => return Err(BankError::MissingApiKey),
                Err(err) => {
                    warn!(subject = %subject, batch, error = %err, "question batch failed");
                    report.record_failure(&err);
                    continue;
                }
            };

            let accepted = self.accept_batch(subject, drafts, &mut known, &mut report);
            if accepted.is_empty() {
                continue;
            }
            report.added += self.questions.add_questions(accepted).await?;
        }

        info!(
            subject = %subject,
            added = report.added,
            failed = report.failed_batches,
            rejected = report.rejected,
            duplicates = report.duplicates,
            "question download finished"
        );
        Ok(report)
    }

    /// Download for every subject in turn, carrying on past failures.
    ///
    /// # Errors
    ///
    /// Returns `BankError::MissingApiKey` when no key is configured. Storage
    /// failures for one subject are logged and counted as failed batches.
    pub async fn bulk_sync(&self, hots: bool) -> Result<SyncReport, BankError> {
        if !self.tutor.is_configured().await {
            return Err(BankError::MissingApiKey);
        }

        let mut sync = SyncReport::default();
        for subject in Subject::ALL {
            match self.download_subject(subject, hots).await {
                Ok(report) => sync.subjects.push(report),
                Err(BankError::MissingApiKey) => return Err(BankError::MissingApiKey),
                Err(err) => {
                    warn!(subject = %subject, error = %err, "subject sync failed");
                    sync.subjects.push(DownloadReport {
                        subject: Some(subject),
                        requested_batches: self.config.batches,
                        failed_batches: self.config.batches,
                        ..DownloadReport::default()
                    });
                }
            }
        }
        info!(
            added = sync.total_added(),
            failed = sync.failed_batches(),
            "bulk sync finished"
        );
        Ok(sync)
    }

    /// Drop downloaded questions and restore the bundled bank; returns its size.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Storage` if the bank cannot be written.
    pub async fn reset_questions(&self) -> Result<usize, BankError> {
        Ok(self.questions.reset_questions().await?)
    }

    fn accept_batch(
        &self,
        subject: Subject,
        drafts: Vec<QuestionDraft>,
        known: &mut Vec<String>,
        report: &mut DownloadReport,
    ) -> Vec<Question> {
        let mut rng = rand::rng();
        let mut accepted = Vec::new();
        for draft in drafts {
            let validated = match draft.validate() {
                Ok(validated) => validated,
                Err(err) => {
                    debug!(error = %err, "rejected generated question");
                    report.rejected += 1;
                    continue;
                }
            };
            if known
                .iter()
                .any(|text| is_near_duplicate(text, validated.text(), self.config.similarity_threshold))
            {
                report.duplicates += 1;
                continue;
            }
            known.push(validated.text().to_string());
            let id = mint_question_id(&self.clock, &mut rng);
            accepted.push(validated.assign(id, subject));
        }
        accepted
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Id for a generated question: `dyn-<unix millis>-<9 random base-36 chars>`.
pub fn mint_question_id<R: Rng + ?Sized>(clock: &Clock, rng: &mut R) -> QuestionId {
    let suffix: String = (0..9)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    QuestionId::new(format!("dyn-{}-{suffix}", clock.timestamp_millis()))
}
