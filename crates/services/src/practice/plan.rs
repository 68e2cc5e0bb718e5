use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::BTreeSet;

use exam_core::model::{Question, QuestionId, Subject};

use crate::error::PracticeError;

/// Questions per session when the pool is large enough.
pub const SESSION_SIZE: usize = 20;
/// Sessions are refused below this many questions.
pub const MIN_SESSION_SIZE: usize = 10;

/// Selection result for a practice session.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticePlan {
    pub subject: Subject,
    pub questions: Vec<Question>,
    pub unsolved_selected: usize,
    pub solved_selected: usize,
}

impl PracticePlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }
}

/// Picks the questions for one session, preferring ones the student has not seen.
pub struct PracticeSelector<'a> {
    subject: Subject,
    solved: &'a BTreeSet<QuestionId>,
}

impl<'a> PracticeSelector<'a> {
    #[must_use]
    pub fn new(subject: Subject, solved: &'a BTreeSet<QuestionId>) -> Self {
        Self { subject, solved }
    }

    /// Build a plan from the full question pool.
    ///
    /// - Pools of [`SESSION_SIZE`] or more always yield exactly that many
    ///   questions: unsolved first, topped up with random solved ones.
    /// - Smaller pools are used whole.
    /// - The final order is shuffled.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::InsufficientQuestions` when fewer than
    /// [`MIN_SESSION_SIZE`] questions exist for the subject.
    pub fn build<R: Rng + ?Sized>(
        self,
        pool: &[Question],
        rng: &mut R,
    ) -> Result<PracticePlan, PracticeError> {
        let (unsolved, solved): (Vec<&Question>, Vec<&Question>) = pool
            .iter()
            .filter(|q| q.subject() == self.subject)
            .partition(|q| !self.solved.contains(q.id()));
        let available = unsolved.len() + solved.len();

        if available < MIN_SESSION_SIZE {
            return Err(PracticeError::InsufficientQuestions {
                subject: self.subject,
                available,
            });
        }

        let mut picked: Vec<&Question>;
        let unsolved_selected;
        let solved_selected;
        if available < SESSION_SIZE {
            unsolved_selected = unsolved.len();
            solved_selected = solved.len();
            picked = unsolved;
            picked.extend(solved);
        } else if unsolved.len() >= SESSION_SIZE {
            picked = unsolved.choose_multiple(rng, SESSION_SIZE).copied().collect();
            unsolved_selected = SESSION_SIZE;
            solved_selected = 0;
        } else {
            let filler = SESSION_SIZE - unsolved.len();
            unsolved_selected = unsolved.len();
            solved_selected = filler;
            picked = unsolved;
            picked.extend(solved.choose_multiple(rng, filler).copied());
        }

        picked.shuffle(rng);

        Ok(PracticePlan {
            subject: self.subject,
            questions: picked.into_iter().cloned().collect(),
            unsolved_selected,
            solved_selected,
        })
    }
}
