use std::sync::Arc;

use exam_core::model::{Lesson, LessonId, Subject};
use storage::repository::{LessonRepository, StorageError};

use crate::error::ProgressError;
use crate::progress_service::ProgressService;

/// A lesson paired with whether the learner has ticked it off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonEntry {
    pub lesson: Lesson,
    pub completed: bool,
}

#[derive(Clone)]
pub struct LessonService {
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<ProgressService>,
}

impl LessonService {
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonRepository>, progress: Arc<ProgressService>) -> Self {
        Self { lessons, progress }
    }

    /// Every lesson in bank order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    pub async fn all_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        self.lessons.load_lessons().await
    }

    /// Lessons for one subject with their completion flags.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the bank cannot be read or progress is unavailable.
    pub async fn lessons_for(&self, subject: Subject) -> Result<Vec<LessonEntry>, ProgressError> {
        let lessons = self.lessons.load_lessons().await?;
        let progress = self.progress.get_progress()?;
        Ok(Lesson::for_subject(&lessons, subject)
            .map(|lesson| LessonEntry {
                completed: progress.is_lesson_completed(&lesson.id),
                lesson: lesson.clone(),
            })
            .collect())
    }

    /// Flip a lesson's completed flag; returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if progress cannot be updated.
    pub async fn toggle_completed(&self, id: LessonId) -> Result<bool, ProgressError> {
        self.progress.toggle_lesson(id).await
    }

    /// Merge new lessons into the bank, skipping titles already present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be written.
    pub async fn add_lessons(&self, lessons: Vec<Lesson>) -> Result<usize, StorageError> {
        self.lessons.add_lessons(lessons).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;
    use storage::repository::Storage;

    async fn service() -> LessonService {
        let storage = Storage::in_memory();
        let progress = ProgressService::load(fixed_clock(), storage.progress.clone())
            .await
            .unwrap();
        LessonService::new(storage.lessons.clone(), Arc::new(progress))
    }

    #[tokio::test]
    async fn toggling_marks_lesson_completed() {
        let service = service().await;
        let entries = service.lessons_for(Subject::PenalaranUmum).await.unwrap();
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| e.lesson.subject == Subject::PenalaranUmum));
        assert!(entries.iter().all(|e| !e.completed));

        let id = entries[0].lesson.id.clone();
        assert!(service.toggle_completed(id.clone()).await.unwrap());

        let entries = service.lessons_for(Subject::PenalaranUmum).await.unwrap();
        assert!(entries.iter().find(|e| e.lesson.id == id).unwrap().completed);

        assert!(!service.toggle_completed(id).await.unwrap());
    }
}
