mod common;

use std::sync::Arc;

use exam_core::model::Subject;
use exam_core::time::fixed_clock;
use services::practice::{PracticeStep, SessionPhase, TimerMode};
use services::{AppServices, PracticeError};
use storage::repository::Storage;

use common::{ScriptedTutor, question};

const SUBJECT: Subject = Subject::LiterasiIndonesia;

async fn services_with_pool(count: usize) -> (AppServices, Storage) {
    let storage = Storage::in_memory();
    let pool: Vec<_> = (0..count)
        .map(|i| {
            question(
                &format!("lbi-{i}"),
                SUBJECT,
                &format!("Bacaan nomor {i}: gagasan utama paragraf adalah"),
                (i % 5) as i64,
            )
        })
        .collect();
    storage.questions.save_questions(&pool).await.unwrap();

    let services = AppServices::assemble(
        storage.clone(),
        fixed_clock(),
        Arc::new(ScriptedTutor::default()),
    )
    .await
    .unwrap();
    (services, storage)
}

#[tokio::test]
async fn small_pool_session_scores_and_records_history() {
    let (services, storage) = services_with_pool(12).await;
    let practice = services.practice();

    let mut session = practice
        .start_practice(SUBJECT, TimerMode::Untimed)
        .await
        .unwrap();
    assert_eq!(session.total(), 12);
    assert_eq!(session.phase(), SessionPhase::InProgress);

    let mut outcome = None;
    for i in 0..12 {
        let q = session.current_question().unwrap();
        let pick = if i < 9 {
            q.correct_answer()
        } else {
            (q.correct_answer() + 1) % 5
        };
        session.submit_answer(pick).unwrap();
        // answering twice must not change the tally
        session.submit_answer(pick).unwrap();

        match practice.advance(&mut session).await.unwrap() {
            PracticeStep::Next(token) => assert!(session.accepts(token)),
            PracticeStep::Finished(done) => outcome = Some(done),
        }
    }

    let outcome = outcome.expect("last advance finishes the session");
    assert_eq!(outcome.correct, 9);
    assert_eq!(outcome.total, 12);
    assert_eq!(outcome.score, 750);
    assert!(outcome.persisted);

    let progress = services.progress().get_progress().unwrap();
    assert_eq!(progress.scores_for(SUBJECT), &[750]);
    let last = progress.history().last().unwrap();
    assert_eq!((last.subject, last.score), (SUBJECT, 750));
    assert_eq!(last.date, fixed_clock().today());
    assert_eq!(progress.solved_question_ids().len(), 12);

    let stored = storage.progress.load_progress().await.unwrap();
    assert_eq!(stored, progress);
}

#[tokio::test]
async fn tiny_pool_is_rejected() {
    let (services, _) = services_with_pool(9).await;
    let err = services
        .practice()
        .start_practice(SUBJECT, TimerMode::Untimed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PracticeError::InsufficientQuestions { available: 9, .. }
    ));
}

#[tokio::test]
async fn timer_expiry_records_partial_session() {
    let (services, _) = services_with_pool(10).await;
    let practice = services.practice();
    let mut session = practice
        .start_practice(SUBJECT, TimerMode::Timed)
        .await
        .unwrap();
    assert_eq!(session.remaining_seconds(), Some(600));

    let first = session.current_question().unwrap().correct_answer();
    session.submit_answer(first).unwrap();

    let mut outcome = None;
    for _ in 0..600 {
        if let Some(done) = practice.tick(&mut session).await.unwrap() {
            outcome = Some(done);
            break;
        }
    }

    let outcome = outcome.expect("timer runs out");
    assert_eq!(session.phase(), SessionPhase::Finished);
    assert_eq!((outcome.correct, outcome.total, outcome.score), (1, 10, 100));
    assert!(practice.finish(&mut session).await.unwrap().is_none());

    // only the question on screen when time ran out was presented
    let progress = services.progress().get_progress().unwrap();
    assert_eq!(progress.solved_question_ids().len(), 1);
    assert_eq!(progress.history().len(), 1);
}

#[tokio::test]
async fn clearing_data_resets_progress() {
    let (services, _) = services_with_pool(10).await;
    let practice = services.practice();
    let mut session = practice
        .start_practice(SUBJECT, TimerMode::Untimed)
        .await
        .unwrap();
    practice.finish(&mut session).await.unwrap();
    assert_eq!(services.progress().get_progress().unwrap().history().len(), 1);

    services.clear_all_data().await.unwrap();

    let progress = services.progress().get_progress().unwrap();
    assert!(progress.history().is_empty());
    assert!(progress.solved_question_ids().is_empty());
}
