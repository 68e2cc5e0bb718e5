mod common;

use std::sync::Arc;
use std::time::Duration;

use exam_core::model::{QuestionDraft, Subject};
use exam_core::time::fixed_clock;
use services::{AppServices, BankConfig, TutorError};
use storage::repository::Storage;

use common::{ScriptedTutor, draft};

#[tokio::test(start_paused = true)]
async fn downloaded_questions_become_practicable() {
    let storage = Storage::in_memory();
    let batch = |texts: &[&str]| -> Result<Vec<QuestionDraft>, TutorError> {
        Ok(texts.iter().map(|text| draft(text, 0)).collect())
    };
    let tutor = ScriptedTutor::with_batches(vec![
        batch(&[
            "What is the main idea of the passage about coral reefs?",
            "Which word best replaces 'abundant' in paragraph two?",
            "The author mentions volcanoes primarily to illustrate",
            "According to the text, why did the farmers migrate north?",
            "Choose the sentence that contains a grammatical error.",
        ]),
        batch(&[
            "What can be inferred from the final line of the poem?",
            "The tone of the letter can best be described as",
            "How does the second speaker respond to the proposal?",
            "Identify the synonym of 'reluctant' used in context.",
            "Which title suits the article on urban gardening?",
        ]),
    ]);
    let services = AppServices::assemble(storage, fixed_clock(), Arc::new(tutor))
        .await
        .unwrap();

    let before = services.bank_stats().await.unwrap();
    let report = services
        .question_bank()
        .download_subject(Subject::LiterasiInggris, false)
        .await
        .unwrap();
    assert_eq!(report.added, 10);
    assert_eq!(report.failed_batches, 0);

    let after = services.bank_stats().await.unwrap();
    assert_eq!(after.questions, before.questions + 10);
    assert_eq!(
        after.questions_by_subject.get(&Subject::LiterasiInggris).copied(),
        Some(before.questions_by_subject.get(&Subject::LiterasiInggris).copied().unwrap_or(0) + 10)
    );

    let session = services
        .practice()
        .start_practice(Subject::LiterasiInggris, Default::default())
        .await
        .unwrap();
    assert_eq!(session.total(), 10);

    let restored = services.question_bank().reset_questions().await.unwrap();
    assert_eq!(restored, before.questions);
}

#[tokio::test(start_paused = true)]
async fn batches_are_spaced_by_configured_delay() {
    let tutor = ScriptedTutor::with_batches(vec![
        Err(TutorError::QuotaExceeded),
        Ok(vec![draft("Sebuah kereta melaju 80 km per jam selama dua jam", 1)]),
        Ok(vec![draft("Harga sebuah buku naik sepuluh persen dari semula", 2)]),
    ]);
    let storage = Storage::in_memory();
    let services = AppServices::assemble(storage, fixed_clock(), Arc::new(tutor))
        .await
        .unwrap();
    let bank = services.question_bank();
    let bank = (*bank).clone().with_config(BankConfig {
        batches: 3,
        batch_delay: Duration::from_secs(2),
        ..BankConfig::default()
    });

    let started = tokio::time::Instant::now();
    let report = bank
        .download_subject(Subject::PenalaranMatematika, true)
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    assert_eq!(report.requested_batches, 3);
    assert_eq!(report.failed_batches, 1);
    assert!(report.quota_exceeded);
    assert_eq!(report.added, 2);
}

#[tokio::test]
async fn tutor_failures_surface_as_fallback_text() {
    let services = AppServices::in_memory(fixed_clock(), Arc::new(ScriptedTutor::default()))
        .await
        .unwrap();
    let tutor = services.tutor();

    let analysis = tutor
        .topic_explanation("Ide pokok", Subject::LiterasiIndonesia)
        .await;
    assert_eq!(analysis.complex, "Gagal memuat analisis.");

    let reply = tutor
        .chat(&[exam_core::model::ChatMessage::user("Halo")], None)
        .await;
    assert_eq!(reply, "echo: 1");
}
