use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use exam_core::model::{
    AiAnalysis, AnalysisExample, ChatMessage, ExplanationMode, Question, QuestionId, Subject,
};
use tracing::warn;

use crate::ai::{Tutor, prompts};

/// Student-facing tutor calls. Never fails: errors turn into text the UI can
/// show as-is, and successful analyses are cached for the app's lifetime.
#[derive(Clone)]
pub struct TutorService {
    tutor: Arc<dyn Tutor>,
    analysis_cache: Arc<Mutex<HashMap<QuestionId, AiAnalysis>>>,
    topic_cache: Arc<Mutex<HashMap<String, AiAnalysis>>>,
}

impl TutorService {
    #[must_use]
    pub fn new(tutor: Arc<dyn Tutor>) -> Self {
        Self {
            tutor,
            analysis_cache: Arc::new(Mutex::new(HashMap::new())),
            topic_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.tutor.is_configured().await
    }

    /// Reply to the last message of `history`.
    pub async fn chat(&self, history: &[ChatMessage], context: Option<&str>) -> String {
        match self.tutor.chat(history, context).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "tutor chat failed");
                err.user_message().to_string()
            }
        }
    }

    /// Open a discussion about `question`: the canned opening request and the
    /// tutor's first reply.
    pub async fn start_walkthrough(&self, question: &Question) -> Vec<ChatMessage> {
        let opening = ChatMessage::user(prompts::WALKTHROUGH_OPENING);
        let context = prompts::walkthrough_context(question);
        let reply = self.chat(std::slice::from_ref(&opening), Some(&context)).await;
        vec![opening, ChatMessage::model(reply)]
    }

    /// Answer a follow-up in an ongoing discussion about `question`.
    pub async fn discuss_question(&self, question: &Question, history: &[ChatMessage]) -> String {
        let context = prompts::followup_context(question);
        self.chat(history, Some(&context)).await
    }

    /// Four-way explanation of a question, cached by question id.
    pub async fn deep_analysis(&self, question: &Question) -> AiAnalysis {
        if let Some(hit) = cache_get(&self.analysis_cache, question.id()) {
            return hit;
        }
        match self.tutor.deep_analysis(question).await {
            Ok(analysis) => {
                cache_put(&self.analysis_cache, question.id().clone(), analysis.clone());
                analysis
            }
            Err(err) => {
                warn!(error = %err, question = %question.id(), "deep analysis failed");
                fallback_question_analysis()
            }
        }
    }

    /// One explanation style of the question's analysis, fetching it on first use.
    pub async fn explain(&self, question: &Question, mode: ExplanationMode) -> String {
        self.deep_analysis(question)
            .await
            .text_for(mode)
            .to_string()
    }

    /// Explanation of a lesson topic with a worked example, cached per subject and topic.
    pub async fn topic_explanation(&self, topic: &str, subject: Subject) -> AiAnalysis {
        let key = format!("{}-{topic}", subject.name());
        if let Some(hit) = cache_get(&self.topic_cache, &key) {
            return hit;
        }
        match self.tutor.topic_explanation(topic, subject).await {
            Ok(analysis) => {
                cache_put(&self.topic_cache, key, analysis.clone());
                analysis
            }
            Err(err) => {
                warn!(error = %err, topic, "topic explanation failed");
                fallback_topic_explanation()
            }
        }
    }

    #[must_use]
    pub fn cached_analysis(&self, id: &QuestionId) -> Option<AiAnalysis> {
        cache_get(&self.analysis_cache, id)
    }
}

fn cache_get<K, Q>(cache: &Mutex<HashMap<K, AiAnalysis>>, key: &Q) -> Option<AiAnalysis>
where
    K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
    Q: std::hash::Hash + Eq + ?Sized,
{
    cache.lock().ok()?.get(key).cloned()
}

fn cache_put<K: std::hash::Hash + Eq>(cache: &Mutex<HashMap<K, AiAnalysis>>, key: K, value: AiAnalysis) {
    if let Ok(mut guard) = cache.lock() {
        guard.insert(key, value);
    }
}

#[must_use]
pub fn fallback_question_analysis() -> AiAnalysis {
    AiAnalysis {
        quick: "Coba refresh halaman.".into(),
        simple: "Terjadi kesalahan.".into(),
        complex: "Gagal generate analisis. Silakan coba lagi.".into(),
        interactive: "Diskusikan dengan teman.".into(),
        example: None,
    }
}

#[must_use]
pub fn fallback_topic_explanation() -> AiAnalysis {
    AiAnalysis {
        quick: "Coba lagi.".into(),
        simple: "Cek koneksi.".into(),
        complex: "Gagal memuat analisis.".into(),
        interactive: "Cek Settings.".into(),
        example: Some(AnalysisExample {
            question: "-".into(),
            answer: "-".into(),
            step_by_step: "-".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TutorError;
    use async_trait::async_trait;
    use exam_core::model::{ChatRole, QuestionDraft};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTutor {
        calls: AtomicUsize,
        fail_with_quota: bool,
    }

    fn analysis(tag: &str) -> AiAnalysis {
        AiAnalysis {
            quick: format!("{tag} quick"),
            simple: format!("{tag} simple"),
            complex: format!("{tag} complex"),
            interactive: format!("{tag} interactive"),
            example: None,
        }
    }

    #[async_trait]
    impl Tutor for CountingTutor {
        async fn generate_questions(
            &self,
            _subject: Subject,
            _count: usize,
            _hots: bool,
        ) -> Result<Vec<QuestionDraft>, TutorError> {
            Ok(Vec::new())
        }

        async fn chat(
            &self,
            history: &[ChatMessage],
            context: Option<&str>,
        ) -> Result<String, TutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_quota {
                return Err(TutorError::QuotaExceeded);
            }
            let last = history.last().map(|m| m.text.as_str()).unwrap_or_default();
            Ok(format!("re: {last} [{}]", context.is_some()))
        }

        async fn deep_analysis(&self, question: &Question) -> Result<AiAnalysis, TutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_quota {
                return Err(TutorError::QuotaExceeded);
            }
            Ok(analysis(question.id().as_str()))
        }

        async fn topic_explanation(
            &self,
            topic: &str,
            _subject: Subject,
        ) -> Result<AiAnalysis, TutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_quota {
                return Err(TutorError::QuotaExceeded);
            }
            Ok(analysis(topic))
        }

        async fn is_configured(&self) -> bool {
            true
        }
    }

    fn question() -> Question {
        QuestionDraft {
            text: "Jika semua A adalah B...".into(),
            options: ["1", "2", "3", "4", "5"].map(String::from).to_vec(),
            correct_answer: 0,
            explanation: "Gunakan diagram Venn untuk melihat hubungan.".into(),
            quick_trick: None,
            context: None,
        }
        .validate()
        .unwrap()
        .assign(QuestionId::new("pu-1"), Subject::PenalaranUmum)
    }

    #[tokio::test]
    async fn analysis_is_cached_per_question() {
        let tutor = Arc::new(CountingTutor::default());
        let service = TutorService::new(tutor.clone());

        let first = service.deep_analysis(&question()).await;
        let second = service.deep_analysis(&question()).await;

        assert_eq!(first, second);
        assert_eq!(first.quick, "pu-1 quick");
        assert_eq!(tutor.calls.load(Ordering::SeqCst), 1);
        assert!(service.cached_analysis(&QuestionId::new("pu-1")).is_some());
    }

    #[tokio::test]
    async fn failures_fall_back_and_are_not_cached() {
        let tutor = Arc::new(CountingTutor {
            fail_with_quota: true,
            ..CountingTutor::default()
        });
        let service = TutorService::new(tutor.clone());

        let analysis = service.deep_analysis(&question()).await;
        assert_eq!(analysis, fallback_question_analysis());
        service.deep_analysis(&question()).await;
        assert_eq!(tutor.calls.load(Ordering::SeqCst), 2);

        let topic = service
            .topic_explanation("Silogisme", Subject::PenalaranUmum)
            .await;
        assert_eq!(topic.complex, "Gagal memuat analisis.");
        assert_eq!(topic.example.unwrap().step_by_step, "-");

        let reply = service.chat(&[ChatMessage::user("halo")], None).await;
        assert_eq!(reply, "⚠️ Kuota Habis.");
    }

    #[tokio::test]
    async fn topic_cache_is_keyed_by_subject_and_topic() {
        let tutor = Arc::new(CountingTutor::default());
        let service = TutorService::new(tutor.clone());

        service.topic_explanation("Logika", Subject::PenalaranUmum).await;
        service.topic_explanation("Logika", Subject::PenalaranUmum).await;
        service
            .topic_explanation("Logika", Subject::PenalaranMatematika)
            .await;

        assert_eq!(tutor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn walkthrough_opens_with_canned_request() {
        let service = TutorService::new(Arc::new(CountingTutor::default()));
        let messages = service.start_walkthrough(&question()).await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[0].text, prompts::WALKTHROUGH_OPENING);
        assert_eq!(messages[1].role, ChatRole::Model);
        assert!(messages[1].text.ends_with("[true]"));
    }

    #[tokio::test]
    async fn explain_switches_style_without_refetching() {
        let tutor = Arc::new(CountingTutor::default());
        let service = TutorService::new(tutor.clone());

        let quick = service.explain(&question(), ExplanationMode::default()).await;
        let complex = service.explain(&question(), ExplanationMode::Complex).await;
        let interactive = service
            .explain(&question(), ExplanationMode::Interactive)
            .await;

        assert_eq!(quick, "pu-1 quick");
        assert_eq!(complex, "pu-1 complex");
        assert_eq!(interactive, "pu-1 interactive");
        assert_eq!(tutor.calls.load(Ordering::SeqCst), 1);
    }
}
