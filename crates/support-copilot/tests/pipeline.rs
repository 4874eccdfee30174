//! End-to-end drafting flow against the in-memory index

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use support_copilot::providers::{
    CompletionRequest, EmbeddingProvider, InMemoryVectorIndex, LlmProvider, RecordingSleeper,
};
use support_copilot::{
    CopilotConfig, CopilotPipeline, DraftRequest, Error, PipelineDeps, Result, Tone,
};

const KNOWLEDGE_BASE: &str = "[Login Issues]
If you cannot log in, reset your password from the sign-in page. Reset emails arrive within five minutes.

[Billing]
Refunds are processed within 5 business days. Contact billing for invoices.

[Shipping]
Orders ship within 24 hours. Tracking numbers are emailed on dispatch.
";

const TOPICS: [&[&str]; 3] = [
    &["password", "login", "log", "reset", "sign"],
    &["refund", "refunds", "billing", "invoice", "invoices", "charged"],
    &["order", "orders", "ship", "shipping", "delivery", "tracking", "package"],
];

/// Keyword-topic embeddings: one dimension per topic plus a small bias
struct TopicEmbedder;

#[async_trait]
impl EmbeddingProvider for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::invalid("Text cannot be empty"));
        }
        let mut vector = vec![0.0; TOPICS.len() + 1];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
        {
            for (dim, keywords) in TOPICS.iter().enumerate() {
                if keywords.contains(&word.as_str()) {
                    vector[dim] += 1.0;
                }
            }
        }
        vector[TOPICS.len()] = 0.1;
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        TOPICS.len() + 1
    }


    fn name(&self) -> &'static str {
        "topic"
    }
}

/// Answers tone prompts with a label and drafting prompts with a canned reply
struct CannedLlm {
    rate_limited: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl CannedLlm {
    fn new(rate_limited: bool) -> Self {
        Self {
            rate_limited,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        if self.rate_limited {
            return Err(Error::RateLimited("Too Many Requests".to_string()));
        }
        if request.system.contains("emotional tone") {
            Ok("Frustrated".to_string())
        } else {
            Ok("Thank you for your patience. You can reset your password from the sign-in page.".to_string())
        }
    }


    fn name(&self) -> &'static str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-model"
    }
}

struct Harness {
    pipeline: CopilotPipeline,
    index: Arc<InMemoryVectorIndex>,
    llm: Arc<CannedLlm>,
    sleeper: Arc<RecordingSleeper>,
    _dir: tempfile::TempDir,
    kb_path: std::path::PathBuf,
}

fn harness(rate_limited: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let kb_path = dir.path().join("sample_docs.txt");
    std::fs::write(&kb_path, KNOWLEDGE_BASE).unwrap();

    let index = Arc::new(InMemoryVectorIndex::new(TOPICS.len() + 1));
    let llm = Arc::new(CannedLlm::new(rate_limited));
    let sleeper = Arc::new(RecordingSleeper::new());

    let deps = PipelineDeps {
        embedder: Arc::new(TopicEmbedder),
        llm: llm.clone(),
        index: index.clone(),
        sleeper: sleeper.clone(),
    };
    let pipeline = CopilotPipeline::new(&CopilotConfig::default(), deps);

    Harness {
        pipeline,
        index,
        llm,
        sleeper,
        _dir: dir,
        kb_path,
    }
}

#[tokio::test]
async fn index_search_and_draft() {
    let h = harness(false);

    let report = h.pipeline.index_documents(&h.kb_path).await.unwrap();
    assert_eq!(report.chunks, 3);
    assert_eq!(report.stored, 3);
    assert_eq!(report.source, "sample_docs.txt");
    assert_eq!(h.index.len(), 3);

    let matches = h
        .pipeline
        .search("I forgot my password and cannot log in", 3)
        .await
        .value_or_default();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].text.starts_with("[Login Issues]"));
    assert!(matches[0].score > 0.5);

    let draft = h
        .pipeline
        .draft(&DraftRequest::new("I can't log in, I need a password reset!").with_tone("reassuring"))
        .await
        .unwrap();

    assert_eq!(draft.detected_tone, Tone::Frustrated);
    assert_eq!(draft.response_tone, "reassuring");
    assert!(draft.degraded.is_empty());
    assert!(!draft.result.is_fallback());
    assert_eq!(draft.result.model_used, "gpt-4");
    assert_eq!(draft.result.context_used, 1);
    assert_eq!(draft.result.sources.len(), 1);
    assert!(draft.result.sources[0].starts_with("Knowledge base chunk 0 (score: "));

    let requests = h.llm.requests.lock();
    let generation = requests.last().unwrap();
    assert!(generation.user.contains("[Login Issues] If you cannot log in"));
    assert!(generation.user.contains("TONE REQUIREMENT: reassuring"));
    assert!(!generation.user.contains("[Billing]"));
}

#[tokio::test]
async fn unrelated_issue_gets_no_context() {
    let h = harness(false);
    h.pipeline.index_documents(&h.kb_path).await.unwrap();

    let draft = h
        .pipeline
        .draft(&DraftRequest::new("What is the meaning of life?"))
        .await
        .unwrap();

    assert!(draft.matches.is_empty());
    assert_eq!(draft.result.context_used, 0);
    assert!(draft.result.sources.is_empty());
    assert!(!draft.result.is_fallback());
}

#[tokio::test]
async fn rate_limited_provider_falls_back() {
    let h = harness(true);
    h.pipeline.index_documents(&h.kb_path).await.unwrap();

    let draft = h
        .pipeline
        .draft(&DraftRequest::new("Where is my refund?"))
        .await
        .unwrap();

    assert_eq!(draft.detected_tone, Tone::Neutral);
    assert!(draft.result.is_fallback());
    assert_eq!(draft.result.model_used, "fallback");
    assert_eq!(draft.result.context_used, 0);
    assert!(draft.result.response_text.contains("Too Many Requests"));
    // Billing passage was still retrieved
    assert_eq!(draft.matches.len(), 1);

    // One tone call plus two generation attempts
    assert_eq!(h.llm.requests.lock().len(), 3);
    assert_eq!(h.sleeper.waits(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn reindexing_accumulates_records() {
    let h = harness(false);
    h.pipeline.index_documents(&h.kb_path).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    h.pipeline.index_documents(&h.kb_path).await.unwrap();

    assert_eq!(h.index.len(), 6);
    assert_eq!(h.pipeline.stats().await.unwrap().total_vector_count, 6);
}

#[tokio::test]
async fn missing_and_empty_sources_fail() {
    let h = harness(false);

    let err = h
        .pipeline
        .index_documents(h.kb_path.with_file_name("absent.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    std::fs::write(&h.kb_path, "   \n").unwrap();
    let err = h.pipeline.index_documents(&h.kb_path).await.unwrap_err();
    assert!(matches!(err, Error::EmptySource(_)));
    assert!(h.index.is_empty());
}
