//! Mock driver shared by the facade tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::stream;
use scrivener::{
    ChunkStream, CompletionDriver, CompletionError, CompletionErrorKind, FinishReason,
    GenerateRequest, GenerateResponse, Role, ScrivenerConfig, ScrivenerResult, StreamChunk,
    Streaming,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Replays canned replies and remembers the last user message of each call.
#[derive(Default)]
pub struct MockDriver {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockDriver {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, req: &GenerateRequest) -> ScrivenerResult<String> {
        let prompt = req
            .messages()
            .iter()
            .rev()
            .find(|m| *m.role() == Role::User)
            .map(|m| m.content().clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);

        self.replies.lock().unwrap().pop_front().ok_or_else(|| {
            CompletionError::new(CompletionErrorKind::Http("script exhausted".to_string())).into()
        })
    }
}

#[async_trait]
impl CompletionDriver for MockDriver {
    async fn generate(&self, req: &GenerateRequest) -> ScrivenerResult<GenerateResponse> {
        Ok(GenerateResponse::new(self.next(req)?, None))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model-v1"
    }
}

#[async_trait]
impl Streaming for MockDriver {
    async fn generate_stream(&self, req: &GenerateRequest) -> ScrivenerResult<ChunkStream> {
        let text = self.next(req)?;
        Ok(Box::pin(stream::iter(vec![
            Ok(StreamChunk::text(text)),
            Ok(StreamChunk::finished(FinishReason::Stop)),
        ])))
    }
}

/// Holds the first request open until released, then replays like [`MockDriver`].
#[derive(Default)]
pub struct GatedDriver {
    inner: MockDriver,
    calls: AtomicUsize,
    pub started: Notify,
    pub release: Notify,
}

impl GatedDriver {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            inner: MockDriver::new(replies),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl CompletionDriver for GatedDriver {
    async fn generate(&self, req: &GenerateRequest) -> ScrivenerResult<GenerateResponse> {
        self.gate().await;
        self.inner.generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "gated-model-v1"
    }
}

#[async_trait]
impl Streaming for GatedDriver {
    async fn generate_stream(&self, req: &GenerateRequest) -> ScrivenerResult<ChunkStream> {
        self.gate().await;
        self.inner.generate_stream(req).await
    }
}

/// Configuration with no delays and no retries.
pub fn quick_config() -> ScrivenerConfig {
    let mut config = ScrivenerConfig::default();
    config.api.stream = false;
    config.writing.max_retries = 0;
    config.writing.retry_delay_ms = 0;
    config.writing.batch_pause_ms = 0;
    config
}
