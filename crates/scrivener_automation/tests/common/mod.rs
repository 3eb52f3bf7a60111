//! Mock drivers and observers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::stream;
use scrivener_automation::WriteObserver;
use scrivener_core::{GenerateRequest, GenerateResponse, Novel, RegexScript, Role};
use scrivener_error::{CompletionError, CompletionErrorKind, ScrivenerResult};
use scrivener_interface::{ChunkStream, CompletionDriver, FinishReason, StreamChunk, Streaming};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Replays canned replies in order and records every request.
#[derive(Default)]
pub struct ScriptedDriver {
    replies: Mutex<VecDeque<Result<String, CompletionErrorKind>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    calls: AtomicUsize,
}

impl ScriptedDriver {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            ..Default::default()
        }
    }

    pub fn push_error(&self, kind: CompletionErrorKind) {
        self.replies.lock().unwrap().push_back(Err(kind));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Text of the last user message of request `index`.
    pub fn user_prompt(&self, index: usize) -> String {
        self.requests()[index]
            .messages()
            .iter()
            .rev()
            .find(|m| *m.role() == Role::User)
            .map(|m| m.content().clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, req: &GenerateRequest) -> ScrivenerResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(kind)) => Err(CompletionError::new(kind).into()),
            None => Err(CompletionError::new(CompletionErrorKind::Http(
                "no more scripted replies".to_string(),
            ))
            .into()),
        }
    }
}

#[async_trait]
impl CompletionDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> ScrivenerResult<GenerateResponse> {
        Ok(GenerateResponse::new(self.next_reply(req)?, None))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model-v1"
    }
}

#[async_trait]
impl Streaming for ScriptedDriver {
    async fn generate_stream(&self, req: &GenerateRequest) -> ScrivenerResult<ChunkStream> {
        let text = self.next_reply(req)?;
        let chars: Vec<char> = text.chars().collect();
        let mut chunks: Vec<ScrivenerResult<StreamChunk>> = chars
            .chunks(4)
            .map(|c| Ok(StreamChunk::text(c.iter().collect::<String>())))
            .collect();
        chunks.push(Ok(StreamChunk::finished(FinishReason::Stop)));
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// Streams one chunk and then never finishes.
#[derive(Default)]
pub struct HangingDriver {
    pub opened: Notify,
}

#[async_trait]
impl CompletionDriver for HangingDriver {
    async fn generate(&self, _req: &GenerateRequest) -> ScrivenerResult<GenerateResponse> {
        self.opened.notify_one();
        std::future::pending().await
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "hanging"
    }
}

#[async_trait]
impl Streaming for HangingDriver {
    async fn generate_stream(&self, _req: &GenerateRequest) -> ScrivenerResult<ChunkStream> {
        self.opened.notify_one();
        let first = stream::iter(vec![Ok(StreamChunk::text("It was a dark"))]);
        Ok(Box::pin(futures_util::StreamExt::chain(
            first,
            stream::pending(),
        )))
    }
}

/// Records everything the engine reports.
#[derive(Default)]
pub struct RecordingObserver {
    pub scripts: Vec<RegexScript>,
    pub fail_completion: bool,
    pub statuses: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<Novel>>,
    pub completed: Mutex<Vec<(u64, String)>>,
}

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<(u64, String)> {
        self.completed.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Novel> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl WriteObserver for RecordingObserver {
    fn active_scripts(&self) -> Vec<RegexScript> {
        self.scripts.clone()
    }

    fn on_status(&self, status: &str) {
        self.statuses.lock().unwrap().push(status.to_string());
    }

    fn on_novel_update(&self, novel: &Novel) {
        self.updates.lock().unwrap().push(novel.clone());
    }

    async fn on_chapter_complete(&self, chapter_id: u64, content: &str) -> ScrivenerResult<()> {
        self.completed
            .lock()
            .unwrap()
            .push((chapter_id, content.to_string()));
        if self.fail_completion {
            return Err(CompletionError::new(CompletionErrorKind::Http("save failed".into())).into());
        }
        Ok(())
    }
}

