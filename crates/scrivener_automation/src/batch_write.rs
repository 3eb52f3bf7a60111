//! Batched, retrying chapter generation over an outline.

use crate::{
    ScrivenerConfig, build_world_info_context, get_chapter_context, process_text_with_regex,
    split_batch_response,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use scrivener_core::{
    Chapter, ChapterSubtype, GenerateRequest, Message, Novel, OutlineItem, PLACEMENT_AI_OUTPUT,
    PLACEMENT_USER_INPUT, PromptItem, RegexScript,
};
use scrivener_error::{
    CompletionError, CompletionErrorKind, ScrivenerError, ScrivenerResult, WriteError,
    WriteErrorKind,
};
use scrivener_interface::Streaming;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Hard ceiling on the token budget of one request.
pub const MAX_BATCH_TOKENS: u32 = 128_000;

/// Token budget for a batch of `batch_size` chapters.
///
/// Multi-chapter replies tend to run long, so batches of more than one
/// chapter get half again as much room per chapter.
///
/// # Examples
///
/// ```
/// use scrivener_automation::batch_token_budget;
///
/// assert_eq!(batch_token_budget(4000, 1), 4000);
/// assert_eq!(batch_token_budget(4000, 3), 18000);
/// assert_eq!(batch_token_budget(64000, 2), 128000);
/// ```
pub fn batch_token_budget(max_reply_length: u32, batch_size: usize) -> u32 {
    let multiplier = if batch_size <= 1 { 1.0 } else { 1.5 };
    let budget = f64::from(max_reply_length) * batch_size as f64 * multiplier;
    budget.min(f64::from(MAX_BATCH_TOKENS)) as u32
}

/// Per-run options for [`BatchWriteEngine::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Extra prompt messages sent between the system prompt and the task
    pub active_prompts: Vec<PromptItem>,
    /// Volume new (or unfiled) chapters are filed into
    pub target_volume_id: Option<String>,
    /// Append a digest of the whole outline to every prompt
    pub include_full_outline: bool,
    /// Outline set the digest is taken from
    pub outline_set_id: Option<String>,
    /// Worldview/character set used for the reference excerpt
    pub reference_set_id: Option<String>,
}

/// Receives progress from a write run.
#[async_trait]
pub trait WriteObserver: Send + Sync {
    /// Regex scripts in effect; asked once per attempt.
    fn active_scripts(&self) -> Vec<RegexScript>;

    /// Human-readable progress line.
    fn on_status(&self, status: &str);

    /// The working copy changed.
    fn on_novel_update(&self, novel: &Novel);

    /// A chapter has its final text. Failures are logged by the engine.
    async fn on_chapter_complete(&self, chapter_id: u64, content: &str) -> ScrivenerResult<()>;
}

/// Writes chapters from an outline, several per request when configured.
///
/// One engine drives one run at a time; [`stop`](Self::stop) may be called
/// from another task while [`run`](Self::run) is in flight.
pub struct BatchWriteEngine {
    driver: Arc<dyn Streaming>,
    config: ScrivenerConfig,
    is_running: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

/// One group of outline items written by a single request.
struct Batch<'a> {
    items: Vec<&'a OutlineItem>,
    chapter_ids: Vec<u64>,
}

impl Batch<'_> {
    fn titles(&self) -> Vec<String> {
        self.items.iter().map(|i| i.title().clone()).collect()
    }
}

fn cancelled() -> ScrivenerError {
    WriteError::new(WriteErrorKind::Cancelled).into()
}

/// Sleeps unless cancelled first.
async fn cancellable_sleep(token: &CancellationToken, duration: Duration) -> ScrivenerResult<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(cancelled()),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

fn is_item_written(novel: &Novel, item: &OutlineItem) -> bool {
    novel
        .chapter_by_title(item.title())
        .is_some_and(Chapter::is_written)
}

impl BatchWriteEngine {
    /// Creates an engine.
    pub fn new(driver: Arc<dyn Streaming>, config: ScrivenerConfig) -> Self {
        Self {
            driver,
            config,
            is_running: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Stops the current run, aborting any in-flight request.
    ///
    /// The stop holds until [`reset`](Self::reset): a [`run`](Self::run)
    /// started afterwards returns its novel untouched.
    pub fn stop(&self) {
        info!("Stopping batch write");
        self.is_running.store(false, Ordering::SeqCst);
        self.token().cancel();
    }

    /// Whether [`stop`](Self::stop) was called since the last reset.
    pub fn is_stopped(&self) -> bool {
        self.token().is_cancelled()
    }

    /// Re-arms a stopped engine so new runs can start.
    pub fn reset(&self) {
        let mut guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_cancelled() {
            debug!("Re-arming stopped engine");
            *guard = CancellationToken::new();
        }
    }

    fn token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Writes every unwritten outline item from `start_index` on.
    ///
    /// Returns the final working copy. Failures are reported through
    /// `observer.on_status` and end the run; cancellation ends it silently.
    #[instrument(skip_all, fields(start_index = start_index, outline_len = outline.len()))]
    pub async fn run(
        &self,
        novel: Novel,
        outline: &[OutlineItem],
        start_index: usize,
        options: &RunOptions,
        observer: &dyn WriteObserver,
    ) -> Novel {
        let token = self.token();
        if token.is_cancelled() {
            debug!("Engine is stopped; not starting");
            return novel;
        }

        self.is_running.store(true, Ordering::SeqCst);
        let novel = self
            .write_outline(novel, outline, start_index, options, observer, &token)
            .await;
        self.is_running.store(false, Ordering::SeqCst);
        novel
    }

    async fn write_outline(
        &self,
        mut novel: Novel,
        outline: &[OutlineItem],
        start_index: usize,
        options: &RunOptions,
        observer: &dyn WriteObserver,
        token: &CancellationToken,
    ) -> Novel {
        let batch_limit = self.config.writing.consecutive_chapter_count.max(1);
        let mut index = start_index;

        while index < outline.len() {
            if token.is_cancelled() {
                debug!(index, "Run stopped");
                return novel;
            }

            if is_item_written(&novel, &outline[index]) {
                debug!(title = outline[index].title().as_str(), "Skipping written chapter");
                index += 1;
                continue;
            }

            let mut end = index + 1;
            while end < outline.len() && end - index < batch_limit {
                if is_item_written(&novel, &outline[end]) {
                    break;
                }
                end += 1;
            }

            let items: Vec<&OutlineItem> = outline[index..end].iter().collect();
            let chapter_ids = self.prepare_chapters(&mut novel, &items, options);
            let batch = Batch { items, chapter_ids };
            observer.on_novel_update(&novel);

            let titles = batch.titles();
            observer.on_status(&format!("Writing: {}", titles.join(", ")));

            match self
                .write_with_retry(&mut novel, &batch, outline, options, observer, token)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    debug!("Run cancelled");
                    return novel;
                }
                Err(e) => {
                    error!(error = %e, "Batch failed after all retries");
                    observer.on_status(&format!("Failed to write {}: {}", titles.join(", "), e));
                    return novel;
                }
            }

            index = end;
            if index < outline.len()
                && cancellable_sleep(token, self.config.writing.batch_pause())
                    .await
                    .is_err()
            {
                return novel;
            }
        }

        info!("Outline complete");
        observer.on_status("All chapters complete");
        novel
    }

    /// Ensures each item has a chapter and returns their ids in order.
    fn prepare_chapters(
        &self,
        novel: &mut Novel,
        items: &[&OutlineItem],
        options: &RunOptions,
    ) -> Vec<u64> {
        items
            .iter()
            .map(|item| {
                let existing = novel
                    .chapters_mut()
                    .iter_mut()
                    .find(|c| c.title() == item.title());

                match existing {
                    Some(chapter) => {
                        if chapter.volume_id().is_none() && options.target_volume_id.is_some() {
                            chapter.set_volume_id(options.target_volume_id.clone());
                        }
                        *chapter.id()
                    }
                    None => {
                        let id = novel.next_chapter_id();
                        let mut chapter = Chapter::new(id, item.title().clone());
                        chapter.set_volume_id(options.target_volume_id.clone());
                        chapter.set_subtype(Some(ChapterSubtype::Story));
                        novel.push_chapter(chapter);
                        id
                    }
                }
            })
            .collect()
    }

    async fn write_with_retry(
        &self,
        novel: &mut Novel,
        batch: &Batch<'_>,
        outline: &[OutlineItem],
        options: &RunOptions,
        observer: &dyn WriteObserver,
        token: &CancellationToken,
    ) -> ScrivenerResult<()> {
        let attempts = self.config.writing.max_retries + 1;
        let mut attempt = 1;

        loop {
            if token.is_cancelled() {
                return Err(cancelled());
            }

            let error = match self
                .write_batch(novel, batch, outline, options, observer, token)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            // Drop partial streamed text so the chapter is not mistaken for written.
            if let Some(first) = batch.chapter_ids.first()
                && let Some(chapter) = novel.chapter_mut(*first)
                && !chapter.content().is_empty()
            {
                chapter.set_content("");
                observer.on_novel_update(novel);
            }

            if error.is_cancelled() {
                return Err(error);
            }
            warn!(attempt, attempts, error = %error, "Batch attempt failed");

            if attempt >= attempts {
                return Err(error);
            }
            attempt += 1;
            observer.on_status(&format!("Retrying ({}/{})...", attempt, attempts));
            cancellable_sleep(token, self.config.writing.retry_delay()).await?;
        }
    }

    fn build_prompt(
        &self,
        novel: &Novel,
        batch: &Batch<'_>,
        prior_context: String,
        outline: &[OutlineItem],
        options: &RunOptions,
    ) -> String {
        let mut sections = Vec::new();

        let world = build_world_info_context(novel, options.reference_set_id.as_deref());
        if !world.is_empty() {
            sections.push(format!("Reference material:\n{}", world));
        }

        if !prior_context.trim().is_empty() {
            sections.push(format!("Story so far:\n{}", prior_context));
        }

        if options.include_full_outline {
            let digest_items = options
                .outline_set_id
                .as_deref()
                .and_then(|id| novel.outline_set(id))
                .map_or(outline, |set| set.items().as_slice());
            let digest: Vec<String> = digest_items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}. {}: {}", i + 1, item.title(), item.summary()))
                .collect();
            sections.push(format!("Full outline:\n{}", digest.join("\n")));
        }

        sections.push(match batch.items.as_slice() {
            [item] => format!(
                "Write the chapter \"{}\".\nOutline: {}",
                item.title(),
                item.summary()
            ),
            items => {
                let list: Vec<String> = items
                    .iter()
                    .map(|item| format!("### {}\nOutline: {}", item.title(), item.summary()))
                    .collect();
                format!(
                    "Write the following {} chapters in order. Begin each chapter with a \
heading line of the form \"### <exact title>\" using the exact titles below, and output \
nothing but the headings and chapter text: no commentary, notes or summaries.\n\n{}",
                    items.len(),
                    list.join("\n\n")
                )
            }
        });

        sections.join("\n\n")
    }

    #[instrument(skip_all, fields(chapters = batch.items.len()))]
    async fn write_batch(
        &self,
        novel: &mut Novel,
        batch: &Batch<'_>,
        outline: &[OutlineItem],
        options: &RunOptions,
        observer: &dyn WriteObserver,
        token: &CancellationToken,
    ) -> ScrivenerResult<()> {
        let scripts = observer.active_scripts();
        let first_id = batch.chapter_ids.first().copied().unwrap_or_default();

        let prior_context = match novel.chapter(first_id) {
            Some(target) => {
                let raw = get_chapter_context(novel, target, &self.config.context);
                process_text_with_regex(&raw, &scripts, PLACEMENT_USER_INPUT).await
            }
            None => String::new(),
        };
        let prompt = self.build_prompt(novel, batch, prior_context, outline, options);

        let mut messages = Vec::new();
        if !self.config.writing.system_prompt.trim().is_empty() {
            messages.push(Message::system(self.config.writing.system_prompt.clone()));
        }
        messages.extend(
            options
                .active_prompts
                .iter()
                .filter(|p| *p.enabled())
                .map(PromptItem::to_message),
        );
        messages.push(Message::user(prompt));

        let api = &self.config.api;
        let request = GenerateRequest::builder()
            .messages(messages)
            .max_tokens(Some(batch_token_budget(
                self.config.writing.max_reply_length,
                batch.items.len(),
            )))
            .temperature(api.temperature)
            .top_p(api.top_p)
            .top_k(api.top_k)
            .build()
            .map_err(|e| CompletionError::new(CompletionErrorKind::InvalidRequest(e.to_string())))?;

        let text = if api.stream {
            self.stream_into_first(novel, first_id, &request, observer, token)
                .await?
        } else {
            let response = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(cancelled()),
                response = self.driver.generate(&request) => response?,
            };
            response.content().clone()
        };

        let titles = batch.titles();
        if text.trim().is_empty() {
            return Err(WriteError::new(WriteErrorKind::EmptyResponse(
                titles.first().cloned().unwrap_or_default(),
            ))
            .into());
        }

        let segments = split_batch_response(&text, &titles);
        let mut finished = Vec::with_capacity(segments.len());
        for (chapter_id, segment) in batch.chapter_ids.iter().zip(segments) {
            let content = process_text_with_regex(&segment, &scripts, PLACEMENT_AI_OUTPUT).await;
            let chapter = novel.chapter_mut(*chapter_id).ok_or_else(|| {
                WriteError::new(WriteErrorKind::MissingChapter(chapter_id.to_string()))
            })?;
            chapter.set_content(content.clone());
            finished.push((*chapter_id, content));
        }
        observer.on_novel_update(novel);

        for (chapter_id, content) in &finished {
            if let Err(e) = observer.on_chapter_complete(*chapter_id, content).await {
                warn!(chapter_id, error = %e, "Chapter completion callback failed");
            }
        }

        debug!(chapters = finished.len(), "Batch written");
        Ok(())
    }

    /// Streams a reply, mirroring the partial text into the first chapter.
    async fn stream_into_first(
        &self,
        novel: &mut Novel,
        first_id: u64,
        request: &GenerateRequest,
        observer: &dyn WriteObserver,
        token: &CancellationToken,
    ) -> ScrivenerResult<String> {
        let mut stream = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(cancelled()),
            stream = self.driver.generate_stream(request) => stream?,
        };

        let mut text = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(cancelled()),
                next = stream.next() => next,
            };

            let Some(chunk) = next else { break };
            let chunk = chunk?;
            if !chunk.content.is_empty() {
                text.push_str(&chunk.content);
                if let Some(chapter) = novel.chapter_mut(first_id) {
                    chapter.set_content(text.clone());
                    observer.on_novel_update(novel);
                }
            }
        }
        Ok(text)
    }
}
