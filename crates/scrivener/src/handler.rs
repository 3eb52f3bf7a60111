//! Task handler that carries out manifest tasks against a novel file.

use async_trait::async_trait;
use scrivener_automation::{
    Action, BatchWriteEngine, RunOptions, Task, TaskHandler, TaskType, UiAction, WriteObserver,
    build_world_info_context, clean_text, parse_actions, replace_macros,
};
use scrivener_core::{Chapter, GenerateRequest, Message, Novel};
use scrivener_error::{
    CompletionError, CompletionErrorKind, ScrivenerResult, WriteError, WriteErrorKind,
};
use scrivener_interface::Streaming;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Reply text produced for a non-chapter task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReply {
    /// Title of the task
    pub task: String,
    /// Reply with action tags removed
    pub text: String,
}

/// Runs manifest tasks without an editor attached.
///
/// Chapter tasks write the outline through the [`BatchWriteEngine`]. Every
/// other task is sent to the model as a single request; the reply is kept
/// and any action tags in it are carried out where that makes sense
/// headless.
pub struct NovelTaskHandler {
    driver: Arc<dyn Streaming>,
    engine: Arc<BatchWriteEngine>,
    observer: Arc<dyn WriteObserver>,
    novel: Mutex<Novel>,
    instruction: String,
    outline_set_id: Option<String>,
    system_prompt: String,
    temperature: Option<f32>,
    replies: Mutex<Vec<TaskReply>>,
}

impl NovelTaskHandler {
    /// Creates a handler working on `novel` for the user's `instruction`.
    pub fn new(
        driver: Arc<dyn Streaming>,
        engine: Arc<BatchWriteEngine>,
        observer: Arc<dyn WriteObserver>,
        novel: Novel,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            engine,
            observer,
            novel: Mutex::new(novel),
            instruction: instruction.into(),
            outline_set_id: None,
            system_prompt: String::new(),
            temperature: None,
            replies: Mutex::new(Vec::new()),
        }
    }

    /// Outline set chapter tasks write from; defaults to the first set.
    pub fn with_outline_set(mut self, outline_set_id: Option<String>) -> Self {
        self.outline_set_id = outline_set_id;
        self
    }

    /// System prompt for non-chapter tasks.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Sampling temperature for non-chapter tasks.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Snapshot of the working novel.
    pub fn novel(&self) -> Novel {
        self.lock_novel().clone()
    }

    /// Replies collected so far, oldest first.
    pub fn replies(&self) -> Vec<TaskReply> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_novel(&self) -> MutexGuard<'_, Novel> {
        self.novel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails once the engine has been stopped.
    fn ensure_not_stopped(&self) -> ScrivenerResult<()> {
        if self.engine.is_stopped() {
            debug!("Engine stopped; skipping remaining work");
            return Err(WriteError::new(WriteErrorKind::Cancelled).into());
        }
        Ok(())
    }

    /// Writes every unwritten item of an outline set from `start_index` on.
    ///
    /// # Errors
    ///
    /// Fails when the outline set does not exist, when the engine was stopped
    /// before or during the run, or when the run ends with items still
    /// unwritten.
    #[instrument(skip(self, options))]
    pub async fn write_outline(
        &self,
        outline_set_id: Option<&str>,
        start_index: usize,
        options: RunOptions,
    ) -> ScrivenerResult<()> {
        self.ensure_not_stopped()?;
        let snapshot = self.novel();
        let set = match outline_set_id {
            Some(id) => snapshot.outline_set(id),
            None => snapshot.outline_sets().first(),
        }
        .ok_or_else(|| {
            WriteError::new(WriteErrorKind::UnknownOutlineSet(
                outline_set_id.unwrap_or("(none)").to_string(),
            ))
        })?;

        let items = set.items().clone();
        let options = RunOptions {
            outline_set_id: Some(set.id().clone()),
            ..options
        };

        let written = self
            .engine
            .run(snapshot, &items, start_index, &options, self.observer.as_ref())
            .await;

        let remaining = items
            .iter()
            .skip(start_index)
            .filter(|item| {
                !written
                    .chapter_by_title(item.title())
                    .is_some_and(Chapter::is_written)
            })
            .count();
        *self.lock_novel() = written;

        self.ensure_not_stopped()?;
        if remaining > 0 {
            return Err(WriteError::new(WriteErrorKind::Incomplete(remaining)).into());
        }
        Ok(())
    }

    async fn complete(&self, task: &Task, description: &str) -> ScrivenerResult<String> {
        let mut prompt = format!(
            "Task: {}\nStage: {}\n\n{}",
            task.title(),
            task.task_type(),
            description
        );
        let reference = build_world_info_context(&self.novel(), None);
        if !reference.is_empty() {
            prompt = format!("Reference material:\n{}\n\n{}", reference, prompt);
        }

        let mut messages = Vec::new();
        if !self.system_prompt.trim().is_empty() {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.push(Message::user(prompt));

        let request = GenerateRequest::builder()
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| CompletionError::new(CompletionErrorKind::InvalidRequest(e.to_string())))?;

        let response = self.driver.generate(&request).await?;
        if response.content().trim().is_empty() {
            return Err(CompletionError::new(CompletionErrorKind::EmptyResponse).into());
        }
        Ok(response.content().clone())
    }

    async fn dispatch(&self, action: &Action) -> ScrivenerResult<()> {
        match action.to_ui_action() {
            Ok(UiAction::StartAutoWrite {
                outline_set_id,
                start_index,
                target_volume_id,
                include_full_outline,
            }) => {
                let set_id = outline_set_id.or_else(|| self.outline_set_id.clone());
                let options = RunOptions {
                    target_volume_id,
                    include_full_outline,
                    ..Default::default()
                };
                self.write_outline(set_id.as_deref(), start_index.unwrap_or(0), options)
                    .await
            }
            Ok(UiAction::AwaitUserInput { message }) => {
                warn!(message = message.as_str(), "Model asked for input; continuing");
                Ok(())
            }
            Ok(other) => {
                debug!(action = ?other, "Action has no effect without an editor");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Ignoring invalid action");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl TaskHandler for NovelTaskHandler {
    #[instrument(skip_all, fields(task = task.title().as_str(), stage = %task.task_type()))]
    async fn handle(&self, task: &Task) -> ScrivenerResult<()> {
        self.ensure_not_stopped()?;
        let description = replace_macros(task.description(), Some(&self.instruction));

        if *task.task_type() == TaskType::Chapter {
            let set_id = self.outline_set_id.clone();
            return self
                .write_outline(set_id.as_deref(), 0, RunOptions::default())
                .await;
        }

        let reply = self.complete(task, &description).await?;
        let text = clean_text(&reply);
        info!(chars = text.chars().count(), "Task reply received");
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TaskReply {
                task: task.title().clone(),
                text,
            });

        for action in parse_actions(&reply) {
            self.ensure_not_stopped()?;
            self.dispatch(&action).await?;
        }
        Ok(())
    }
}
