//! Write observer that logs progress and keeps the novel file current.

use crate::save_novel;
use async_trait::async_trait;
use scrivener_automation::WriteObserver;
use scrivener_core::{Novel, RegexScript};
use scrivener_error::ScrivenerResult;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Minimum spacing between saves while text is streaming in.
const SAVE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
struct PendingSave {
    novel: Option<Novel>,
    last_saved: Option<Instant>,
}

/// Logs write progress and saves the working copy to disk.
///
/// Streaming produces an update per chunk, so saves are throttled; the
/// latest copy is always flushed when a chapter completes.
pub struct FileObserver {
    path: Option<PathBuf>,
    scripts: Vec<RegexScript>,
    pending: Mutex<PendingSave>,
}

impl FileObserver {
    /// Creates an observer; without a path nothing is saved.
    pub fn new(path: Option<PathBuf>, scripts: Vec<RegexScript>) -> Self {
        Self {
            path,
            scripts,
            pending: Mutex::new(PendingSave::default()),
        }
    }

    /// Writes the latest working copy, if one is waiting.
    pub fn flush(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let (Some(path), Some(novel)) = (&self.path, pending.novel.take()) else {
            return;
        };

        match save_novel(path, &novel) {
            Ok(()) => debug!(path = %path.display(), "Saved novel"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to save novel"),
        }
        pending.last_saved = Some(Instant::now());
    }
}

#[async_trait]
impl WriteObserver for FileObserver {
    fn active_scripts(&self) -> Vec<RegexScript> {
        self.scripts.clone()
    }

    fn on_status(&self, status: &str) {
        info!(status, "Write progress");
    }

    fn on_novel_update(&self, novel: &Novel) {
        if self.path.is_none() {
            return;
        }

        let due = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.novel = Some(novel.clone());
            pending
                .last_saved
                .is_none_or(|at| at.elapsed() >= SAVE_INTERVAL)
        };
        if due {
            self.flush();
        }
    }

    async fn on_chapter_complete(&self, chapter_id: u64, content: &str) -> ScrivenerResult<()> {
        info!(chapter_id, chars = content.chars().count(), "Chapter written");
        self.flush();
        Ok(())
    }
}
