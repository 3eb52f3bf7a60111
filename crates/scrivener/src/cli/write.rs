//! Batch write command handler.

use super::{WriteArgs, load_config, stop_on_ctrl_c};
use scrivener::{
    BatchWriteEngine, FileObserver, NovelTaskHandler, RunOptions, ScrivenerResult,
    client_from_config, load_novel, load_scripts, save_novel,
};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Writes an outline set into the novel file.
///
/// The file is updated while chapters stream in and saved once more at the
/// end, even when the run failed part way. Ctrl-C ends the run cleanly.
pub async fn write_novel(config_path: Option<&Path>, args: &WriteArgs) -> ScrivenerResult<()> {
    let config = load_config(config_path)?;
    let novel = load_novel(&args.novel)?;
    let scripts = load_scripts(args.scripts.as_deref())?;
    let client = Arc::new(client_from_config(&config)?);

    let engine = Arc::new(BatchWriteEngine::new(client.clone(), config));
    let observer = Arc::new(FileObserver::new(Some(args.novel.clone()), scripts));
    let handler = NovelTaskHandler::new(client, engine.clone(), observer, novel, "");

    let interrupt = {
        let engine = engine.clone();
        stop_on_ctrl_c(move || engine.stop())
    };

    let options = RunOptions {
        target_volume_id: args.volume.clone(),
        include_full_outline: args.full_outline,
        ..Default::default()
    };
    let result = handler
        .write_outline(Some(&args.outline_set), args.start, options)
        .await;
    interrupt.abort();

    save_novel(&args.novel, &handler.novel())?;
    match result {
        Err(e) if e.is_cancelled() => {
            warn!("Write interrupted; progress saved");
            Ok(())
        }
        other => other,
    }
}
