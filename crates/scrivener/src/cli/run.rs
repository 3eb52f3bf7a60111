//! Plan-and-execute command handler.

use super::{load_config, plan::print_manifest, stop_on_ctrl_c};
use scrivener::{
    AgentCore, AgentError, AgentErrorKind, AgentStatus, BatchWriteEngine, FileObserver,
    ManifestPlanner, NovelTaskHandler, ScrivenerResult, client_from_config, load_novel,
    load_scripts, save_novel,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Plans a manifest for the instruction and executes it end to end.
///
/// The novel file is saved after execution whatever the outcome; replies
/// to non-chapter tasks are printed.
pub async fn run_novel(
    config_path: Option<&Path>,
    novel_path: &Path,
    instruction: &str,
    outline_set: Option<String>,
    scripts: Option<&Path>,
) -> ScrivenerResult<()> {
    let config = load_config(config_path)?;
    let novel = load_novel(novel_path)?;
    let scripts = load_scripts(scripts)?;
    let client = Arc::new(client_from_config(&config)?);

    let engine = Arc::new(BatchWriteEngine::new(client.clone(), config.clone()));
    let observer = Arc::new(FileObserver::new(Some(novel_path.to_path_buf()), scripts));
    let handler = Arc::new(
        NovelTaskHandler::new(
            client.clone(),
            engine.clone(),
            observer,
            novel.clone(),
            instruction,
        )
        .with_outline_set(outline_set)
        .with_system_prompt(config.writing.system_prompt.clone())
        .with_temperature(config.api.temperature),
    );

    let core = Arc::new(AgentCore::new(handler.clone()).with_subscriber(|state| {
        debug!(
            status = %state.status(),
            task = ?state.current_task_index(),
            "Agent state changed"
        );
    }));

    let interrupt = {
        let core = core.clone();
        let engine = engine.clone();
        stop_on_ctrl_c(move || {
            core.stop();
            engine.stop();
        })
    };

    let planner = ManifestPlanner::new(client).with_temperature(config.api.temperature);
    let mut status = core.start_planning(&planner, &novel, instruction).await?;
    if status == AgentStatus::AwaitingUser {
        if let Some(manifest) = core.state().manifest() {
            print_manifest(manifest);
        }
        status = core.start_execution().await?;
    }
    interrupt.abort();

    save_novel(novel_path, &handler.novel())?;
    for reply in handler.replies() {
        println!("## {}\n\n{}\n", reply.task, reply.text);
    }

    let state = core.state();
    let latest = state.logs().first().cloned().unwrap_or_default();
    match status {
        AgentStatus::Completed => {
            info!("Run complete");
            Ok(())
        }
        AgentStatus::Error if state.manifest().is_none() => {
            Err(AgentError::new(AgentErrorKind::PlanningFailed(latest)).into())
        }
        AgentStatus::Error => {
            let task = state
                .manifest()
                .as_ref()
                .zip(*state.current_task_index())
                .and_then(|(manifest, index)| manifest.task(index))
                .map(|task| task.title().clone())
                .unwrap_or_default();
            Err(AgentError::new(AgentErrorKind::TaskFailed {
                task,
                message: latest,
            })
            .into())
        }
        other => {
            warn!(status = %other, "Run ended early");
            Ok(())
        }
    }
}
