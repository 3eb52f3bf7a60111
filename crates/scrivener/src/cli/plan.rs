//! Manifest planning command handler.

use super::load_config;
use scrivener::{
    Manifest, ManifestPlanner, ScrivenerResult, client_from_config, load_novel, write_json,
};
use std::path::Path;
use std::sync::Arc;

/// Prints a manifest as a numbered task list.
pub(super) fn print_manifest(manifest: &Manifest) {
    println!("Manifest ({} tasks):", manifest.len());
    for (i, task) in manifest.tasks().iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, task.task_type(), task.title());
        if !task.description().is_empty() {
            println!("     {}", task.description());
        }
    }
}

/// Plans a manifest for the novel and prints or saves it.
pub async fn plan_novel(
    config_path: Option<&Path>,
    novel_path: &Path,
    instruction: &str,
    out: Option<&Path>,
) -> ScrivenerResult<()> {
    let config = load_config(config_path)?;
    let novel = load_novel(novel_path)?;
    let client = Arc::new(client_from_config(&config)?);

    tracing::info!(
        novel = %novel_path.display(),
        chapters = novel.chapters().len(),
        "Planning"
    );

    let planner = ManifestPlanner::new(client).with_temperature(config.api.temperature);
    let manifest = planner.plan(&novel, instruction).await?;

    print_manifest(&manifest);
    if let Some(out) = out {
        write_json(out, &manifest)?;
        tracing::info!(path = %out.display(), "Manifest saved");
    }
    Ok(())
}
