//! Action inspection command handler.

use scrivener::{ScrivenerResult, StorageError, StorageErrorKind, clean_text, parse_actions};
use std::path::Path;

/// Prints every action tag in a file, then the text without them.
pub fn show_actions(path: &Path) -> ScrivenerResult<()> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;

    let actions = parse_actions(&text);
    println!("{} action(s)", actions.len());
    for action in &actions {
        println!("[{}] {}", action.action_type(), action.payload());
        match action.to_ui_action() {
            Ok(ui) => println!("    {:?}", ui),
            Err(e) => println!("    not understood: {}", e.message),
        }
    }

    println!();
    println!("{}", clean_text(&text));
    Ok(())
}
