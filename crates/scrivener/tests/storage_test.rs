//! Novel and script files on disk.

use scrivener::{
    Chapter, Novel, ScrivenerErrorKind, load_novel, load_scripts, save_novel, write_json,
};
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scrivener-storage-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn test_saved_novel_loads_back() {
    let path = scratch("novel.json");
    let mut chapter = Chapter::new(1, "Landfall");
    chapter.set_content("Sand and salt.");
    let novel = Novel::builder()
        .id("n1")
        .title("The Tide Clock")
        .chapters(vec![chapter])
        .build()
        .unwrap();

    save_novel(&path, &novel).unwrap();
    assert_eq!(load_novel(&path).unwrap(), novel);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_scripts_file_is_optional() {
    assert!(load_scripts(None).unwrap().is_empty());

    let path = scratch("scripts.json");
    write_json(
        &path,
        &serde_json::json!([
            {"scriptName": "dashes", "findRegex": "/--/g", "replaceString": "-", "placement": 2}
        ]),
    )
    .unwrap();
    let scripts = load_scripts(Some(&path)).unwrap();
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].script_name(), "dashes");
}

#[test]
fn test_missing_and_malformed_files() {
    let missing = scratch("does-not-exist.json");
    assert!(matches!(
        load_novel(&missing).unwrap_err().kind(),
        ScrivenerErrorKind::Storage(_)
    ));

    let garbage = scratch("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    let err = load_novel(&garbage).unwrap_err();
    assert!(format!("{}", err).contains("Malformed"));
}
