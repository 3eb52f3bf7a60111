//! Batch write engine behaviour against scripted drivers.

mod common;

use common::{HangingDriver, RecordingObserver, ScriptedDriver};
use scrivener_automation::{
    BatchWriteEngine, MISSING_CHAPTER_PLACEHOLDER, RunOptions, ScrivenerConfig, batch_token_budget,
};
use scrivener_core::{
    Chapter, ChapterSubtype, Novel, OutlineItem, OutlineSet, PLACEMENT_AI_OUTPUT, RegexScript,
};
use scrivener_error::CompletionErrorKind;
use std::sync::Arc;
use std::time::Duration;

fn config(batch: usize, stream: bool) -> ScrivenerConfig {
    let mut config = ScrivenerConfig::default();
    config.writing.consecutive_chapter_count = batch;
    config.writing.retry_delay_ms = 0;
    config.writing.batch_pause_ms = 0;
    config.api.stream = stream;
    config
}

fn outline(titles: &[&str]) -> Vec<OutlineItem> {
    titles
        .iter()
        .map(|t| OutlineItem::new(*t, format!("{} happens", t)))
        .collect()
}

fn content_of<'a>(novel: &'a Novel, title: &str) -> &'a str {
    novel
        .chapter_by_title(title)
        .map(|c| c.content().as_str())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_two_chapter_batch_is_split_by_heading() {
    let driver = Arc::new(ScriptedDriver::new(&["### Ch1\nText1\n### Ch2\nText2"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(2, false));
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1", "Ch2"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(content_of(&novel, "Ch1"), "Text1");
    assert_eq!(content_of(&novel, "Ch2"), "Text2");
    assert_eq!(driver.calls(), 1);

    let completed = observer.completed();
    assert_eq!(
        completed,
        vec![(1, "Text1".to_string()), (2, "Text2".to_string())]
    );

    let statuses = observer.statuses();
    assert_eq!(statuses.first().map(String::as_str), Some("Writing: Ch1, Ch2"));
    assert_eq!(statuses.last().map(String::as_str), Some("All chapters complete"));

    let request = &driver.requests()[0];
    assert_eq!(*request.max_tokens(), Some(batch_token_budget(4096, 2)));
    let prompt = driver.user_prompt(0);
    assert!(prompt.contains("### <exact title>"));
    assert!(prompt.contains("### Ch2\nOutline: Ch2 happens"));
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_written_chapters_are_skipped_and_split_batches() {
    let mut written = Chapter::new(1, "Ch2");
    written.set_content("Already here");
    let novel = Novel::builder().chapters(vec![written]).build().unwrap();

    let driver = Arc::new(ScriptedDriver::new(&["Body1", "Body3"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(3, false));
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            novel,
            &outline(&["Ch1", "Ch2", "Ch3"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(driver.calls(), 2);
    assert_eq!(content_of(&novel, "Ch1"), "Body1");
    assert_eq!(content_of(&novel, "Ch2"), "Already here");
    assert_eq!(content_of(&novel, "Ch3"), "Body3");
    assert!(driver.user_prompt(0).contains("Write the chapter \"Ch1\""));
    assert!(driver.user_prompt(1).contains("Write the chapter \"Ch3\""));
}

#[tokio::test]
async fn test_start_index_skips_earlier_items() {
    let driver = Arc::new(ScriptedDriver::new(&["Body2"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(1, false));
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1", "Ch2"]),
            1,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert!(novel.chapter_by_title("Ch1").is_none());
    assert_eq!(content_of(&novel, "Ch2"), "Body2");
}

#[tokio::test]
async fn test_placeholders_are_created_and_filed() {
    let unfiled = Chapter::new(5, "Ch1");
    let novel = Novel::builder().chapters(vec![unfiled]).build().unwrap();

    let driver = Arc::new(ScriptedDriver::new(&["### Ch1\nA\n### Ch2\nB"]));
    let engine = BatchWriteEngine::new(driver, config(2, false));
    let observer = RecordingObserver::default();
    let options = RunOptions {
        target_volume_id: Some("v1".to_string()),
        ..Default::default()
    };

    let novel = engine
        .run(novel, &outline(&["Ch1", "Ch2"]), 0, &options, &observer)
        .await;

    let first = novel.chapter_by_title("Ch1").unwrap();
    assert_eq!(*first.id(), 5);
    assert_eq!(first.volume_id().as_deref(), Some("v1"));

    let second = novel.chapter_by_title("Ch2").unwrap();
    assert_eq!(*second.id(), 6);
    assert_eq!(second.volume_id().as_deref(), Some("v1"));
    assert_eq!(*second.subtype(), Some(ChapterSubtype::Story));

    // Placeholders are published before generation starts.
    let first_update = &observer.updates()[0];
    assert_eq!(first_update.chapters().len(), 2);
    assert!(first_update.chapters().iter().all(|c| c.content().is_empty()));
}

#[tokio::test]
async fn test_shortfall_padded_with_placeholder() {
    let driver = Arc::new(ScriptedDriver::new(&["### Ch1\nOnly the first"]));
    let engine = BatchWriteEngine::new(driver, config(2, false));
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1", "Ch2"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(content_of(&novel, "Ch1"), "Only the first");
    assert_eq!(content_of(&novel, "Ch2"), MISSING_CHAPTER_PLACEHOLDER);
}

#[tokio::test]
async fn test_retry_exhaustion_makes_exactly_three_attempts() {
    let driver = Arc::new(ScriptedDriver::default());
    for _ in 0..5 {
        driver.push_error(CompletionErrorKind::Http("connection reset".to_string()));
    }
    let mut config = config(1, false);
    config.writing.max_retries = 2;
    let engine = BatchWriteEngine::new(driver.clone(), config);
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1", "Ch2"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(driver.calls(), 3);
    assert!(!engine.is_running());
    assert_eq!(content_of(&novel, "Ch1"), "");
    assert!(novel.chapter_by_title("Ch2").is_none());

    let statuses = observer.statuses();
    assert!(statuses.contains(&"Retrying (2/3)...".to_string()));
    assert!(statuses.contains(&"Retrying (3/3)...".to_string()));
    assert!(statuses.last().unwrap().starts_with("Failed to write Ch1"));
    assert!(observer.completed().is_empty());
}

#[tokio::test]
async fn test_empty_reply_is_retried() {
    let driver = Arc::new(ScriptedDriver::new(&["", "   ", "Finally"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(1, false));
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(driver.calls(), 3);
    assert_eq!(content_of(&novel, "Ch1"), "Finally");
}

#[tokio::test]
async fn test_streaming_updates_first_chapter_only() {
    let driver = Arc::new(ScriptedDriver::new(&["### Ch1\nText1\n### Ch2\nText2"]));
    let engine = BatchWriteEngine::new(driver, config(2, true));
    let observer = RecordingObserver::default();

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1", "Ch2"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(content_of(&novel, "Ch1"), "Text1");
    assert_eq!(content_of(&novel, "Ch2"), "Text2");

    let partial = observer
        .updates()
        .into_iter()
        .find(|n| content_of(n, "Ch1").starts_with("### Ch1"))
        .expect("a streamed partial update");
    assert_eq!(content_of(&partial, "Ch2"), "");
}

#[tokio::test]
async fn test_stop_mid_stream_is_silent() {
    let driver = Arc::new(HangingDriver::default());
    let engine = Arc::new(BatchWriteEngine::new(driver.clone(), config(1, true)));
    let observer = Arc::new(RecordingObserver::default());

    let handle = {
        let engine = engine.clone();
        let observer = observer.clone();
        tokio::spawn(async move {
            engine
                .run(
                    Novel::default(),
                    &outline(&["Ch1", "Ch2"]),
                    0,
                    &RunOptions::default(),
                    observer.as_ref(),
                )
                .await
        })
    };

    driver.opened.notified().await;
    engine.stop();

    let novel = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run ends after stop")
        .unwrap();

    assert!(!engine.is_running());
    assert!(novel.chapter_by_title("Ch2").is_none());
    assert!(
        observer
            .statuses()
            .iter()
            .all(|s| !s.starts_with("Failed") && !s.starts_with("Retrying"))
    );
}

#[tokio::test]
async fn test_stop_mid_stream_discards_partial_chapter() {
    let driver = Arc::new(HangingDriver::default());
    let engine = Arc::new(BatchWriteEngine::new(driver.clone(), config(1, true)));
    let observer = Arc::new(RecordingObserver::default());

    let handle = {
        let engine = engine.clone();
        let observer = observer.clone();
        tokio::spawn(async move {
            engine
                .run(
                    Novel::default(),
                    &outline(&["Ch1", "Ch2"]),
                    0,
                    &RunOptions::default(),
                    observer.as_ref(),
                )
                .await
        })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while !observer
            .updates()
            .iter()
            .any(|n| content_of(n, "Ch1") == "It was a dark")
        {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("partial text streamed");
    engine.stop();

    let novel = handle.await.unwrap();
    assert_eq!(content_of(&novel, "Ch1"), "");
    let last = observer.updates().pop().unwrap();
    assert_eq!(content_of(&last, "Ch1"), "");

    let driver = Arc::new(ScriptedDriver::new(&["Full chapter one", "Full chapter two"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(1, true));
    let novel = engine
        .run(
            novel,
            &outline(&["Ch1", "Ch2"]),
            0,
            &RunOptions::default(),
            &RecordingObserver::default(),
        )
        .await;

    assert_eq!(driver.calls(), 2);
    assert_eq!(content_of(&novel, "Ch1"), "Full chapter one");
    assert_eq!(content_of(&novel, "Ch2"), "Full chapter two");
}

#[tokio::test]
async fn test_stopped_engine_stays_stopped_until_reset() {
    let driver = Arc::new(ScriptedDriver::new(&["Text one"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(1, false));
    let observer = RecordingObserver::default();

    engine.stop();
    assert!(engine.is_stopped());
    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;
    assert_eq!(driver.calls(), 0);
    assert!(novel.chapters().is_empty());
    assert!(!engine.is_running());

    engine.reset();
    assert!(!engine.is_stopped());
    let novel = engine
        .run(novel, &outline(&["Ch1"]), 0, &RunOptions::default(), &observer)
        .await;
    assert_eq!(content_of(&novel, "Ch1"), "Text one");
    assert_eq!(observer.statuses().last().unwrap(), "All chapters complete");
}

#[tokio::test]
async fn test_output_scripts_and_failed_callbacks() {
    let driver = Arc::new(ScriptedDriver::new(&["Text one", "Text two"]));
    let engine = BatchWriteEngine::new(driver, config(1, false));
    let observer = RecordingObserver {
        scripts: vec![RegexScript::new("prose", "Text", "Prose", PLACEMENT_AI_OUTPUT)],
        fail_completion: true,
        ..Default::default()
    };

    let novel = engine
        .run(
            Novel::default(),
            &outline(&["Ch1", "Ch2"]),
            0,
            &RunOptions::default(),
            &observer,
        )
        .await;

    assert_eq!(content_of(&novel, "Ch1"), "Prose one");
    assert_eq!(content_of(&novel, "Ch2"), "Prose two");
    assert_eq!(observer.completed().len(), 2);
    assert_eq!(
        observer.statuses().last().map(String::as_str),
        Some("All chapters complete")
    );
}

#[tokio::test]
async fn test_full_outline_digest_uses_named_set() {
    let novel = Novel::builder()
        .outline_sets(vec![OutlineSet::new(
            "o1",
            "Main",
            vec![
                OutlineItem::new("Ch1", "Departure"),
                OutlineItem::new("Ch2", "Return"),
            ],
        )])
        .build()
        .unwrap();

    let driver = Arc::new(ScriptedDriver::new(&["Body"]));
    let engine = BatchWriteEngine::new(driver.clone(), config(1, false));
    let observer = RecordingObserver::default();
    let options = RunOptions {
        include_full_outline: true,
        outline_set_id: Some("o1".to_string()),
        ..Default::default()
    };

    engine
        .run(novel, &outline(&["Ch1"]), 0, &options, &observer)
        .await;

    let prompt = driver.user_prompt(0);
    assert!(prompt.contains("Full outline:\n1. Ch1: Departure\n2. Ch2: Return"));
}
