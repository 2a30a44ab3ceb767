use async_trait::async_trait;
use futures::StreamExt;
use picname_library::batch::{self, BatchEvent, Placement};
use picname_library::collaborator::TextExtractor;
use picname_library::collaborator::error::Result as CollaboratorResult;
use picname_library::error::{ErrorKind, Result};
use picname_library::{ContentNamer, NameGenerator};
use picname_naming::{FilenameBuilder, Wordlists};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Names every image the same, recording when it was asked.
#[derive(Default)]
struct Constant {
    name: &'static str,
    calls: Mutex<Vec<(PathBuf, Instant)>>,
}
impl Constant {
    fn new(name: &'static str) -> Self {
        Self { name, ..Default::default() }
    }

    fn calls(&self) -> Vec<(PathBuf, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}
#[async_trait]
impl NameGenerator for Constant {
    async fn generate(&self, image: &Path) -> Result<String> {
        self.calls.lock().unwrap().push((image.to_path_buf(), Instant::now()));
        Ok(self.name.to_string())
    }
}

/// Fails for files whose name contains a marker; names the rest after their stem.
struct FailOn(&'static str, ErrorKind);
#[async_trait]
impl NameGenerator for FailOn {
    async fn generate(&self, image: &Path) -> Result<String> {
        let stem = image.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        if stem.contains(self.0) {
            exn::bail!(match self.1 {
                ErrorKind::QuotaExhausted => ErrorKind::QuotaExhausted,
                _ => ErrorKind::Generate,
            });
        }
        Ok(format!("renamed {stem}"))
    }
}

fn images(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> =
        std::fs::read_dir(dir).unwrap().map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_collisions() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    images(source.path(), &["a.jpg", "b.jpg", "c.jpg"]);

    let summary = batch::run(source.path(), target.path(), 100, &Constant::new("sunset beach")).await.unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, source.path().join("c.jpg"));
    assert_eq!(file_names(target.path()), vec!["sunset beach.jpg", "sunset beach_.jpg"]);
    assert_eq!(file_names(source.path()), vec!["c.jpg"]);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    images(source.path(), &["1.png", "2.png", "3.png"]);
    let generator = Constant::new("frame");

    let events: Vec<_> =
        batch::batch(source.path(), target.path(), 2, &generator).map(|event| event.unwrap()).collect().await;

    let pauses: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::RateLimited(wait) => Some(*wait),
            _ => None,
        })
        .collect();
    assert_eq!(pauses.len(), 1);
    assert!(pauses[0] <= Duration::from_secs(61));

    let calls = generator.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[1].1 - calls[0].1 < Duration::from_secs(1));
    assert!(calls[2].1 - calls[0].1 >= Duration::from_secs(61));
    assert_eq!(file_names(target.path()), vec!["frame.png", "frame_.png"]);
    let BatchEvent::Complete(summary) = events.last().unwrap() else {
        panic!("stream didn't complete");
    };
    assert_eq!((summary.processed, summary.failures.len()), (2, 1));
}

#[tokio::test]
async fn test_generator_failure_skips_file() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    images(source.path(), &["broken.png", "fine.webp", "notes.md"]);

    let events: Vec<_> = batch::batch(source.path(), target.path(), 100, &FailOn("broken", ErrorKind::Generate))
        .map(|event| event.unwrap())
        .collect()
        .await;

    let skipped: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::Skipped(failure) => Some(failure.path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec![source.path().join("broken.png")]);
    let processed: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::Processed(processed) => Some(processed.placement.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(processed, vec![Placement::Moved(target.path().join("renamed fine.webp"))]);
    assert_eq!(file_names(source.path()), vec!["broken.png", "notes.md"]);
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
    let temp_dir = tempfile::tempdir().unwrap();
    let target = temp_dir.path().join("named");

    let err = batch::run(&temp_dir.path().join("missing"), &target, 100, &Constant::new("x")).await.unwrap_err();

    assert!(matches!(&*err, ErrorKind::Batch));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_quota_exhausted_stops_run() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    images(source.path(), &["a.png", "b-quota.png", "c.png"]);

    let events: Vec<_> =
        batch::batch(source.path(), target.path(), 100, &FailOn("quota", ErrorKind::QuotaExhausted)).collect().await;

    assert!(events.last().unwrap().is_err());
    assert!(!events.iter().any(|event| matches!(event, Ok(BatchEvent::Complete(_)))));
    assert_eq!(file_names(target.path()), vec!["renamed a.png"]);
    assert_eq!(file_names(source.path()), vec!["b-quota.png", "c.png"]);
}

struct Ocr(String);
#[async_trait]
impl TextExtractor for Ocr {
    async fn extract_text(&self, _image: &Path) -> CollaboratorResult<String> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn test_content_namer_end_to_end() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    images(source.path(), &["IMG_0042.jpeg"]);
    let builder = FilenameBuilder::new(Arc::new(Wordlists::default())).unwrap();
    let namer = ContentNamer::new(builder).with_text_extractor(Ocr("2023-04-22 SUNSET beach 3K".into()));

    let summary = batch::run(source.path(), target.path(), 100, &namer).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(file_names(target.path()), vec!["20230422 SUNSET beach.jpeg"]);
}

#[tokio::test]
async fn test_multibyte_text_still_fits() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    images(source.path(), &["scan.png"]);
    let text: Vec<String> = ('\u{4E00}'..='\u{4E27}').map(|c| format!("東京都{c}")).collect();
    let builder = FilenameBuilder::new(Arc::new(Wordlists::default())).unwrap();
    let namer = ContentNamer::new(builder).with_text_extractor(Ocr(format!("2023-04-22 {}", text.join(" "))));

    let summary = batch::run(source.path(), target.path(), 100, &namer).await.unwrap();

    assert_eq!((summary.processed, summary.failures.len()), (1, 0));
    let names = file_names(target.path());
    assert!(names[0].starts_with("20230422 東京都"));
    assert!(names[0].len() <= picname_storage::MAX_FILE_NAME_BYTES);
}
