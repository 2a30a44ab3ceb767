use crate::NameGenerator;
use crate::batch::error::{ErrorKind as BatchErrorKind, Result as BatchResult};
use crate::batch::file::{Placement, place};
use crate::batch::window::RateWindow;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use picname_storage::{FileInfo, LocalFolder};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Progress events emitted by [`batch`] as it works through a source folder.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete), exactly once, with the
///    number of images found.
/// 3. [`RateLimited`](Self::RateLimited), [`Processed`](Self::Processed) and
///    [`Skipped`](Self::Skipped), as files are worked through. Every image
///    ends up either processed or skipped.
/// 4. [`Complete`](Self::Complete), exactly once, with the run summary.
///
/// A fatal error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum BatchEvent {
    Started,
    DiscoveryComplete(u64),
    /// The rate limit was reached; nothing happens for this long.
    RateLimited(Duration),
    Processed(Processed),
    /// A file was left where it was.
    Skipped(Failure),
    Complete(RunSummary),
}

/// A file that was renamed and moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub source: PathBuf,
    pub placement: Placement,
    /// Files processed so far, including this one.
    pub processed: u64,
    pub total: u64,
}

/// A file that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: u64,
    pub total: u64,
    pub failures: Vec<Failure>,
}
impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Streams [`BatchEvent`]s while renaming every image directly inside
/// `source` and moving it into `target` (created if needed).
///
/// Files are processed one at a time, in path order. No more than
/// `rate_limit` files are completed in any rolling 61-second window; when
/// the window is full the stream pauses until the oldest completion ages out.
///
/// # Errors
///
/// Yields an [`Exn<LibraryErrorKind::Batch>`](LibraryErrorKind::Batch) and
/// stops if the source folder can't be read, the target folder can't be
/// created, or a collaborator's quota runs out. Any other failure only skips
/// the file concerned.
pub fn batch<'a, G>(
    source: &'a Path,
    target: &'a Path,
    rate_limit: u32,
    generator: &'a G,
) -> impl Stream<Item = LibraryResult<BatchEvent>> + 'a
where
    G: NameGenerator + ?Sized,
{
    stream! {
        for await event in batch_inner(source, target, rate_limit, generator) {
            yield event.or_raise(|| LibraryErrorKind::Batch);
        }
    }
}

/// Drains [`batch`], returning the final summary.
pub async fn run<G>(source: &Path, target: &Path, rate_limit: u32, generator: &G) -> LibraryResult<RunSummary>
where
    G: NameGenerator + ?Sized,
{
    let mut events = std::pin::pin!(batch(source, target, rate_limit, generator));
    let mut summary = None;
    while let Some(event) = events.next().await {
        if let BatchEvent::Complete(done) = event? {
            summary = Some(done);
        }
    }
    match summary {
        Some(summary) => Ok(summary),
        None => exn::bail!(LibraryErrorKind::Batch),
    }
}

fn batch_inner<'a, G>(
    source: &'a Path,
    target: &'a Path,
    rate_limit: u32,
    generator: &'a G,
) -> impl Stream<Item = BatchResult<BatchEvent>> + 'a
where
    G: NameGenerator + ?Sized,
{
    stream!({
        yield Ok(BatchEvent::Started);

        let files = match list_source(source).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let target = match LocalFolder::create(target).or_raise(|| BatchErrorKind::Target) {
            Ok(folder) => folder,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let total = u64::try_from(files.len()).unwrap_or(u64::MAX);
        tracing::info!(total, source = %source.display(), target = %target.root().display(), "Images found");
        yield Ok(BatchEvent::DiscoveryComplete(total));

        let mut window = RateWindow::new(rate_limit);
        let mut summary = RunSummary { total, ..Default::default() };
        for file in files {
            if let Some(wait) = window.delay(Instant::now()) {
                tracing::info!(wait_secs = wait.as_secs(), limit = window.limit(), "Rate limit reached; pausing");
                yield Ok(BatchEvent::RateLimited(wait));
                tokio::time::sleep(wait).await;
            }

            match process(&target, generator, &file).await {
                Ok(placement) => {
                    window.record(Instant::now());
                    summary.processed += 1;
                    tracing::info!(
                        from = %file.path.display(),
                        to = %placement.path().display(),
                        processed = summary.processed,
                        total,
                        "Renamed image",
                    );
                    yield Ok(BatchEvent::Processed(Processed {
                        source: file.path,
                        placement,
                        processed: summary.processed,
                        total,
                    }));
                },
                Err(e) if e.deref().is_fatal() => {
                    yield Err(e);
                    return;
                },
                Err(e) => {
                    let failure = Failure { path: file.path, reason: e.deref().to_string() };
                    tracing::warn!(path = %failure.path.display(), reason = %failure.reason, "Skipped image");
                    summary.failures.push(failure.clone());
                    yield Ok(BatchEvent::Skipped(failure));
                },
            }
        }

        tracing::info!(processed = summary.processed, total, failed = summary.failures.len(), "Batch complete");
        yield Ok(BatchEvent::Complete(summary));
    })
}

async fn list_source(source: &Path) -> BatchResult<Vec<FileInfo>> {
    let folder = LocalFolder::open(source).or_raise(|| BatchErrorKind::Source)?;
    folder.list().await.or_raise(|| BatchErrorKind::Source)
}

/// Names a single file and moves it into place.
async fn process<G>(target: &LocalFolder, generator: &G, file: &FileInfo) -> BatchResult<Placement>
where
    G: NameGenerator + ?Sized,
{
    let name = match generator.generate(&file.path).await {
        Ok(name) => name,
        Err(e) if matches!(e.deref(), LibraryErrorKind::QuotaExhausted) => {
            return Err(e).or_raise(|| BatchErrorKind::QuotaExhausted);
        },
        Err(e) => {
            let reason = e.deref().to_string();
            return Err(e).or_raise(|| BatchErrorKind::Generate(reason));
        },
    };
    let name = name.trim();
    if name.is_empty() {
        exn::bail!(BatchErrorKind::Generate("empty name".into()));
    }
    place(target, file, name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Named(&'static str);
    #[async_trait]
    impl NameGenerator for Named {
        async fn generate(&self, _image: &Path) -> LibraryResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_event_order() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.png"), b"a").unwrap();
        std::fs::write(source.path().join("notes.txt"), b"not an image").unwrap();

        let events: Vec<_> = batch(source.path(), target.path(), 10, &Named("harbour"))
            .map(|event| event.unwrap())
            .collect()
            .await;
        assert!(matches!(events[0], BatchEvent::Started));
        assert!(matches!(events[1], BatchEvent::DiscoveryComplete(1)));
        let BatchEvent::Processed(processed) = &events[2] else {
            panic!("expected a processed file, got {:?}", events[2]);
        };
        assert_eq!(processed.placement, Placement::Moved(target.path().join("harbour.png")));
        assert_eq!((processed.processed, processed.total), (1, 1));
        let BatchEvent::Complete(summary) = &events[3] else {
            panic!("expected completion, got {:?}", events[3]);
        };
        assert!(summary.is_success());
        assert_eq!(events.len(), 4);
        assert!(source.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_blank_name_is_skipped() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.png"), b"a").unwrap();
        let summary = run(source.path(), target.path(), 10, &Named("   ")).await.unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.failures.len(), 1);
        assert!(source.path().join("a.png").exists());
    }

    #[tokio::test]
    async fn test_creates_target() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let nested = target.path().join("named/images");
        let summary = run(source.path(), &nested, 10, &Named("x")).await.unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(nested.is_dir());
    }
}
