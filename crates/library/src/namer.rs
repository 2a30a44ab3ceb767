use crate::collaborator::error::{ErrorKind as CollaboratorErrorKind, Result as CollaboratorResult};
use crate::collaborator::{CommandCollaborator, Describer, EntityExtractor, TextExtractor, Unconfigured};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use picname_config::Config;
use picname_naming::{DateToken, FilenameBuilder, Wordlists, resolve_date};
use std::future::Future;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;

/// Produces a filename (without extension) for an image.
#[async_trait]
pub trait NameGenerator: Send + Sync {
    async fn generate(&self, image: &Path) -> Result<String>;
}

/// Names images after what is in them.
///
/// For each image:
///
/// 1. The text in the image is extracted. If that fails (unsupported image,
///    or still throttled after one retry) the image gets a fallback name. A
///    text extractor that can't be run at all is an error.
/// 2. The image is described in keywords.
/// 3. A date is resolved from the extracted text, the path, or the
///    modification time, in that order.
/// 4. Notable terms are picked out of the extracted text, and wordlist names
///    mentioned in it are added.
/// 5. Terms come first, description keywords second and the extracted text
///    last; each is cleaned, then the words are packed into a name behind the
///    date.
///
/// Steps 2 and 4 are best effort: a failing collaborator there only means
/// fewer words to choose from.
pub struct ContentNamer {
    builder: FilenameBuilder,
    text: Arc<dyn TextExtractor>,
    describer: Arc<dyn Describer>,
    entities: Arc<dyn EntityExtractor>,
}
impl ContentNamer {
    /// A namer with no collaborators configured.
    pub fn new(builder: FilenameBuilder) -> Self {
        Self {
            builder,
            text: Arc::new(Unconfigured),
            describer: Arc::new(Unconfigured),
            entities: Arc::new(Unconfigured),
        }
    }

    /// Builds a namer from configuration: loads the wordlists and wires up
    /// command collaborators for every configured role.
    pub fn from_config(config: &Config) -> Result<Self> {
        let wordlists = Wordlists::load(&config.wordlists.paths()).or_raise(|| ErrorKind::Wordlists)?;
        let builder = FilenameBuilder::new(Arc::new(wordlists))
            .or_raise(|| ErrorKind::Wordlists)?
            .with_max_length(config.max_length);
        let mut namer = Self::new(builder);
        let collaborators = &config.collaborators;
        if let Some(ocr) = &collaborators.ocr {
            namer = namer.with_text_extractor(CommandCollaborator::new(ocr));
        }
        if let Some(describe) = &collaborators.describe {
            namer = namer.with_describer(CommandCollaborator::new(describe));
        }
        if let Some(entities) = &collaborators.entities {
            namer = namer.with_entity_extractor(CommandCollaborator::new(entities));
        }
        Ok(namer)
    }

    pub fn with_text_extractor(mut self, text: impl TextExtractor + 'static) -> Self {
        self.text = Arc::new(text);
        self
    }

    pub fn with_describer(mut self, describer: impl Describer + 'static) -> Self {
        self.describer = Arc::new(describer);
        self
    }

    pub fn with_entity_extractor(mut self, entities: impl EntityExtractor + 'static) -> Self {
        self.entities = Arc::new(entities);
        self
    }

    pub fn builder(&self) -> &FilenameBuilder {
        &self.builder
    }

    /// Name for an image whose content couldn't be analysed: just the date
    /// from the path or modification time, or `unnamed<N>` without one.
    fn fallback(&self, image: &Path, modified: Option<OffsetDateTime>) -> String {
        match resolve_date("", image, modified) {
            Some((date, source)) => {
                tracing::info!(%date, %source, "Date-only fallback name");
                date.to_string()
            },
            None => self.builder.fallback(None),
        }
    }

    /// Candidate words by priority: notable terms, then description
    /// keywords, then whatever else the extracted text has to offer.
    fn compose(&self, text: &str, description: &str, entities: Vec<String>, date: Option<&DateToken>) -> String {
        let mut terms = entities;
        terms.extend(self.builder.wordlists().mentioned_in(text));
        tracing::debug!(?terms, description, "Candidate words");
        self.builder.name([terms.join(" ").as_str(), description, text], date)
    }
}

#[async_trait]
impl NameGenerator for ContentNamer {
    #[tracing::instrument(level = "info", skip(self), fields(image = %image.display()))]
    async fn generate(&self, image: &Path) -> Result<String> {
        let modified = picname_storage::stat(image).await.ok().map(|info| info.modified);

        let text = match retry_once("text extraction", || self.text.extract_text(image)).await {
            Ok(text) => text,
            Err(e) if matches!(e.deref(), CollaboratorErrorKind::QuotaExhausted) => {
                return Err(e).or_raise(|| ErrorKind::QuotaExhausted);
            },
            // A missing or broken program says nothing about the image.
            Err(e) if matches!(e.deref(), CollaboratorErrorKind::Spawn(_) | CollaboratorErrorKind::NotFound(_)) => {
                return Err(e).or_raise(|| ErrorKind::Generate);
            },
            Err(e) => {
                tracing::warn!(error = %e.deref(), "Could not read text from image; using a fallback name");
                return Ok(self.fallback(image, modified));
            },
        };

        let description = match retry_once("description", || self.describer.describe(image)).await {
            Ok(description) => description,
            Err(e) if matches!(e.deref(), CollaboratorErrorKind::QuotaExhausted) => {
                return Err(e).or_raise(|| ErrorKind::QuotaExhausted);
            },
            Err(e) => {
                tracing::warn!(error = %e.deref(), "Could not describe image");
                String::new()
            },
        };

        let date = resolve_date(&text, image, modified);
        match &date {
            Some((date, source)) => tracing::info!(%date, %source, "Date found"),
            None => tracing::info!("No date found"),
        }

        let entities = match text.trim().is_empty() {
            true => Vec::new(),
            false => match retry_once("entity extraction", || self.entities.entities(&text)).await {
                Ok(entities) => entities,
                Err(e) if matches!(e.deref(), CollaboratorErrorKind::QuotaExhausted) => {
                    return Err(e).or_raise(|| ErrorKind::QuotaExhausted);
                },
                Err(e) => {
                    tracing::warn!(error = %e.deref(), "Could not extract entities");
                    Vec::new()
                },
            },
        };

        let name = self.compose(&text, &description, entities, date.as_ref().map(|(date, _)| date));
        tracing::info!(name, "Generated name");
        Ok(name)
    }
}

/// Calls a collaborator, and if it asks to be called again after a number of
/// seconds, waits that long and calls it exactly once more.
async fn retry_once<T, F, Fut>(role: &str, mut call: F) -> CollaboratorResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CollaboratorResult<T>>,
{
    let first = call().await;
    let wait = match &first {
        Err(e) => match e.deref() {
            CollaboratorErrorKind::RetryAfter(wait) => Some(*wait),
            _ => None,
        },
        Ok(_) => None,
    };
    let Some(wait) = wait else {
        return first;
    };
    tracing::info!(role, wait_secs = wait.as_secs(), "Throttled; waiting before trying again");
    tokio::time::sleep(wait).await;
    call().await
}
