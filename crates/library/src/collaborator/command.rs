use crate::collaborator::error::{ErrorKind, Result};
use crate::collaborator::{Describer, EntityExtractor, TextExtractor};
use async_trait::async_trait;
use exn::ResultExt;
use picname_config::{Collaborators, CommandConfig, PATH_PLACEHOLDER};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

// Text extractors commonly emit Markdown; headings carry no extra meaning.
static HEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s*").unwrap());

/// A collaborator backed by an external program.
///
/// Image-based roles pass the image path through the arguments (every
/// [`PATH_PLACEHOLDER`] is substituted); the entity role writes the text to
/// the program's stdin. Whatever the program prints on stdout is the result.
/// A non-zero exit status is an error, classified from what was printed on
/// stderr.
#[derive(Clone, Debug)]
pub struct CommandCollaborator {
    program: PathBuf,
    args: Vec<String>,
}
impl CommandCollaborator {
    /// Uses the program exactly as configured, without checking it exists.
    pub fn new(config: &CommandConfig) -> Self {
        Self { program: PathBuf::from(&config.program), args: config.args.clone() }
    }

    fn args_for(&self, image: Option<&Path>) -> Vec<String> {
        match image {
            Some(image) => {
                let image = image.to_string_lossy();
                self.args.iter().map(|arg| arg.replace(PATH_PLACEHOLDER, &image)).collect()
            },
            None => self.args.clone(),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, input), fields(program = %self.program.display()))]
    async fn run(&self, image: Option<&Path>, input: Option<&str>) -> Result<String> {
        let name = self.program.display().to_string();
        let mut child = Command::new(&self.program)
            .args(self.args_for(image))
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .or_raise(|| ErrorKind::Spawn(name.clone()))?;

        // Feed stdin while output is collected, otherwise a chatty program can
        // fill its stdout pipe and never get to the end of its input.
        let stdin = child.stdin.take();
        let feed = async move {
            match (stdin, input) {
                (Some(mut stdin), Some(input)) => stdin.write_all(input.as_bytes()).await,
                _ => Ok(()),
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.or_raise(|| ErrorKind::Spawn(name.clone()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(status = %output.status, stderr = %stderr.trim(), "Collaborator failed");
            exn::bail!(ErrorKind::classify(&stderr));
        }
        // Only matters if the program succeeded without reading its input.
        fed.or_raise(|| ErrorKind::Spawn(name))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextExtractor for CommandCollaborator {
    async fn extract_text(&self, image: &Path) -> Result<String> {
        let output = self.run(Some(image), None).await?;
        Ok(HEADING_MARKER.replace_all(&output, "").trim().to_string())
    }
}

#[async_trait]
impl Describer for CommandCollaborator {
    async fn describe(&self, image: &Path) -> Result<String> {
        let output = self.run(Some(image), None).await?;
        Ok(output.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

#[async_trait]
impl EntityExtractor for CommandCollaborator {
    async fn entities(&self, text: &str) -> Result<Vec<String>> {
        let output = self.run(None, Some(text)).await?;
        Ok(output.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect())
    }
}

/// Checks that every configured collaborator program can be found.
///
/// All programs are checked (and logged) before failing on the first one
/// that is missing.
pub fn check_setup(collaborators: &Collaborators) -> Result<()> {
    let mut missing = None;
    for (role, config) in collaborators.configured() {
        match which::which(&config.program) {
            Ok(path) => tracing::info!(role, program = %path.display(), "Collaborator found"),
            Err(_) => {
                tracing::error!(role, program = %config.program, "Collaborator program not found");
                if missing.is_none() {
                    missing = Some(config.program.clone());
                }
            },
        }
    }
    if collaborators.configured().next().is_none() {
        tracing::warn!("No collaborators configured; every image will get a fallback name");
    }
    match missing {
        Some(program) => exn::bail!(ErrorKind::NotFound(program)),
        None => Ok(()),
    }
}
