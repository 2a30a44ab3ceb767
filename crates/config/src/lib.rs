//! Layered configuration.
//!
//! Values are merged from (lowest to highest priority):
//!
//! 1. Built-in defaults.
//! 2. A configuration file: either given explicitly, or `picname.toml` in the
//!    platform configuration directory if it exists. TOML, YAML and JSON are
//!    supported, chosen by file extension.
//! 3. `PICNAME_`-prefixed environment variables. Nested keys are separated by
//!    a double underscore, e.g. `PICNAME_WORDLISTS__DIRECTORY`.
//! 4. Command-line [`Overrides`].

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use picname_naming::{DEFAULT_MAX_LENGTH, FALLBACK_MAX, WordlistPaths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE: &str = "./images/to_name";
pub const DEFAULT_TARGET: &str = "./images/named_images";
pub const DEFAULT_RATE_LIMIT: u32 = 100;
pub const CONFIG_FILE_NAME: &str = "picname.toml";
pub const ENV_PREFIX: &str = "PICNAME_";
/// Placeholder in collaborator arguments that is replaced by the image path.
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder containing the images to rename.
    pub source: PathBuf,
    /// Folder renamed images are moved into.
    pub target: PathBuf,
    /// Maximum number of images renamed per minute.
    pub rate_limit: u32,
    /// Maximum length of a generated name, excluding the extension.
    pub max_length: usize,
    pub wordlists: WordlistConfig,
    pub collaborators: Collaborators,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            target: PathBuf::from(DEFAULT_TARGET),
            rate_limit: DEFAULT_RATE_LIMIT,
            max_length: DEFAULT_MAX_LENGTH,
            wordlists: WordlistConfig::default(),
            collaborators: Collaborators::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordlistConfig {
    /// Folder the wordlist files are looked up in.
    pub directory: PathBuf,
    pub exclude: String,
    pub include: String,
    pub names: String,
    pub non_personal_names: String,
}
impl Default for WordlistConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./wordlists"),
            exclude: "words_to_remove.txt".into(),
            include: "words_to_include.txt".into(),
            names: "names_to_include.txt".into(),
            non_personal_names: "non_personal_names_to_include.txt".into(),
        }
    }
}
impl WordlistConfig {
    pub fn paths(&self) -> WordlistPaths {
        WordlistPaths {
            exclude: self.directory.join(&self.exclude),
            include: self.directory.join(&self.include),
            names: self.directory.join(&self.names),
            non_personal_names: self.directory.join(&self.non_personal_names),
        }
    }
}

/// External programs performing the content analysis. Any of them may be
/// left unconfigured, in which case it contributes no text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collaborators {
    /// Prints the text visible in an image.
    pub ocr: Option<CommandConfig>,
    /// Prints a line of keywords describing an image.
    pub describe: Option<CommandConfig>,
    /// Reads text on stdin and prints notable terms found in it.
    pub entities: Option<CommandConfig>,
}
impl Collaborators {
    /// Configured collaborators, labelled by role.
    pub fn configured(&self) -> impl Iterator<Item = (&'static str, &CommandConfig)> {
        [("ocr", &self.ocr), ("describe", &self.describe), ("entities", &self.entities)]
            .into_iter()
            .filter_map(|(role, command)| command.as_ref().map(|command| (role, command)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    /// Arguments; [`PATH_PLACEHOLDER`] is substituted with the image path.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Config {
    /// Loads and validates the full configuration.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let figment = Self::figment(file)?
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides));
        Self::from_figment(&figment)
    }

    /// Defaults merged with the configuration file, if any.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match file {
            Some(file) if !file.is_file() => exn::bail!(ErrorKind::MissingFile(file.to_path_buf())),
            Some(file) => Some(file.to_path_buf()),
            None => Self::default_file().filter(|file| file.is_file()),
        };
        let Some(file) = file else {
            tracing::debug!("No configuration file found; using defaults");
            return Ok(figment);
        };
        tracing::debug!(path = %file.display(), "Loading configuration file");
        let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file_exact(&file)),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(&file)),
            Some("json") => figment.merge(Json::file_exact(&file)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
        })
    }

    /// Extracts and validates a configuration from an arbitrary figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the per-user configuration file, if the platform has one.
    pub fn default_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "picname").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limit == 0 {
            exn::bail!(ErrorKind::Invalid("rate_limit must be at least 1".into()));
        }
        // Room for a date, a space and the longest fallback name.
        let minimum = 8 + 1 + format!("unnamed{FALLBACK_MAX}").len();
        if self.max_length < minimum {
            exn::bail!(ErrorKind::Invalid(format!("max_length must be at least {minimum}")));
        }
        if let Some((role, _)) = self.collaborators.configured().find(|(_, command)| command.program.trim().is_empty()) {
            exn::bail!(ErrorKind::Invalid(format!("collaborator `{role}` has an empty program")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(extension).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit, 100);
        assert_eq!(config.max_length, 135);
        assert_eq!(config.wordlists.paths().exclude, Path::new("./wordlists/words_to_remove.txt"));
        assert_eq!(config.collaborators.configured().count(), 0);
    }

    #[test]
    fn test_toml_file() {
        let file = write_config(
            ".toml",
            r#"
            rate_limit = 2
            source = "/tmp/in"

            [wordlists]
            directory = "/etc/picname"

            [collaborators.ocr]
            program = "tesseract"
            args = ["{path}", "-"]
            "#,
        );
        let config = Config::from_figment(&Config::figment(Some(file.path())).unwrap()).unwrap();
        assert_eq!(config.rate_limit, 2);
        assert_eq!(config.source, Path::new("/tmp/in"));
        // Unset values keep their defaults.
        assert_eq!(config.target, Path::new(DEFAULT_TARGET));
        assert_eq!(config.wordlists.paths().names, Path::new("/etc/picname/names_to_include.txt"));
        let ocr = config.collaborators.ocr.unwrap();
        assert_eq!(ocr.program, "tesseract");
        assert_eq!(ocr.args, vec!["{path}", "-"]);
    }

    #[test]
    fn test_yaml_file() {
        let file = write_config(".yml", "max_length: 60\ncollaborators:\n  describe:\n    program: describe-image\n");
        let config = Config::from_figment(&Config::figment(Some(file.path())).unwrap()).unwrap();
        assert_eq!(config.max_length, 60);
        assert_eq!(config.collaborators.describe.unwrap().args, Vec::<String>::new());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::figment(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingFile(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = write_config(".ini", "rate_limit=1");
        let err = Config::figment(Some(file.path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_overrides_win() {
        let file = write_config(".toml", "rate_limit = 2\nmax_length = 50\n");
        let overrides = Overrides { rate_limit: Some(7), ..Default::default() };
        let figment = Config::figment(Some(file.path())).unwrap().merge(Serialized::defaults(&overrides));
        let config = Config::from_figment(&figment).unwrap();
        assert_eq!(config.rate_limit, 7);
        assert_eq!(config.max_length, 50);
    }

    #[rstest]
    #[case("rate_limit = 0")]
    #[case("max_length = 18")]
    #[case("[collaborators.entities]\nprogram = \"  \"")]
    fn test_invalid(#[case] contents: &str) {
        let file = write_config(".toml", contents);
        let err = Config::from_figment(&Config::figment(Some(file.path())).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_malformed_file() {
        let file = write_config(".toml", "rate_limit = \"lots\"");
        let err = Config::from_figment(&Config::figment(Some(file.path())).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(_)));
    }
}
