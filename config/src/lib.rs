//! Configuration for Civilisation Hub.
//!
//! Settings live in `~/.civhub/config.toml` (or the file named by
//! `CIVHUB_CONFIG`). A missing file means defaults; a file that cannot be read
//! or parsed is an error.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use toml::de::Error as TomlError;
use toml_edit::{DocumentMut, Item, Table, TomlError as EditError, value};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "CIVHUB_CONFIG";

const DATA_DIR: &str = ".civhub";
const DEFAULT_DB: &str = "civhub.db";

const fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: TomlError,
    },
    #[error("failed to write config at {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to edit config at {}: {source}", path.display())]
    Edit { path: PathBuf, source: EditError },
    #[error("config at {} has a non-table `{key}` entry", path.display())]
    NotATable { path: PathBuf, key: &'static str },
    #[error("could not determine config path")]
    NoPath,
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Write { path, .. }
            | ConfigError::Edit { path, .. }
            | ConfigError::NotATable { path, .. } => Some(path),
            ConfigError::NoPath => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct CivhubConfig {
    pub output: Option<OutputConfig>,
    pub store: Option<StoreConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    /// One of `text`, `json`, `markdown`, `table`.
    pub format: Option<String>,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default = "default_true")]
    pub balance_indicators: bool,
    pub width: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            timestamps: false,
            balance_indicators: true,
            width: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `civhub_core=debug`.
    pub level: Option<String>,
}

impl CivhubConfig {
    /// Loads from [`config_path`]. `Ok(None)` when no file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), "Failed to read config: {source}");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!(path = %path.display(), "Failed to parse config: {source}");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn output(&self) -> OutputConfig {
        self.output.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn output_format(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.format.as_deref())
    }

    /// Configured store path, else the default under the data directory.
    #[must_use]
    pub fn db_path(&self) -> Option<PathBuf> {
        self.store
            .as_ref()
            .and_then(|s| s.path.clone())
            .or_else(default_db_path)
    }

    #[must_use]
    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

/// `~/.civhub`
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    data_dir().map(|dir| dir.join("config.toml"))
}

#[must_use]
pub fn default_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(DEFAULT_DB))
}

/// Persist the output format to the config file, keeping comments and
/// formatting of everything else.
pub fn persist_output_format(format: &str) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoPath)?;
    persist_output_format_to(&path, format)
}

pub fn persist_output_format_to(path: &Path, format: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = if path.exists() {
        fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<DocumentMut>()
        .map_err(|source| ConfigError::Edit {
            path: path.to_path_buf(),
            source,
        })?;

    let output = doc
        .entry("output")
        .or_insert(Item::Table(Table::new()))
        .as_table_like_mut()
        .ok_or_else(|| ConfigError::NotATable {
            path: path.to_path_buf(),
            key: "output",
        })?;
    output.insert("format", value(format));

    atomic_write(path, doc.to_string().as_bytes()).map_err(write_err)?;
    tracing::debug!(path = %path.display(), format, "Persisted output format");
    Ok(())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = CivhubConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn parses_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[output]
format = "markdown"
color = false
width = 100

[store]
path = "/tmp/hub.db"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = CivhubConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(config.output_format(), Some("markdown"));
        let output = config.output();
        assert!(!output.color);
        assert!(output.balance_indicators);
        assert_eq!(output.width, Some(100));
        assert_eq!(config.db_path(), Some(PathBuf::from("/tmp/hub.db")));
        assert_eq!(config.log_level(), Some("debug"));
    }

    #[test]
    fn parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output\nformat = ").unwrap();
        let err = CivhubConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn persist_keeps_comments_and_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "# my settings\n[logging]\nlevel = \"info\"\n").unwrap();

        persist_output_format_to(&path, "table").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("# my settings"));
        let config = CivhubConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(config.output_format(), Some("table"));
        assert_eq!(config.log_level(), Some("info"));
    }

    #[test]
    fn persist_rejects_non_table_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "output = \"x\"\n").unwrap();

        let err = persist_output_format_to(&path, "json").unwrap_err();
        assert!(matches!(err, ConfigError::NotATable { key: "output", .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "output = \"x\"\n");
    }

    #[test]
    fn persist_into_inline_output_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "output = { color = false }\n").unwrap();

        persist_output_format_to(&path, "table").unwrap();
        let config = CivhubConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(config.output_format(), Some("table"));
        assert!(!config.output().color);
    }

    #[test]
    fn persist_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("config.toml");
        persist_output_format_to(&path, "json").unwrap();
        let config = CivhubConfig::load_from(&path).unwrap().unwrap();
        assert_eq!(config.output_format(), Some("json"));
    }
}
