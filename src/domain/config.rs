use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::Metadata;

/// Configuration for the model store and its collaborators.
///
/// This struct holds settings that control view ergonomics, display
/// formatting and persistence scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The number of elements a single view may show before validation
    /// suggests splitting it.
    max_visible_elements: usize,

    /// The string placed between names when rendering an element's path.
    ///
    /// For example, `Shop / API / Orders` with the default `" / "`.
    path_separator: String,

    /// Quiet window, in milliseconds, after the last change before an
    /// automatic save is issued.
    autosave_debounce_ms: u64,

    /// Interval, in milliseconds, between periodic local snapshots.
    snapshot_interval_ms: u64,

    /// Metadata given to newly created models.
    pub default_metadata: Metadata,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_visible_elements: default_max_visible_elements(),
            path_separator: default_path_separator(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            snapshot_interval_ms: default_snapshot_interval_ms(),
            default_metadata: Metadata::default(),
        }
    }
}

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    /// The file is not valid configuration TOML.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Returns the crowded-view threshold.
    #[must_use]
    pub const fn max_visible_elements(&self) -> usize {
        self.max_visible_elements
    }

    /// Returns the separator used when joining element paths.
    #[must_use]
    pub fn path_separator(&self) -> &str {
        &self.path_separator
    }

    /// Returns the autosave quiet window.
    #[must_use]
    pub const fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// Returns the interval between periodic snapshots.
    #[must_use]
    pub const fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    /// Sets the crowded-view threshold.
    pub const fn set_max_visible_elements(&mut self, value: usize) {
        self.max_visible_elements = value;
    }

    /// Sets the path separator.
    pub fn set_path_separator(&mut self, separator: impl Into<String>) {
        self.path_separator = separator.into();
    }
}

const fn default_max_visible_elements() -> usize {
    15
}

fn default_path_separator() -> String {
    " / ".to_string()
}

const fn default_autosave_debounce_ms() -> u64 {
    2_000
}

const fn default_snapshot_interval_ms() -> u64 {
    30_000
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_max_visible_elements")]
        max_visible_elements: usize,

        #[serde(default = "default_path_separator")]
        path_separator: String,

        #[serde(default = "default_autosave_debounce_ms")]
        autosave_debounce_ms: u64,

        #[serde(default = "default_snapshot_interval_ms")]
        snapshot_interval_ms: u64,

        #[serde(default)]
        default_metadata: Metadata,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                max_visible_elements,
                path_separator,
                autosave_debounce_ms,
                snapshot_interval_ms,
                default_metadata,
            } => Self {
                max_visible_elements,
                path_separator,
                autosave_debounce_ms,
                snapshot_interval_ms,
                default_metadata,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            max_visible_elements: config.max_visible_elements,
            path_separator: config.path_separator,
            autosave_debounce_ms: config.autosave_debounce_ms,
            snapshot_interval_ms: config.snapshot_interval_ms,
            default_metadata: config.default_metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nmax_visible_elements = 9\npath_separator = \" > \"\nautosave_debounce_ms = 500\n\n[default_metadata]\nname = \"Payments\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.max_visible_elements(), 9);
        assert_eq!(config.path_separator(), " > ");
        assert_eq!(config.autosave_debounce(), Duration::from_millis(500));
        assert_eq!(config.snapshot_interval(), Duration::from_secs(30));
        assert_eq!(config.default_metadata.name, "Payments");
        assert_eq!(config.default_metadata.version, "1.0");
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read(_)));
        assert!(error.to_string().starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmax_visible_elements = \"many\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("c4m.toml");

        let mut config = Config::default();
        config.set_max_visible_elements(20);
        config.set_path_separator(" :: ");
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
