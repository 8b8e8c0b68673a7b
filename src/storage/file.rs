use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::instrument;

use crate::{
    domain::Model,
    structurizr::{Workspace, import_from_structurizr},
};

/// The shape of a model document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// A native model export.
    Native,
    /// A Structurizr workspace.
    Structurizr,
}

impl FileFormat {
    /// Classifies a parsed JSON document.
    ///
    /// A document with a `model` key alongside `views` or `documentation` is
    /// a Structurizr workspace; anything else is treated as native.
    #[must_use]
    pub fn detect(document: &Value) -> Self {
        let present = |key: &str| document.get(key).is_some_and(|value| !value.is_null());
        if present("model") && (present("views") || present("documentation")) {
            Self::Structurizr
        } else {
            Self::Native
        }
    }
}

/// Errors that can occur when loading a model.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The model file was not found.
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// An I/O error occurred.
    #[error("failed to read model file: {0}")]
    Io(#[from] io::Error),
    /// The document is not JSON, or not shaped like a model.
    #[error("failed to parse model: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when saving a model.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The model could not be serialized.
    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The file could not be written.
    #[error("failed to write model file: {0}")]
    Io(#[from] io::Error),
}

/// A loaded model together with the format it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    /// The format of the source document.
    pub format: FileFormat,
    /// The normalized model.
    pub model: Model,
}

impl ModelFile {
    /// Parses a model document, importing Structurizr workspaces.
    ///
    /// Missing or wrongly typed fields are defaulted; only malformed JSON or
    /// a document of entirely the wrong shape is an error.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] if the bytes are not a usable JSON
    /// document.
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        let document: Value = serde_json::from_slice(bytes)?;
        let format = FileFormat::detect(&document);
        let model = match format {
            FileFormat::Native => serde_json::from_value(document)?,
            FileFormat::Structurizr => {
                let workspace: Workspace = serde_json::from_value(document)?;
                import_from_structurizr(&workspace)
            }
        };
        Ok(Self { format, model })
    }
}

/// Reads and parses the model at `path`.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] if there is no file at `path`, or another
/// [`LoadError`] if it cannot be read or parsed.
#[instrument(level = "debug")]
pub fn load_model(path: &Path) -> Result<ModelFile, LoadError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io(e),
    })?;
    let file = ModelFile::parse(&bytes)?;
    tracing::debug!(format = ?file.format, elements = file.model.element_count(), "loaded model");
    Ok(file)
}

/// Writes `model` to `path` as pretty-printed JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns a [`SaveError`] if the model cannot be serialized or the file
/// cannot be written.
#[instrument(level = "debug", skip(model))]
pub fn save_model(path: &Path, model: &Model) -> Result<(), SaveError> {
    let mut json = serde_json::to_string_pretty(model)?;
    json.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}

/// Where local snapshots of the model at `path` are written: next to it,
/// with an `.autosave.json` suffix.
#[must_use]
pub fn snapshot_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "model".into(), |stem| stem.to_string_lossy());
    path.with_file_name(format!("{stem}.autosave.json"))
}
