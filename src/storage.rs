//! Model persistence.
//!
//! Models are stored as pretty-printed JSON. Files produced by Structurizr
//! are recognised on load and imported. Save scheduling (debouncing,
//! duplicate suppression, periodic snapshots) is handled by [`AutoSave`],
//! which never touches the filesystem itself.

mod file;
pub use file::{FileFormat, LoadError, ModelFile, SaveError, load_model, save_model, snapshot_path};

mod autosave;
pub use autosave::{AutoSave, SaveRequest, SaveStatus, fingerprint};
