use std::path::PathBuf;

use anyhow::Context as _;
use c4model::storage::{FileFormat, load_model};
use clap::Parser;
use tracing::instrument;

use super::{Paths, Session, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Replace the model with the contents of another file")]
pub struct Import {
    /// A native model or Structurizr workspace (JSON)
    pub(crate) source: PathBuf,
}

impl Import {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let file = load_model(&self.source)
            .with_context(|| format!("failed to import {}", self.source.display()))?;

        let mut session = match Session::open(paths) {
            Ok(session) => session,
            Err(_) if !paths.model.exists() => Session::create(paths)?,
            Err(e) => return Err(e),
        };
        let elements = file.model.element_count();
        let relationships = file.model.relationships.len();
        session.store.import_model(file.model);
        session.save()?;

        let format = match file.format {
            FileFormat::Native => "model",
            FileFormat::Structurizr => "Structurizr workspace",
        };
        println!(
            "{}",
            format!(
                "Imported {format} with {elements} element(s) and {relationships} relationship(s)"
            )
            .success()
        );
        Ok(())
    }
}
