use std::path::PathBuf;

use c4model::{export, structurizr::export_to_structurizr};
use clap::Parser;
use tracing::instrument;

use super::{Paths, Session, emit, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Render the model in another format")]
pub struct Export {
    /// The output format
    format: Format,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Format {
    /// A Structurizr workspace (JSON)
    Structurizr,
    /// Mermaid C4 diagram
    Mermaid,
    /// C4-PlantUML diagram
    Plantuml,
    /// draw.io (diagrams.net) document
    Drawio,
    /// Markdown documentation
    Markdown,
    /// The native model document
    Json,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let session = Session::open(paths)?;
        let model = session.store.model();

        let rendered = match self.format {
            Format::Structurizr => serde_json::to_string_pretty(&export_to_structurizr(model))?,
            Format::Mermaid => export::mermaid(model),
            Format::Plantuml => export::plantuml(model),
            Format::Drawio => export::drawio(model),
            Format::Markdown => export::markdown(model),
            Format::Json => serde_json::to_string_pretty(model)?,
        };

        emit(self.output.as_deref(), &rendered)?;
        if let Some(path) = &self.output {
            eprintln!(
                "{}",
                format!("Exported {:?} to {}", self.format, path.display()).success()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use c4model::{ElementKind, ElementPatch, RelationshipPatch, domain::LineStyle};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn drawio_export_is_written_to_file() {
        let tmp = tempdir().unwrap();
        let paths = Paths {
            model: tmp.path().join("model.json"),
            config: None,
        };
        let mut session = Session::create(&paths).unwrap();
        let store = &mut session.store;
        let user = store.add_element(ElementKind::Person, ElementPatch::named("User"));
        let shop = store.add_element(ElementKind::System, ElementPatch::named("Shop"));
        store.add_relationship(
            &user.id,
            &shop.id,
            RelationshipPatch {
                line_style: Some(LineStyle::Dotted),
                ..RelationshipPatch::described("browses")
            },
        );
        session.save().unwrap();

        let output = tmp.path().join("shop.drawio");
        Export {
            format: Format::Drawio,
            output: Some(output.clone()),
        }
        .run(&paths)
        .unwrap();

        let xml = std::fs::read_to_string(output).unwrap();
        assert!(xml.contains("<mxfile"));
        assert!(xml.contains("value=\"browses\""));
        assert!(xml.contains("dashed=1;dashPattern=2 2;"));
    }
}
