use std::{borrow::Cow, fmt};

use crate::domain::{Element, ElementKind, Model};

/// Renders a model as Markdown documentation.
///
/// Systems are listed with their containers, followed by external systems,
/// people and a relationship table. Empty sections are omitted.
#[derive(Debug, Clone, Copy)]
pub struct Markdown<'a>(pub &'a Model);

/// Renders `model` as Markdown documentation.
#[must_use]
pub fn markdown(model: &Model) -> String {
    Markdown(model).to_string()
}

impl Markdown<'_> {
    /// Containers placed in `system`, by hint or by containment.
    fn containers_of<'m>(&'m self, system: &'m Element) -> impl Iterator<Item = &'m Element> {
        self.0.containers.iter().filter(move |container| {
            container
                .parent_system
                .as_deref()
                .or(container.parent_id.as_deref())
                == Some(system.id.as_str())
        })
    }

    /// The display name for a relationship end, falling back to the raw id.
    fn name_of<'m>(&'m self, id: &'m str) -> &'m str {
        self.0
            .elements()
            .filter(|element| element.kind != ElementKind::Shadow)
            .find(|element| element.id == id)
            .map(|element| element.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(id)
    }
}

impl fmt::Display for Markdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.0;
        writeln!(f, "# {}", model.metadata.name)?;
        writeln!(f)?;
        writeln!(f, "**Version:** {}", model.metadata.version)?;
        writeln!(f, "**Author:** {}", model.metadata.author)?;
        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;

        if !model.systems.is_empty() {
            writeln!(f, "## Software Systems")?;
            writeln!(f)?;
            for system in &model.systems {
                heading(f, system)?;
                if !system.technology.is_empty() {
                    writeln!(f, "**Technology:** {}", system.technology)?;
                    writeln!(f)?;
                }

                let mut containers = self.containers_of(system).peekable();
                if containers.peek().is_some() {
                    writeln!(f, "#### Containers")?;
                    writeln!(f)?;
                    for container in containers {
                        write!(f, "- **{}**", container.name)?;
                        if !container.technology.is_empty() {
                            write!(f, " ({})", container.technology)?;
                        }
                        if !container.description.is_empty() {
                            write!(f, ": {}", container.description)?;
                        }
                        writeln!(f)?;
                    }
                    writeln!(f)?;
                }
            }
        }

        if !model.external_systems.is_empty() {
            writeln!(f, "## External Systems")?;
            writeln!(f)?;
            for system in &model.external_systems {
                heading(f, system)?;
            }
        }

        if !model.people.is_empty() {
            writeln!(f, "## People / Actors")?;
            writeln!(f)?;
            for person in &model.people {
                heading(f, person)?;
            }
        }

        if !model.relationships.is_empty() {
            writeln!(f, "## Relationships")?;
            writeln!(f)?;
            writeln!(f, "| From | To | Description | Technology |")?;
            writeln!(f, "|------|-----|-------------|------------|")?;
            for rel in &model.relationships {
                writeln!(
                    f,
                    "| {} | {} | {} | {} |",
                    cell(self.name_of(&rel.from)),
                    cell(self.name_of(&rel.to)),
                    cell(&rel.description),
                    cell(&rel.technology)
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn heading(f: &mut fmt::Formatter<'_>, element: &Element) -> fmt::Result {
    writeln!(f, "### {}", element.name)?;
    writeln!(f)?;
    if !element.description.is_empty() {
        writeln!(f, "{}", element.description)?;
        writeln!(f)?;
    }
    Ok(())
}

/// A table cell: `-` when empty, pipes escaped.
fn cell(text: &str) -> Cow<'_, str> {
    if text.is_empty() {
        Cow::Borrowed("-")
    } else if text.contains('|') {
        Cow::Owned(text.replace('|', "\\|"))
    } else {
        Cow::Borrowed(text)
    }
}
