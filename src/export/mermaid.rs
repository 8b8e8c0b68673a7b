use std::fmt;

use super::{quoted, sanitize_id};
use crate::domain::{ArrowDirection, Element, Model};

/// Renders a model as a Mermaid C4 diagram.
///
/// The diagram type is `C4Component` if the model has components,
/// `C4Container` if it has containers, and `C4Context` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Mermaid<'a>(pub &'a Model);

/// Renders `model` as a Mermaid C4 diagram.
#[must_use]
pub fn mermaid(model: &Model) -> String {
    Mermaid(model).to_string()
}

impl Mermaid<'_> {
    fn diagram_type(&self) -> &'static str {
        if !self.0.components.is_empty() {
            "C4Component"
        } else if !self.0.containers.is_empty() {
            "C4Container"
        } else {
            "C4Context"
        }
    }
}

impl fmt::Display for Mermaid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.0;
        writeln!(f, "{}", self.diagram_type())?;
        writeln!(f, "  title {}", model.metadata.name)?;
        writeln!(f)?;

        section(f, &model.people, |f, person| {
            writeln!(
                f,
                "  Person({}, \"{}\", \"{}\")",
                sanitize_id(&person.id),
                quoted(&person.name),
                quoted(&person.description)
            )
        })?;
        section(f, &model.systems, |f, system| {
            write!(
                f,
                "  System({}, \"{}\", \"{}\"",
                sanitize_id(&system.id),
                quoted(&system.name),
                quoted(&system.description)
            )?;
            if !system.technology.is_empty() {
                write!(f, ", \"{}\"", quoted(&system.technology))?;
            }
            writeln!(f, ")")
        })?;
        section(f, &model.external_systems, |f, system| {
            writeln!(
                f,
                "  System_Ext({}, \"{}\", \"{}\")",
                sanitize_id(&system.id),
                quoted(&system.name),
                quoted(&system.description)
            )
        })?;
        section(f, &model.containers, |f, container| {
            leveled(f, "Container", container)
        })?;
        section(f, &model.components, |f, component| {
            leveled(f, "Component", component)
        })?;

        for rel in &model.relationships {
            let macro_name = if rel.arrow_direction == ArrowDirection::Left {
                "Rel_Back"
            } else {
                "Rel"
            };
            let label = if rel.description.is_empty() {
                "uses"
            } else {
                &rel.description
            };
            write!(
                f,
                "  {macro_name}({}, {}, \"{}\"",
                sanitize_id(&rel.from),
                sanitize_id(&rel.to),
                quoted(label)
            )?;
            if !rel.technology.is_empty() {
                write!(f, ", \"{}\"", quoted(&rel.technology))?;
            }
            writeln!(f, ")")?;
        }
        Ok(())
    }
}

/// Writes each element with `line`, followed by a blank line if there were
/// any.
fn section<F>(f: &mut fmt::Formatter<'_>, elements: &[Element], mut line: F) -> fmt::Result
where
    F: FnMut(&mut fmt::Formatter<'_>, &Element) -> fmt::Result,
{
    for element in elements {
        line(f, element)?;
    }
    if elements.is_empty() {
        Ok(())
    } else {
        writeln!(f)
    }
}

/// Containers and components put the technology before the description.
fn leveled(f: &mut fmt::Formatter<'_>, macro_name: &str, element: &Element) -> fmt::Result {
    write!(
        f,
        "  {macro_name}({}, \"{}\"",
        sanitize_id(&element.id),
        quoted(&element.name)
    )?;
    if !element.technology.is_empty() {
        write!(f, ", \"{}\"", quoted(&element.technology))?;
    }
    writeln!(f, ", \"{}\")", quoted(&element.description))
}
