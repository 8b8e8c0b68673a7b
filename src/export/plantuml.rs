use std::fmt;

use super::{quoted, sanitize_id};
use crate::domain::{Element, Model};

const C4_INCLUDE: &str =
    "https://raw.githubusercontent.com/plantuml-stdlib/C4-PlantUML/master/C4_Context.puml";

/// Renders a model as a C4-PlantUML diagram.
#[derive(Debug, Clone, Copy)]
pub struct PlantUml<'a>(pub &'a Model);

/// Renders `model` as a C4-PlantUML diagram.
#[must_use]
pub fn plantuml(model: &Model) -> String {
    PlantUml(model).to_string()
}

impl fmt::Display for PlantUml<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.0;
        writeln!(f, "@startuml")?;
        writeln!(f, "!include {C4_INCLUDE}")?;
        writeln!(f)?;
        writeln!(f, "title {}", model.metadata.name)?;
        writeln!(f)?;

        for person in &model.people {
            described(f, "Person", person)?;
        }
        for system in &model.systems {
            described(f, "System", system)?;
        }
        for system in &model.external_systems {
            described(f, "System_Ext", system)?;
        }
        for container in &model.containers {
            with_technology(f, "Container", container)?;
        }
        for component in &model.components {
            with_technology(f, "Component", component)?;
        }

        writeln!(f)?;
        for rel in &model.relationships {
            let label = if rel.description.is_empty() {
                "uses"
            } else {
                &rel.description
            };
            write!(
                f,
                "Rel({}, {}, \"{}\"",
                sanitize_id(&rel.from),
                sanitize_id(&rel.to),
                quoted(label)
            )?;
            if !rel.technology.is_empty() {
                write!(f, ", \"{}\"", quoted(&rel.technology))?;
            }
            writeln!(f, ")")?;
        }

        writeln!(f)?;
        write!(f, "@enduml")
    }
}

fn described(f: &mut fmt::Formatter<'_>, macro_name: &str, element: &Element) -> fmt::Result {
    writeln!(
        f,
        "{macro_name}({}, \"{}\", \"{}\")",
        sanitize_id(&element.id),
        quoted(&element.name),
        quoted(&element.description)
    )
}

fn with_technology(f: &mut fmt::Formatter<'_>, macro_name: &str, element: &Element) -> fmt::Result {
    write!(
        f,
        "{macro_name}({}, \"{}\", \"{}\"",
        sanitize_id(&element.id),
        quoted(&element.name),
        quoted(&element.description)
    )?;
    if !element.technology.is_empty() {
        write!(f, ", \"{}\"", quoted(&element.technology))?;
    }
    writeln!(f, ")")
}
