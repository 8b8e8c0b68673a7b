use std::collections::HashSet;

use c4model::{Element, Relationship, Store};
use clap::Parser;
use tracing::instrument;

use super::{Paths, Session, terminal::Colorize};

#[derive(Debug, Default, Parser)]
#[command(about = "Show an element and the level of the model below it")]
pub struct Show {
    /// The element to show (defaults to the root level)
    ///
    /// Shadows show the level of the element they mirror.
    id: Option<String>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let mut session = Session::open(paths)?;
        let store = &mut session.store;

        if let Some(id) = &self.id {
            if store.element(id).is_none() {
                anyhow::bail!("element '{id}' not found");
            }
            // Leaves have no level of their own; only their details are shown.
            store.drill_down(id);
        }
        let store = &session.store;
        let focus = self.id.as_deref().and_then(|id| store.element(id));

        match self.output {
            OutputFormat::Pretty => output_pretty(store, focus),
            OutputFormat::Json => output_json(store, focus)?,
        }
        Ok(())
    }
}

/// Relationships with both ends among `elements`.
fn internal<'s>(store: &'s Store, elements: &[&Element]) -> Vec<&'s Relationship> {
    let ids: HashSet<&str> = elements.iter().map(|element| element.id.as_str()).collect();
    store
        .relationships()
        .iter()
        .filter(|rel| ids.contains(rel.from.as_str()) && ids.contains(rel.to.as_str()))
        .collect()
}

fn output_pretty(store: &Store, focus: Option<&Element>) {
    if let Some(element) = focus {
        println!("# {}", element.display_name());
        println!("{}\n", store.element_path(&element.id).dim());

        println!("{}", "Details".dim());
        println!("  Kind:       {}", element.kind.label());
        println!("  Id:         {}", element.id);
        if !element.technology.is_empty() {
            println!("  Technology: {}", element.technology);
        }
        if let Some(target) = &element.target_id {
            let name = store.element(target).map_or("(missing)", Element::display_name);
            println!("  Mirrors:    {name} ({target})");
        }
        for (role, owner) in [
            ("PM", &element.owner_pm),
            ("UX", &element.owner_ux),
            ("Tech", &element.owner_tech),
        ] {
            if let Some(owner) = owner {
                println!("  Owner {role:<5}{owner}");
            }
        }
        if !element.description.is_empty() {
            println!("\n{}", element.description);
        }
        if !element.tags.is_empty() {
            println!("\n{}", "Tags".dim());
            for tag in &element.tags {
                println!("  • {tag}");
            }
        }
        if !element.phases.is_empty() {
            println!("\n{}", "Phases".dim());
            for phase in &element.phases {
                println!(
                    "  • {} ({} → {})",
                    phase.name, phase.start_month, phase.end_month
                );
            }
        }
        if element.kind.is_leaf() {
            return;
        }
        println!();
    }

    let breadcrumb: Vec<&str> = store
        .breadcrumb()
        .into_iter()
        .map(Element::display_name)
        .collect();
    let separator = store.config().path_separator();
    if breadcrumb.is_empty() {
        println!("{}", store.metadata().name.info());
    } else {
        println!(
            "{}",
            format!("{}{separator}{}", store.metadata().name, breadcrumb.join(separator)).info()
        );
    }

    let visible = store.visible_elements();
    if visible.is_empty() {
        println!("  {}", "(empty)".dim());
        return;
    }
    for element in &visible {
        let children = store.child_count(&element.id);
        let count = if children > 0 {
            format!(" ({children})")
        } else {
            String::new()
        };
        println!(
            "  • {} {}{count} {}",
            element.display_name(),
            format!("[{}]", element.kind).dim(),
            element.id.dim()
        );
    }

    let relationships = internal(store, &visible);
    if !relationships.is_empty() {
        println!("\n{}", "Relationships".dim());
        for rel in relationships {
            let name = |id: &str| store.element(id).map_or("?", Element::display_name).to_string();
            print!("  {} → {}", name(&rel.from), name(&rel.to));
            if !rel.description.is_empty() {
                print!(": {}", rel.description);
            }
            if !rel.technology.is_empty() {
                print!(" [{}]", rel.technology);
            }
            println!();
        }
    }

    let max = store.config().max_visible_elements();
    if visible.len() > max {
        println!(
            "\n{}",
            format!(
                "This level shows {} elements; consider splitting it (limit {max})",
                visible.len()
            )
            .warning()
        );
    }
}

fn output_json(store: &Store, focus: Option<&Element>) -> anyhow::Result<()> {
    use serde_json::json;

    let visible = if focus.is_some_and(|element| element.kind.is_leaf()) {
        Vec::new()
    } else {
        store.visible_elements()
    };
    let relationships = internal(store, &visible);
    let breadcrumb: Vec<&str> = store
        .breadcrumb()
        .into_iter()
        .map(|element| element.id.as_str())
        .collect();

    let output = json!({
        "element": focus,
        "path": focus.map(|element| store.element_path(&element.id)),
        "context": store.navigation().current(),
        "breadcrumb": breadcrumb,
        "elements": visible,
        "relationships": relationships,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
