use std::collections::HashSet;

use c4model::{Element, Store};
use clap::Parser;
use tracing::instrument;

use super::{Paths, Session, terminal::Colorize};

#[derive(Debug, Default, Parser)]
#[command(about = "Print the containment tree")]
pub struct Tree {
    /// Start from this element instead of the root
    #[arg(long)]
    from: Option<String>,

    /// Maximum depth to print
    #[arg(long)]
    depth: Option<usize>,

    /// Include element ids
    #[arg(long)]
    ids: bool,
}

impl Tree {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let session = Session::open(paths)?;
        let store = &session.store;

        let root = match &self.from {
            Some(id) => {
                let Some(element) = store.element(id) else {
                    anyhow::bail!("element '{id}' not found");
                };
                println!("{}", self.label(store, element));
                Some(id.as_str())
            }
            None => {
                println!("{}", store.metadata().name);
                None
            }
        };

        for line in self.lines(store, root) {
            println!("{line}");
        }

        if self.from.is_none() {
            let unreachable = unreachable(store);
            if !unreachable.is_empty() {
                println!(
                    "\n{}",
                    format!("{} element(s) not reachable from the root:", unreachable.len())
                        .warning()
                );
                for element in unreachable {
                    println!("  • {}", self.label(store, element));
                }
            }
        }
        Ok(())
    }

    fn label(&self, store: &Store, element: &Element) -> String {
        let mut label = format!(
            "{} {}",
            element.display_name(),
            format!("[{}]", element.kind).dim()
        );
        let children = store.child_count(&element.id);
        if children > 0 {
            label.push_str(&format!(" ({children})"));
        }
        if self.ids {
            label.push_str(&format!(" {}", element.id.dim()));
        }
        label
    }

    /// The rendered tree below `root`, one line per element.
    fn lines(&self, store: &Store, root: Option<&str>) -> Vec<String> {
        let mut lines = Vec::new();
        let mut seen = HashSet::new();
        if let Some(id) = root {
            seen.insert(id.to_string());
        }
        self.walk(store, root, "", 1, &mut seen, &mut lines);
        lines
    }

    fn walk(
        &self,
        store: &Store,
        parent: Option<&str>,
        prefix: &str,
        depth: usize,
        seen: &mut HashSet<String>,
        lines: &mut Vec<String>,
    ) {
        if self.depth.is_some_and(|max| depth > max) {
            return;
        }
        let children = store.children(parent);
        for (idx, child) in children.iter().enumerate() {
            if !seen.insert(child.id.clone()) {
                continue;
            }
            let last = idx == children.len() - 1;
            let (branch, indent) = if last { ("└─ ", "   ") } else { ("├─ ", "│  ") };
            lines.push(format!("{prefix}{branch}{}", self.label(store, child)));
            self.walk(
                store,
                Some(child.id.as_str()),
                &format!("{prefix}{indent}"),
                depth + 1,
                seen,
                lines,
            );
        }
    }
}

/// Elements whose chain of parents never reaches the root: dangling
/// parents and containment cycles.
fn unreachable(store: &Store) -> Vec<&Element> {
    let mut reachable = HashSet::new();
    let mut frontier = vec![None];
    while let Some(parent) = frontier.pop() {
        for child in store.children(parent) {
            if reachable.insert(child.id.as_str()) {
                frontier.push(Some(child.id.as_str()));
            }
        }
    }
    store
        .all_elements()
        .into_iter()
        .filter(|element| !reachable.contains(element.id.as_str()))
        .collect()
}
