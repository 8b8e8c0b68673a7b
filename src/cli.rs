use std::path::{Path, PathBuf};

mod export;
mod import;
mod show;
mod terminal;
mod tree;
mod validate;

use anyhow::Context as _;
use c4model::{
    Config, ElementKind, ElementPatch, RelationshipPatch, Store,
    storage::{LoadError, load_model, save_model},
};
use clap::ArgAction;
use export::Export;
use import::Import;
use show::Show;
use terminal::Colorize;
use tracing::instrument;
use tree::Tree;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The model file to operate on
    #[arg(short, long, default_value = "model.json", global = true)]
    model: PathBuf,

    /// A TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let paths = Paths {
            model: self.model,
            config: self.config,
        };
        self.command
            .unwrap_or_else(|| Command::Show(Show::default()))
            .run(&paths)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create a new, empty model file
    Init(Init),

    /// Add an element
    ///
    /// The element is placed at root level unless a parent is given.
    Add(Add),

    /// Add a relationship between two elements
    Link(Link),

    /// Delete an element or relationship
    ///
    /// Deleting an element also deletes every relationship touching it.
    /// Children are left in place.
    Delete(Delete),

    /// Print the containment tree
    Tree(Tree),

    /// Show one level of the model (default)
    Show(Show),

    /// Check the model for structural problems
    Validate(Validate),

    /// Render the model in another format
    Export(Export),

    /// Replace the model with the contents of a native or Structurizr file
    Import(Import),
}

impl Command {
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(paths)?,
            Self::Add(command) => command.run(paths)?,
            Self::Link(command) => command.run(paths)?,
            Self::Delete(command) => command.run(paths)?,
            Self::Tree(command) => command.run(paths)?,
            Self::Show(command) => command.run(paths)?,
            Self::Validate(command) => command.run(paths)?,
            Self::Export(command) => command.run(paths)?,
            Self::Import(command) => command.run(paths)?,
        }
        Ok(())
    }
}

/// The files named by the global flags.
#[derive(Debug)]
pub struct Paths {
    model: PathBuf,
    config: Option<PathBuf>,
}

impl Paths {
    fn config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(Config::default()),
        }
    }
}

/// A store loaded from, and saved back to, the model file.
#[derive(Debug)]
struct Session {
    path: PathBuf,
    store: Store,
}

impl Session {
    fn open(paths: &Paths) -> anyhow::Result<Self> {
        let config = paths.config()?;
        let file = match load_model(&paths.model) {
            Ok(file) => file,
            Err(LoadError::NotFound(path)) => {
                anyhow::bail!(
                    "no model at {} (run 'c4m init' to create one)",
                    path.display()
                )
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to open {}", paths.model.display()));
            }
        };
        Ok(Self {
            path: paths.model.clone(),
            store: Store::from_model(config, file.model),
        })
    }

    /// A session over a model file that does not exist yet.
    fn create(paths: &Paths) -> anyhow::Result<Self> {
        Ok(Self {
            path: paths.model.clone(),
            store: Store::new(paths.config()?),
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        save_model(&self.path, self.store.model())
            .with_context(|| format!("failed to save {}", self.path.display()))
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// The model name
    #[arg(long, short)]
    name: Option<String>,

    /// The model author
    #[arg(long, short)]
    author: Option<String>,

    /// Overwrite an existing model file
    #[arg(long, short)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        if paths.model.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                paths.model.display()
            );
        }

        let config = match &paths.config {
            Some(path) if !path.exists() => {
                let config = Config::default();
                config
                    .save(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("  Created: {}", path.display());
                config
            }
            _ => paths.config()?,
        };

        let mut store = Store::new(config);
        let mut metadata = store.metadata().clone();
        if let Some(name) = self.name {
            metadata.name = name;
        }
        if let Some(author) = self.author {
            metadata.author = author;
        }
        store.set_metadata(metadata);

        save_model(&paths.model, store.model())
            .with_context(|| format!("failed to write {}", paths.model.display()))?;

        println!(
            "{}",
            format!(
                "Initialized model '{}' in {}",
                store.metadata().name,
                paths.model.display()
            )
            .success()
        );
        println!();
        println!("Next steps:");
        println!("  c4m add system --name \"Your First System\"");
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// The kind of element: system, container, component, person,
    /// external-system or shadow
    kind: ElementKind,

    /// The element name
    #[arg(long, short)]
    name: String,

    /// The id of the containing element
    #[arg(long, short)]
    parent: Option<String>,

    /// What the element does
    #[arg(long, short)]
    description: Option<String>,

    /// The technology it is built with
    #[arg(long, short)]
    technology: Option<String>,

    /// Tags (comma-separated or repeated)
    #[arg(long = "tag", value_delimiter = ',')]
    tags: Vec<String>,

    /// For shadows, the id of the element being mirrored
    #[arg(long)]
    target: Option<String>,
}

impl Add {
    #[instrument(level = "debug", skip(self))]
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let mut session = Session::open(paths)?;

        if let Some(parent) = &self.parent {
            if !session.store.navigate_to(Some(parent.as_str())) {
                anyhow::bail!("parent element '{parent}' not found");
            }
        }
        if !session.store.allowed_child_kinds().contains(&self.kind) {
            eprintln!(
                "{}",
                format!(
                    "note: a {} is not usually placed here",
                    self.kind.label().to_lowercase()
                )
                .dim()
            );
        }
        if let Some(target) = &self.target {
            if session.store.element(target).is_none() {
                eprintln!(
                    "{}",
                    format!("⚠️  target element '{target}' not found").warning()
                );
            }
        }

        let patch = ElementPatch {
            name: Some(self.name),
            description: self.description,
            technology: self.technology,
            tags: (!self.tags.is_empty()).then_some(self.tags),
            target_id: self.target.map(Some),
            ..ElementPatch::default()
        };
        let element = session.store.add_element(self.kind, patch);
        session.save()?;

        println!(
            "{}",
            format!("Added {} {}", element.kind.label().to_lowercase(), element.id).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Link {
    /// The id of the source element
    from: String,

    /// The id of the target element
    to: String,

    /// What the relationship does
    #[arg(long, short)]
    description: Option<String>,

    /// Protocol or technology
    #[arg(long, short)]
    technology: Option<String>,
}

impl Link {
    #[instrument(level = "debug", skip(self))]
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let mut session = Session::open(paths)?;

        for end in [&self.from, &self.to] {
            if session.store.element(end).is_none() {
                anyhow::bail!("element '{end}' not found");
            }
        }

        let patch = RelationshipPatch {
            description: self.description,
            technology: self.technology,
            ..RelationshipPatch::default()
        };
        let relationship = session.store.add_relationship(&self.from, &self.to, patch);
        session.save()?;

        println!(
            "{}",
            format!(
                "Linked {} → {} ({})",
                self.from, self.to, relationship.id
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The id of the element or relationship to delete
    id: String,
}

impl Delete {
    #[instrument(level = "debug", skip(self))]
    fn run(self, paths: &Paths) -> anyhow::Result<()> {
        let mut session = Session::open(paths)?;
        let store = &mut session.store;

        let message = if let Some(kind) = store.element(&self.id).map(|element| element.kind) {
            let touching = store
                .relationships()
                .iter()
                .filter(|relationship| relationship.touches(&self.id))
                .count();
            let orphans = store.child_count(&self.id);
            store.delete_element(kind, &self.id);
            if orphans > 0 {
                eprintln!(
                    "{}",
                    format!("⚠️  {orphans} child element(s) now have a dangling parent").warning()
                );
            }
            format!(
                "Deleted {} {} and {touching} relationship(s)",
                kind.label().to_lowercase(),
                self.id
            )
        } else if store.delete_relationship(&self.id) {
            format!("Deleted relationship {}", self.id)
        } else {
            anyhow::bail!("'{}' is not an element or relationship", self.id);
        };

        session.save()?;
        println!("{}", format!("✅ {message}").success());
        Ok(())
    }
}

/// Writes `contents` to `path`, or to stdout when there is no path.
fn emit(path: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use c4model::storage::load_model;
    use tempfile::{TempDir, tempdir};

    use super::*;

    fn workspace() -> (TempDir, Paths) {
        let tmp = tempdir().unwrap();
        let paths = Paths {
            model: tmp.path().join("model.json"),
            config: None,
        };
        (tmp, paths)
    }

    fn add(paths: &Paths, kind: ElementKind, name: &str, parent: Option<&str>) -> String {
        Add {
            kind,
            name: name.to_string(),
            parent: parent.map(str::to_string),
            description: None,
            technology: None,
            tags: Vec::new(),
            target: None,
        }
        .run(paths)
        .unwrap();
        load_model(&paths.model)
            .unwrap()
            .model
            .elements()
            .find(|element| element.name == name)
            .map(|element| element.id.clone())
            .expect("added element should be saved")
    }

    fn init(paths: &Paths) {
        Init {
            name: Some("Shop".to_string()),
            author: None,
            force: false,
        }
        .run(paths)
        .unwrap();
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let (_tmp, paths) = workspace();
        init(&paths);
        let again = Init {
            name: None,
            author: None,
            force: false,
        };
        assert!(again.run(&paths).is_err());
        assert_eq!(load_model(&paths.model).unwrap().model.metadata.name, "Shop");
    }

    #[test]
    fn init_writes_missing_config() {
        let (tmp, mut paths) = workspace();
        let config = tmp.path().join("c4m.toml");
        paths.config = Some(config.clone());
        init(&paths);
        assert_eq!(Config::load(&config).unwrap(), Config::default());
    }

    #[test]
    fn commands_need_an_initialized_model() {
        let (_tmp, paths) = workspace();
        let error = Delete {
            id: "anything".to_string(),
        }
        .run(&paths)
        .unwrap_err();
        assert!(error.to_string().contains("c4m init"));
    }

    #[test]
    fn add_places_elements_under_parent() {
        let (_tmp, paths) = workspace();
        init(&paths);
        let system = add(&paths, ElementKind::System, "Store", None);
        let container = add(&paths, ElementKind::Container, "API", Some(&system));

        let model = load_model(&paths.model).unwrap().model;
        let api = model.element(&container).unwrap();
        assert_eq!(api.parent_id.as_deref(), Some(system.as_str()));
        assert!(model.element(&system).unwrap().is_root_level());
    }

    #[test]
    fn add_rejects_unknown_parent() {
        let (_tmp, paths) = workspace();
        init(&paths);
        let command = Add {
            kind: ElementKind::Container,
            name: "API".to_string(),
            parent: Some("missing".to_string()),
            description: None,
            technology: None,
            tags: Vec::new(),
            target: None,
        };
        assert!(command.run(&paths).is_err());
    }

    #[test]
    fn link_then_delete_cascades() {
        let (_tmp, paths) = workspace();
        init(&paths);
        let customer = add(&paths, ElementKind::Person, "Customer", None);
        let store = add(&paths, ElementKind::System, "Store", None);

        Link {
            from: customer.clone(),
            to: store.clone(),
            description: Some("buys from".to_string()),
            technology: None,
        }
        .run(&paths)
        .unwrap();
        let model = load_model(&paths.model).unwrap().model;
        assert_eq!(model.relationships.len(), 1);
        assert_eq!(model.relationships[0].description, "buys from");

        Delete { id: store }.run(&paths).unwrap();
        let model = load_model(&paths.model).unwrap().model;
        assert!(model.relationships.is_empty());
        assert_eq!(model.element_count(), 1);
    }

    #[test]
    fn link_rejects_unknown_elements() {
        let (_tmp, paths) = workspace();
        init(&paths);
        let customer = add(&paths, ElementKind::Person, "Customer", None);
        let link = Link {
            from: customer,
            to: "missing".to_string(),
            description: None,
            technology: None,
        };
        assert!(link.run(&paths).is_err());
    }

    #[test]
    fn import_replaces_the_model() {
        let (tmp, paths) = workspace();
        init(&paths);
        add(&paths, ElementKind::System, "Old", None);

        let mut source = c4model::Model::default();
        source
            .people
            .push(c4model::Element::new("person-1", ElementKind::Person));
        let source_path = tmp.path().join("other.json");
        save_model(&source_path, &source).unwrap();

        Import {
            source: source_path,
        }
        .run(&paths)
        .unwrap();
        let model = load_model(&paths.model).unwrap().model;
        assert!(model.systems.is_empty());
        assert_eq!(model.people.len(), 1);
    }
}
