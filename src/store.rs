//! The hierarchical model store.
//!
//! The [`Store`] is the single source of truth for elements, relationships,
//! metadata, selection and the navigation context. Every mutation goes
//! through it, and every operation is total: unknown identifiers are ignored
//! and nothing here returns an error.
//!
//! Identifiers stored in elements and relationships (`parent_id`,
//! `target_id`, `from`, `to`) are weak references. Deleting an element never
//! chases them down, except for relationships, which are removed along with
//! either endpoint.

use tracing::instrument;

use crate::domain::{
    Config, Element, ElementKind, ElementPatch, Metadata, Model, Relationship,
    RelationshipPatch, id,
};

mod navigation;
pub use navigation::{Hierarchy, Navigation, ancestors, element_path};

mod selection;
pub use selection::Selection;

mod validate;
pub use validate::{Severity, Warning, WarningKind, validate};

/// An in-memory, single-writer architecture model with a navigation
/// context.
#[derive(Debug, Clone)]
pub struct Store {
    config: Config,
    model: Model,
    navigation: Navigation,
    selection: Selection,
    warnings: Vec<Warning>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Store {
    /// Creates an empty store, seeding metadata from the configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let model = Model::with_metadata(config.default_metadata.clone());
        Self::from_model(config, model)
    }

    /// Creates a store holding `model`, positioned at the root.
    ///
    /// Blank metadata fields take the configured defaults.
    #[must_use]
    pub fn from_model(config: Config, mut model: Model) -> Self {
        model.metadata.fill_blanks(&config.default_metadata);
        Self {
            config,
            model,
            navigation: Navigation::default(),
            selection: Selection::default(),
            warnings: Vec::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Read access to the whole model.
    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Model metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.model.metadata
    }

    /// Replaces the model metadata.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.model.metadata = metadata;
    }

    /// The navigation state.
    #[must_use]
    pub const fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    /// The warnings produced by the last [`Store::validate_model`].
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Creates an element of `kind` inside the current navigation context.
    ///
    /// The new element receives a fresh identifier and `parent_id` set to the
    /// current context; fields in `patch` are then merged on top, so a patch
    /// may override the parent. No other validation is applied.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn add_element(&mut self, kind: ElementKind, patch: ElementPatch) -> Element {
        let mut element = Element::new(self.fresh_id(kind.as_str()), kind);
        element.parent_id = self.navigation.current().map(str::to_string);
        patch.apply(&mut element);

        tracing::debug!(id = %element.id, parent = ?element.parent_id, "added element");
        self.model.collection_mut(kind).push(element.clone());
        element
    }

    /// Merges `patch` onto the element `id` in the `kind` collection.
    ///
    /// Returns `false`, changing nothing, if there is no such element. A
    /// selected element observes the update immediately.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update_element(&mut self, kind: ElementKind, id: &str, patch: ElementPatch) -> bool {
        let Some(element) = self
            .model
            .collection_mut(kind)
            .iter_mut()
            .find(|element| element.id == id)
        else {
            tracing::debug!("no such element, ignoring update");
            return false;
        };

        patch.apply(element);
        true
    }

    /// Removes the element `id` from the `kind` collection.
    ///
    /// Every relationship with `id` at either end is removed too. If the
    /// element is the current navigation context or one of its ancestors in
    /// the history, navigation returns to the root. Shadows targeting the
    /// element are kept.
    ///
    /// Returns `false`, changing nothing, if there is no such element.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_element(&mut self, kind: ElementKind, id: &str) -> bool {
        let collection = self.model.collection_mut(kind);
        let before = collection.len();
        collection.retain(|element| element.id != id);
        if collection.len() == before {
            tracing::debug!("no such element, ignoring delete");
            return false;
        }

        let before = self.model.relationships.len();
        self.model
            .relationships
            .retain(|relationship| !relationship.touches(id));
        let removed = before - self.model.relationships.len();
        if removed > 0 {
            tracing::debug!(removed, "removed dangling relationships");
        }

        if self.navigation.contains(id) {
            tracing::info!("navigation context deleted, returning to root");
            self.navigation.reset();
        }
        self.prune_selection();
        true
    }

    /// Creates a relationship from `from` to `to`.
    ///
    /// The endpoints are not checked; dangling endpoints are reported by
    /// [`Store::validate_model`].
    #[instrument(level = "debug", skip(self, patch))]
    pub fn add_relationship(
        &mut self,
        from: &str,
        to: &str,
        patch: RelationshipPatch,
    ) -> Relationship {
        let mut relationship = Relationship::new(self.fresh_id("rel"), from, to);
        patch.apply(&mut relationship);
        self.model.relationships.push(relationship.clone());
        relationship
    }

    /// Merges `patch` onto the relationship `id`.
    ///
    /// Returns `false`, changing nothing, if there is no such relationship.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update_relationship(&mut self, id: &str, patch: RelationshipPatch) -> bool {
        let Some(relationship) = self
            .model
            .relationships
            .iter_mut()
            .find(|relationship| relationship.id == id)
        else {
            return false;
        };

        patch.apply(relationship);
        true
    }

    /// Removes the relationship `id`. Returns `false` if there is none.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_relationship(&mut self, id: &str) -> bool {
        let before = self.model.relationships.len();
        self.model
            .relationships
            .retain(|relationship| relationship.id != id);
        let removed = self.model.relationships.len() != before;
        if removed {
            self.prune_selection();
        }
        removed
    }

    /// Every element, collections concatenated in [`ElementKind::ALL`] order.
    #[must_use]
    pub fn all_elements(&self) -> Vec<&Element> {
        self.model.elements().collect()
    }

    /// Finds an element by identifier.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.model.element(id)
    }

    /// The direct children of `parent`, or the root-level elements for
    /// `None`.
    #[must_use]
    pub fn children(&self, parent: Option<&str>) -> Vec<&Element> {
        self.model.children(parent)
    }

    /// All relationships, in insertion order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.model.relationships
    }

    /// Finds a relationship by identifier.
    #[must_use]
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.model
            .relationships
            .iter()
            .find(|relationship| relationship.id == id)
    }

    /// A snapshot of the model, for persistence and interchange.
    #[must_use]
    pub fn export_model(&self) -> Model {
        self.model.clone()
    }

    /// Replaces the whole model, returning to the root with nothing selected.
    ///
    /// Blank metadata fields take the configured defaults.
    #[instrument(level = "debug", skip_all)]
    pub fn import_model(&mut self, mut model: Model) {
        model.metadata.fill_blanks(&self.config.default_metadata);
        tracing::info!(
            elements = model.element_count(),
            relationships = model.relationships.len(),
            "importing model"
        );
        self.model = model;
        self.navigation.reset();
        self.selection = Selection::None;
        self.warnings.clear();
    }

    /// Empties every collection and resets navigation, selection and
    /// warnings. Metadata is kept.
    #[instrument(level = "debug", skip_all)]
    pub fn clear_all(&mut self) {
        self.model = Model::with_metadata(self.model.metadata.clone());
        self.navigation.reset();
        self.selection = Selection::None;
        self.warnings.clear();
    }

    /// Checks the model and records the resulting warnings.
    ///
    /// Warnings are advisory; nothing is blocked or repaired.
    pub fn validate_model(&mut self) -> &[Warning] {
        let visible = self.visible_elements().len();
        self.warnings = validate(&self.model, visible, self.config.max_visible_elements());
        if !self.warnings.is_empty() {
            tracing::debug!(count = self.warnings.len(), "model has warnings");
        }
        &self.warnings
    }

    fn fresh_id(&self, prefix: &str) -> String {
        loop {
            let id = id::mint(prefix);
            if self.model.element(&id).is_none() && self.relationship(&id).is_none() {
                return id;
            }
        }
    }
}
