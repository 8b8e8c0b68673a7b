//! Hierarchical navigation.
//!
//! The navigation context is the element whose children are currently on
//! view, or the root. Moving into an element pushes the previous context onto
//! a history stack; moving up pops it. Every walk along `parent_id` chains is
//! bounded, so cyclic parentage never loops forever.

use std::collections::HashSet;

use tracing::instrument;

use crate::{
    domain::{Element, ElementKind, Model},
    store::Store,
};

/// Read access to a containment hierarchy.
pub trait Hierarchy {
    /// Finds an element by identifier.
    fn lookup(&self, id: &str) -> Option<&Element>;

    /// The direct children of `parent`, or the root-level elements for
    /// `None`.
    fn children_of(&self, parent: Option<&str>) -> Vec<&Element>;
}

impl Hierarchy for Model {
    fn lookup(&self, id: &str) -> Option<&Element> {
        self.element(id)
    }

    fn children_of(&self, parent: Option<&str>) -> Vec<&Element> {
        self.children(parent)
    }
}

/// The current navigation context and the stack of contexts above it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    current: Option<String>,
    history: Vec<Option<String>>,
}

impl Navigation {
    /// The current context, or `None` at the root.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Previous contexts, oldest first. `None` entries stand for the root.
    #[must_use]
    pub fn history(&self) -> &[Option<String>] {
        &self.history
    }

    /// Whether the root is on view.
    #[must_use]
    pub const fn is_at_root(&self) -> bool {
        self.current.is_none()
    }

    /// Whether `id` is the current context or appears in the history.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id)
            || self
                .history
                .iter()
                .any(|entry| entry.as_deref() == Some(id))
    }

    /// Moves into `id`, if it exists in `hierarchy`.
    pub fn enter<H: Hierarchy + ?Sized>(&mut self, hierarchy: &H, id: &str) -> bool {
        if hierarchy.lookup(id).is_none() {
            return false;
        }
        let previous = self.current.replace(id.to_string());
        self.history.push(previous);
        true
    }

    /// Moves to the previous context. Returns `false` with an empty history.
    pub fn up(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        self.current = previous;
        true
    }

    /// Returns to the root and clears the history.
    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
    }

    /// Jumps straight to `target`, rebuilding the history from its ancestry.
    ///
    /// `None` resets to the root. An identifier that does not resolve leaves
    /// the state untouched and returns `false`.
    pub fn jump<H: Hierarchy + ?Sized>(&mut self, hierarchy: &H, target: Option<&str>) -> bool {
        let Some(target) = target else {
            self.reset();
            return true;
        };
        if hierarchy.lookup(target).is_none() {
            return false;
        }

        self.history = std::iter::once(None)
            .chain(ancestors(hierarchy, target).into_iter().map(Some))
            .collect();
        self.current = Some(target.to_string());
        true
    }

    /// The elements from the top of the history down to the current context.
    ///
    /// Root markers and entries that no longer resolve are skipped.
    #[must_use]
    pub fn breadcrumb<'h, H: Hierarchy + ?Sized>(&self, hierarchy: &'h H) -> Vec<&'h Element> {
        self.history
            .iter()
            .chain(std::iter::once(&self.current))
            .filter_map(|entry| entry.as_deref())
            .filter_map(|id| hierarchy.lookup(id))
            .collect()
    }

    /// The children of the current context.
    #[must_use]
    pub fn visible<'h, H: Hierarchy + ?Sized>(&self, hierarchy: &'h H) -> Vec<&'h Element> {
        hierarchy.children_of(self.current())
    }
}

/// The ancestor identifiers of `id`, root first, excluding `id` itself.
///
/// A dangling parent reference is included and ends the walk. The walk stops
/// at the first repeated identifier.
pub fn ancestors<H: Hierarchy + ?Sized>(hierarchy: &H, id: &str) -> Vec<String> {
    let mut seen = HashSet::from([id]);
    let mut chain = Vec::new();
    let mut cursor = hierarchy.lookup(id);

    while let Some(parent) = cursor.and_then(|element| element.parent_id.as_deref()) {
        if !seen.insert(parent) {
            tracing::warn!(id, parent, "containment cycle");
            break;
        }
        chain.push(parent.to_string());
        cursor = hierarchy.lookup(parent);
    }

    chain.reverse();
    chain
}

/// The display names from the root-level ancestor down to `id`, joined with
/// `separator`.
///
/// Blank names are replaced by identifiers; unresolved ancestors end the
/// path. An unknown `id` yields an empty string.
pub fn element_path<H: Hierarchy + ?Sized>(hierarchy: &H, id: &str, separator: &str) -> String {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut cursor = hierarchy.lookup(id);

    while let Some(element) = cursor {
        if !seen.insert(element.id.as_str()) {
            break;
        }
        names.push(element.display_name());
        cursor = element
            .parent_id
            .as_deref()
            .and_then(|parent| hierarchy.lookup(parent));
    }

    names.reverse();
    names.join(separator)
}

impl Store {
    /// Moves into element `id`. Unknown ids are ignored.
    #[instrument(level = "debug", skip(self))]
    pub fn navigate_into(&mut self, id: &str) -> bool {
        let moved = self.navigation.enter(&self.model, id);
        if moved {
            self.clear_selection();
        }
        moved
    }

    /// Moves to the previous context. Does nothing at the top of the
    /// history.
    #[instrument(level = "debug", skip(self))]
    pub fn navigate_up(&mut self) -> bool {
        let moved = self.navigation.up();
        if moved {
            self.clear_selection();
        }
        moved
    }

    /// Returns to the root.
    #[instrument(level = "debug", skip(self))]
    pub fn navigate_to_root(&mut self) {
        self.navigation.reset();
        self.clear_selection();
    }

    /// Jumps to `target` (the root for `None`), rebuilding the history so
    /// that moving up walks the ancestry.
    #[instrument(level = "debug", skip(self))]
    pub fn navigate_to(&mut self, target: Option<&str>) -> bool {
        let moved = self.navigation.jump(&self.model, target);
        if moved {
            self.clear_selection();
        } else {
            tracing::debug!("target does not resolve, staying put");
        }
        moved
    }

    /// Enters an element the way double-clicking it on a canvas would.
    ///
    /// A shadow enters its target instead; people and external systems are
    /// leaves and are refused. The current context is pushed either way, so
    /// moving up returns to the view that held the shadow.
    #[instrument(level = "debug", skip(self))]
    pub fn drill_down(&mut self, id: &str) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        let destination = match element.kind {
            ElementKind::Shadow => match element.target_id.as_deref().and_then(|t| self.element(t)) {
                Some(target) if !target.kind.is_leaf() => target.id.clone(),
                _ => return false,
            },
            kind if kind.is_leaf() => return false,
            _ => element.id.clone(),
        };
        self.navigate_into(&destination)
    }

    /// The elements from the oldest history entry down to the current
    /// context.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<&Element> {
        self.navigation.breadcrumb(&self.model)
    }

    /// The children of the current context.
    #[must_use]
    pub fn visible_elements(&self) -> Vec<&Element> {
        self.navigation.visible(&self.model)
    }

    /// The display path to `id`, joined with the configured separator.
    #[must_use]
    pub fn element_path(&self, id: &str) -> String {
        element_path(&self.model, id, self.config.path_separator())
    }

    /// The number of direct children of `id`.
    #[must_use]
    pub fn child_count(&self, id: &str) -> usize {
        self.model
            .elements()
            .filter(|element| element.parent_id.as_deref() == Some(id))
            .count()
    }

    /// Whether `id` has at least one direct child.
    #[must_use]
    pub fn has_children(&self, id: &str) -> bool {
        self.model
            .elements()
            .any(|element| element.parent_id.as_deref() == Some(id))
    }

    /// The element kinds offered for creation in the current context.
    #[must_use]
    pub fn allowed_child_kinds(&self) -> &'static [ElementKind] {
        let kind = self
            .navigation
            .current()
            .and_then(|id| self.element(id))
            .map(|element| element.kind);
        ElementKind::allowed_children(kind)
    }
}
