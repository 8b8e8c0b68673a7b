use crate::{
    domain::{Element, Relationship},
    store::Store,
};

/// What is currently selected: at most one element or one relationship.
///
/// Selection is held by identifier and resolved on read, so it always
/// reflects the latest version of the selected item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing is selected.
    #[default]
    None,
    /// An element, by id.
    Element(String),
    /// A relationship, by id.
    Edge(String),
}

impl Store {
    /// The raw selection state.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selects an element, clearing any selected relationship. `None` clears
    /// the selection.
    pub fn select_element(&mut self, id: Option<&str>) {
        self.selection = id.map_or(Selection::None, |id| Selection::Element(id.to_string()));
    }

    /// Selects a relationship, clearing any selected element. `None` clears
    /// the selection.
    pub fn select_edge(&mut self, id: Option<&str>) {
        self.selection = id.map_or(Selection::None, |id| Selection::Edge(id.to_string()));
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// The selected element, if one is selected and still exists.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        match &self.selection {
            Selection::Element(id) => self.element(id),
            _ => None,
        }
    }

    /// The selected relationship, if one is selected and still exists.
    #[must_use]
    pub fn selected_edge(&self) -> Option<&Relationship> {
        match &self.selection {
            Selection::Edge(id) => self.relationship(id),
            _ => None,
        }
    }

    /// Drops a selection that no longer resolves.
    pub(super) fn prune_selection(&mut self) {
        let stale = match &self.selection {
            Selection::None => false,
            Selection::Element(_) => self.selected_element().is_none(),
            Selection::Edge(_) => self.selected_edge().is_none(),
        };
        if stale {
            self.selection = Selection::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElementKind, ElementPatch, RelationshipPatch};

    #[test]
    fn element_and_edge_selection_are_exclusive() {
        let mut store = Store::default();
        let a = store.add_element(ElementKind::System, ElementPatch::named("A"));
        let b = store.add_element(ElementKind::System, ElementPatch::named("B"));
        let rel = store.add_relationship(&a.id, &b.id, RelationshipPatch::default());

        store.select_element(Some(&a.id));
        assert_eq!(store.selected_element().map(|e| e.id.as_str()), Some(a.id.as_str()));
        assert!(store.selected_edge().is_none());

        store.select_edge(Some(&rel.id));
        assert!(store.selected_element().is_none());
        assert_eq!(store.selected_edge(), Some(&rel));

        store.select_edge(None);
        assert_eq!(store.selection(), &Selection::None);
    }

    #[test]
    fn selection_sees_updates() {
        let mut store = Store::default();
        let a = store.add_element(ElementKind::System, ElementPatch::named("A"));
        store.select_element(Some(&a.id));

        store.update_element(ElementKind::System, &a.id, ElementPatch::named("Renamed"));

        assert_eq!(store.selected_element().unwrap().name, "Renamed");
    }

    #[test]
    fn deleting_the_selected_edge_clears_selection() {
        let mut store = Store::default();
        let a = store.add_element(ElementKind::System, ElementPatch::named("A"));
        let rel = store.add_relationship(&a.id, &a.id, RelationshipPatch::default());
        store.select_edge(Some(&rel.id));

        store.delete_element(ElementKind::System, &a.id);

        assert_eq!(store.selection(), &Selection::None);
    }
}
