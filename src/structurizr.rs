//! Conversion to and from Structurizr workspaces.
//!
//! A Structurizr workspace nests elements by construction (systems contain
//! containers contain components) and identifies them with small integers
//! local to one document. The native model is flat, with `parent_id` links
//! and opaque string ids. The conversion is lossy:
//!
//! - shadows are not exported,
//! - containers and components without a resolvable parent are attached to
//!   the first available system or container, or to a fabricated default,
//! - identifiers differ after a round trip.
//!
//! Names, descriptions and technologies of every non-shadow element survive
//! an export followed by an import.

mod workspace;
pub use workspace::{
    AutomaticLayout, Component, Configuration, Container, ElementStyle, ElementView, Person,
    Relationship, SoftwareSystem, Styles, View, Views, Workspace, WorkspaceModel,
};

mod export;
pub use export::{export_at, export_to_structurizr};

mod import;
pub use import::import_from_structurizr;

/// Tag marking people.
pub const PERSON_TAG: &str = "Person";
/// Tag marking software systems, internal or external.
pub const SOFTWARE_SYSTEM_TAG: &str = "Software System";
/// Tag marking external software systems.
pub const EXTERNAL_TAG: &str = "External";
/// Tag marking containers.
pub const CONTAINER_TAG: &str = "Container";
/// Tag marking components.
pub const COMPONENT_TAG: &str = "Component";

/// Location of software systems owned by the modelling team.
pub const LOCATION_UNSPECIFIED: &str = "Unspecified";
/// Location of third-party software systems.
pub const LOCATION_EXTERNAL: &str = "External";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Element, ElementKind, Model, Position, Relationship as Link};

    fn element(kind: ElementKind, id: &str, name: &str, parent: Option<&str>) -> Element {
        let mut element = Element::new(id, kind);
        element.name = name.to_string();
        element.description = format!("{name} description");
        element.technology = format!("{name} tech");
        element.parent_id = parent.map(str::to_string);
        element
    }

    fn sample() -> Model {
        let mut model = Model::default();
        model.metadata.name = "Shop".to_string();
        model
            .people
            .push(element(ElementKind::Person, "p-1", "Customer", None));
        model
            .systems
            .push(element(ElementKind::System, "s-1", "Store", None));
        model
            .external_systems
            .push(element(ElementKind::ExternalSystem, "x-1", "Bank", None));
        model
            .containers
            .push(element(ElementKind::Container, "c-1", "API", Some("s-1")));
        model
            .components
            .push(element(ElementKind::Component, "k-1", "Orders", Some("c-1")));
        let mut shadow = Element::new("sh-1", ElementKind::Shadow);
        shadow.target_id = Some("s-1".to_string());
        shadow.name = "Store (shadow)".to_string();
        model.shadows.push(shadow);
        model.relationships.extend([
            Link::new("r-1", "p-1", "s-1"),
            Link::new("r-2", "k-1", "x-1"),
            Link::new("r-3", "sh-1", "s-1"),
        ]);
        model
    }

    fn by_name<'m>(model: &'m Model, name: &str) -> &'m Element {
        model
            .elements()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no element named {name}"))
    }

    #[test]
    fn round_trip_preserves_element_content() {
        let original = sample();
        let restored = import_from_structurizr(&export_to_structurizr(&original));

        for element in original.elements().filter(|e| e.kind != ElementKind::Shadow) {
            let twin = by_name(&restored, &element.name);
            assert_eq!(twin.kind, element.kind);
            assert_eq!(twin.description, element.description);
            assert_eq!(twin.technology, element.technology);
            assert_ne!(twin.id, element.id);
        }
        assert!(restored.shadows.is_empty());
        assert_eq!(restored.metadata.name, "Shop");
    }

    #[test]
    fn round_trip_restores_hierarchy() {
        let restored = import_from_structurizr(&export_to_structurizr(&sample()));

        let store = by_name(&restored, "Store");
        let api = by_name(&restored, "API");
        let orders = by_name(&restored, "Orders");
        assert_eq!(api.parent_id.as_deref(), Some(store.id.as_str()));
        assert_eq!(api.parent_system.as_deref(), Some(store.id.as_str()));
        assert_eq!(orders.parent_id.as_deref(), Some(api.id.as_str()));
        assert_eq!(orders.parent_container.as_deref(), Some(api.id.as_str()));
    }

    #[test]
    fn round_trip_keeps_relationships_between_exported_elements() {
        let restored = import_from_structurizr(&export_to_structurizr(&sample()));

        let pairs: Vec<_> = restored
            .relationships
            .iter()
            .map(|r| {
                let from = restored.element(&r.from).map(|e| e.name.as_str());
                let to = restored.element(&r.to).map(|e| e.name.as_str());
                (from, to)
            })
            .collect();

        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&(Some("Customer"), Some("Store"))));
        assert!(pairs.contains(&(Some("Orders"), Some("Bank"))));
    }

    #[test]
    fn round_trip_keeps_user_tags_and_positions() {
        let mut model = sample();
        model.systems[0].tags = vec!["core".to_string(), "pci".to_string()];

        let restored = import_from_structurizr(&export_to_structurizr(&model));

        let store = by_name(&restored, "Store");
        assert_eq!(store.tags, ["core", "pci"]);
        // the first person sits at the grid origin, the first system next to it
        assert_eq!(by_name(&restored, "Customer").position, Position::new(100.0, 100.0));
        assert_eq!(store.position, Position::new(400.0, 100.0));
    }
}
