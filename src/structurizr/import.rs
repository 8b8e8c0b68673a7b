use std::collections::HashMap;

use tracing::instrument;

use super::{
    COMPONENT_TAG, CONTAINER_TAG, EXTERNAL_TAG, LOCATION_EXTERNAL, PERSON_TAG,
    SOFTWARE_SYSTEM_TAG, SoftwareSystem, Workspace,
};
use crate::domain::{
    Element, ElementKind, Metadata, Model, Position, Relationship, id::FreshIds,
};

const DEFAULT_POSITION: Position = Position::new(100.0, 100.0);

/// Converts a Structurizr workspace into a native model.
///
/// Every element receives a freshly minted native id. Containers and
/// components record their parent both as `parent_id` and as the legacy
/// `parent_system`/`parent_container` hint. Positions are taken from the
/// first view that places the element. Relationships are translated once
/// every element has an id; those with an end that is not in the workspace
/// are dropped.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn import_from_structurizr(workspace: &Workspace) -> Model {
    let mut importer = Importer::new(workspace);
    let mut model = Model::with_metadata(metadata(workspace));

    for person in &workspace.model.people {
        let mut element = importer.element(ElementKind::Person, &person.id);
        element.name.clone_from(&person.name);
        element.description.clone_from(&person.description);
        element.technology.clone_from(&person.technology);
        element.tags = user_tags(&person.tags, &[PERSON_TAG]);
        model.people.push(element);
    }

    for system in &workspace.model.software_systems {
        importer.system(system, &mut model);
    }

    let relationships = workspace
        .model
        .people
        .iter()
        .flat_map(|person| &person.relationships)
        .chain(workspace.model.software_systems.iter().flat_map(|system| {
            system.relationships.iter().chain(
                system.containers.iter().flat_map(|container| {
                    container.relationships.iter().chain(
                        container
                            .components
                            .iter()
                            .flat_map(|component| &component.relationships),
                    )
                }),
            )
        }));

    for relationship in relationships {
        let (Some(from), Some(to)) = (
            importer.native(&relationship.source_id),
            importer.native(&relationship.destination_id),
        ) else {
            tracing::debug!(
                source = %relationship.source_id,
                destination = %relationship.destination_id,
                "dropping relationship with an unknown end"
            );
            continue;
        };
        let mut imported = Relationship::new(importer.ids.mint("rel"), from, to);
        imported.description.clone_from(&relationship.description);
        imported.technology.clone_from(&relationship.technology);
        model.relationships.push(imported);
    }

    tracing::debug!(
        elements = model.element_count(),
        relationships = model.relationships.len(),
        "imported workspace"
    );
    model
}

struct Importer<'w> {
    ids: FreshIds,
    natives: HashMap<&'w str, String>,
    positions: HashMap<&'w str, Position>,
}

impl<'w> Importer<'w> {
    fn new(workspace: &'w Workspace) -> Self {
        let mut positions = HashMap::new();
        for placed in workspace.views.all().flat_map(|view| &view.elements) {
            if let (Some(x), Some(y)) = (placed.x, placed.y) {
                positions
                    .entry(placed.id.as_str())
                    .or_insert(Position::new(x, y));
            }
        }

        Self {
            ids: FreshIds::default(),
            natives: HashMap::new(),
            positions,
        }
    }

    /// A fresh element of `kind` standing for workspace element `external`.
    fn element(&mut self, kind: ElementKind, external: &'w str) -> Element {
        let id = self.ids.mint_with_infix(kind.as_str(), external);
        self.natives.insert(external, id.clone());
        let mut element = Element::new(id, kind);
        element.position = self
            .positions
            .get(external)
            .copied()
            .unwrap_or(DEFAULT_POSITION);
        element
    }

    fn native(&self, external: &str) -> Option<String> {
        self.natives.get(external).cloned()
    }

    fn system(&mut self, system: &'w SoftwareSystem, model: &mut Model) {
        let external = system.location == LOCATION_EXTERNAL
            || system
                .tags
                .split(',')
                .any(|tag| tag.trim() == EXTERNAL_TAG);
        let kind = if external {
            ElementKind::ExternalSystem
        } else {
            ElementKind::System
        };

        let mut element = self.element(kind, &system.id);
        element.name.clone_from(&system.name);
        element.description.clone_from(&system.description);
        element.technology.clone_from(&system.technology);
        element.tags = user_tags(&system.tags, &[SOFTWARE_SYSTEM_TAG, EXTERNAL_TAG]);
        let system_id = element.id.clone();
        model.collection_mut(kind).push(element);

        for container in &system.containers {
            let mut element = self.element(ElementKind::Container, &container.id);
            element.name.clone_from(&container.name);
            element.description.clone_from(&container.description);
            element.technology.clone_from(&container.technology);
            element.tags = user_tags(&container.tags, &[CONTAINER_TAG]);
            element.parent_id = Some(system_id.clone());
            element.parent_system = Some(system_id.clone());
            let container_id = element.id.clone();
            model.containers.push(element);

            for component in &container.components {
                let mut element = self.element(ElementKind::Component, &component.id);
                element.name.clone_from(&component.name);
                element.description.clone_from(&component.description);
                element.technology.clone_from(&component.technology);
                element.tags = user_tags(&component.tags, &[COMPONENT_TAG]);
                element.parent_id = Some(container_id.clone());
                element.parent_container = Some(container_id.clone());
                model.components.push(element);
            }
        }
    }
}

fn metadata(workspace: &Workspace) -> Metadata {
    let author = workspace
        .properties
        .get("author")
        .and_then(|author| non_empty(author))
        .or_else(|| {
            workspace
                .last_modified_user
                .as_deref()
                .and_then(non_empty)
        })
        .unwrap_or_else(|| "Unknown".to_string());

    Metadata {
        name: non_empty(&workspace.name).unwrap_or_else(|| "Imported Model".to_string()),
        version: non_empty(&workspace.version).unwrap_or_else(|| "1.0".to_string()),
        author,
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.trim().is_empty())
}

/// Splits a comma-separated tag list, dropping blanks and `type_tags`.
fn user_tags(tags: &str, type_tags: &[&str]) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && !type_tags.contains(tag))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn parse(json: &str) -> Model {
        import_from_structurizr(&serde_json::from_str(json).unwrap())
    }

    #[test_case(r#"{"id": "1", "name": "Bank", "location": "External"}"#; "by location")]
    #[test_case(r#"{"id": "1", "name": "Bank", "tags": "Software System, External"}"#; "by tag")]
    fn external_systems_are_detected(system: &str) {
        let model = parse(&format!(r#"{{"model": {{"softwareSystems": [{system}]}}}}"#));

        assert!(model.systems.is_empty());
        assert_eq!(model.external_systems.len(), 1);
        assert!(model.external_systems[0].id.starts_with("externalSystem-"));
        assert!(model.external_systems[0].tags.is_empty());
    }

    #[test]
    fn a_tag_merely_containing_external_is_not_external() {
        let model = parse(
            r#"{"model": {"softwareSystems": [{"id": "1", "tags": "Software System,Externally Hosted"}]}}"#,
        );
        assert_eq!(model.systems.len(), 1);
        assert_eq!(model.systems[0].tags, ["Externally Hosted"]);
    }

    #[test]
    fn nested_elements_are_flattened_with_parents() {
        let model = parse(
            r#"{"model": {"softwareSystems": [{
                "id": "1", "name": "Shop",
                "containers": [{"id": "2", "name": "API", "technology": "Rust",
                    "components": [{"id": "3", "name": "Orders"}]}]
            }]}}"#,
        );

        let system = &model.systems[0];
        let container = &model.containers[0];
        let component = &model.components[0];
        assert_eq!(container.parent_id.as_ref(), Some(&system.id));
        assert_eq!(container.parent_system.as_ref(), Some(&system.id));
        assert_eq!(container.technology, "Rust");
        assert_eq!(component.parent_id.as_ref(), Some(&container.id));
        assert_eq!(component.parent_container.as_ref(), Some(&container.id));
        assert!(component.id.starts_with("component-"));
        assert!(component.id.contains("-3-"));
    }

    #[test]
    fn positions_come_from_the_first_view_that_places_an_element() {
        let model = parse(
            r#"{
                "model": {"people": [{"id": "1"}, {"id": "2"}, {"id": "3"}]},
                "views": {
                    "systemContextViews": [{"elements": [{"id": "1", "x": 5, "y": 6}, {"id": "2", "x": 7}]}],
                    "componentViews": [{"elements": [{"id": "1", "x": 50, "y": 60}, {"id": "3", "x": 1, "y": 2}]}]
                }
            }"#,
        );

        let positions: Vec<_> = model.people.iter().map(|p| p.position).collect();
        assert_eq!(
            positions,
            [
                Position::new(5.0, 6.0),
                DEFAULT_POSITION,
                Position::new(1.0, 2.0)
            ]
        );
    }

    #[test]
    fn forward_relationships_survive() {
        // the person refers to a system that is defined after it
        let model = parse(
            r#"{"model": {
                "people": [{"id": "1", "name": "User", "relationships": [{"sourceId": "1", "destinationId": "9", "description": "uses"}]}],
                "softwareSystems": [{"id": "9", "name": "Shop", "relationships": [{"sourceId": "9", "destinationId": "404"}]}]
            }}"#,
        );

        assert_eq!(model.relationships.len(), 1);
        let rel = &model.relationships[0];
        assert_eq!(rel.from, model.people[0].id);
        assert_eq!(rel.to, model.systems[0].id);
        assert_eq!(rel.description, "uses");
        assert!(rel.id.starts_with("rel-"));
    }

    #[test]
    fn metadata_falls_back_in_order() {
        let model = parse(r#"{"lastModifiedUser": "ada", "properties": {"author": ""}}"#);
        assert_eq!(model.metadata.name, "Imported Model");
        assert_eq!(model.metadata.version, "1.0");
        assert_eq!(model.metadata.author, "ada");

        let model = parse(r#"{"name": "Shop", "version": "2", "properties": {"author": "Grace"}}"#);
        assert_eq!(model.metadata.name, "Shop");
        assert_eq!(model.metadata.version, "2");
        assert_eq!(model.metadata.author, "Grace");

        assert_eq!(parse("{}").metadata.author, "Unknown");
    }
}
