use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::instrument;

use super::{
    AutomaticLayout, COMPONENT_TAG, CONTAINER_TAG, Component, Configuration, Container,
    EXTERNAL_TAG, ElementStyle, ElementView, LOCATION_EXTERNAL, LOCATION_UNSPECIFIED, PERSON_TAG,
    Person, Relationship, SOFTWARE_SYSTEM_TAG, SoftwareSystem, Styles, View, Views, Workspace,
    WorkspaceModel,
};
use crate::domain::{Element, Model};

const GRID_ORIGIN: f64 = 100.0;
const GRID_PITCH: f64 = 300.0;
const GRID_WRAP: f64 = 1200.0;

/// Converts `model` into a Structurizr workspace stamped with the current
/// time.
#[must_use]
pub fn export_to_structurizr(model: &Model) -> Workspace {
    export_at(model, Utc::now())
}

/// Converts `model` into a Structurizr workspace stamped with `now`.
///
/// Shadows are skipped. Containers are attached to the system named by
/// `parent_system` (or else `parent_id`), falling back to the first system;
/// components likewise to a container. When nothing suitable exists a
/// default system or container is fabricated. Relationships are stored on
/// their source; those with an end that was not exported are dropped.
#[must_use]
#[instrument(level = "debug", skip_all)]
pub fn export_at(model: &Model, now: DateTime<Utc>) -> Workspace {
    let mut ids = ExternalIds::default();

    let mut people: Vec<_> = model
        .people
        .iter()
        .map(|person| Person {
            id: ids.id_for(&person.id),
            name: name_or(person, "Unnamed Person"),
            description: person.description.clone(),
            technology: person.technology.clone(),
            tags: tags(&[PERSON_TAG], &person.tags),
            location: LOCATION_UNSPECIFIED.to_string(),
            relationships: Vec::new(),
        })
        .collect();

    let internal = model.systems.iter().map(|system| SoftwareSystem {
        id: ids.id_for(&system.id),
        name: name_or(system, "Unnamed System"),
        description: system.description.clone(),
        technology: system.technology.clone(),
        tags: tags(&[SOFTWARE_SYSTEM_TAG], &system.tags),
        location: LOCATION_UNSPECIFIED.to_string(),
        containers: Vec::new(),
        relationships: Vec::new(),
    });
    let mut systems: Vec<_> = internal.collect();
    for external in &model.external_systems {
        systems.push(SoftwareSystem {
            id: ids.id_for(&external.id),
            name: name_or(external, "Unnamed External System"),
            description: external.description.clone(),
            technology: external.technology.clone(),
            tags: tags(&[SOFTWARE_SYSTEM_TAG, EXTERNAL_TAG], &external.tags),
            location: LOCATION_EXTERNAL.to_string(),
            containers: Vec::new(),
            relationships: Vec::new(),
        });
    }

    for container in &model.containers {
        let exported = Container {
            id: ids.id_for(&container.id),
            name: name_or(container, "Unnamed Container"),
            description: container.description.clone(),
            technology: container.technology.clone(),
            tags: tags(&[CONTAINER_TAG], &container.tags),
            components: Vec::new(),
            relationships: Vec::new(),
        };

        let parent = declared_parents(container.parent_system.as_deref(), container)
            .filter_map(|native| ids.lookup(native))
            .find_map(|external| systems.iter().position(|s| s.id == external));
        match parent {
            Some(index) => systems[index].containers.push(exported),
            None if systems.is_empty() => {
                tracing::debug!(id = %container.id, "fabricating a default system");
                let mut system = default_system(&mut ids, "containers");
                system.containers.push(exported);
                systems.push(system);
            }
            None => systems[0].containers.push(exported),
        }
    }

    for component in &model.components {
        let exported = Component {
            id: ids.id_for(&component.id),
            name: name_or(component, "Unnamed Component"),
            description: component.description.clone(),
            technology: component.technology.clone(),
            tags: tags(&[COMPONENT_TAG], &component.tags),
            relationships: Vec::new(),
        };

        let parent = declared_parents(component.parent_container.as_deref(), component)
            .filter_map(|native| ids.lookup(native))
            .find_map(|external| find_container(&systems, external))
            .or_else(|| first_container(&systems));
        match parent {
            Some((s, c)) => systems[s].containers[c].components.push(exported),
            None => {
                tracing::debug!(id = %component.id, "fabricating a default container");
                if systems.is_empty() {
                    systems.push(default_system(&mut ids, "components"));
                }
                let mut container = default_container(&mut ids);
                container.components.push(exported);
                systems[0].containers.push(container);
            }
        }
    }

    for relationship in &model.relationships {
        let (Some(source), Some(destination)) =
            (ids.lookup(&relationship.from), ids.lookup(&relationship.to))
        else {
            tracing::debug!(id = %relationship.id, "dropping relationship with an unexported end");
            continue;
        };
        let exported = Relationship {
            source_id: source.to_string(),
            destination_id: destination.to_string(),
            description: relationship.description.clone(),
            technology: relationship.technology.clone(),
            tags: String::new(),
        };
        if let Some(list) = relationships_of(&mut people, &mut systems, source) {
            list.push(exported);
        }
    }

    let views = views(&people, &systems);
    let metadata = &model.metadata;

    Workspace {
        id: 1,
        name: non_empty_or(&metadata.name, "Architecture Model"),
        description: format!(
            "Exported from c4-modeller on {}",
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        version: non_empty_or(&metadata.version, "1.0"),
        last_modified_user: None,
        model: WorkspaceModel {
            people,
            software_systems: systems,
        },
        views,
        documentation: serde_json::Map::new(),
        properties: [
            ("exportedFrom".to_string(), "c4-modeller".to_string()),
            ("author".to_string(), metadata.author.clone()),
        ]
        .into_iter()
        .collect(),
    }
}

/// Hands out sequential workspace identifiers, one per native id.
#[derive(Debug, Default)]
struct ExternalIds {
    last: u64,
    assigned: HashMap<String, String>,
}

impl ExternalIds {
    fn id_for(&mut self, native: &str) -> String {
        if let Some(id) = self.assigned.get(native) {
            return id.clone();
        }
        let id = self.fresh();
        self.assigned.insert(native.to_string(), id.clone());
        id
    }

    fn lookup(&self, native: &str) -> Option<&str> {
        self.assigned.get(native).map(String::as_str)
    }

    fn fresh(&mut self) -> String {
        self.last += 1;
        self.last.to_string()
    }
}

/// The legacy hint first, then `parent_id`.
fn declared_parents<'a>(
    hint: Option<&'a str>,
    element: &'a Element,
) -> impl Iterator<Item = &'a str> {
    hint.into_iter().chain(element.parent_id.as_deref())
}

fn find_container(systems: &[SoftwareSystem], id: &str) -> Option<(usize, usize)> {
    systems.iter().enumerate().find_map(|(s, system)| {
        system
            .containers
            .iter()
            .position(|container| container.id == id)
            .map(|c| (s, c))
    })
}

fn first_container(systems: &[SoftwareSystem]) -> Option<(usize, usize)> {
    systems
        .iter()
        .position(|system| !system.containers.is_empty())
        .map(|s| (s, 0))
}

fn default_system(ids: &mut ExternalIds, orphans: &str) -> SoftwareSystem {
    SoftwareSystem {
        id: ids.fresh(),
        name: "Default System".to_string(),
        description: format!("System created to contain orphaned {orphans}"),
        technology: String::new(),
        tags: SOFTWARE_SYSTEM_TAG.to_string(),
        location: LOCATION_UNSPECIFIED.to_string(),
        containers: Vec::new(),
        relationships: Vec::new(),
    }
}

fn default_container(ids: &mut ExternalIds) -> Container {
    Container {
        id: ids.fresh(),
        name: "Default Container".to_string(),
        description: "Container created to contain orphaned components".to_string(),
        technology: String::new(),
        tags: CONTAINER_TAG.to_string(),
        components: Vec::new(),
        relationships: Vec::new(),
    }
}

/// The relationship list of the element with workspace id `id`, searching
/// people, then systems, their containers and their components.
fn relationships_of<'w>(
    people: &'w mut [Person],
    systems: &'w mut [SoftwareSystem],
    id: &str,
) -> Option<&'w mut Vec<Relationship>> {
    if let Some(person) = people.iter_mut().find(|p| p.id == id) {
        return Some(&mut person.relationships);
    }
    for system in systems {
        if system.id == id {
            return Some(&mut system.relationships);
        }
        for container in &mut system.containers {
            if container.id == id {
                return Some(&mut container.relationships);
            }
            if let Some(component) = container.components.iter_mut().find(|c| c.id == id) {
                return Some(&mut component.relationships);
            }
        }
    }
    None
}

/// A single landscape view laying out people and systems on a grid, and
/// the fixed style table.
fn views(people: &[Person], systems: &[SoftwareSystem]) -> Views {
    let mut landscape = Vec::new();
    if !people.is_empty() || !systems.is_empty() {
        let (mut x, mut y) = (GRID_ORIGIN, GRID_ORIGIN);
        let placed = people.iter().map(|p| &p.id).chain(systems.iter().map(|s| &s.id));
        let elements = placed
            .map(|id| {
                let view = ElementView {
                    id: id.clone(),
                    x: Some(x),
                    y: Some(y),
                };
                x += GRID_PITCH;
                if x > GRID_WRAP {
                    x = GRID_ORIGIN;
                    y += GRID_PITCH;
                }
                view
            })
            .collect();

        landscape.push(View {
            key: "SystemLandscape".to_string(),
            description: "System Landscape view".to_string(),
            elements,
            relationships: Vec::new(),
            automatic_layout: Some(AutomaticLayout {
                rank_direction: "TopBottom".to_string(),
                rank_separation: 200,
                node_separation: 200,
            }),
        });
    }

    Views {
        system_landscape_views: landscape,
        configuration: Configuration {
            styles: Styles {
                elements: styles(),
                relationships: Vec::new(),
            },
        },
        ..Views::default()
    }
}

fn styles() -> Vec<ElementStyle> {
    let style = |tag: &str, shape: Option<&str>, background: &str, color: &str| ElementStyle {
        tag: tag.to_string(),
        shape: shape.map(str::to_string),
        background: background.to_string(),
        color: color.to_string(),
    };
    vec![
        style(PERSON_TAG, Some("Person"), "#08427b", "#ffffff"),
        style(SOFTWARE_SYSTEM_TAG, None, "#1168bd", "#ffffff"),
        style(EXTERNAL_TAG, None, "#999999", "#ffffff"),
        style(CONTAINER_TAG, None, "#438dd5", "#ffffff"),
        style(COMPONENT_TAG, None, "#85bbf0", "#000000"),
    ]
}

/// Type tags first, then user tags that do not repeat them.
fn tags(type_tags: &[&str], user: &[String]) -> String {
    type_tags
        .iter()
        .copied()
        .chain(
            user.iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty() && !type_tags.contains(tag)),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn name_or(element: &Element, fallback: &str) -> String {
    non_empty_or(&element.name, fallback)
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
