//! Advisory model checks.
//!
//! Validation never changes the model and never fails; it returns a list of
//! [`Warning`]s for a collaborator to present.

use std::{collections::HashSet, fmt};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;

use crate::domain::{ElementKind, Model};

/// How much a warning matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A usability hint.
    Info,
    /// A structural oddity that the model tolerates.
    Warning,
    /// A reference that cannot be followed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// What a warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// A container's `parentSystem` hint names no system.
    MissingParentSystem,
    /// A component's `parentContainer` hint names no container.
    MissingParentContainer,
    /// An element's `parentId` names no element.
    DanglingParent,
    /// A relationship's source does not resolve.
    DanglingSource,
    /// A relationship's target does not resolve.
    DanglingTarget,
    /// A set of elements contain each other.
    ContainmentCycle,
    /// The current view shows more elements than the configured threshold.
    CrowdedView,
}

impl WarningKind {
    /// The severity attached to this kind of warning.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::CrowdedView => Severity::Info,
            Self::DanglingSource | Self::DanglingTarget => Severity::Error,
            Self::MissingParentSystem
            | Self::MissingParentContainer
            | Self::DanglingParent
            | Self::ContainmentCycle => Severity::Warning,
        }
    }
}

/// A single advisory finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    /// How much it matters.
    pub severity: Severity,
    /// What it is about.
    pub kind: WarningKind,
    /// Human-readable description.
    pub message: String,
    /// The element or relationship concerned, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl Warning {
    fn new(kind: WarningKind, message: String, element_id: Option<&str>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message,
            element_id: element_id.map(str::to_string),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Checks `model`, given the number of elements in the current view and
/// the crowded-view threshold.
#[must_use]
pub fn validate(model: &Model, visible: usize, max_visible: usize) -> Vec<Warning> {
    let ids: HashSet<&str> = model.elements().map(|element| element.id.as_str()).collect();
    let mut warnings = Vec::new();

    for container in &model.containers {
        let dangling = container
            .parent_system
            .as_deref()
            .is_some_and(|system| !model.systems.iter().any(|s| s.id == system));
        if dangling {
            warnings.push(Warning::new(
                WarningKind::MissingParentSystem,
                format!(
                    "Container \"{}\" references non-existent parent system",
                    container.display_name()
                ),
                Some(&container.id),
            ));
        }
    }

    for component in &model.components {
        let dangling = component
            .parent_container
            .as_deref()
            .is_some_and(|container| !model.containers.iter().any(|c| c.id == container));
        if dangling {
            warnings.push(Warning::new(
                WarningKind::MissingParentContainer,
                format!(
                    "Component \"{}\" references non-existent parent container",
                    component.display_name()
                ),
                Some(&component.id),
            ));
        }
    }

    for element in model.elements() {
        let Some(parent) = element.parent_id.as_deref() else {
            continue;
        };
        if !ids.contains(parent) {
            warnings.push(Warning::new(
                WarningKind::DanglingParent,
                format!(
                    "{} \"{}\" references non-existent parent {parent}",
                    element.kind.label(),
                    element.display_name()
                ),
                Some(&element.id),
            ));
        }
    }

    warnings.extend(containment_cycles(model, &ids));

    for relationship in &model.relationships {
        if !ids.contains(relationship.from.as_str()) {
            warnings.push(Warning::new(
                WarningKind::DanglingSource,
                format!(
                    "Relationship references non-existent source element: {}",
                    relationship.from
                ),
                Some(&relationship.id),
            ));
        }
        if !ids.contains(relationship.to.as_str()) {
            warnings.push(Warning::new(
                WarningKind::DanglingTarget,
                format!(
                    "Relationship references non-existent target element: {}",
                    relationship.to
                ),
                Some(&relationship.id),
            ));
        }
    }

    if visible > max_visible {
        warnings.push(Warning::new(
            WarningKind::CrowdedView,
            format!(
                "Current view has {visible} elements. Consider splitting into multiple diagrams for clarity."
            ),
            None,
        ));
    }

    warnings
}

/// Finds sets of elements whose `parent_id` links form a loop.
fn containment_cycles(model: &Model, ids: &HashSet<&str>) -> Vec<Warning> {
    // edges point from child to parent
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for element in model.elements() {
        graph.add_node(element.id.as_str());
        if let Some(parent) = element.parent_id.as_deref().filter(|p| ids.contains(p)) {
            graph.add_edge(element.id.as_str(), parent, ());
        }
    }

    let mut cycles = Vec::new();
    for component in tarjan_scc(&graph) {
        let is_cycle = match component.as_slice() {
            [] => false,
            [node] => graph.contains_edge(*node, *node),
            _ => true,
        };
        if !is_cycle {
            continue;
        }

        let mut members = component;
        members.sort_unstable();
        let names: Vec<_> = members
            .iter()
            .filter_map(|id| model.element(id))
            .map(|element| element.display_name())
            .collect();
        cycles.push(Warning::new(
            WarningKind::ContainmentCycle,
            format!("Containment cycle between {}", names.join(", ")),
            members.first().copied(),
        ));
    }

    cycles.sort_by(|a, b| a.element_id.cmp(&b.element_id));
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Config, Element, ElementPatch, Relationship},
        store::Store,
    };

    fn sample(kind: ElementKind, id: &str) -> Element {
        let mut element = Element::new(id, kind);
        element.name = id.to_uppercase();
        element
    }

    fn child(kind: ElementKind, id: &str, parent: &str) -> Element {
        let mut element = sample(kind, id);
        element.parent_id = Some(parent.to_string());
        element
    }

    #[test]
    fn clean_model_has_no_warnings() {
        let mut model = Model::default();
        model.systems.push(sample(ElementKind::System, "sys-1"));
        model
            .containers
            .push(child(ElementKind::Container, "con-1", "sys-1"));
        model
            .relationships
            .push(Relationship::new("rel-1", "con-1", "sys-1"));

        assert!(validate(&model, 1, 15).is_empty());
    }

    #[test]
    fn dangling_target_yields_exactly_one_warning() {
        let mut model = Model::default();
        model.systems.push(sample(ElementKind::System, "sys-1"));
        model
            .relationships
            .push(Relationship::new("rel-1", "sys-1", "missing-id"));

        let warnings = validate(&model, 1, 15);

        let about_rel: Vec<_> = warnings
            .iter()
            .filter(|w| w.element_id.as_deref() == Some("rel-1"))
            .collect();
        assert_eq!(about_rel.len(), 1);
        assert_eq!(about_rel[0].kind, WarningKind::DanglingTarget);
        assert_eq!(about_rel[0].severity, Severity::Error);
        assert!(about_rel[0].message.ends_with("missing-id"));
    }

    #[test]
    fn legacy_parent_hints_are_checked() {
        let mut model = Model::default();
        let mut container = sample(ElementKind::Container, "con-1");
        container.parent_system = Some("gone".to_string());
        let mut component = sample(ElementKind::Component, "cmp-1");
        component.parent_container = Some("con-1".to_string());
        let mut stray = sample(ElementKind::Component, "cmp-2");
        stray.parent_container = Some("gone".to_string());
        model.containers.push(container);
        model.components.extend([component, stray]);

        let kinds: Vec<_> = validate(&model, 0, 15).into_iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            [WarningKind::MissingParentSystem, WarningKind::MissingParentContainer]
        );
    }

    #[test]
    fn dangling_parent_is_reported() {
        let mut model = Model::default();
        model
            .containers
            .push(child(ElementKind::Container, "con-1", "sys-gone"));

        let warnings = validate(&model, 0, 15);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DanglingParent);
        assert_eq!(warnings[0].element_id.as_deref(), Some("con-1"));
    }

    #[test]
    fn containment_cycles_are_reported_once() {
        let mut model = Model::default();
        model.systems.push(child(ElementKind::System, "a", "b"));
        model.containers.push(child(ElementKind::Container, "b", "a"));
        model.components.push(child(ElementKind::Component, "c", "c"));
        model.people.push(sample(ElementKind::Person, "p"));

        let cycles: Vec<_> = validate(&model, 0, 15)
            .into_iter()
            .filter(|w| w.kind == WarningKind::ContainmentCycle)
            .collect();

        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].element_id.as_deref(), Some("a"));
        assert_eq!(cycles[0].message, "Containment cycle between A, B");
        assert_eq!(cycles[1].element_id.as_deref(), Some("c"));
    }

    #[test]
    fn crowded_view_is_informational() {
        let mut store = Store::new(Config::default());
        for i in 0..16 {
            store.add_element(ElementKind::Person, ElementPatch::named(format!("P{i}")));
        }

        let warnings = store.validate_model().to_vec();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::CrowdedView);
        assert_eq!(warnings[0].severity, Severity::Info);
        assert_eq!(warnings[0].element_id, None);
        assert_eq!(store.warnings(), warnings.as_slice());
    }

    #[test]
    fn crowded_threshold_is_configurable() {
        let mut config = Config::default();
        config.set_max_visible_elements(2);
        let mut store = Store::new(config);
        for _ in 0..2 {
            store.add_element(ElementKind::System, ElementPatch::default());
        }
        assert!(store.validate_model().is_empty());

        store.add_element(ElementKind::System, ElementPatch::default());
        assert_eq!(store.validate_model().len(), 1);
    }

    #[test]
    fn warnings_serialize_with_camel_case_keys() {
        let warning = Warning::new(
            WarningKind::DanglingSource,
            "Relationship references non-existent source element: x".to_string(),
            Some("rel-1"),
        );
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["kind"], "danglingSource");
        assert_eq!(json["elementId"], "rel-1");
    }
}
