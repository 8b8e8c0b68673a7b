//! The serializable model root.
//!
//! A [`Model`] is the unit handed to every persistence and interchange
//! collaborator. Deserialization always goes through a normalizing step: a
//! document with missing collections or badly typed fields yields a
//! well-formed model with defaults filled in, never an error.
//!
//! Missing metadata fields are left blank. They depend on configuration, so
//! the [`Store`](crate::Store) fills them in with [`Metadata::fill_blanks`]
//! when it takes the model over.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    element::{Element, ElementKind, RawElement},
    id::FreshIds,
    lenient,
    relationship::{RawRelationship, Relationship},
};

/// Descriptive information about a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Model name.
    pub name: String,
    /// Model version label.
    pub version: String,
    /// Author.
    pub author: String,
}

impl Metadata {
    /// Replaces blank fields with the matching field of `defaults`.
    pub fn fill_blanks(&mut self, defaults: &Self) {
        for (field, default) in [
            (&mut self.name, &defaults.name),
            (&mut self.version, &defaults.version),
            (&mut self.author, &defaults.author),
        ] {
            if field.trim().is_empty() {
                field.clone_from(default);
            }
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: "New C4 Model".to_string(),
            version: "1.0".to_string(),
            author: "Solution Architect".to_string(),
        }
    }
}

/// The whole architecture model: metadata, six element collections and the
/// relationships between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawModel")]
pub struct Model {
    /// Descriptive metadata.
    pub metadata: Metadata,
    /// Software systems.
    pub systems: Vec<Element>,
    /// Containers.
    pub containers: Vec<Element>,
    /// Components.
    pub components: Vec<Element>,
    /// People.
    pub people: Vec<Element>,
    /// External systems.
    pub external_systems: Vec<Element>,
    /// Shadows.
    pub shadows: Vec<Element>,
    /// Relationships.
    pub relationships: Vec<Relationship>,
}

impl Model {
    /// Creates an empty model with the given metadata.
    #[must_use]
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// The collection holding elements of `kind`.
    #[must_use]
    pub fn collection(&self, kind: ElementKind) -> &Vec<Element> {
        match kind {
            ElementKind::System => &self.systems,
            ElementKind::Container => &self.containers,
            ElementKind::Component => &self.components,
            ElementKind::Person => &self.people,
            ElementKind::ExternalSystem => &self.external_systems,
            ElementKind::Shadow => &self.shadows,
        }
    }

    /// The mutable collection holding elements of `kind`.
    pub fn collection_mut(&mut self, kind: ElementKind) -> &mut Vec<Element> {
        match kind {
            ElementKind::System => &mut self.systems,
            ElementKind::Container => &mut self.containers,
            ElementKind::Component => &mut self.components,
            ElementKind::Person => &mut self.people,
            ElementKind::ExternalSystem => &mut self.external_systems,
            ElementKind::Shadow => &mut self.shadows,
        }
    }

    /// Every element: collections in [`ElementKind::ALL`] order, insertion
    /// order within each.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        ElementKind::ALL
            .into_iter()
            .flat_map(move |kind| self.collection(kind).iter())
    }

    /// Finds an element by identifier across all collections.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements().find(|element| element.id == id)
    }

    /// The elements whose `parent_id` equals `parent`. `None` yields the
    /// root-level elements.
    #[must_use]
    pub fn children(&self, parent: Option<&str>) -> Vec<&Element> {
        self.elements()
            .filter(|element| element.parent_id.as_deref() == parent)
            .collect()
    }

    /// The number of elements across all collections.
    #[must_use]
    pub fn element_count(&self) -> usize {
        ElementKind::ALL
            .into_iter()
            .map(|kind| self.collection(kind).len())
            .sum()
    }

    /// Whether the model holds at least one element that is not a shadow.
    #[must_use]
    pub fn has_content(&self) -> bool {
        ElementKind::ALL
            .into_iter()
            .filter(|kind| *kind != ElementKind::Shadow)
            .any(|kind| !self.collection(kind).is_empty())
    }
}

/// The untrusted form of a [`Model`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawModel {
    #[serde(deserialize_with = "lenient::field")]
    metadata: Option<RawMetadata>,
    #[serde(deserialize_with = "lenient::field")]
    systems: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::field")]
    containers: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::field")]
    components: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::field")]
    people: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::field")]
    external_systems: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::field")]
    shadows: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::field")]
    relationships: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    #[serde(deserialize_with = "lenient::field")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    version: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    author: Option<String>,
}

impl From<RawMetadata> for Metadata {
    fn from(raw: RawMetadata) -> Self {
        Self {
            name: raw.name.unwrap_or_default(),
            version: raw.version.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
        }
    }
}

impl From<RawModel> for Model {
    fn from(raw: RawModel) -> Self {
        let mut ids = FreshIds::default();
        let mut model = Self {
            metadata: Metadata::from(raw.metadata.unwrap_or_default()),
            ..Self::default()
        };

        let collections = [
            (ElementKind::System, raw.systems),
            (ElementKind::Container, raw.containers),
            (ElementKind::Component, raw.components),
            (ElementKind::Person, raw.people),
            (ElementKind::ExternalSystem, raw.external_systems),
            (ElementKind::Shadow, raw.shadows),
        ];

        for (kind, values) in collections {
            let elements = values
                .unwrap_or_default()
                .into_iter()
                .filter_map(|value| serde_json::from_value::<RawElement>(value).ok())
                .map(|raw| raw.normalize(kind, &mut ids))
                .collect();
            *model.collection_mut(kind) = elements;
        }

        model.relationships = raw
            .relationships
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| serde_json::from_value::<RawRelationship>(value).ok())
            .map(|raw| raw.normalize(&mut ids))
            .collect();

        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::Position;

    fn sample() -> Model {
        let mut model = Model::default();
        let mut system = Element::new("sys-1", ElementKind::System);
        system.name = "Billing".to_string();
        system.position = Position::new(10.0, 20.0);
        let mut api = Element::new("con-1", ElementKind::Container);
        api.parent_id = Some("sys-1".to_string());
        api.technology = "Rust".to_string();
        let mut shadow = Element::new("sh-1", ElementKind::Shadow);
        shadow.target_id = Some("sys-1".to_string());
        model.systems.push(system);
        model.containers.push(api);
        model.shadows.push(shadow);
        model
            .relationships
            .push(Relationship::new("rel-1", "con-1", "sys-1"));
        model
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let model = sample();
        let json = serde_json::to_string(&model).unwrap();
        let restored: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn empty_object_yields_empty_model() {
        let mut model: Model = serde_json::from_str("{}").unwrap();
        assert_eq!(model.element_count(), 0);
        assert!(model.relationships.is_empty());

        model.metadata.fill_blanks(&Metadata::default());
        assert_eq!(model, Model::default());
    }

    #[test]
    fn partial_metadata_leaves_gaps_blank() {
        let model: Model = serde_json::from_str(r#"{"metadata": {"name": "Shop"}}"#).unwrap();
        assert_eq!(model.metadata.name, "Shop");
        assert_eq!(model.metadata.version, "");
        assert_eq!(model.metadata.author, "");
    }

    #[test]
    fn fill_blanks_keeps_present_fields() {
        let mut metadata = Metadata {
            name: "Shop".to_string(),
            version: "  ".to_string(),
            author: String::new(),
        };
        let defaults = Metadata {
            author: "Grace".to_string(),
            ..Metadata::default()
        };

        metadata.fill_blanks(&defaults);

        assert_eq!(metadata.name, "Shop");
        assert_eq!(metadata.version, "1.0");
        assert_eq!(metadata.author, "Grace");
    }

    #[test]
    fn malformed_collections_are_defaulted() {
        let model: Model = serde_json::from_str(
            r#"{"systems": "nope", "people": [1, {"name": "Ops", "type": "system"}], "relationships": [{"from": "x"}]}"#,
        )
        .unwrap();

        assert!(model.systems.is_empty());
        assert_eq!(model.people.len(), 1);
        // the collection decides the kind
        assert_eq!(model.people[0].kind, ElementKind::Person);
        assert!(model.people[0].id.starts_with("person-"));
        assert_eq!(model.relationships[0].from, "x");
        assert_eq!(model.relationships[0].to, "");
    }

    #[test]
    fn elements_follow_collection_order() {
        let model = sample();
        let ids: Vec<_> = model.elements().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["sys-1", "con-1", "sh-1"]);
        assert_eq!(model.element_count(), 3);
        assert_eq!(
            model.element("con-1").map(|e| e.kind),
            Some(ElementKind::Container)
        );
    }

    #[test]
    fn shadows_alone_are_not_content() {
        let mut model = Model::default();
        model
            .shadows
            .push(Element::new("sh-1", ElementKind::Shadow));
        assert!(!model.has_content());
        model
            .people
            .push(Element::new("p-1", ElementKind::Person));
        assert!(model.has_content());
    }
}
