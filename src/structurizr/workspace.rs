//! Structurizr workspace document types.
//!
//! Only the subset of the Structurizr JSON schema this crate reads and writes
//! is modelled. Every field is optional on input; identifiers may be given as
//! strings or numbers. Layout settings and properties of an unexpected shape
//! are dropped rather than failing the whole document.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::lenient;

/// A Structurizr workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Workspace {
    /// Workspace number.
    #[serde(deserialize_with = "number")]
    pub id: u64,
    /// Workspace name.
    pub name: String,
    /// Workspace description.
    pub description: String,
    /// Version label.
    pub version: String,
    /// The last user to modify the workspace, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_user: Option<String>,
    /// The nested architecture model.
    pub model: WorkspaceModel,
    /// Diagram definitions.
    pub views: Views,
    /// Documentation sections, carried opaquely.
    pub documentation: Map<String, Value>,
    /// Free-form properties. Numbers and booleans are read as text; other
    /// values are skipped.
    #[serde(deserialize_with = "properties")]
    pub properties: BTreeMap<String, String>,
}

/// The `model` section of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceModel {
    /// People.
    pub people: Vec<Person>,
    /// Software systems, internal and external.
    pub software_systems: Vec<SoftwareSystem>,
}

/// A person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    /// Workspace-local identifier.
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Technology. Not part of the Structurizr schema for people.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub technology: String,
    /// Comma-separated tags.
    pub tags: String,
    /// `Unspecified`, `Internal` or `External`.
    pub location: String,
    /// Relationships originating here.
    pub relationships: Vec<Relationship>,
}

/// A software system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoftwareSystem {
    /// Workspace-local identifier.
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Technology. Not part of the Structurizr schema for systems.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub technology: String,
    /// Comma-separated tags.
    pub tags: String,
    /// `Unspecified`, `Internal` or `External`.
    pub location: String,
    /// Nested containers.
    pub containers: Vec<Container>,
    /// Relationships originating here.
    pub relationships: Vec<Relationship>,
}

/// A container, nested in a software system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Container {
    /// Workspace-local identifier.
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Technology.
    pub technology: String,
    /// Comma-separated tags.
    pub tags: String,
    /// Nested components.
    pub components: Vec<Component>,
    /// Relationships originating here.
    pub relationships: Vec<Relationship>,
}

/// A component, nested in a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Component {
    /// Workspace-local identifier.
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Technology.
    pub technology: String,
    /// Comma-separated tags.
    pub tags: String,
    /// Relationships originating here.
    pub relationships: Vec<Relationship>,
}

/// A relationship, stored on its source element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Relationship {
    /// Source element identifier.
    #[serde(deserialize_with = "identifier")]
    pub source_id: String,
    /// Destination element identifier.
    #[serde(deserialize_with = "identifier")]
    pub destination_id: String,
    /// Description.
    pub description: String,
    /// Technology.
    pub technology: String,
    /// Comma-separated tags.
    pub tags: String,
}

/// The `views` section of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Views {
    /// System landscape views.
    pub system_landscape_views: Vec<View>,
    /// System context views.
    pub system_context_views: Vec<View>,
    /// Container views.
    pub container_views: Vec<View>,
    /// Component views.
    pub component_views: Vec<View>,
    /// Styling.
    pub configuration: Configuration,
}

impl Views {
    /// Every view, in landscape, context, container, component order.
    pub fn all(&self) -> impl Iterator<Item = &View> {
        self.system_landscape_views
            .iter()
            .chain(&self.system_context_views)
            .chain(&self.container_views)
            .chain(&self.component_views)
    }
}

/// A single diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct View {
    /// Unique key.
    pub key: String,
    /// Description.
    pub description: String,
    /// Placed elements.
    pub elements: Vec<ElementView>,
    /// Placed relationships, carried opaquely.
    pub relationships: Vec<Value>,
    /// Automatic layout settings.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::field"
    )]
    pub automatic_layout: Option<AutomaticLayout>,
}

/// An element placed on a view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementView {
    /// The element identifier.
    #[serde(deserialize_with = "identifier")]
    pub id: String,
    /// Horizontal coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Vertical coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// Automatic layout settings of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutomaticLayout {
    /// `TopBottom`, `BottomTop`, `LeftRight` or `RightLeft`.
    pub rank_direction: String,
    /// Distance between ranks.
    pub rank_separation: u32,
    /// Distance between nodes in a rank.
    pub node_separation: u32,
}

impl Default for AutomaticLayout {
    fn default() -> Self {
        Self {
            rank_direction: "TopBottom".to_string(),
            rank_separation: 300,
            node_separation: 300,
        }
    }
}

/// View configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Styles keyed by tag.
    pub styles: Styles,
}

/// Element and relationship styles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Styles {
    /// Element styles.
    pub elements: Vec<ElementStyle>,
    /// Relationship styles, carried opaquely.
    pub relationships: Vec<Value>,
}

/// The style applied to elements carrying `tag`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStyle {
    /// The tag selecting elements.
    pub tag: String,
    /// Shape name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Fill colour.
    pub background: String,
    /// Text colour.
    pub color: String,
}

/// Reads an identifier given as a string or a number.
fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Reads a property map, keeping scalar values as text.
fn properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect())
}

/// Reads a workspace number given as a number or a numeric string.
fn number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}
