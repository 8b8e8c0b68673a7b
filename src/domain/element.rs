//! Architecture elements.
//!
//! Every node in a model is an [`Element`]. Its [`ElementKind`] selects the
//! collection it lives in; containment is expressed through `parent_id`, a
//! weak reference resolved by lookup.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{id, id::FreshIds, lenient};

/// The kind of an architecture element.
///
/// Variants are declared in collection order: the order in which
/// collections are concatenated when enumerating every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// A software system owned by the modelling team.
    System,
    /// A deployable or addressable unit inside a system.
    Container,
    /// A code-level building block inside a container.
    Component,
    /// A human actor.
    Person,
    /// A third-party system outside the team's control.
    ExternalSystem,
    /// A presentation-only mirror of another element.
    Shadow,
}

impl ElementKind {
    /// Every kind, in collection order.
    pub const ALL: [Self; 6] = [
        Self::System,
        Self::Container,
        Self::Component,
        Self::Person,
        Self::ExternalSystem,
        Self::Shadow,
    ];

    /// The identifier used in serialized models (the `type` field).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Container => "container",
            Self::Component => "component",
            Self::Person => "person",
            Self::ExternalSystem => "externalSystem",
            Self::Shadow => "shadow",
        }
    }

    /// The name of the model collection holding elements of this kind.
    #[must_use]
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::System => "systems",
            Self::Container => "containers",
            Self::Component => "components",
            Self::Person => "people",
            Self::ExternalSystem => "externalSystems",
            Self::Shadow => "shadows",
        }
    }

    /// A human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Container => "Container",
            Self::Component => "Component",
            Self::Person => "Person",
            Self::ExternalSystem => "External System",
            Self::Shadow => "Shadow",
        }
    }

    /// Leaves cannot be drilled into.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Person | Self::ExternalSystem)
    }

    /// The kinds offered for creation inside a context whose element has
    /// kind `parent` (`None` for the root or an unresolved context).
    ///
    /// This is an editing affordance only. The store accepts any parentage.
    #[must_use]
    pub const fn allowed_children(parent: Option<Self>) -> &'static [Self] {
        match parent {
            None => &[Self::System, Self::Person, Self::ExternalSystem],
            Some(Self::System) => &[Self::Container, Self::Person],
            Some(Self::Container) => &[Self::Component],
            Some(_) => &[],
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name an element kind.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown element kind '{0}'")]
pub struct UnknownKindError(String);

impl FromStr for ElementKind {
    type Err = UnknownKindError;

    /// Parses a kind, ignoring case and `-`/`_` separators, so that
    /// `externalSystem`, `external-system` and `EXTERNAL_SYSTEM` all match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "system" => Ok(Self::System),
            "container" => Ok(Self::Container),
            "component" => Ok(Self::Component),
            "person" => Ok(Self::Person),
            "externalsystem" => Ok(Self::ExternalSystem),
            "shadow" => Ok(Self::Shadow),
            _ => Err(UnknownKindError(s.to_string())),
        }
    }
}

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A delivery phase of an element, spanning whole months.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Phase {
    /// Phase identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// First month, formatted `YYYY-MM`.
    pub start_month: String,
    /// Last month, formatted `YYYY-MM`.
    pub end_month: String,
}

/// Errors raised when constructing a [`Phase`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhaseError {
    /// A month was not formatted `YYYY-MM`.
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    /// The phase ends before it starts.
    #[error("phase ends ({end}) before it starts ({start})")]
    EndsBeforeStart {
        /// The start month.
        start: String,
        /// The end month.
        end: String,
    },
}

impl Phase {
    /// Creates a phase with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::InvalidMonth`] if either month is not `YYYY-MM`,
    /// or [`PhaseError::EndsBeforeStart`] if `end` precedes `start`.
    pub fn new(
        name: impl Into<String>,
        start_month: impl Into<String>,
        end_month: impl Into<String>,
    ) -> Result<Self, PhaseError> {
        let start_month = start_month.into();
        let end_month = end_month.into();
        let start = parse_month(&start_month)?;
        let end = parse_month(&end_month)?;
        if end < start {
            return Err(PhaseError::EndsBeforeStart {
                start: start_month,
                end: end_month,
            });
        }
        Ok(Self {
            id: id::mint("phase"),
            name: name.into(),
            start_month,
            end_month,
        })
    }

    /// The first days of the start and end months, if both parse.
    #[must_use]
    pub fn months(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((
            parse_month(&self.start_month).ok()?,
            parse_month(&self.end_month).ok()?,
        ))
    }
}

fn parse_month(month: &str) -> Result<NaiveDate, PhaseError> {
    let well_formed = month.len() == 7
        && month.as_bytes()[4] == b'-'
        && month
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit());
    if !well_formed {
        return Err(PhaseError::InvalidMonth(month.to_string()));
    }
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| PhaseError::InvalidMonth(month.to_string()))
}

/// A node in the architecture model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Globally unique, stable identifier.
    pub id: String,
    /// Element kind; selects the owning collection.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Implementation technology.
    pub technology: String,
    /// Ordered tags.
    pub tags: Vec<String>,
    /// The containing element, or `None` at root level.
    pub parent_id: Option<String>,
    /// Canvas position.
    pub position: Position,
    /// Product ownership label.
    #[serde(rename = "ownerPM", skip_serializing_if = "Option::is_none")]
    pub owner_pm: Option<String>,
    /// UX ownership label.
    #[serde(rename = "ownerUX", skip_serializing_if = "Option::is_none")]
    pub owner_ux: Option<String>,
    /// Technical ownership label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_tech: Option<String>,
    /// Delivery phases.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<Phase>,
    /// For shadows: the element being mirrored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Legacy parent hint on containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_system: Option<String>,
    /// Legacy parent hint on components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_container: Option<String>,
}

impl Element {
    /// Creates an empty root-level element.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: String::new(),
            description: String::new(),
            technology: String::new(),
            tags: Vec::new(),
            parent_id: None,
            position: Position::default(),
            owner_pm: None,
            owner_ux: None,
            owner_tech: None,
            phases: Vec::new(),
            target_id: None,
            parent_system: None,
            parent_container: None,
        }
    }

    /// The name, or the identifier when the name is blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Whether this element sits at root level.
    #[must_use]
    pub const fn is_root_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A partial update to an [`Element`].
///
/// `None` leaves a field untouched. For optional fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New technology.
    pub technology: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// New parent.
    pub parent_id: Option<Option<String>>,
    /// New position.
    pub position: Option<Position>,
    /// New product owner.
    pub owner_pm: Option<Option<String>>,
    /// New UX owner.
    pub owner_ux: Option<Option<String>>,
    /// New technical owner.
    pub owner_tech: Option<Option<String>>,
    /// Replacement phases.
    pub phases: Option<Vec<Phase>>,
    /// New shadow target.
    pub target_id: Option<Option<String>>,
    /// New legacy parent system hint.
    pub parent_system: Option<Option<String>>,
    /// New legacy parent container hint.
    pub parent_container: Option<Option<String>>,
}

impl ElementPatch {
    /// A patch that only sets the name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Merges this patch onto `element`.
    pub fn apply(self, element: &mut Element) {
        let Self {
            name,
            description,
            technology,
            tags,
            parent_id,
            position,
            owner_pm,
            owner_ux,
            owner_tech,
            phases,
            target_id,
            parent_system,
            parent_container,
        } = self;

        if let Some(name) = name {
            element.name = name;
        }
        if let Some(description) = description {
            element.description = description;
        }
        if let Some(technology) = technology {
            element.technology = technology;
        }
        if let Some(tags) = tags {
            element.tags = tags;
        }
        if let Some(parent_id) = parent_id {
            element.parent_id = parent_id.filter(|parent| !parent.is_empty());
        }
        if let Some(position) = position {
            element.position = position;
        }
        if let Some(owner_pm) = owner_pm {
            element.owner_pm = owner_pm;
        }
        if let Some(owner_ux) = owner_ux {
            element.owner_ux = owner_ux;
        }
        if let Some(owner_tech) = owner_tech {
            element.owner_tech = owner_tech;
        }
        if let Some(phases) = phases {
            element.phases = phases;
        }
        if let Some(target_id) = target_id {
            element.target_id = target_id;
        }
        if let Some(parent_system) = parent_system {
            element.parent_system = parent_system;
        }
        if let Some(parent_container) = parent_container {
            element.parent_container = parent_container;
        }
    }
}

/// An element as found in an untrusted document: every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawElement {
    #[serde(deserialize_with = "lenient::field")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    technology: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::field")]
    parent_id: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    position: Option<Position>,
    #[serde(rename = "ownerPM", deserialize_with = "lenient::field")]
    owner_pm: Option<String>,
    #[serde(rename = "ownerUX", deserialize_with = "lenient::field")]
    owner_ux: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    owner_tech: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    phases: Option<Vec<Phase>>,
    #[serde(deserialize_with = "lenient::field")]
    target_id: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    parent_system: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    parent_container: Option<String>,
}

impl RawElement {
    /// Fills defaults, taking the kind from the collection the record was
    /// found in and minting an identifier if none was given.
    pub(crate) fn normalize(self, kind: ElementKind, ids: &mut FreshIds) -> Element {
        let id = match self.id.filter(|id| !id.is_empty()) {
            Some(id) => {
                ids.reserve(&id);
                id
            }
            None => ids.mint(kind.as_str()),
        };

        Element {
            id,
            kind,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            technology: self.technology.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            parent_id: self.parent_id.filter(|p| !p.is_empty()),
            position: self.position.unwrap_or_default(),
            owner_pm: self.owner_pm,
            owner_ux: self.owner_ux,
            owner_tech: self.owner_tech,
            phases: self.phases.unwrap_or_default(),
            target_id: self.target_id,
            parent_system: self.parent_system,
            parent_container: self.parent_container,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("system", ElementKind::System)]
    #[test_case("externalSystem", ElementKind::ExternalSystem)]
    #[test_case("external-system", ElementKind::ExternalSystem)]
    #[test_case("EXTERNAL_SYSTEM", ElementKind::ExternalSystem)]
    #[test_case("Person", ElementKind::Person)]
    #[test_case("shadow", ElementKind::Shadow)]
    fn parses_kind(input: &str, expected: ElementKind) {
        assert_eq!(input.parse::<ElementKind>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!("database".parse::<ElementKind>().is_err());
    }

    #[test]
    fn kind_serializes_as_type_string() {
        for kind in ElementKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test_case(None, &[ElementKind::System, ElementKind::Person, ElementKind::ExternalSystem])]
    #[test_case(Some(ElementKind::System), &[ElementKind::Container, ElementKind::Person])]
    #[test_case(Some(ElementKind::Container), &[ElementKind::Component])]
    #[test_case(Some(ElementKind::Component), &[])]
    #[test_case(Some(ElementKind::Person), &[])]
    fn allowed_children_follow_c4_levels(parent: Option<ElementKind>, expected: &[ElementKind]) {
        assert_eq!(ElementKind::allowed_children(parent), expected);
    }

    #[test]
    fn only_people_and_external_systems_are_leaves() {
        let leaves: Vec<_> = ElementKind::ALL
            .into_iter()
            .filter(|k| k.is_leaf())
            .collect();
        assert_eq!(leaves, [ElementKind::Person, ElementKind::ExternalSystem]);
    }

    #[test]
    fn patch_sets_and_clears_fields() {
        let mut element = Element::new("c-1", ElementKind::Container);
        element.parent_id = Some("s-1".to_string());
        element.owner_pm = Some("Ada".to_string());

        ElementPatch {
            name: Some("API".to_string()),
            parent_id: Some(None),
            owner_pm: Some(None),
            ..ElementPatch::default()
        }
        .apply(&mut element);

        assert_eq!(element.name, "API");
        assert_eq!(element.parent_id, None);
        assert_eq!(element.owner_pm, None);
        assert_eq!(element.kind, ElementKind::Container);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut element = Element::new("sys-1", ElementKind::System);
        assert_eq!(element.display_name(), "sys-1");
        element.name = "Billing".to_string();
        assert_eq!(element.display_name(), "Billing");
    }

    #[test]
    fn phase_validates_months() {
        let phase = Phase::new("Build", "2025-01", "2025-06").unwrap();
        assert!(phase.id.starts_with("phase-"));
        let (start, end) = phase.months().unwrap();
        assert!(start < end);

        assert_eq!(
            Phase::new("Bad", "2025-1", "2025-06"),
            Err(PhaseError::InvalidMonth("2025-1".to_string()))
        );
        assert_eq!(
            Phase::new("Bad", "2025-13", "2025-14"),
            Err(PhaseError::InvalidMonth("2025-13".to_string()))
        );
        assert!(matches!(
            Phase::new("Backwards", "2025-06", "2025-01"),
            Err(PhaseError::EndsBeforeStart { .. })
        ));
    }

    #[test]
    fn single_month_phase_is_valid() {
        assert!(Phase::new("Spike", "2025-03", "2025-03").is_ok());
    }

    #[test]
    fn raw_element_defaults_every_field() {
        let raw: RawElement =
            serde_json::from_str(r#"{"name": 3, "tags": ["a"], "position": "left"}"#).unwrap();
        let mut ids = FreshIds::default();
        let element = raw.normalize(ElementKind::Component, &mut ids);

        assert!(element.id.starts_with("component-"));
        assert_eq!(element.kind, ElementKind::Component);
        assert_eq!(element.name, "");
        assert_eq!(element.tags, ["a"]);
        assert_eq!(element.position, Position::default());
        assert_eq!(element.parent_id, None);
    }

    #[test]
    fn serialized_element_uses_camel_case_keys() {
        let mut element = Element::new("sh-1", ElementKind::Shadow);
        element.target_id = Some("sys-1".to_string());
        element.owner_pm = Some("Ada".to_string());
        let json = serde_json::to_value(&element).unwrap();

        assert_eq!(json["type"], "shadow");
        assert_eq!(json["targetId"], "sys-1");
        assert_eq!(json["ownerPM"], "Ada");
        assert!(json["parentId"].is_null());
        assert!(json.get("phases").is_none());
    }
}
