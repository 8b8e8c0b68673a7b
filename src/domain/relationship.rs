//! Directed relationships between elements.

use serde::{Deserialize, Serialize};

use crate::domain::{id::FreshIds, lenient};

/// Which end(s) of a relationship carry an arrowhead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    /// Arrow points at the target.
    #[default]
    Right,
    /// Arrow points at the source.
    Left,
    /// Arrows at both ends.
    Both,
    /// No arrowheads.
    None,
}

/// Stroke style of a relationship line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Continuous line.
    #[default]
    Solid,
    /// Dashed line.
    Dashed,
    /// Dotted line.
    Dotted,
}

/// A directed edge between two elements.
///
/// `from` and `to` are weak references; either may dangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Unique identifier.
    pub id: String,
    /// Source element id.
    pub from: String,
    /// Target element id.
    pub to: String,
    /// What the relationship does.
    pub description: String,
    /// Protocol or technology.
    pub technology: String,
    /// Arrowhead placement.
    pub arrow_direction: ArrowDirection,
    /// Line style.
    pub line_style: LineStyle,
    /// Presentation-only animation flag.
    pub animated: bool,
}

impl Relationship {
    /// Creates a relationship with default presentation.
    #[must_use]
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            description: String::new(),
            technology: String::new(),
            arrow_direction: ArrowDirection::default(),
            line_style: LineStyle::default(),
            animated: false,
        }
    }

    /// Whether either end refers to `id`.
    #[must_use]
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

/// A partial update to a [`Relationship`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipPatch {
    /// New source.
    pub from: Option<String>,
    /// New target.
    pub to: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New technology.
    pub technology: Option<String>,
    /// New arrowhead placement.
    pub arrow_direction: Option<ArrowDirection>,
    /// New line style.
    pub line_style: Option<LineStyle>,
    /// New animation flag.
    pub animated: Option<bool>,
}

impl RelationshipPatch {
    /// A patch that only sets the description.
    #[must_use]
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Merges this patch onto `relationship`.
    pub fn apply(self, relationship: &mut Relationship) {
        if let Some(from) = self.from {
            relationship.from = from;
        }
        if let Some(to) = self.to {
            relationship.to = to;
        }
        if let Some(description) = self.description {
            relationship.description = description;
        }
        if let Some(technology) = self.technology {
            relationship.technology = technology;
        }
        if let Some(arrow_direction) = self.arrow_direction {
            relationship.arrow_direction = arrow_direction;
        }
        if let Some(line_style) = self.line_style {
            relationship.line_style = line_style;
        }
        if let Some(animated) = self.animated {
            relationship.animated = animated;
        }
    }
}

/// A relationship as found in an untrusted document.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RawRelationship {
    #[serde(deserialize_with = "lenient::field")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    from: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    to: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    technology: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    arrow_direction: Option<ArrowDirection>,
    #[serde(deserialize_with = "lenient::field")]
    line_style: Option<LineStyle>,
    #[serde(deserialize_with = "lenient::field")]
    animated: Option<bool>,
}

impl RawRelationship {
    pub(crate) fn normalize(self, ids: &mut FreshIds) -> Relationship {
        let id = match self.id.filter(|id| !id.is_empty()) {
            Some(id) => {
                ids.reserve(&id);
                id
            }
            None => ids.mint("rel"),
        };

        Relationship {
            id,
            from: self.from.unwrap_or_default(),
            to: self.to.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            technology: self.technology.unwrap_or_default(),
            arrow_direction: self.arrow_direction.unwrap_or_default(),
            line_style: self.line_style.unwrap_or_default(),
            animated: self.animated.unwrap_or_default(),
        }
    }
}
