//! Domain models for C4 architecture modelling.
//!
//! This module contains the core domain types: elements and their kinds,
//! relationships, the serializable model root, identifier minting and
//! configuration.

/// Architecture elements and element kinds.
pub mod element;
pub use element::{Element, ElementKind, ElementPatch, Phase, PhaseError, Position, UnknownKindError};

/// Directed relationships between elements.
pub mod relationship;
pub use relationship::{ArrowDirection, LineStyle, Relationship, RelationshipPatch};

mod model;
pub use model::{Metadata, Model};

mod config;
pub use config::{Config, ConfigError};

/// Identifier minting.
pub mod id;

pub(crate) mod lenient;
