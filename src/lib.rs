//! C4 architecture modelling
//!
//! A model is a flat collection of systems, containers, components, people,
//! external systems and shadows, arranged into a hierarchy by `parent_id`
//! links, together with the relationships between them. The [`Store`] owns a
//! model and the navigation context used to view it one level at a time.

pub mod domain;
pub use domain::{
    Config, Element, ElementKind, ElementPatch, Metadata, Model, Relationship, RelationshipPatch,
};

pub mod store;
pub use store::Store;

pub mod structurizr;

pub mod storage;

pub mod export;
