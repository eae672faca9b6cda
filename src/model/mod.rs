//! Data model: identifier types and entity records.

pub mod entity;
pub mod types;

pub use entity::{
    Accelerator, App, BoundedContext, Container, ContribModule, DeploymentNode, DynamicStep,
    Entity, Epic, Integration, Journey, Persona, Relationship, SoftwareSystem, Story,
};
pub use types::{DocumentId, EntityType, Slug, ValidationError};
