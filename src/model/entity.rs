//! Entity records contributed by documents.
//!
//! One struct per entity family. Every record carries a `slug` (unique
//! within its family's registry) and an `owning_document` (the document
//! whose parse produced it; invalidating that document removes the record).
//!
//! Records are plain serde-serializable data. The [`Entity`] trait gives the
//! registry uniform access to slug, owning document, and field projection
//! for `find_by_field`-style queries.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{DocumentId, EntityType, Slug};

// ---------------------------------------------------------------------------
// Entity trait
// ---------------------------------------------------------------------------

/// Uniform access to the attributes shared by every entity family.
pub trait Entity: Clone + Serialize + DeserializeOwned + Sized {
    /// The family this record belongs to.
    const TYPE: EntityType;

    /// The record's slug, unique within its family's registry.
    fn slug(&self) -> &Slug;

    /// The document whose parse produced this record.
    fn owning_document(&self) -> &DocumentId;

    /// Project a named field as a JSON value, for predicate queries.
    ///
    /// Returns `None` if the field does not exist on this family. Backed by
    /// serde serialization, so field names match the struct field names.
    fn field_value(&self, field: &str) -> Option<serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.get(field).cloned(),
            _ => None,
        }
    }
}

/// Implement [`Entity`] for a record struct with `slug` and
/// `owning_document` fields.
macro_rules! impl_entity {
    ($($ty:ident => $family:ident),+ $(,)?) => {
        $(
            impl Entity for $ty {
                const TYPE: EntityType = EntityType::$family;

                fn slug(&self) -> &Slug {
                    &self.slug
                }

                fn owning_document(&self) -> &DocumentId {
                    &self.owning_document
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Product narrative families
// ---------------------------------------------------------------------------

/// A user story.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Story {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub title: String,
    /// Persona this story is told from, if any.
    #[serde(default)]
    pub persona: Option<Slug>,
    /// Epic this story belongs to, if any.
    #[serde(default)]
    pub epic: Option<Slug>,
    /// Acceptance criteria, in document order.
    #[serde(default)]
    pub acceptance: Vec<String>,
}

/// A group of related stories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Epic {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Stories attached by later blocks in the same document.
    #[serde(default)]
    pub stories: Vec<Slug>,
}

/// A user journey through one or more apps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Journey {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub title: String,
    #[serde(default)]
    pub persona: Option<Slug>,
    /// Ordered journey steps as prose.
    #[serde(default)]
    pub steps: Vec<String>,
}

/// A user persona.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Persona {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    /// Needs collected from later blocks in the same document.
    #[serde(default)]
    pub needs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Application landscape families
// ---------------------------------------------------------------------------

/// An application in the landscape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct App {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Integrations attached by later blocks in the same document.
    #[serde(default)]
    pub integrations: Vec<Slug>,
}

/// A reusable accelerator (starter kit, shared library, template).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Accelerator {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Capabilities this accelerator provides.
    #[serde(default)]
    pub provides: Vec<String>,
}

/// A point-to-point integration between two apps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Integration {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    pub source_app: Slug,
    #[serde(default)]
    pub target_app: Option<Slug>,
    #[serde(default)]
    pub protocol: String,
}

// ---------------------------------------------------------------------------
// Architecture model families
// ---------------------------------------------------------------------------

/// A software system (architecture model root element).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct SoftwareSystem {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether the system is outside the scope being documented.
    #[serde(default)]
    pub external: bool,
}

/// A deployable/runnable unit inside a software system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Container {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub system: Option<Slug>,
    #[serde(default)]
    pub technology: String,
}

/// A directed relationship between two architecture elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Relationship {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub source: Slug,
    pub target: Slug,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technology: String,
}

/// An infrastructure node elements are deployed onto.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct DeploymentNode {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub environment: String,
    /// Containers hosted on this node.
    #[serde(default)]
    pub hosts: Vec<Slug>,
}

/// One step in a dynamic (runtime interaction) view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct DynamicStep {
    pub slug: Slug,
    pub owning_document: DocumentId,
    /// Position within the interaction sequence.
    pub sequence: u32,
    pub source: Slug,
    pub target: Slug,
    #[serde(default)]
    pub description: String,
}

/// A bounded context in the domain model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct BoundedContext {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub description: String,
}

/// A contributed code module discovered in or declared for the codebase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ContribModule {
    pub slug: Slug,
    pub owning_document: DocumentId,
    pub name: String,
    /// Source path of the module, relative to the repository root.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: String,
}

impl_entity! {
    Story => Story,
    Epic => Epic,
    Journey => Journey,
    Persona => Persona,
    App => App,
    Accelerator => Accelerator,
    Integration => Integration,
    SoftwareSystem => SoftwareSystem,
    Container => Container,
    Relationship => Relationship,
    DeploymentNode => DeploymentNode,
    DynamicStep => DynamicStep,
    BoundedContext => BoundedContext,
    ContribModule => ContribModule,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
