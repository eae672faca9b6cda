//! Core identifier types for weft.
//!
//! Foundation types used throughout the build core: entity slugs, document
//! identifiers, and the closed set of entity families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

/// A validated entity slug.
///
/// Slugs are lowercase alphanumeric with hyphens and underscores, 1–128
/// characters, unique within one registry and immutable once assigned.
/// Examples: `checkout-flow`, `persona_power_user`, `billing-api`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// The maximum length of a slug.
    pub const MAX_LEN: usize = 128;

    /// Create a new `Slug` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the slug is empty, too long, or contains invalid
    /// characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the slug as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::Slug,
                value: s.to_owned(),
                reason: "slug must not be empty".to_owned(),
            });
        }
        if s.len() > Self::MAX_LEN {
            return Err(ValidationError {
                kind: ErrorKind::Slug,
                value: s.to_owned(),
                reason: format!(
                    "slug must be at most {} characters, got {}",
                    Self::MAX_LEN,
                    s.len()
                ),
            });
        }
        if s.starts_with(['-', '_']) || s.ends_with(['-', '_']) {
            return Err(ValidationError {
                kind: ErrorKind::Slug,
                value: s.to_owned(),
                reason: "slug must not start or end with a separator".to_owned(),
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ValidationError {
                kind: ErrorKind::Slug,
                value: s.to_owned(),
                reason:
                    "slug must contain only lowercase letters (a-z), digits (0-9), hyphens (-), and underscores (_)"
                        .to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// A validated document identifier.
///
/// Document identifiers are relative source paths such as
/// `personas/index.md`. They must be non-empty, must not be absolute, and
/// must not contain `..` segments or NUL bytes. Ordered so that document
/// sets and per-document reports are deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new `DocumentId` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the identifier is empty, absolute, or contains
    /// `..` segments.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the document identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::DocumentId,
                value: s.to_owned(),
                reason: "document identifier must not be empty".to_owned(),
            });
        }
        if s.contains('\0') {
            return Err(ValidationError {
                kind: ErrorKind::DocumentId,
                value: s.to_owned(),
                reason: "document identifier must not contain NUL bytes".to_owned(),
            });
        }
        if s.starts_with('/') || s.starts_with('\\') {
            return Err(ValidationError {
                kind: ErrorKind::DocumentId,
                value: s.to_owned(),
                reason: "document identifier must be a relative path".to_owned(),
            });
        }
        if s.split(['/', '\\']).any(|seg| seg == "..") {
            return Err(ValidationError {
                kind: ErrorKind::DocumentId,
                value: s.to_owned(),
                reason: "document identifier must not contain '..' segments".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<DocumentId> for String {
    fn from(doc: DocumentId) -> Self {
        doc.0
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// The closed set of entity families contributed by documents.
///
/// Each family has its own registry in the build environment. The set is
/// closed: adding a family is a source change, not a runtime registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Story,
    Epic,
    Journey,
    Persona,
    App,
    Accelerator,
    Integration,
    SoftwareSystem,
    Container,
    Relationship,
    DeploymentNode,
    DynamicStep,
    BoundedContext,
    ContribModule,
}

impl EntityType {
    /// All entity families, in registry iteration order.
    pub const ALL: [Self; 14] = [
        Self::Story,
        Self::Epic,
        Self::Journey,
        Self::Persona,
        Self::App,
        Self::Accelerator,
        Self::Integration,
        Self::SoftwareSystem,
        Self::Container,
        Self::Relationship,
        Self::DeploymentNode,
        Self::DynamicStep,
        Self::BoundedContext,
        Self::ContribModule,
    ];

    /// Stable snake_case name for this family.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Epic => "epic",
            Self::Journey => "journey",
            Self::Persona => "persona",
            Self::App => "app",
            Self::Accelerator => "accelerator",
            Self::Integration => "integration",
            Self::SoftwareSystem => "software_system",
            Self::Container => "container",
            Self::Relationship => "relationship",
            Self::DeploymentNode => "deployment_node",
            Self::DynamicStep => "dynamic_step",
            Self::BoundedContext => "bounded_context",
            Self::ContribModule => "contrib_module",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// The kind of value that failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A [`Slug`] validation error.
    Slug,
    /// A [`DocumentId`] validation error.
    DocumentId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slug => write!(f, "Slug"),
            Self::DocumentId => write!(f, "DocumentId"),
        }
    }
}

/// A validation error for weft core types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// What kind of value was being validated.
    pub kind: ErrorKind,
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {}: {:?}: {}",
            self.kind, self.value, self.reason
        )
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
