//! weft: incremental build core for multi-document generation pipelines.
//!
//! A set of independently parsed documents each contribute typed entity
//! records into shared per-family registries, and each document's output
//! may reference entities defined in documents that have not been parsed
//! yet. This crate guarantees that:
//!
//! - every cross-document reference resolves regardless of parse order
//!   (deferred nodes, replaced during a global resolution pass),
//! - re-processing one document never leaves stale data behind
//!   (document invalidation),
//! - splitting the parse phase across workers produces the same end state
//!   as running it sequentially (ownership-filtered merge).
//!
//! The host pipeline drives all phase transitions; see
//! [`env::BuildEnvironment`] for the lifecycle. The markup layer that
//! produces records, the renderer that consumes resolved output, and the
//! scheduling of documents onto workers all live outside this crate.

pub mod config;
pub mod consistency;
pub mod env;
pub mod error;
pub mod merge;
pub mod model;
pub mod phase;
pub mod registry;
pub mod resolve;
pub mod telemetry;
pub mod tree;

// Re-export the types most hosts touch at the crate root for ergonomic
// imports: `use weft::{BuildEnvironment, Registry, Slug};`
pub use config::WeftConfig;
pub use consistency::{ConsistencyReport, IssueKind, ValidationIssue, reconcile, reconcile_with};
pub use env::{BuildEnvironment, DocScratch, InvalidationReport, Registries};
pub use error::BuildError;
pub use merge::{MergeReport, merge_worker};
pub use model::types::{DocumentId, EntityType, Slug, ValidationError};
pub use phase::BuildPhase;
pub use registry::Registry;
pub use resolve::{ResolveReport, ResolverRegistry, StubbedNode, resolve_all, resolve_document};
pub use tree::{DeferredNode, OutputNode, OutputTree};
