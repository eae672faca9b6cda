//! Resolver registration and the global resolution pass.
//!
//! A resolver is a pure function from a deferred node and the full
//! (cross-document-complete) build environment to final content, registered
//! against a tag at startup. Resolution runs once per document after every
//! document's local parse has completed.
//!
//! Resolvers get `&BuildEnvironment`: read-only registry access is
//! enforced by the type, not by convention. Resolution may run again across
//! incremental rebuilds for unrelated documents, so a resolver that wrote
//! to a registry would corrupt cached results.
//!
//! # Fault isolation
//!
//! A failing resolver, or a tag with no resolver, never aborts the pass:
//! the node is replaced with a clearly marked stub, the failure is logged,
//! and every other node in this and every other document still resolves.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::env::BuildEnvironment;
use crate::error::BuildError;
use crate::model::types::DocumentId;
use crate::phase::BuildPhase;
use crate::tree::DeferredNode;

// ---------------------------------------------------------------------------
// ResolverRegistry
// ---------------------------------------------------------------------------

/// A resolution function for one deferred-node tag.
pub type ResolverFn =
    Box<dyn Fn(&DeferredNode, &BuildEnvironment) -> anyhow::Result<String> + Send + Sync>;

/// Maps deferred-node tags to resolver functions.
///
/// Owned by the host, populated once at startup, and passed by shared
/// reference into the resolution pass. Deliberately separate from
/// [`BuildEnvironment`] so worker snapshots stay plain clones of data.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, ResolverFn>,
}

impl ResolverRegistry {
    /// Create an empty resolver registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver for a tag. Re-registering a tag replaces the
    /// previous resolver.
    pub fn register<F>(&mut self, tag: impl Into<String>, resolver: F)
    where
        F: Fn(&DeferredNode, &BuildEnvironment) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let tag = tag.into();
        if self.resolvers.insert(tag.clone(), Box::new(resolver)).is_some() {
            warn!(tag = %tag, "resolver re-registered; previous resolver replaced");
        }
    }

    /// Look up the resolver for a tag.
    #[must_use]
    pub fn lookup(&self, tag: &str) -> Option<&ResolverFn> {
        self.resolvers.get(tag)
    }

    /// All registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.resolvers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Number of registered resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether no resolvers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ResolveReport
// ---------------------------------------------------------------------------

/// A deferred node that was replaced with a stub instead of final content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StubbedNode {
    /// Handle of the node within its document's tree.
    pub handle: usize,
    /// The node's tag.
    pub tag: String,
    /// Why resolution failed.
    pub reason: String,
}

/// Outcome of resolving one document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// The resolved document.
    pub document: DocumentId,
    /// Nodes replaced with resolver output.
    pub resolved: usize,
    /// Nodes replaced with stubs, in tree order.
    pub stubbed: Vec<StubbedNode>,
}

impl ResolveReport {
    /// Returns `true` if every node resolved without a stub.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stubbed.is_empty()
    }

    /// Total nodes consumed by this pass.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resolved + self.stubbed.len()
    }
}

// ---------------------------------------------------------------------------
// resolve_document
// ---------------------------------------------------------------------------

/// Resolve every deferred node in one document's output tree.
///
/// Two passes, per the placeholder protocol: collect the deferred nodes
/// with their handles, invoke each node's resolver against the frozen
/// environment, then replace by handle. Within the document, nodes resolve
/// in tree order. Nodes whose resolver fails or whose tag has no resolver
/// are replaced with a `[<marker> <tag>: <reason>]` stub.
///
/// # Errors
/// Fails if the environment is not in the resolution phase, or the
/// document has no output tree. Resolver failures are not errors.
pub fn resolve_document(
    env: &mut BuildEnvironment,
    resolvers: &ResolverRegistry,
    doc: &DocumentId,
    stub_marker: &str,
) -> Result<ResolveReport, BuildError> {
    if env.phase() != BuildPhase::Resolution {
        return Err(BuildError::PhaseViolation {
            from: env.phase(),
            to: BuildPhase::Resolution,
        });
    }
    let pending = match env.tree(doc) {
        Some(tree) => tree.deferred_nodes(),
        None => {
            return Err(BuildError::UnknownDocument {
                document: doc.clone(),
            });
        }
    };

    // Pass 1: compute replacements against the immutable environment.
    let mut replacements: Vec<(usize, String, Result<String, String>)> =
        Vec::with_capacity(pending.len());
    for (handle, node) in pending {
        let outcome = match resolvers.lookup(&node.tag) {
            Some(resolver) => resolver(&node, env).map_err(|e| format!("{e:#}")),
            None => Err(format!("no resolver registered for tag '{}'", node.tag)),
        };
        if let Err(reason) = &outcome {
            warn!(
                document = %doc,
                tag = %node.tag,
                handle,
                reason = %reason,
                "deferred node stubbed"
            );
        }
        replacements.push((handle, node.tag, outcome));
    }

    // Pass 2: replace by handle.
    let mut report = ResolveReport {
        document: doc.clone(),
        resolved: 0,
        stubbed: Vec::new(),
    };
    let Some(tree) = env.tree_mut(doc) else {
        return Err(BuildError::UnknownDocument {
            document: doc.clone(),
        });
    };
    for (handle, tag, outcome) in replacements {
        match outcome {
            Ok(content) => {
                tree.replace(handle, content);
                report.resolved += 1;
            }
            Err(reason) => {
                tree.replace(handle, format!("[{stub_marker} {tag}: {reason}]"));
                report.stubbed.push(StubbedNode { handle, tag, reason });
            }
        }
    }
    debug!(
        document = %doc,
        resolved = report.resolved,
        stubbed = report.stubbed.len(),
        "document resolved"
    );
    Ok(report)
}

/// Resolve every document in the environment, in document order.
///
/// There is no ordering guarantee between documents; callers must not rely
/// on the iteration order beyond determinism.
///
/// # Errors
/// Fails only on phase misuse; per-node failures degrade to stubs.
pub fn resolve_all(
    env: &mut BuildEnvironment,
    resolvers: &ResolverRegistry,
    stub_marker: &str,
) -> Result<Vec<ResolveReport>, BuildError> {
    let docs: Vec<DocumentId> = env.documents().cloned().collect();
    let mut reports = Vec::with_capacity(docs.len());
    for doc in &docs {
        reports.push(resolve_document(env, resolvers, doc, stub_marker)?);
    }
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
