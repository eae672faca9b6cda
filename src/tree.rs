//! Per-document output trees and deferred nodes.
//!
//! During local parse, the markup layer appends nodes to its document's
//! [`OutputTree`]. Content that depends only on the current document is
//! appended as [`OutputNode::Rendered`]; content that references entities
//! possibly defined in *other* documents is appended as a
//! [`OutputNode::Deferred`] placeholder and replaced during global
//! resolution.
//!
//! Replacement is an explicit two-pass protocol: collect deferred handles
//! first, then replace by handle. The tree is never mutated while being
//! traversed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::types::DocumentId;

// ---------------------------------------------------------------------------
// DeferredNode
// ---------------------------------------------------------------------------

/// A placeholder for content that cannot be produced until every document
/// has been locally parsed.
///
/// The `tag` selects which resolver applies. `attrs` is an opaque bag of
/// resolver inputs. `source_document` records where the node was created,
/// for traceability only; the node lives in that document's tree, is
/// resolved exactly once, and never moves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredNode {
    /// Resolver selector.
    pub tag: String,
    /// Opaque resolver inputs, keyed by attribute name.
    pub attrs: BTreeMap<String, serde_json::Value>,
    /// The document whose parse created this node.
    pub source_document: DocumentId,
}

impl DeferredNode {
    /// Look up a string-valued attribute.
    #[must_use]
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(serde_json::Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// OutputNode
// ---------------------------------------------------------------------------

/// One node in a document's output tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum OutputNode {
    /// Final content.
    Rendered { content: String },
    /// An unresolved placeholder awaiting global resolution.
    Deferred(DeferredNode),
}

impl OutputNode {
    /// Returns `true` if this node still awaits resolution.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

// ---------------------------------------------------------------------------
// OutputTree
// ---------------------------------------------------------------------------

/// A document's output, as an ordered sequence of nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTree {
    nodes: Vec<OutputNode>,
}

impl OutputTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append final content.
    pub fn push_rendered(&mut self, content: impl Into<String>) {
        self.nodes.push(OutputNode::Rendered {
            content: content.into(),
        });
    }

    /// Append a deferred placeholder and return its handle.
    pub fn push_deferred(&mut self, node: DeferredNode) -> usize {
        self.nodes.push(OutputNode::Deferred(node));
        self.nodes.len() - 1
    }

    /// Collect pass: handles and copies of every deferred node, in tree
    /// (traversal) order.
    #[must_use]
    pub fn deferred_nodes(&self) -> Vec<(usize, DeferredNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(handle, node)| match node {
                OutputNode::Deferred(deferred) => Some((handle, deferred.clone())),
                OutputNode::Rendered { .. } => None,
            })
            .collect()
    }

    /// Replace pass: swap the deferred node at `handle` for final content.
    ///
    /// Returns `false` if the handle is out of range or the node was
    /// already rendered (a node is consumed at most once).
    pub fn replace(&mut self, handle: usize, content: String) -> bool {
        match self.nodes.get_mut(handle) {
            Some(node @ OutputNode::Deferred(_)) => {
                *node = OutputNode::Rendered { content };
                true
            }
            _ => false,
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether every node has been rendered.
    #[must_use]
    pub fn is_fully_resolved(&self) -> bool {
        !self.nodes.iter().any(OutputNode::is_deferred)
    }

    /// Iterate the nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = &OutputNode> {
        self.nodes.iter()
    }

    /// Final content of every rendered node, in order. Deferred nodes are
    /// skipped.
    pub fn rendered(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| match node {
            OutputNode::Rendered { content } => Some(content.as_str()),
            OutputNode::Deferred(_) => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
