//! The build environment: registries, per-document state, and lifecycle.
//!
//! [`BuildEnvironment`] is the single ownership root for all mutable build
//! state: one registry per entity family, one output tree per document, and
//! per-document scratch state. There is no ambient or static state: every
//! operation takes the environment explicitly, which is also what makes the
//! worker merge a pure function over two environment values.
//!
//! The host pipeline drives the lifecycle; the environment only validates
//! the call sequence (see [`BuildPhase`]):
//!
//! ```text
//! begin_document → (saves, deferred nodes) → end_local_parse   per document
//! begin_global_resolution                                      once all parsed
//! invalidate_document                                          incremental rebuild
//! worker_snapshot / merge_worker                               parallel parse
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BuildError;
use crate::model::entity::{
    Accelerator, App, BoundedContext, Container, ContribModule, DeploymentNode, DynamicStep, Epic,
    Integration, Journey, Persona, Relationship, SoftwareSystem, Story,
};
use crate::model::types::{DocumentId, EntityType, Slug};
use crate::phase::BuildPhase;
use crate::registry::Registry;
use crate::tree::{DeferredNode, OutputTree};

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

/// One registry per entity family.
#[derive(Clone, Debug, Default)]
pub struct Registries {
    pub story: Registry<Story>,
    pub epic: Registry<Epic>,
    pub journey: Registry<Journey>,
    pub persona: Registry<Persona>,
    pub app: Registry<App>,
    pub accelerator: Registry<Accelerator>,
    pub integration: Registry<Integration>,
    pub software_system: Registry<SoftwareSystem>,
    pub container: Registry<Container>,
    pub relationship: Registry<Relationship>,
    pub deployment_node: Registry<DeploymentNode>,
    pub dynamic_step: Registry<DynamicStep>,
    pub bounded_context: Registry<BoundedContext>,
    pub contrib_module: Registry<ContribModule>,
}

impl Registries {
    /// Remove every record owned by `doc` across all families.
    ///
    /// Returns per-family removal counts; families with nothing removed are
    /// omitted. Idempotent: a second call with no intervening writes
    /// returns an empty map.
    pub fn clear_document(&mut self, doc: &DocumentId) -> BTreeMap<EntityType, usize> {
        let mut removed = BTreeMap::new();
        removed.insert(EntityType::Story, self.story.clear_by_owning_document(doc));
        removed.insert(EntityType::Epic, self.epic.clear_by_owning_document(doc));
        removed.insert(
            EntityType::Journey,
            self.journey.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::Persona,
            self.persona.clear_by_owning_document(doc),
        );
        removed.insert(EntityType::App, self.app.clear_by_owning_document(doc));
        removed.insert(
            EntityType::Accelerator,
            self.accelerator.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::Integration,
            self.integration.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::SoftwareSystem,
            self.software_system.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::Container,
            self.container.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::Relationship,
            self.relationship.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::DeploymentNode,
            self.deployment_node.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::DynamicStep,
            self.dynamic_step.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::BoundedContext,
            self.bounded_context.clear_by_owning_document(doc),
        );
        removed.insert(
            EntityType::ContribModule,
            self.contrib_module.clear_by_owning_document(doc),
        );
        removed.retain(|_, n| *n > 0);
        removed
    }

    /// Per-family record counts; empty families are omitted.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<EntityType, usize> {
        let mut counts = BTreeMap::new();
        counts.insert(EntityType::Story, self.story.len());
        counts.insert(EntityType::Epic, self.epic.len());
        counts.insert(EntityType::Journey, self.journey.len());
        counts.insert(EntityType::Persona, self.persona.len());
        counts.insert(EntityType::App, self.app.len());
        counts.insert(EntityType::Accelerator, self.accelerator.len());
        counts.insert(EntityType::Integration, self.integration.len());
        counts.insert(EntityType::SoftwareSystem, self.software_system.len());
        counts.insert(EntityType::Container, self.container.len());
        counts.insert(EntityType::Relationship, self.relationship.len());
        counts.insert(EntityType::DeploymentNode, self.deployment_node.len());
        counts.insert(EntityType::DynamicStep, self.dynamic_step.len());
        counts.insert(EntityType::BoundedContext, self.bounded_context.len());
        counts.insert(EntityType::ContribModule, self.contrib_module.len());
        counts.retain(|_, n| *n > 0);
        counts
    }

    /// Total record count across all families.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts().values().sum()
    }
}

// ---------------------------------------------------------------------------
// DocScratch
// ---------------------------------------------------------------------------

/// Per-document scratch state used while a document's blocks are parsed in
/// sequence.
///
/// The canonical use is `current_entity`: a declaration block records the
/// entity it created here, so that follow-up blocks in the same document
/// can extend that record without repeating its slug. Scratch state assumes
/// strictly sequential block processing within one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocScratch {
    /// The entity currently under construction in this document, if any.
    pub current_entity: Option<(EntityType, Slug)>,
    /// Free-form scratch values for the markup layer.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl DocScratch {
    /// Record the entity now under construction.
    pub fn set_current_entity(&mut self, ty: EntityType, slug: Slug) {
        self.current_entity = Some((ty, slug));
    }

    /// The entity currently under construction, if any.
    #[must_use]
    pub fn current_entity(&self) -> Option<(EntityType, &Slug)> {
        self.current_entity.as_ref().map(|(ty, slug)| (*ty, slug))
    }
}

// ---------------------------------------------------------------------------
// InvalidationReport
// ---------------------------------------------------------------------------

/// What removing one document's contributions actually removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// The invalidated document.
    pub document: DocumentId,
    /// Per-family record removal counts (families with zero removals are
    /// omitted).
    pub removed: BTreeMap<EntityType, usize>,
    /// Whether the document had an output tree.
    pub tree_removed: bool,
    /// Whether the document had scratch state.
    pub scratch_removed: bool,
}

impl InvalidationReport {
    /// Total records removed across all families.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }

    /// Returns `true` if the environment held nothing for this document.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && !self.tree_removed && !self.scratch_removed
    }
}

// ---------------------------------------------------------------------------
// BuildEnvironment
// ---------------------------------------------------------------------------

/// All mutable state of one build, and the lifecycle operations over it.
#[derive(Clone, Debug, Default)]
pub struct BuildEnvironment {
    pub(crate) registries: Registries,
    pub(crate) trees: BTreeMap<DocumentId, OutputTree>,
    pub(crate) scratch: BTreeMap<DocumentId, DocScratch>,
    pub(crate) phase: BuildPhase,
    pub(crate) current_document: Option<DocumentId>,
}

impl BuildEnvironment {
    /// Create a fresh environment in the setup phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current build phase.
    #[must_use]
    pub const fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Read access to the registries. Always available: resolvers and
    /// renderers read through this during resolution.
    #[must_use]
    pub const fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Write access to the registries.
    ///
    /// # Errors
    /// Fails during global resolution; registries are frozen between "all
    /// local parse complete" and "all resolution complete".
    pub fn registries_mut(&mut self) -> Result<&mut Registries, BuildError> {
        if self.phase.allows_writes() {
            Ok(&mut self.registries)
        } else {
            Err(BuildError::WriteDuringResolution)
        }
    }

    /// The document currently open for local parse, if any.
    #[must_use]
    pub const fn current_document(&self) -> Option<&DocumentId> {
        self.current_document.as_ref()
    }

    /// Documents this environment holds output trees for, in order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentId> {
        self.trees.keys()
    }

    /// A document's output tree.
    #[must_use]
    pub fn tree(&self, doc: &DocumentId) -> Option<&OutputTree> {
        self.trees.get(doc)
    }

    pub(crate) fn tree_mut(&mut self, doc: &DocumentId) -> Option<&mut OutputTree> {
        self.trees.get_mut(doc)
    }

    /// A document's scratch state.
    #[must_use]
    pub fn scratch(&self, doc: &DocumentId) -> Option<&DocScratch> {
        self.scratch.get(doc)
    }

    // -- local parse ---------------------------------------------------------

    /// Open a document for local parse.
    ///
    /// Starts the document with a fresh output tree and scratch state. The
    /// first `begin_document` moves the environment from setup into the
    /// local parse phase.
    ///
    /// # Errors
    /// Fails if another document is still open, or during global
    /// resolution (invalidate the document first to return to parsing).
    pub fn begin_document(&mut self, doc: DocumentId) -> Result<(), BuildError> {
        if let Some(open) = &self.current_document {
            return Err(BuildError::DocumentStillOpen {
                document: open.clone(),
            });
        }
        match self.phase {
            BuildPhase::Resolution => {
                return Err(BuildError::PhaseViolation {
                    from: BuildPhase::Resolution,
                    to: BuildPhase::LocalParse,
                });
            }
            BuildPhase::Setup => self.phase = BuildPhase::LocalParse,
            BuildPhase::LocalParse => {}
        }
        self.trees.insert(doc.clone(), OutputTree::new());
        self.scratch.insert(doc.clone(), DocScratch::default());
        self.current_document = Some(doc);
        Ok(())
    }

    /// Append final content to the open document's output tree.
    ///
    /// # Errors
    /// Fails if no document is open.
    pub fn push_rendered(&mut self, content: impl Into<String>) -> Result<(), BuildError> {
        let doc = self
            .current_document
            .clone()
            .ok_or(BuildError::NoCurrentDocument)?;
        // The tree exists whenever a document is open.
        if let Some(tree) = self.trees.get_mut(&doc) {
            tree.push_rendered(content);
        }
        Ok(())
    }

    /// Insert a deferred node into the open document's output tree and
    /// return its handle.
    ///
    /// # Errors
    /// Fails if no document is open.
    pub fn insert_deferred_node(
        &mut self,
        tag: impl Into<String>,
        attrs: BTreeMap<String, serde_json::Value>,
    ) -> Result<usize, BuildError> {
        let doc = self
            .current_document
            .clone()
            .ok_or(BuildError::NoCurrentDocument)?;
        let node = DeferredNode {
            tag: tag.into(),
            attrs,
            source_document: doc.clone(),
        };
        match self.trees.get_mut(&doc) {
            Some(tree) => Ok(tree.push_deferred(node)),
            None => Err(BuildError::UnknownDocument { document: doc }),
        }
    }

    /// Mutable scratch state for the open document.
    ///
    /// # Errors
    /// Fails if no document is open.
    pub fn current_scratch_mut(&mut self) -> Result<&mut DocScratch, BuildError> {
        let doc = self
            .current_document
            .clone()
            .ok_or(BuildError::NoCurrentDocument)?;
        Ok(self.scratch.entry(doc).or_default())
    }

    /// Close the open document's local parse.
    ///
    /// # Errors
    /// Fails if `doc` is not the currently open document.
    pub fn end_local_parse(&mut self, doc: &DocumentId) -> Result<(), BuildError> {
        match &self.current_document {
            Some(open) if open == doc => {
                self.current_document = None;
                Ok(())
            }
            Some(_) => Err(BuildError::DocumentNotOpen {
                document: doc.clone(),
            }),
            None => Err(BuildError::NoCurrentDocument),
        }
    }

    // -- global resolution ---------------------------------------------------

    /// Freeze registries and enter the global resolution phase.
    ///
    /// Must be called only after every document's local parse has
    /// completed.
    ///
    /// # Errors
    /// Fails if a document is still open or the transition is invalid.
    pub fn begin_global_resolution(&mut self) -> Result<(), BuildError> {
        if let Some(open) = &self.current_document {
            return Err(BuildError::DocumentStillOpen {
                document: open.clone(),
            });
        }
        if !self.phase.can_transition_to(BuildPhase::Resolution) {
            return Err(BuildError::PhaseViolation {
                from: self.phase,
                to: BuildPhase::Resolution,
            });
        }
        self.phase = BuildPhase::Resolution;
        info!(
            documents = self.trees.len(),
            records = self.registries.total(),
            "entering global resolution"
        );
        Ok(())
    }

    // -- invalidation --------------------------------------------------------

    /// Remove one document's contributions ahead of its re-parse.
    ///
    /// Clears the document's records from every registry, its scratch
    /// state, and its output tree, and nothing owned by any other
    /// document. If called during resolution, the environment returns to
    /// the local parse phase. Idempotent.
    ///
    /// # Errors
    /// Fails if a document is still open for local parse.
    pub fn invalidate_document(
        &mut self,
        doc: &DocumentId,
    ) -> Result<InvalidationReport, BuildError> {
        if let Some(open) = &self.current_document {
            return Err(BuildError::DocumentStillOpen {
                document: open.clone(),
            });
        }
        if self.phase == BuildPhase::Resolution {
            self.phase = BuildPhase::LocalParse;
        }
        let removed = self.registries.clear_document(doc);
        let tree_removed = self.trees.remove(doc).is_some();
        let scratch_removed = self.scratch.remove(doc).is_some();
        let report = InvalidationReport {
            document: doc.clone(),
            removed,
            tree_removed,
            scratch_removed,
        };
        info!(
            document = %doc,
            records = report.total_removed(),
            tree = tree_removed,
            "invalidated document"
        );
        Ok(report)
    }

    // -- parallel workers ----------------------------------------------------

    /// Snapshot this environment for a parse worker.
    ///
    /// The worker parses its assigned documents against the snapshot and is
    /// merged back with [`crate::merge::merge_worker`], which filters by
    /// document ownership.
    #[must_use]
    pub fn worker_snapshot(&self) -> Self {
        let mut snapshot = self.clone();
        snapshot.current_document = None;
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
