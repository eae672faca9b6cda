//! Ownership-filtered merge of a worker environment into the main one.
//!
//! Each parse worker runs against a private snapshot of the pre-parallel
//! environment, so a finished worker's registries contain two kinds of
//! records: those owned by the worker's assigned documents (new work) and
//! those copied in with the snapshot (artifacts). The merge adopts only the
//! first kind. Copying unconditionally would resurrect documents another
//! worker deleted or changed after the snapshot was taken, so the ownership
//! filter is the merge's core correctness property.
//!
//! Discarded snapshot artifacts are expected, not errors: they are counted
//! in the report and logged at debug level only.
//!
//! For disjoint document sets the merge commutes: merging two workers into
//! a fresh main environment in either order yields the same registry
//! contents (see the property tests).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::env::BuildEnvironment;
use crate::error::BuildError;
use crate::model::entity::Entity;
use crate::model::types::{DocumentId, EntityType};
use crate::phase::BuildPhase;
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// MergeReport
// ---------------------------------------------------------------------------

/// Outcome of merging one worker into the main environment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Per-family counts of records adopted from the worker (zero-count
    /// families omitted).
    pub adopted: BTreeMap<EntityType, usize>,
    /// Per-family counts of snapshot artifacts discarded (zero-count
    /// families omitted).
    pub discarded: BTreeMap<EntityType, usize>,
    /// The worker's assigned document set.
    pub documents: BTreeSet<DocumentId>,
}

impl MergeReport {
    /// Total records adopted across all families.
    #[must_use]
    pub fn total_adopted(&self) -> usize {
        self.adopted.values().sum()
    }

    /// Total snapshot artifacts discarded across all families.
    #[must_use]
    pub fn total_discarded(&self) -> usize {
        self.discarded.values().sum()
    }
}

// ---------------------------------------------------------------------------
// merge_worker
// ---------------------------------------------------------------------------

/// Merge a finished worker's environment into the main environment.
///
/// `docs` is the worker's assigned document set `S`. For every record in
/// the worker's registries: adopt it iff its owning document is in `S`;
/// otherwise discard it as a snapshot artifact. The worker's output trees
/// and scratch state for documents in `S` replace the main environment's
/// copies.
///
/// The main side's existing records for documents in `S` are cleared
/// before adoption, so merging is correct even when the main environment
/// held stale copies of those documents.
///
/// # Errors
/// Fails if either environment still has a document open for local parse,
/// or the main environment is mid-resolution (merge is a parse-phase
/// operation).
pub fn merge_worker(
    main: &mut BuildEnvironment,
    worker: BuildEnvironment,
    docs: &BTreeSet<DocumentId>,
) -> Result<MergeReport, BuildError> {
    if let Some(open) = main.current_document() {
        return Err(BuildError::DocumentStillOpen {
            document: open.clone(),
        });
    }
    if let Some(open) = worker.current_document() {
        return Err(BuildError::DocumentStillOpen {
            document: open.clone(),
        });
    }
    if main.phase() == BuildPhase::Resolution {
        return Err(BuildError::WriteDuringResolution);
    }

    // Clear the main side's prior contributions for the worker's documents.
    for doc in docs {
        main.registries.clear_document(doc);
        main.trees.remove(doc);
        main.scratch.remove(doc);
    }

    let mut report = MergeReport {
        adopted: BTreeMap::new(),
        discarded: BTreeMap::new(),
        documents: docs.clone(),
    };

    let regs = worker.registries;
    adopt(&mut main.registries.story, regs.story, docs, &mut report);
    adopt(&mut main.registries.epic, regs.epic, docs, &mut report);
    adopt(&mut main.registries.journey, regs.journey, docs, &mut report);
    adopt(&mut main.registries.persona, regs.persona, docs, &mut report);
    adopt(&mut main.registries.app, regs.app, docs, &mut report);
    adopt(
        &mut main.registries.accelerator,
        regs.accelerator,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.integration,
        regs.integration,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.software_system,
        regs.software_system,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.container,
        regs.container,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.relationship,
        regs.relationship,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.deployment_node,
        regs.deployment_node,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.dynamic_step,
        regs.dynamic_step,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.bounded_context,
        regs.bounded_context,
        docs,
        &mut report,
    );
    adopt(
        &mut main.registries.contrib_module,
        regs.contrib_module,
        docs,
        &mut report,
    );

    // Trees and scratch follow the same ownership rule, keyed by document.
    for (doc, tree) in worker.trees {
        if docs.contains(&doc) {
            main.trees.insert(doc, tree);
        }
    }
    for (doc, scratch) in worker.scratch {
        if docs.contains(&doc) {
            main.scratch.insert(doc, scratch);
        }
    }

    info!(
        documents = report.documents.len(),
        adopted = report.total_adopted(),
        discarded = report.total_discarded(),
        "worker merged"
    );
    Ok(report)
}

/// Adopt the worker records of one family that pass the ownership filter.
fn adopt<T: Entity>(
    main: &mut Registry<T>,
    worker: Registry<T>,
    docs: &BTreeSet<DocumentId>,
    report: &mut MergeReport,
) {
    let mut adopted = 0_usize;
    let mut discarded = 0_usize;
    for record in worker.into_records() {
        if docs.contains(record.owning_document()) {
            main.save(record);
            adopted += 1;
        } else {
            debug!(
                family = %T::TYPE,
                slug = %record.slug(),
                owner = %record.owning_document(),
                "snapshot artifact discarded"
            );
            discarded += 1;
        }
    }
    if adopted > 0 {
        *report.adopted.entry(T::TYPE).or_default() += adopted;
    }
    if discarded > 0 {
        *report.discarded.entry(T::TYPE).or_default() += discarded;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
