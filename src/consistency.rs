//! End-of-build reconciliation between two independently populated
//! registries.
//!
//! The canonical use: one registry holds contrib modules *declared* in
//! markup, the other holds modules *discovered* by static inspection of the
//! codebase, both keyed in the same slug namespace. The checker computes
//! which slugs match up and reports the rest:
//!
//! - **undocumented**: discovered but never declared in any document.
//! - **no backing**: declared but never discovered.
//! - **mismatch**: present on both sides but the records disagree
//!   (only when the caller supplies a comparator).
//!
//! The check is read-only, runs once per build after all documents are
//! read, and never blocks the build: issues are surfaced for the host's
//! reporting layer, nothing is raised.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::model::entity::Entity;
use crate::model::types::Slug;
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// ValidationIssue
// ---------------------------------------------------------------------------

/// The kind of discrepancy a consistency issue reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Discovered but not declared in any document.
    Undocumented,
    /// Declared but not backed by anything discovered.
    NoBacking,
    /// Declared and discovered, but the two records disagree.
    Mismatch,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undocumented => write!(f, "undocumented"),
            Self::NoBacking => write!(f, "no_backing"),
            Self::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// One discrepancy found by the consistency checker.
///
/// Created fresh on each run; never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// The slug the issue concerns.
    pub slug: Slug,
    /// What kind of discrepancy this is.
    pub kind: IssueKind,
    /// Human-readable message for the host's reporting layer.
    pub message: String,
}

// ---------------------------------------------------------------------------
// ConsistencyReport
// ---------------------------------------------------------------------------

/// Result of one consistency-check run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Slugs declared in markup.
    pub documented: BTreeSet<Slug>,
    /// Slugs discovered independently.
    pub discovered: BTreeSet<Slug>,
    /// Slugs present on both sides.
    pub matched: BTreeSet<Slug>,
    /// One issue per discrepancy, ordered by kind then slug.
    pub issues: Vec<ValidationIssue>,
}

impl ConsistencyReport {
    /// Returns `true` if any discrepancy was found.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// One-line summary for the host's log.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "consistency: {} documented, {} discovered, {} matched, {} issue(s)",
            self.documented.len(),
            self.discovered.len(),
            self.matched.len(),
            self.issues.len()
        )
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Reconcile a declared registry against a discovered one by slug.
///
/// Emits one issue per undocumented and per no-backing slug. Matched
/// records are not compared; use [`reconcile_with`] for that.
#[must_use]
pub fn reconcile<T: Entity, U: Entity>(
    declared: &Registry<T>,
    discovered: &Registry<U>,
) -> ConsistencyReport {
    reconcile_with(declared, discovered, |_, _| None)
}

/// Reconcile with record-level comparison of matched slugs.
///
/// `compare` receives the declared and discovered records for each matched
/// slug; returning `Some(detail)` emits a [`IssueKind::Mismatch`] issue
/// with that detail.
#[must_use]
pub fn reconcile_with<T: Entity, U: Entity>(
    declared: &Registry<T>,
    discovered: &Registry<U>,
    compare: impl Fn(&T, &U) -> Option<String>,
) -> ConsistencyReport {
    let documented: BTreeSet<Slug> = declared.iter().map(|r| r.slug().clone()).collect();
    let found: BTreeSet<Slug> = discovered.iter().map(|r| r.slug().clone()).collect();
    let matched: BTreeSet<Slug> = documented.intersection(&found).cloned().collect();

    let mut issues = Vec::new();
    for slug in found.difference(&documented) {
        issues.push(ValidationIssue {
            slug: slug.clone(),
            kind: IssueKind::Undocumented,
            message: format!("'{slug}' was discovered but is not documented anywhere"),
        });
    }
    for slug in documented.difference(&found) {
        issues.push(ValidationIssue {
            slug: slug.clone(),
            kind: IssueKind::NoBacking,
            message: format!("'{slug}' is documented but nothing discovered backs it"),
        });
    }
    for slug in &matched {
        // Both lookups must hit: the slug came from the intersection.
        if let (Some(decl), Some(disc)) = (declared.get(slug), discovered.get(slug))
            && let Some(detail) = compare(decl, disc)
        {
            issues.push(ValidationIssue {
                slug: slug.clone(),
                kind: IssueKind::Mismatch,
                message: format!("'{slug}' is documented and discovered, but they disagree: {detail}"),
            });
        }
    }
    issues.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.slug.cmp(&b.slug)));

    ConsistencyReport {
        documented,
        discovered: found,
        matched,
        issues,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::ContribModule;
    use crate::model::types::DocumentId;

    fn slug(s: &str) -> Slug {
        Slug::new(s).unwrap()
    }

    fn module(slug_str: &str, doc_str: &str, path: &str) -> ContribModule {
        ContribModule {
            slug: slug(slug_str),
            owning_document: DocumentId::new(doc_str).unwrap(),
            name: slug_str.to_owned(),
            path: path.to_owned(),
            description: String::new(),
        }
    }

    fn registry_of(modules: &[(&str, &str)]) -> Registry<ContribModule> {
        let mut reg = Registry::new();
        for (s, path) in modules {
            reg.save(module(s, "modules.md", path));
        }
        reg
    }

    #[test]
    fn declared_ab_discovered_bc() {
        // declared = {a, b}, discovered = {b, c}
        let declared = registry_of(&[("a", "src/a"), ("b", "src/b")]);
        let discovered = registry_of(&[("b", "src/b"), ("c", "src/c")]);

        let report = reconcile(&declared, &discovered);
        assert_eq!(report.matched, BTreeSet::from([slug("b")]));
        assert_eq!(report.documented, BTreeSet::from([slug("a"), slug("b")]));
        assert_eq!(report.discovered, BTreeSet::from([slug("b"), slug("c")]));

        assert_eq!(report.issues.len(), 2);
        let undocumented: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::Undocumented)
            .collect();
        let no_backing: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::NoBacking)
            .collect();
        assert_eq!(undocumented.len(), 1);
        assert_eq!(undocumented[0].slug, slug("c"));
        assert_eq!(no_backing.len(), 1);
        assert_eq!(no_backing[0].slug, slug("a"));
    }

    #[test]
    fn identical_sides_are_clean() {
        let declared = registry_of(&[("a", "src/a"), ("b", "src/b")]);
        let discovered = registry_of(&[("a", "src/a"), ("b", "src/b")]);
        let report = reconcile(&declared, &discovered);
        assert!(!report.has_issues());
        assert_eq!(report.matched.len(), 2);
    }

    #[test]
    fn both_empty_is_clean() {
        let declared: Registry<ContribModule> = Registry::new();
        let discovered: Registry<ContribModule> = Registry::new();
        let report = reconcile(&declared, &discovered);
        assert!(!report.has_issues());
        assert!(report.matched.is_empty());
    }

    #[test]
    fn messages_are_human_readable() {
        let declared = registry_of(&[("ghost-module", "src/ghost")]);
        let discovered = registry_of(&[]);
        let report = reconcile(&declared, &discovered);
        assert!(report.issues[0].message.contains("ghost-module"));
        assert!(report.issues[0].message.contains("nothing discovered"));
    }

    #[test]
    fn issues_sorted_by_kind_then_slug() {
        let declared = registry_of(&[("zz", "z"), ("aa", "a")]);
        let discovered = registry_of(&[("mm", "m"), ("bb", "b")]);
        let report = reconcile(&declared, &discovered);
        let order: Vec<_> = report
            .issues
            .iter()
            .map(|i| (i.kind, i.slug.as_str().to_owned()))
            .collect();
        assert_eq!(
            order,
            vec![
                (IssueKind::Undocumented, "bb".to_owned()),
                (IssueKind::Undocumented, "mm".to_owned()),
                (IssueKind::NoBacking, "aa".to_owned()),
                (IssueKind::NoBacking, "zz".to_owned()),
            ]
        );
    }

    #[test]
    fn comparator_emits_mismatches() {
        let declared = registry_of(&[("mod-a", "src/a"), ("mod-b", "src/b")]);
        let discovered = registry_of(&[("mod-a", "src/a"), ("mod-b", "lib/b")]);

        let report = reconcile_with(&declared, &discovered, |decl, disc| {
            (decl.path != disc.path).then(|| {
                format!("declared path '{}', discovered path '{}'", decl.path, disc.path)
            })
        });
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Mismatch);
        assert_eq!(report.issues[0].slug, slug("mod-b"));
        assert!(report.issues[0].message.contains("lib/b"));
    }

    #[test]
    fn checker_is_read_only() {
        let declared = registry_of(&[("a", "src/a")]);
        let discovered = registry_of(&[("b", "src/b")]);
        let before_decl = declared.len();
        let before_disc = discovered.len();
        let _ = reconcile(&declared, &discovered);
        assert_eq!(declared.len(), before_decl);
        assert_eq!(discovered.len(), before_disc);
    }

    #[test]
    fn summary_line() {
        let declared = registry_of(&[("a", "x")]);
        let discovered = registry_of(&[("b", "y")]);
        let report = reconcile(&declared, &discovered);
        let summary = report.summary();
        assert!(summary.contains("1 documented"));
        assert!(summary.contains("1 discovered"));
        assert!(summary.contains("0 matched"));
        assert!(summary.contains("2 issue(s)"));
    }
}
