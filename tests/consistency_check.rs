//! Integration test for the end-of-build consistency check, as the host
//! pipeline would run it: one registry populated by document parse, the
//! other by an independent discovery pass.

use weft::model::entity::ContribModule;
use weft::{BuildEnvironment, DocumentId, IssueKind, Registry, Slug, reconcile, reconcile_with};

fn doc(s: &str) -> DocumentId {
    DocumentId::new(s).unwrap()
}

fn slug(s: &str) -> Slug {
    Slug::new(s).unwrap()
}

fn module(slug_str: &str, doc_str: &str, path: &str) -> ContribModule {
    ContribModule {
        slug: slug(slug_str),
        owning_document: doc(doc_str),
        name: slug_str.to_owned(),
        path: path.to_owned(),
        description: String::new(),
    }
}

#[test]
fn end_of_build_reconciliation() {
    // Declared side: the parse phase populated the contrib_module registry.
    let mut env = BuildEnvironment::new();
    env.begin_document(doc("modules.md")).unwrap();
    let regs = env.registries_mut().unwrap();
    regs.contrib_module
        .save(module("auth", "modules.md", "src/auth"));
    regs.contrib_module
        .save(module("billing", "modules.md", "src/billing"));
    regs.contrib_module
        .save(module("legacy-export", "modules.md", "src/export"));
    env.end_local_parse(&doc("modules.md")).unwrap();

    // Discovered side: an inspection pass over the codebase, owned by a
    // synthetic document since it has no markup source.
    let mut discovered: Registry<ContribModule> = Registry::new();
    discovered.save(module("auth", "inspection", "src/auth"));
    discovered.save(module("billing", "inspection", "src/billing"));
    discovered.save(module("search", "inspection", "src/search"));

    let report = reconcile(&env.registries().contrib_module, &discovered);
    assert_eq!(report.matched.len(), 2);
    assert!(report.has_issues());

    let kinds: Vec<_> = report
        .issues
        .iter()
        .map(|i| (i.kind, i.slug.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (IssueKind::Undocumented, "search"),
            (IssueKind::NoBacking, "legacy-export"),
        ]
    );

    // The check never blocks the build: the environment is untouched and
    // still usable afterwards.
    assert_eq!(env.registries().contrib_module.len(), 3);
    env.begin_global_resolution().unwrap();
}

#[test]
fn path_mismatch_detected_with_comparator() {
    let mut declared: Registry<ContribModule> = Registry::new();
    declared.save(module("auth", "modules.md", "src/auth"));

    let mut discovered: Registry<ContribModule> = Registry::new();
    discovered.save(module("auth", "inspection", "services/auth"));

    let report = reconcile_with(&declared, &discovered, |decl, disc| {
        (decl.path != disc.path)
            .then(|| format!("path '{}' vs '{}'", decl.path, disc.path))
    });
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, IssueKind::Mismatch);
    assert!(report.issues[0].message.contains("services/auth"));
}
