//! Integration tests for the full build lifecycle: local parse across
//! documents, global resolution, and incremental invalidation.
//!
//! Coverage:
//! - Cross-document references resolve regardless of parse order
//! - Reverse parse order produces identical output
//! - Registries frozen during resolution, readable by resolvers
//! - Invalidate + reparse leaves no stale records, refreshes output
//! - Dangling reference stubs out; rest of the document still resolves
//! - Consistency check result shape from the host's point of view

use std::collections::BTreeMap;

use anyhow::anyhow;
use serde_json::json;

use weft::model::entity::{Persona, Story};
use weft::{
    BuildEnvironment, DocumentId, ResolverRegistry, Slug, resolve_all, resolve_document,
};

const MARKER: &str = "unresolved";

fn doc(s: &str) -> DocumentId {
    DocumentId::new(s).unwrap()
}

fn slug(s: &str) -> Slug {
    Slug::new(s).unwrap()
}

fn slug_attrs(s: &str) -> BTreeMap<String, serde_json::Value> {
    BTreeMap::from([("slug".to_owned(), json!(s))])
}

/// Resolvers for the two reference tags these tests use.
fn resolvers() -> ResolverRegistry {
    let mut resolvers = ResolverRegistry::new();
    resolvers.register("story-ref", |node, env| {
        let wanted = Slug::new(
            node.attr_str("slug")
                .ok_or_else(|| anyhow!("missing 'slug' attribute"))?,
        )?;
        env.registries()
            .story
            .get(&wanted)
            .map(|s| format!("story: {}", s.title))
            .ok_or_else(|| anyhow!("no story with slug '{wanted}'"))
    });
    resolvers.register("persona-ref", |node, env| {
        let wanted = Slug::new(
            node.attr_str("slug")
                .ok_or_else(|| anyhow!("missing 'slug' attribute"))?,
        )?;
        env.registries()
            .persona
            .get(&wanted)
            .map(|p| format!("persona: {}", p.name))
            .ok_or_else(|| anyhow!("no persona with slug '{wanted}'"))
    });
    resolvers
}

/// Parse `personas.md` (declares the shopper persona, references a story)
/// into the environment.
fn parse_personas(env: &mut BuildEnvironment) {
    env.begin_document(doc("personas.md")).unwrap();
    env.registries_mut().unwrap().persona.save(Persona {
        slug: slug("shopper"),
        owning_document: doc("personas.md"),
        name: "Sam the Shopper".to_owned(),
        role: "customer".to_owned(),
        description: String::new(),
        needs: vec![],
    });
    env.push_rendered("## Personas").unwrap();
    env.insert_deferred_node("story-ref", slug_attrs("checkout"))
        .unwrap();
    env.end_local_parse(&doc("personas.md")).unwrap();
}

/// Parse `stories.md` (declares the checkout story, references a persona)
/// into the environment.
fn parse_stories(env: &mut BuildEnvironment) {
    env.begin_document(doc("stories.md")).unwrap();
    env.registries_mut().unwrap().story.save(Story {
        slug: slug("checkout"),
        owning_document: doc("stories.md"),
        title: "Fast checkout".to_owned(),
        persona: Some(slug("shopper")),
        epic: None,
        acceptance: vec![],
    });
    env.push_rendered("## Stories").unwrap();
    env.insert_deferred_node("persona-ref", slug_attrs("shopper"))
        .unwrap();
    env.end_local_parse(&doc("stories.md")).unwrap();
}

fn rendered(env: &BuildEnvironment, d: &str) -> Vec<String> {
    env.tree(&doc(d))
        .unwrap()
        .rendered()
        .map(str::to_owned)
        .collect()
}

#[test]
fn cross_references_resolve_in_both_directions() {
    let mut env = BuildEnvironment::new();
    // personas.md references a story that is parsed *later*
    parse_personas(&mut env);
    parse_stories(&mut env);
    env.begin_global_resolution().unwrap();

    let reports = resolve_all(&mut env, &resolvers(), MARKER).unwrap();
    assert!(reports.iter().all(|r| r.is_clean()));

    assert_eq!(
        rendered(&env, "personas.md"),
        vec!["## Personas", "story: Fast checkout"]
    );
    assert_eq!(
        rendered(&env, "stories.md"),
        vec!["## Stories", "persona: Sam the Shopper"]
    );
}

#[test]
fn parse_order_does_not_change_output() {
    let mut forward = BuildEnvironment::new();
    parse_personas(&mut forward);
    parse_stories(&mut forward);
    forward.begin_global_resolution().unwrap();
    resolve_all(&mut forward, &resolvers(), MARKER).unwrap();

    let mut reverse = BuildEnvironment::new();
    parse_stories(&mut reverse);
    parse_personas(&mut reverse);
    reverse.begin_global_resolution().unwrap();
    resolve_all(&mut reverse, &resolvers(), MARKER).unwrap();

    for d in ["personas.md", "stories.md"] {
        assert_eq!(rendered(&forward, d), rendered(&reverse, d));
    }
}

#[test]
fn incremental_rebuild_refreshes_exactly_one_document() {
    let mut env = BuildEnvironment::new();
    parse_personas(&mut env);
    parse_stories(&mut env);
    env.begin_global_resolution().unwrap();
    resolve_all(&mut env, &resolvers(), MARKER).unwrap();

    // stories.md changes: the story gets a new title.
    let report = env.invalidate_document(&doc("stories.md")).unwrap();
    assert_eq!(report.total_removed(), 1);

    env.begin_document(doc("stories.md")).unwrap();
    env.registries_mut().unwrap().story.save(Story {
        slug: slug("checkout"),
        owning_document: doc("stories.md"),
        title: "One-click checkout".to_owned(),
        persona: Some(slug("shopper")),
        epic: None,
        acceptance: vec![],
    });
    env.push_rendered("## Stories (v2)").unwrap();
    env.insert_deferred_node("persona-ref", slug_attrs("shopper"))
        .unwrap();
    env.end_local_parse(&doc("stories.md")).unwrap();

    // Only one story record exists: no stale duplicate under the old cycle.
    assert_eq!(env.registries().story.len(), 1);
    assert_eq!(
        env.registries().story.get(&slug("checkout")).unwrap().title,
        "One-click checkout"
    );

    env.begin_global_resolution().unwrap();
    let report = resolve_document(&mut env, &resolvers(), &doc("stories.md"), MARKER).unwrap();
    assert!(report.is_clean());
    assert_eq!(
        rendered(&env, "stories.md"),
        vec!["## Stories (v2)", "persona: Sam the Shopper"]
    );
    // personas.md was untouched by the incremental pass
    assert!(env.tree(&doc("personas.md")).unwrap().is_fully_resolved());
}

#[test]
fn dangling_reference_stubs_and_rest_of_document_survives() {
    let mut env = BuildEnvironment::new();
    parse_stories(&mut env);

    env.begin_document(doc("broken.md")).unwrap();
    env.insert_deferred_node("story-ref", slug_attrs("no-such-story"))
        .unwrap();
    env.insert_deferred_node("story-ref", slug_attrs("checkout"))
        .unwrap();
    env.end_local_parse(&doc("broken.md")).unwrap();
    env.begin_global_resolution().unwrap();

    let reports = resolve_all(&mut env, &resolvers(), MARKER).unwrap();
    let broken = reports
        .iter()
        .find(|r| r.document == doc("broken.md"))
        .unwrap();
    assert_eq!(broken.resolved, 1);
    assert_eq!(broken.stubbed.len(), 1);

    let out = rendered(&env, "broken.md");
    assert!(out[0].starts_with("[unresolved story-ref:"));
    assert_eq!(out[1], "story: Fast checkout");
}

#[test]
fn saves_rejected_between_parse_and_resolution_end() {
    let mut env = BuildEnvironment::new();
    parse_stories(&mut env);
    env.begin_global_resolution().unwrap();
    assert!(env.registries_mut().is_err());
    // resolvers can still read
    assert!(env.registries().story.get(&slug("checkout")).is_some());
}
