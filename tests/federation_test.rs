mod helpers;

use helpers::{
    sample_library, sample_notebook, sample_tenant, setup_tenant_and_library, similar_embedding,
    test_db, test_embedding,
};
use synthesis::catalog::libraries::create_library;
use synthesis::catalog::notebooks::create_notebook;
use synthesis::catalog::tenants::create_tenant;
use synthesis::error::Error;
use synthesis::index::embeddings::upsert_embedding;
use synthesis::index::graph::merge_relationship;
use synthesis::query::hydrate::hydrate_notebooks;
use synthesis::query::search::search_by_similarity;
use synthesis::query::traverse::traverse_relationships;
use synthesis::uri::EntityKind;

fn link(conn: &mut rusqlite::Connection, from: &str, rel: &str, to: &str) {
    merge_relationship(
        conn,
        EntityKind::Notebook,
        from,
        rel,
        EntityKind::Notebook,
        to,
        None,
    )
    .unwrap();
}

// ── Similarity search ─────────────────────────────────────────────────────────

#[test]
fn search_ranks_by_similarity_descending() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    for id in ["n1", "n2", "n3"] {
        create_notebook(&mut conn, &sample_notebook("t1", "l1", id)).unwrap();
    }

    let base = test_embedding(1);
    upsert_embedding(&mut conn, "n1", &base, "model-a").unwrap();
    upsert_embedding(&mut conn, "n2", &similar_embedding(&base), "model-a").unwrap();
    upsert_embedding(&mut conn, "n3", &test_embedding(200), "model-a").unwrap();

    let hits = search_by_similarity(&conn, &base, None, 3, 4).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].entity_id, "n1");
    assert_eq!(hits[1].entity_id, "n2");
    assert_eq!(hits[2].entity_id, "n3");
    assert!(hits[0].score > hits[1].score);
    assert!(hits[1].score > hits[2].score);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    assert!(hits[2].score.abs() < 1e-5);
}

#[test]
fn search_breaks_score_ties_by_id_ascending() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    for id in ["nb", "na"] {
        create_notebook(&mut conn, &sample_notebook("t1", "l1", id)).unwrap();
    }

    let vector = test_embedding(7);
    upsert_embedding(&mut conn, "nb", &vector, "model-a").unwrap();
    upsert_embedding(&mut conn, "na", &vector, "model-a").unwrap();

    let hits = search_by_similarity(&conn, &vector, None, 2, 4).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.entity_id.as_str()).collect();
    assert_eq!(ids, ["na", "nb"]);
}

#[test]
fn search_respects_tenant_scope() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    create_tenant(&mut conn, &sample_tenant("t2")).unwrap();
    create_library(&mut conn, &sample_library("t2", "l2")).unwrap();
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n1")).unwrap();
    create_notebook(&mut conn, &sample_notebook("t2", "l2", "n2")).unwrap();

    let vector = test_embedding(1);
    upsert_embedding(&mut conn, "n1", &vector, "model-a").unwrap();
    upsert_embedding(&mut conn, "n2", &vector, "model-a").unwrap();

    let hits = search_by_similarity(&conn, &vector, Some("t2"), 10, 4).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.entity_id.as_str()).collect();
    assert_eq!(ids, ["n2"]);
}

#[test]
fn search_reports_multi_model_entities_once() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n1")).unwrap();

    let vector = test_embedding(1);
    upsert_embedding(&mut conn, "n1", &vector, "model-a").unwrap();
    upsert_embedding(&mut conn, "n1", &similar_embedding(&vector), "model-b").unwrap();

    let hits = search_by_similarity(&conn, &vector, None, 10, 4).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity_id, "n1");
    // Best score across models wins
    assert!((hits[0].score - 1.0).abs() < 1e-5);
}

#[test]
fn search_rejects_wrong_dimensionality() {
    let conn = test_db();
    let err = search_by_similarity(&conn, &[0.5f32; 3], None, 10, 4).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn search_with_zero_limit_is_empty() {
    let conn = test_db();
    let hits = search_by_similarity(&conn, &test_embedding(1), None, 0, 4).unwrap();
    assert!(hits.is_empty());
}

// ── Graph traversal ───────────────────────────────────────────────────────────

#[test]
fn traversal_respects_hop_bound() {
    let mut conn = test_db();
    // Two distinct 3-hop paths from a to d
    link(&mut conn, "a", "feeds", "b");
    link(&mut conn, "b", "feeds", "c");
    link(&mut conn, "c", "feeds", "d");
    link(&mut conn, "a", "feeds", "e");
    link(&mut conn, "e", "feeds", "f");
    link(&mut conn, "f", "feeds", "d");

    let within_two = traverse_relationships(&conn, "a", 2, None).unwrap();
    let ids: Vec<&str> = within_two.iter().map(|n| n.id.as_str()).collect();
    assert!(!ids.contains(&"d"), "3-hop node leaked into 2-hop result");

    let within_three = traverse_relationships(&conn, "a", 3, None).unwrap();
    let d_count = within_three.iter().filter(|n| n.id == "d").count();
    assert_eq!(d_count, 1, "node reachable via two paths must appear once");
}

#[test]
fn traversal_is_cycle_safe() {
    let mut conn = test_db();
    link(&mut conn, "a", "feeds", "b");
    link(&mut conn, "b", "feeds", "a");

    let nodes = traverse_relationships(&conn, "a", 10, None).unwrap();
    let mut ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, ["a", "b"]);
}

#[test]
fn zero_hops_returns_start_only_if_present() {
    let mut conn = test_db();
    link(&mut conn, "a", "feeds", "b");

    let start_only = traverse_relationships(&conn, "a", 0, None).unwrap();
    assert_eq!(start_only.len(), 1);
    assert_eq!(start_only[0].id, "a");
    assert_eq!(start_only[0].hops, 0);

    // Unknown start: empty result, never an error
    let empty = traverse_relationships(&conn, "ghost", 0, None).unwrap();
    assert!(empty.is_empty());
    let empty = traverse_relationships(&conn, "ghost", 5, None).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn traversal_filters_by_relationship_type() {
    let mut conn = test_db();
    link(&mut conn, "a", "feeds", "b");
    link(&mut conn, "a", "mentions", "c");

    let fed = traverse_relationships(&conn, "a", 1, Some(&["feeds".to_string()])).unwrap();
    let ids: Vec<&str> = fed.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[test]
fn traversal_reports_hop_distance() {
    let mut conn = test_db();
    link(&mut conn, "a", "feeds", "b");
    link(&mut conn, "b", "feeds", "c");

    let nodes = traverse_relationships(&conn, "a", 2, None).unwrap();
    let hop_of = |id: &str| nodes.iter().find(|n| n.id == id).unwrap().hops;
    assert_eq!(hop_of("a"), 0);
    assert_eq!(hop_of("b"), 1);
    assert_eq!(hop_of("c"), 2);
}

// ── Hydration ─────────────────────────────────────────────────────────────────

#[test]
fn hydrate_preserves_order_and_omits_missing() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n1")).unwrap();
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n2")).unwrap();

    let ids = vec!["n2".to_string(), "ghost".to_string(), "n1".to_string()];
    let hydrated = hydrate_notebooks(&conn, &ids).unwrap();

    let got: Vec<&str> = hydrated.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(got, ["n2", "n1"]);
}

#[test]
fn hydrate_returns_full_aggregates() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);

    let mut notebook = sample_notebook("t1", "l1", "n1");
    notebook.contents.data.markdown = "# Body".into();
    notebook.contents.content_blocks = vec![helpers::block("a", None, 0)];
    create_notebook(&mut conn, &notebook).unwrap();

    let hydrated = hydrate_notebooks(&conn, &["n1".to_string()]).unwrap();
    assert_eq!(hydrated.len(), 1);
    assert_eq!(hydrated[0], notebook);
}
