mod helpers;

use helpers::{sample_notebook, setup_tenant_and_library, test_db, test_embedding};
use rusqlite::params;
use synthesis::catalog::notebooks::{create_notebook, delete_notebook};
use synthesis::error::Error;
use synthesis::index::embeddings::{
    delete_embedding, delete_embeddings_for_model, upsert_embedding,
};
use synthesis::index::graph::{delete_relationship, merge_relationship};
use synthesis::index::sync::{
    pending_drift, purge_entity, record_drift, reindex, ReindexOutcome,
};
use synthesis::uri::EntityKind;

#[test]
fn upsert_embedding_replaces_per_model() {
    let mut conn = test_db();

    upsert_embedding(&mut conn, "n1", &test_embedding(1), "model-a").unwrap();
    upsert_embedding(&mut conn, "n1", &test_embedding(2), "model-a").unwrap();

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM embedding_record WHERE entity_id = 'n1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);

    let vec_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM embedding_vec", [], |r| r.get(0))
        .unwrap();
    assert_eq!(vec_count, 1);
}

#[test]
fn embeddings_under_different_models_coexist() {
    let mut conn = test_db();

    upsert_embedding(&mut conn, "n1", &test_embedding(1), "model-a").unwrap();
    upsert_embedding(&mut conn, "n1", &test_embedding(2), "model-b").unwrap();

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM embedding_record WHERE entity_id = 'n1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn mismatched_dimensionality_is_validation() {
    let mut conn = test_db();

    let short = vec![1.0f32; 16];
    let err = upsert_embedding(&mut conn, "n1", &short, "model-a").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn delete_embedding_is_idempotent() {
    let mut conn = test_db();

    upsert_embedding(&mut conn, "n1", &test_embedding(1), "model-a").unwrap();
    delete_embedding(&mut conn, "n1").unwrap();
    // Deleting an already-absent embedding is not an error
    delete_embedding(&mut conn, "n1").unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM embedding_record", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn delete_for_model_leaves_other_models() {
    let mut conn = test_db();

    upsert_embedding(&mut conn, "n1", &test_embedding(1), "model-a").unwrap();
    upsert_embedding(&mut conn, "n1", &test_embedding(2), "model-b").unwrap();

    delete_embeddings_for_model(&mut conn, "n1", "model-a").unwrap();

    let models: Vec<String> = conn
        .prepare("SELECT model FROM embedding_record WHERE entity_id = 'n1'")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(models, ["model-b"]);
}

#[test]
fn merge_relationship_is_idempotent_with_latest_properties() {
    let mut conn = test_db();

    merge_relationship(
        &mut conn,
        EntityKind::Feature,
        "f1",
        "derived_from",
        EntityKind::Notebook,
        "n1",
        Some(&serde_json::json!({ "weight": 1 })),
    )
    .unwrap();

    merge_relationship(
        &mut conn,
        EntityKind::Feature,
        "f1",
        "derived_from",
        EntityKind::Notebook,
        "n1",
        Some(&serde_json::json!({ "weight": 2 })),
    )
    .unwrap();

    // Exactly one edge, carrying the latest properties
    let (count, properties): (i64, String) = conn
        .query_row(
            "SELECT COUNT(*), MAX(properties_json) FROM graph_edge \
             WHERE from_id = 'f1' AND rel_type = 'derived_from' AND to_id = 'n1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    let props: serde_json::Value = serde_json::from_str(&properties).unwrap();
    assert_eq!(props["weight"], 2);
}

#[test]
fn merge_materializes_placeholder_nodes() {
    let mut conn = test_db();

    merge_relationship(
        &mut conn,
        EntityKind::Product,
        "p1",
        "uses",
        EntityKind::Notebook,
        "n1",
        None,
    )
    .unwrap();

    let types: Vec<(String, String)> = conn
        .prepare("SELECT id, node_type FROM graph_node ORDER BY id")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        types,
        [
            ("n1".to_string(), "notebook".to_string()),
            ("p1".to_string(), "product".to_string())
        ]
    );
}

#[test]
fn delete_relationship_is_idempotent() {
    let mut conn = test_db();

    merge_relationship(
        &mut conn,
        EntityKind::Feature,
        "f1",
        "derived_from",
        EntityKind::Notebook,
        "n1",
        None,
    )
    .unwrap();

    delete_relationship(&mut conn, "f1", "derived_from", "n1").unwrap();
    delete_relationship(&mut conn, "f1", "derived_from", "n1").unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM graph_edge", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn recorded_drift_is_visible_until_reindexed() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n1")).unwrap();

    let err = record_drift(&conn, "upsert_embedding", "n1", "vector store timed out");
    assert!(matches!(err, Error::IndexDrift { .. }));

    let pending = pending_drift(&conn).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].entity_id, "n1");

    let outcome = reindex(&mut conn, "n1").unwrap();
    assert_eq!(outcome, ReindexOutcome::Restored);

    assert!(pending_drift(&conn).unwrap().is_empty());
}

#[test]
fn reindex_restores_a_lost_resource_index_row() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n1")).unwrap();

    // Simulate drift: the index row vanished while the entity survives.
    conn.execute(
        "DELETE FROM resource_index WHERE entity_id = 'n1'",
        params![],
    )
    .unwrap();

    let outcome = reindex(&mut conn, "n1").unwrap();
    assert_eq!(outcome, ReindexOutcome::Restored);

    let uri: String = conn
        .query_row(
            "SELECT uri FROM resource_index WHERE entity_type = 'notebook' AND entity_id = 'n1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(uri, "synthesis://tenant/t1/notebook/n1");
}

#[test]
fn reindex_retires_entries_for_vanished_entities() {
    let mut conn = test_db();
    setup_tenant_and_library(&mut conn);
    create_notebook(&mut conn, &sample_notebook("t1", "l1", "n1")).unwrap();
    upsert_embedding(&mut conn, "n1", &test_embedding(1), "model-a").unwrap();
    merge_relationship(
        &mut conn,
        EntityKind::Library,
        "l1",
        "contains",
        EntityKind::Notebook,
        "n1",
        None,
    )
    .unwrap();

    delete_notebook(&mut conn, "n1").unwrap();

    let outcome = reindex(&mut conn, "n1").unwrap();
    assert_eq!(outcome, ReindexOutcome::Retired);

    let embeddings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM embedding_record WHERE entity_id = 'n1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(embeddings, 0);

    let edges: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM graph_edge WHERE from_id = 'n1' OR to_id = 'n1'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(edges, 0);
}

#[test]
fn purge_entity_clears_both_secondary_indices() {
    let mut conn = test_db();

    upsert_embedding(&mut conn, "n1", &test_embedding(1), "model-a").unwrap();
    upsert_embedding(&mut conn, "n1", &test_embedding(2), "model-b").unwrap();
    merge_relationship(
        &mut conn,
        EntityKind::Notebook,
        "n1",
        "references",
        EntityKind::Notebook,
        "n2",
        None,
    )
    .unwrap();

    purge_entity(&mut conn, "n1").unwrap();

    let embeddings: i64 = conn
        .query_row("SELECT COUNT(*) FROM embedding_record", [], |r| r.get(0))
        .unwrap();
    assert_eq!(embeddings, 0);

    let nodes: Vec<String> = conn
        .prepare("SELECT id FROM graph_node")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(nodes, ["n2"]);
}
