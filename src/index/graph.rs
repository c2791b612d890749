//! Graph index maintenance.
//!
//! Typed directed edges between entity references, with
//! (from, rel_type, to) as the natural key: merging an existing edge
//! updates its properties instead of duplicating it. Edge endpoints are
//! materialized as placeholder nodes on first reference.

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::index::sync;
use crate::uri::EntityKind;

/// Create the edge if absent, or update its properties if an edge with the
/// same (from, to, relType) key exists. Previously-unseen node identifiers
/// get minimal placeholder nodes.
pub fn merge_relationship(
    conn: &mut Connection,
    from_kind: EntityKind,
    from_id: &str,
    rel_type: &str,
    to_kind: EntityKind,
    to_id: &str,
    properties: Option<&serde_json::Value>,
) -> Result<()> {
    if from_id.is_empty() || to_id.is_empty() {
        return Err(Error::validation("edge endpoints must not be empty"));
    }
    if rel_type.is_empty() {
        return Err(Error::validation("relationship type must not be empty"));
    }

    let properties_json = properties.map(|p| p.to_string());
    let now = chrono::Utc::now().to_rfc3339();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT OR IGNORE INTO graph_node (id, node_type) VALUES (?1, ?2)",
        params![from_id, from_kind.as_str()],
    )?;
    tx.execute(
        "INSERT OR IGNORE INTO graph_node (id, node_type) VALUES (?1, ?2)",
        params![to_id, to_kind.as_str()],
    )?;

    tx.execute(
        "INSERT INTO graph_edge (from_id, rel_type, to_id, properties_json, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT (from_id, rel_type, to_id) DO UPDATE \
         SET properties_json = excluded.properties_json",
        params![from_id, rel_type, to_id, properties_json, now],
    )?;

    sync::journal(
        &tx,
        "merge_edge",
        from_id,
        "applied",
        Some(&serde_json::json!({ "rel": rel_type, "to": to_id })),
    )?;

    tx.commit()?;

    tracing::debug!(from = %from_id, rel = %rel_type, to = %to_id, "relationship merged");
    Ok(())
}

/// Remove the matching edge. Idempotent no-op if absent.
pub fn delete_relationship(
    conn: &mut Connection,
    from_id: &str,
    rel_type: &str,
    to_id: &str,
) -> Result<()> {
    let tx = conn.transaction()?;

    let removed = tx.execute(
        "DELETE FROM graph_edge WHERE from_id = ?1 AND rel_type = ?2 AND to_id = ?3",
        params![from_id, rel_type, to_id],
    )?;

    if removed > 0 {
        sync::journal(
            &tx,
            "delete_edge",
            from_id,
            "applied",
            Some(&serde_json::json!({ "rel": rel_type, "to": to_id })),
        )?;
    }

    tx.commit()?;
    Ok(())
}
