//! Drift bookkeeping and the repair path.
//!
//! Every secondary-index mutation attempt is journaled. When the attempt
//! after a primary commit fails, [`record_drift`] captures it as a failed
//! journal entry and an [`Error::IndexDrift`] for the caller to report —
//! the primary commit stands. [`reindex`] is the idempotent repair
//! primitive: it recomputes an entity's resource-index row from
//! primary-store truth and retires secondary entries for entities that no
//! longer exist.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;

use crate::catalog::upsert_resource_index;
use crate::error::{Error, Result};
use crate::index::entity_key;
use crate::uri::{self, EntityKind};

/// Outcome of a [`reindex`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexOutcome {
    /// The entity exists; its resource-index row was recomputed.
    Restored,
    /// The entity is gone; its index entries were retired.
    Retired,
}

/// A failed secondary-index mutation awaiting repair.
#[derive(Debug, Clone, Serialize)]
pub struct DriftEntry {
    pub id: i64,
    pub operation: String,
    pub entity_id: String,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

/// Append an entry to the index journal.
pub(crate) fn journal(
    conn: &Connection,
    operation: &str,
    entity_id: &str,
    status: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO index_journal (operation, entity_id, status, details, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![operation, entity_id, status, details.map(|d| d.to_string()), now],
    )?;
    Ok(())
}

/// Capture a failed secondary-index step after a successful primary commit.
/// Writes a failed journal entry and returns the drift error for the caller
/// to report; never unwinds the primary change.
pub fn record_drift(
    conn: &Connection,
    operation: &str,
    entity_id: &str,
    reason: &str,
) -> Error {
    tracing::warn!(
        entity = %entity_id,
        operation = %operation,
        reason = %reason,
        "secondary index update failed after primary commit"
    );
    if let Err(journal_err) = journal(
        conn,
        operation,
        entity_id,
        "failed",
        Some(&serde_json::json!({ "reason": reason })),
    ) {
        // The journal itself is down; the drift error still surfaces.
        tracing::error!(error = %journal_err, "could not journal index drift");
    }
    Error::drift(entity_id, reason)
}

/// All failed journal entries, oldest first — the repair worklist.
pub fn pending_drift(conn: &Connection) -> Result<Vec<DriftEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, operation, entity_id, details, created_at \
         FROM index_journal WHERE status = 'failed' ORDER BY id",
    )?;
    let entries = stmt
        .query_map([], |row| {
            let details: Option<String> = row.get(3)?;
            Ok(DriftEntry {
                id: row.get(0)?,
                operation: row.get(1)?,
                entity_id: row.get(2)?,
                details: details.and_then(|s| serde_json::from_str(&s).ok()),
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Recompute the resource-index row for one entity from the primary store's
/// current state. The entity's kind is resolved from the primary tables, so
/// a caller only needs the id (all the drift journal records). Existing
/// entities get their row upserted; vanished entities get their rows,
/// embeddings, and graph presence retired. Clears any failed journal
/// entries for the entity on success.
pub fn reindex(conn: &mut Connection, entity_id: &str) -> Result<ReindexOutcome> {
    let located = locate_any(conn, entity_id)?;

    let tx = conn.transaction()?;

    let outcome = match located {
        Some((kind, resource_uri, tenant_id)) => {
            upsert_resource_index(&tx, &resource_uri, kind, entity_id, &tenant_id)?;
            ReindexOutcome::Restored
        }
        None => {
            // Gone from the primary store under every kind: retire its
            // index rows wholesale.
            tx.execute(
                "DELETE FROM resource_index WHERE entity_id = ?1",
                params![entity_id],
            )?;
            purge_in_tx(&tx, entity_id)?;
            ReindexOutcome::Retired
        }
    };

    tx.execute(
        "DELETE FROM index_journal WHERE entity_id = ?1 AND status = 'failed'",
        params![entity_id],
    )?;
    journal(
        &tx,
        "reindex",
        entity_id,
        "applied",
        Some(&serde_json::json!({ "outcome": outcome })),
    )?;

    tx.commit()?;

    tracing::info!(entity = %entity_id, ?outcome, "reindexed");
    Ok(outcome)
}

/// Retire the secondary-index entries (embeddings, graph node and edges)
/// for a deleted entity. Idempotent; called by adapters after repository
/// deletes commit.
pub fn purge_entity(conn: &mut Connection, entity_id: &str) -> Result<()> {
    let tx = conn.transaction()?;
    purge_in_tx(&tx, entity_id)?;
    journal(&tx, "purge", entity_id, "applied", None)?;
    tx.commit()?;
    Ok(())
}

fn purge_in_tx(tx: &Transaction, entity_id: &str) -> Result<()> {
    let models: Vec<String> = tx
        .prepare("SELECT model FROM embedding_record WHERE entity_id = ?1")?
        .query_map(params![entity_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for model in &models {
        tx.execute(
            "DELETE FROM embedding_vec WHERE entity_key = ?1",
            params![entity_key(entity_id, model)],
        )?;
    }
    tx.execute(
        "DELETE FROM embedding_record WHERE entity_id = ?1",
        params![entity_id],
    )?;

    tx.execute(
        "DELETE FROM graph_edge WHERE from_id = ?1 OR to_id = ?1",
        params![entity_id],
    )?;
    tx.execute("DELETE FROM graph_node WHERE id = ?1", params![entity_id])?;

    Ok(())
}

/// Determine which entity kind an id currently resolves to, and its URI and
/// owning tenant, without side effects.
fn locate_any(
    conn: &Connection,
    entity_id: &str,
) -> Result<Option<(EntityKind, String, String)>> {
    for kind in [
        EntityKind::Tenant,
        EntityKind::Library,
        EntityKind::Notebook,
        EntityKind::Feature,
        EntityKind::Tool,
        EntityKind::TypeDef,
    ] {
        if let Some((resource_uri, tenant_id)) = locate(conn, kind, entity_id)? {
            return Ok(Some((kind, resource_uri, tenant_id)));
        }
    }
    Ok(None)
}

/// Find an entity in its primary table; returns its canonical URI and
/// owning tenant if it exists. Products are addressable but carry no
/// primary table in this build, so they always read as absent.
fn locate(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
) -> Result<Option<(String, String)>> {
    let row = match kind {
        EntityKind::Tenant => conn
            .query_row(
                "SELECT id FROM tenant WHERE id = ?1",
                params![entity_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|id| (uri::tenant_uri(&id), id)),
        EntityKind::Library => conn
            .query_row(
                "SELECT tenant_id FROM library WHERE id = ?1",
                params![entity_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|tenant| (uri::library_uri(&tenant, entity_id), tenant)),
        EntityKind::Notebook => conn
            .query_row(
                "SELECT tenant_id FROM notebook WHERE id = ?1",
                params![entity_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|tenant| (uri::notebook_uri(&tenant, entity_id), tenant)),
        EntityKind::Feature => conn
            .query_row(
                "SELECT tenant_id FROM feature WHERE id = ?1",
                params![entity_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|tenant| (uri::feature_uri(&tenant, entity_id), tenant)),
        EntityKind::Tool => conn
            .query_row(
                "SELECT tenant_id FROM tool_config WHERE id = ?1",
                params![entity_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|tenant| (uri::tool_uri(&tenant, entity_id), tenant)),
        EntityKind::TypeDef => conn
            .query_row(
                "SELECT name FROM type_def WHERE name = ?1",
                params![entity_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .map(|name| (uri::type_uri(&name), String::new())),
        EntityKind::Product => None,
    };

    match row {
        Some((uri_result, tenant)) => Ok(Some((uri_result?, tenant))),
        None => Ok(None),
    }
}
