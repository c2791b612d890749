//! Entity repositories and the content tree manager.
//!
//! Each repository module owns transactional CRUD for one entity type
//! against the primary store, including the `resource_index` rows that make
//! entities discoverable. Writes run inside exactly one transaction; a
//! dropped transaction rolls back, so a cancelled call leaves the store
//! unchanged. Secondary indices (vector, graph) are never touched here —
//! see `crate::index`.

pub mod features;
pub mod libraries;
pub mod notebooks;
pub mod tenants;
pub mod tool_configs;
pub mod tree;
pub mod type_defs;
pub mod types;

use rusqlite::{params, Connection};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::uri::EntityKind;

/// Current time as the RFC 3339 string we store in TEXT columns.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Reject an empty required field with a validation error naming it.
pub(crate) fn require(value: &str, field: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn labels_to_json(labels: &BTreeMap<String, String>) -> Result<Option<String>> {
    if labels.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(labels)
        .map(Some)
        .map_err(|e| Error::validation(format!("labels not serializable: {e}")))
}

pub(crate) fn labels_from_json(json: Option<String>) -> BTreeMap<String, String> {
    json.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Atomic insert-or-update of a `resource_index` row. Concurrent creators
/// of the same URI resolve deterministically to one winner instead of
/// raising a spurious conflict.
pub(crate) fn upsert_resource_index(
    conn: &Connection,
    uri: &str,
    kind: EntityKind,
    entity_id: &str,
    tenant_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO resource_index (uri, entity_type, entity_id, tenant_id) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (uri) DO UPDATE \
         SET entity_type = excluded.entity_type, \
             entity_id = excluded.entity_id, \
             tenant_id = excluded.tenant_id",
        params![uri, kind.as_str(), entity_id, tenant_id],
    )?;
    Ok(())
}

/// Retire the `resource_index` row for one entity. Idempotent.
pub(crate) fn delete_resource_index(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
) -> Result<()> {
    conn.execute(
        "DELETE FROM resource_index WHERE entity_type = ?1 AND entity_id = ?2",
        params![kind.as_str(), entity_id],
    )?;
    Ok(())
}
