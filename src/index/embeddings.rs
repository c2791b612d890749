//! Vector index maintenance.
//!
//! One current embedding per (entity, model); re-upsert replaces. The
//! `model` field records provenance, so embeddings for the same entity
//! under different models coexist as distinct rows.

use rusqlite::{params, Connection};

use crate::db::migrations::EMBEDDING_DIM;
use crate::error::{Error, Result};
use crate::index::{embedding_to_bytes, entity_key, sync};

/// Replace the embedding for (entity, model). The vector must match the
/// index's fixed dimensionality; anything else is a validation error before
/// the store is touched.
pub fn upsert_embedding(
    conn: &mut Connection,
    entity_id: &str,
    vector: &[f32],
    model: &str,
) -> Result<()> {
    if entity_id.is_empty() {
        return Err(Error::validation("entity id must not be empty"));
    }
    if model.is_empty() {
        return Err(Error::validation("model must not be empty"));
    }
    // '#' delimits entity and model inside vec0 keys
    if model.contains('#') {
        return Err(Error::validation("model must not contain '#'"));
    }
    if vector.len() != EMBEDDING_DIM {
        return Err(Error::validation(format!(
            "embedding for model {model} has {} dimensions, index expects {EMBEDDING_DIM}",
            vector.len()
        )));
    }

    let key = entity_key(entity_id, model);
    let now = chrono::Utc::now().to_rfc3339();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO embedding_record (entity_id, model, dim, updated_at) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (entity_id, model) DO UPDATE \
         SET dim = excluded.dim, updated_at = excluded.updated_at",
        params![entity_id, model, vector.len() as i64, now],
    )?;

    // vec0 has no upsert; replace the row.
    tx.execute(
        "DELETE FROM embedding_vec WHERE entity_key = ?1",
        params![key],
    )?;
    tx.execute(
        "INSERT INTO embedding_vec (entity_key, embedding) VALUES (?1, ?2)",
        params![key, embedding_to_bytes(vector)],
    )?;

    sync::journal(
        &tx,
        "upsert_embedding",
        entity_id,
        "applied",
        Some(&serde_json::json!({ "model": model })),
    )?;

    tx.commit()?;

    tracing::debug!(entity = %entity_id, model = %model, "embedding upserted");
    Ok(())
}

/// Remove every embedding for an entity, across all models. Idempotent —
/// deleting an absent embedding is not an error.
pub fn delete_embedding(conn: &mut Connection, entity_id: &str) -> Result<()> {
    let tx = conn.transaction()?;

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

    if !models.is_empty() {
        sync::journal(
            &tx,
            "delete_embedding",
            entity_id,
            "applied",
            Some(&serde_json::json!({ "models": models })),
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Remove the embedding for one (entity, model) pair. Idempotent.
pub fn delete_embeddings_for_model(
    conn: &mut Connection,
    entity_id: &str,
    model: &str,
) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "DELETE FROM embedding_vec WHERE entity_key = ?1",
        params![entity_key(entity_id, model)],
    )?;
    let removed = tx.execute(
        "DELETE FROM embedding_record WHERE entity_id = ?1 AND model = ?2",
        params![entity_id, model],
    )?;

    if removed > 0 {
        sync::journal(
            &tx,
            "delete_embedding",
            entity_id,
            "applied",
            Some(&serde_json::json!({ "model": model })),
        )?;
    }

    tx.commit()?;
    Ok(())
}
