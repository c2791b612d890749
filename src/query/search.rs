//! Similarity search over the vector index.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

use crate::db::migrations::EMBEDDING_DIM;
use crate::error::{Error, Result};
use crate::index::{embedding_to_bytes, l2_to_cosine};

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityHit {
    pub entity_id: String,
    pub score: f64,
}

/// Rank entities by similarity between their stored embeddings and the
/// query vector, descending; ties break by entity id ascending so results
/// are deterministic. An entity embedded under several models is reported
/// once with its best score. With a tenant scope, only entities whose
/// owning tenant matches are eligible.
///
/// `candidate_multiplier` controls KNN over-fetch so scope filtering and
/// per-model dedup still leave `limit` survivors.
pub fn search_by_similarity(
    conn: &Connection,
    query_vector: &[f32],
    tenant_scope: Option<&str>,
    limit: usize,
    candidate_multiplier: usize,
) -> Result<Vec<SimilarityHit>> {
    if query_vector.len() != EMBEDDING_DIM {
        return Err(Error::validation(format!(
            "query vector has {} dimensions, index expects {EMBEDDING_DIM}",
            query_vector.len()
        )));
    }
    if limit == 0 {
        return Ok(Vec::new());
    }

    let k = limit.saturating_mul(candidate_multiplier.max(1)) as i64;
    let mut stmt = conn.prepare(
        "SELECT entity_key, distance FROM embedding_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let candidates: Vec<(String, f64)> = stmt
        .query_map(params![embedding_to_bytes(query_vector), k], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // Keys are `{entity_id}#{model}`; models never contain '#', so the last
    // separator is the model boundary. Keep the best score per entity.
    let mut best: HashMap<String, f64> = HashMap::new();
    for (key, distance) in candidates {
        let entity_id = match key.rsplit_once('#') {
            Some((entity_id, _model)) => entity_id.to_string(),
            None => key,
        };
        let score = l2_to_cosine(distance);
        let entry = best.entry(entity_id).or_insert(f64::NEG_INFINITY);
        if score > *entry {
            *entry = score;
        }
    }

    let mut hits: Vec<SimilarityHit> = Vec::with_capacity(best.len());
    for (entity_id, score) in best {
        if let Some(tenant) = tenant_scope {
            if !entity_belongs_to_tenant(conn, &entity_id, tenant)? {
                continue;
            }
        }
        hits.push(SimilarityHit { entity_id, score });
    }

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    hits.truncate(limit);

    Ok(hits)
}

/// Scope check through the resource index, which maps every addressable
/// entity to its owning tenant.
fn entity_belongs_to_tenant(conn: &Connection, entity_id: &str, tenant_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM resource_index WHERE entity_id = ?1 AND tenant_id = ?2",
            params![entity_id, tenant_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
