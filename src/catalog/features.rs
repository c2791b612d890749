//! Feature persistence — derived data linked to external resources.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;

use crate::catalog::types::{ExternalResource, Feature, Notification};
use crate::catalog::{delete_resource_index, now, require, upsert_resource_index};
use crate::error::{Error, Result};
use crate::uri::{self, EntityKind};

/// Create a feature under an existing tenant, with its linked resources,
/// notification targets, and value map, in one transaction.
pub fn create_feature(conn: &mut Connection, feature: &Feature) -> Result<()> {
    require(&feature.id, "feature id")?;
    require(&feature.tenant_id, "tenant id")?;
    require(&feature.display_name, "display name")?;

    let resource_uri = uri::feature_uri(&feature.tenant_id, &feature.id)?;
    let values_json = values_to_json(&feature.values)?;
    let timestamp = now();

    let tx = conn.transaction()?;

    let tenant_exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM tenant WHERE id = ?1",
            params![feature.tenant_id],
            |row| row.get(0),
        )
        .optional()?;
    if tenant_exists.is_none() {
        return Err(Error::not_found("tenant", feature.tenant_id.clone()));
    }

    tx.execute(
        "INSERT INTO feature (id, tenant_id, display_name, description, ttl_seconds, values_json, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            feature.id,
            feature.tenant_id,
            feature.display_name,
            feature.description,
            feature.ttl_seconds.map(|v| v as i64),
            values_json,
            timestamp,
        ],
    )
    .map_err(|e| match Error::from(e) {
        Error::Conflict(_) => Error::conflict(format!("feature already exists: {}", feature.id)),
        other => other,
    })?;

    insert_dependents(&tx, feature)?;

    upsert_resource_index(
        &tx,
        &resource_uri,
        EntityKind::Feature,
        &feature.id,
        &feature.tenant_id,
    )?;

    tx.commit()?;

    tracing::info!(feature = %feature.id, tenant = %feature.tenant_id, "feature created");
    Ok(())
}

/// Fetch the full feature aggregate.
pub fn get_feature(conn: &Connection, id: &str) -> Result<Feature> {
    let header = conn
        .query_row(
            "SELECT id, tenant_id, display_name, description, ttl_seconds, values_json \
             FROM feature WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<i64>>(4)?.map(|v| v as u64),
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| Error::not_found("feature", id))?;

    let (id, tenant_id, display_name, description, ttl_seconds, values_json) = header;

    Ok(Feature {
        tenant_id,
        display_name,
        description,
        resources: fetch_resources(conn, &id)?,
        notifications: fetch_notifications(conn, &id)?,
        ttl_seconds,
        values: values_from_json(values_json),
        id,
    })
}

/// Features under one tenant, newest first, id tie-break.
pub fn list_features_by_tenant(conn: &Connection, tenant_id: &str) -> Result<Vec<Feature>> {
    let ids: Vec<String> = conn
        .prepare(
            "SELECT id FROM feature WHERE tenant_id = ?1 ORDER BY created_at DESC, id ASC",
        )?
        .query_map(params![tenant_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    ids.iter().map(|id| get_feature(conn, id)).collect()
}

/// Full replace of mutable fields and dependents.
pub fn update_feature(conn: &mut Connection, feature: &Feature) -> Result<()> {
    require(&feature.id, "feature id")?;
    require(&feature.display_name, "display name")?;

    let resource_uri = uri::feature_uri(&feature.tenant_id, &feature.id)?;
    let values_json = values_to_json(&feature.values)?;

    let tx = conn.transaction()?;

    let rows = tx.execute(
        "UPDATE feature SET display_name = ?2, description = ?3, ttl_seconds = ?4, values_json = ?5 \
         WHERE id = ?1",
        params![
            feature.id,
            feature.display_name,
            feature.description,
            feature.ttl_seconds.map(|v| v as i64),
            values_json,
        ],
    )?;
    if rows == 0 {
        return Err(Error::not_found("feature", feature.id.clone()));
    }

    tx.execute(
        "DELETE FROM feature_resource WHERE feature_id = ?1",
        params![feature.id],
    )?;
    tx.execute(
        "DELETE FROM feature_notification WHERE feature_id = ?1",
        params![feature.id],
    )?;
    insert_dependents(&tx, feature)?;

    upsert_resource_index(
        &tx,
        &resource_uri,
        EntityKind::Feature,
        &feature.id,
        &feature.tenant_id,
    )?;

    tx.commit()?;
    Ok(())
}

/// Delete a feature and retire its resource-index row.
pub fn delete_feature(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let rows = tx.execute("DELETE FROM feature WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found("feature", id));
    }

    delete_resource_index(&tx, EntityKind::Feature, id)?;

    tx.commit()?;
    tracing::info!(feature = %id, "feature deleted");
    Ok(())
}

// ── Row helpers ───────────────────────────────────────────────────────────────

fn insert_dependents(tx: &Transaction, feature: &Feature) -> Result<()> {
    for (pos, resource) in feature.resources.iter().enumerate() {
        tx.execute(
            "INSERT INTO feature_resource (feature_id, pos, url) VALUES (?1, ?2, ?3)",
            params![feature.id, pos as i64, resource.url],
        )?;
    }
    for (pos, notification) in feature.notifications.iter().enumerate() {
        tx.execute(
            "INSERT INTO feature_notification (feature_id, pos, nurl) VALUES (?1, ?2, ?3)",
            params![feature.id, pos as i64, notification.url],
        )?;
    }
    Ok(())
}

fn fetch_resources(conn: &Connection, feature_id: &str) -> Result<Vec<ExternalResource>> {
    let mut stmt = conn
        .prepare("SELECT url FROM feature_resource WHERE feature_id = ?1 ORDER BY pos")?;
    let resources = stmt
        .query_map(params![feature_id], |row| {
            Ok(ExternalResource { url: row.get(0)? })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(resources)
}

fn fetch_notifications(conn: &Connection, feature_id: &str) -> Result<Vec<Notification>> {
    let mut stmt = conn
        .prepare("SELECT nurl FROM feature_notification WHERE feature_id = ?1 ORDER BY pos")?;
    let notifications = stmt
        .query_map(params![feature_id], |row| {
            Ok(Notification { url: row.get(0)? })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(notifications)
}

fn values_to_json(values: &BTreeMap<String, String>) -> Result<Option<String>> {
    if values.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(values)
        .map(Some)
        .map_err(|e| Error::validation(format!("values not serializable: {e}")))
}

fn values_from_json(json: Option<String>) -> BTreeMap<String, String> {
    json.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
