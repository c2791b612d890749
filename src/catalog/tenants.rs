//! Tenant persistence.
//!
//! Tenants carry an optimistic version: every successful mutation bumps it,
//! and updates must present the version they read or fail with a conflict.

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::types::Tenant;
use crate::catalog::{
    labels_from_json, labels_to_json, now, require, upsert_resource_index,
};
use crate::error::{Error, Result};
use crate::uri::{self, EntityKind};

/// Create a tenant with version 1 and upsert its resource-index row, all in
/// one transaction. An existing id fails with a conflict and leaves nothing
/// behind.
pub fn create_tenant(conn: &mut Connection, tenant: &Tenant) -> Result<Tenant> {
    require(&tenant.id, "tenant id")?;
    require(&tenant.owner, "owner")?;
    require(&tenant.display_name, "display name")?;

    let resource_uri = uri::tenant_uri(&tenant.id)?;
    let labels_json = labels_to_json(&tenant.labels)?;
    let timestamp = now();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO tenant (id, owner, display_name, description, labels_json, version, last_modified, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
        params![
            tenant.id,
            tenant.owner,
            tenant.display_name,
            tenant.description,
            labels_json,
            timestamp,
        ],
    )
    .map_err(|e| match Error::from(e) {
        Error::Conflict(_) => Error::conflict(format!("tenant already exists: {}", tenant.id)),
        other => other,
    })?;

    upsert_resource_index(&tx, &resource_uri, EntityKind::Tenant, &tenant.id, &tenant.id)?;

    tx.commit()?;

    tracing::info!(tenant = %tenant.id, "tenant created");
    Ok(Tenant {
        version: 1,
        last_modified: timestamp,
        ..tenant.clone()
    })
}

/// Fetch a tenant by id.
pub fn get_tenant(conn: &Connection, id: &str) -> Result<Tenant> {
    conn.query_row(
        "SELECT id, owner, display_name, description, labels_json, version, last_modified \
         FROM tenant WHERE id = ?1",
        params![id],
        |row| {
            Ok(Tenant {
                id: row.get(0)?,
                owner: row.get(1)?,
                display_name: row.get(2)?,
                description: row.get(3)?,
                labels: labels_from_json(row.get(4)?),
                version: row.get::<_, i64>(5)? as u64,
                last_modified: row.get(6)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| Error::not_found("tenant", id))
}

/// All tenants, newest first; ties broken by id so pagination stays stable.
pub fn list_tenants(conn: &Connection) -> Result<Vec<Tenant>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, display_name, description, labels_json, version, last_modified \
         FROM tenant ORDER BY created_at DESC, id ASC",
    )?;
    let tenants = stmt
        .query_map([], |row| {
            Ok(Tenant {
                id: row.get(0)?,
                owner: row.get(1)?,
                display_name: row.get(2)?,
                description: row.get(3)?,
                labels: labels_from_json(row.get(4)?),
                version: row.get::<_, i64>(5)? as u64,
                last_modified: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tenants)
}

/// Full replace of mutable fields, guarded by the version the caller read.
/// A version mismatch on an existing tenant is a conflict; an unknown id is
/// not-found. Returns the tenant with its bumped version.
pub fn update_tenant(conn: &mut Connection, tenant: &Tenant) -> Result<Tenant> {
    require(&tenant.id, "tenant id")?;
    require(&tenant.owner, "owner")?;
    require(&tenant.display_name, "display name")?;

    let resource_uri = uri::tenant_uri(&tenant.id)?;
    let labels_json = labels_to_json(&tenant.labels)?;
    let timestamp = now();

    let tx = conn.transaction()?;

    let rows = tx.execute(
        "UPDATE tenant \
         SET owner = ?2, display_name = ?3, description = ?4, labels_json = ?5, \
             version = version + 1, last_modified = ?6 \
         WHERE id = ?1 AND version = ?7",
        params![
            tenant.id,
            tenant.owner,
            tenant.display_name,
            tenant.description,
            labels_json,
            timestamp,
            tenant.version as i64,
        ],
    )?;

    if rows == 0 {
        let exists: Option<i64> = tx
            .query_row(
                "SELECT version FROM tenant WHERE id = ?1",
                params![tenant.id],
                |row| row.get(0),
            )
            .optional()?;
        return match exists {
            Some(current) => Err(Error::conflict(format!(
                "tenant {} version mismatch: have {}, caller supplied {}",
                tenant.id, current, tenant.version
            ))),
            None => Err(Error::not_found("tenant", tenant.id.clone())),
        };
    }

    upsert_resource_index(&tx, &resource_uri, EntityKind::Tenant, &tenant.id, &tenant.id)?;

    tx.commit()?;

    Ok(Tenant {
        version: tenant.version + 1,
        last_modified: timestamp,
        ..tenant.clone()
    })
}

/// Delete a tenant, cascading to all owned entities and retiring every
/// resource-index row under the tenant. Returns the ids of entities whose
/// secondary-index entries (embeddings, graph nodes) the synchronizer must
/// now retire.
pub fn delete_tenant(conn: &mut Connection, id: &str) -> Result<Vec<String>> {
    let tx = conn.transaction()?;

    let mut retired: Vec<String> = tx
        .prepare("SELECT entity_id FROM resource_index WHERE tenant_id = ?1")?
        .query_map(params![id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let rows = tx.execute("DELETE FROM tenant WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found("tenant", id));
    }

    tx.execute(
        "DELETE FROM resource_index WHERE tenant_id = ?1",
        params![id],
    )?;

    tx.commit()?;

    if !retired.contains(&id.to_string()) {
        retired.push(id.to_string());
    }
    tracing::info!(tenant = %id, entities = retired.len(), "tenant deleted");
    Ok(retired)
}
