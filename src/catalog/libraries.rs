//! Library persistence.

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::types::Library;
use crate::catalog::{
    delete_resource_index, labels_from_json, labels_to_json, now, require, upsert_resource_index,
};
use crate::error::{Error, Result};
use crate::uri::{self, EntityKind};

/// Create a library under an existing tenant.
pub fn create_library(conn: &mut Connection, library: &Library) -> Result<()> {
    require(&library.id, "library id")?;
    require(&library.tenant_id, "tenant id")?;
    require(&library.owner, "owner")?;
    require(&library.display_name, "display name")?;

    let resource_uri = uri::library_uri(&library.tenant_id, &library.id)?;
    let labels_json = labels_to_json(&library.labels)?;
    let timestamp = now();

    let tx = conn.transaction()?;

    let tenant_exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM tenant WHERE id = ?1",
            params![library.tenant_id],
            |row| row.get(0),
        )
        .optional()?;
    if tenant_exists.is_none() {
        return Err(Error::not_found("tenant", library.tenant_id.clone()));
    }

    tx.execute(
        "INSERT INTO library (id, tenant_id, owner, display_name, description, labels_json, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            library.id,
            library.tenant_id,
            library.owner,
            library.display_name,
            library.description,
            labels_json,
            timestamp,
        ],
    )
    .map_err(|e| match Error::from(e) {
        Error::Conflict(_) => Error::conflict(format!("library already exists: {}", library.id)),
        other => other,
    })?;

    upsert_resource_index(
        &tx,
        &resource_uri,
        EntityKind::Library,
        &library.id,
        &library.tenant_id,
    )?;

    tx.commit()?;

    tracing::info!(library = %library.id, tenant = %library.tenant_id, "library created");
    Ok(())
}

/// Fetch a library by id.
pub fn get_library(conn: &Connection, id: &str) -> Result<Library> {
    conn.query_row(
        "SELECT id, tenant_id, owner, display_name, description, labels_json \
         FROM library WHERE id = ?1",
        params![id],
        |row| {
            Ok(Library {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                owner: row.get(2)?,
                display_name: row.get(3)?,
                description: row.get(4)?,
                labels: labels_from_json(row.get(5)?),
            })
        },
    )
    .optional()?
    .ok_or_else(|| Error::not_found("library", id))
}

/// Libraries under one tenant, newest first, id tie-break.
pub fn list_libraries_by_tenant(conn: &Connection, tenant_id: &str) -> Result<Vec<Library>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, owner, display_name, description, labels_json \
         FROM library WHERE tenant_id = ?1 ORDER BY created_at DESC, id ASC",
    )?;
    let libraries = stmt
        .query_map(params![tenant_id], |row| {
            Ok(Library {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                owner: row.get(2)?,
                display_name: row.get(3)?,
                description: row.get(4)?,
                labels: labels_from_json(row.get(5)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(libraries)
}

/// Full replace of mutable fields.
pub fn update_library(conn: &mut Connection, library: &Library) -> Result<()> {
    require(&library.id, "library id")?;
    require(&library.owner, "owner")?;
    require(&library.display_name, "display name")?;

    let resource_uri = uri::library_uri(&library.tenant_id, &library.id)?;
    let labels_json = labels_to_json(&library.labels)?;

    let tx = conn.transaction()?;

    let rows = tx.execute(
        "UPDATE library SET owner = ?2, display_name = ?3, description = ?4, labels_json = ?5 \
         WHERE id = ?1",
        params![
            library.id,
            library.owner,
            library.display_name,
            library.description,
            labels_json,
        ],
    )?;
    if rows == 0 {
        return Err(Error::not_found("library", library.id.clone()));
    }

    upsert_resource_index(
        &tx,
        &resource_uri,
        EntityKind::Library,
        &library.id,
        &library.tenant_id,
    )?;

    tx.commit()?;
    Ok(())
}

/// Delete a library, cascading to its notebooks. Returns the ids of
/// entities whose secondary-index entries must be retired.
pub fn delete_library(conn: &mut Connection, id: &str) -> Result<Vec<String>> {
    let tx = conn.transaction()?;

    let notebook_ids: Vec<String> = tx
        .prepare("SELECT id FROM notebook WHERE library_id = ?1")?
        .query_map(params![id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let rows = tx.execute("DELETE FROM library WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found("library", id));
    }

    delete_resource_index(&tx, EntityKind::Library, id)?;
    for notebook_id in &notebook_ids {
        delete_resource_index(&tx, EntityKind::Notebook, notebook_id)?;
    }

    tx.commit()?;

    let mut retired = notebook_ids;
    retired.push(id.to_string());
    Ok(retired)
}
