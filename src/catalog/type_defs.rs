//! Global content-type catalog. Not tenant-scoped; resource-index rows for
//! type definitions carry an empty tenant id.

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::types::{Constraint, Editor, Renderer, TypeDef};
use crate::catalog::{
    delete_resource_index, labels_from_json, labels_to_json, now, require, upsert_resource_index,
};
use crate::error::{Error, Result};
use crate::uri::{self, EntityKind};

fn components_to_json<T: serde::Serialize>(items: &[T], what: &str) -> Result<Option<String>> {
    if items.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(items)
        .map(Some)
        .map_err(|e| Error::validation(format!("{what} not serializable: {e}")))
}

fn components_from_json<T: serde::de::DeserializeOwned>(json: Option<String>) -> Vec<T> {
    json.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn create_type_def(conn: &mut Connection, type_def: &TypeDef) -> Result<()> {
    require(&type_def.name, "type name")?;

    let resource_uri = uri::type_uri(&type_def.name)?;
    let timestamp = now();

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO type_def (name, description, renderers_json, editors_json, constraints_json, labels_json, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            type_def.name,
            type_def.description,
            components_to_json(&type_def.renderers, "renderers")?,
            components_to_json(&type_def.editors, "editors")?,
            components_to_json(&type_def.constraints, "constraints")?,
            labels_to_json(&type_def.labels)?,
            timestamp,
        ],
    )
    .map_err(|e| match Error::from(e) {
        Error::Conflict(_) => {
            Error::conflict(format!("type def already exists: {}", type_def.name))
        }
        other => other,
    })?;

    // The global catalog has no owning tenant.
    upsert_resource_index(&tx, &resource_uri, EntityKind::TypeDef, &type_def.name, "")?;

    tx.commit()?;
    Ok(())
}

pub fn get_type_def(conn: &Connection, name: &str) -> Result<TypeDef> {
    conn.query_row(
        "SELECT name, description, renderers_json, editors_json, constraints_json, labels_json \
         FROM type_def WHERE name = ?1",
        params![name],
        |row| {
            Ok(TypeDef {
                name: row.get(0)?,
                description: row.get(1)?,
                renderers: components_from_json::<Renderer>(row.get(2)?),
                editors: components_from_json::<Editor>(row.get(3)?),
                constraints: components_from_json::<Constraint>(row.get(4)?),
                labels: labels_from_json(row.get(5)?),
            })
        },
    )
    .optional()?
    .ok_or_else(|| Error::not_found("type def", name))
}

pub fn list_type_defs(conn: &Connection) -> Result<Vec<TypeDef>> {
    let names: Vec<String> = conn
        .prepare("SELECT name FROM type_def ORDER BY created_at DESC, name ASC")?
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    names.iter().map(|name| get_type_def(conn, name)).collect()
}

pub fn delete_type_def(conn: &mut Connection, name: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let rows = tx.execute("DELETE FROM type_def WHERE name = ?1", params![name])?;
    if rows == 0 {
        return Err(Error::not_found("type def", name));
    }

    delete_resource_index(&tx, EntityKind::TypeDef, name)?;

    tx.commit()?;
    Ok(())
}
