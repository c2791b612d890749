//! Tool configuration persistence.
//!
//! Settings are a closed tagged-variant payload serialized to JSON; parsing
//! a stored row back is total because unknown kinds were already folded
//! into the opaque variant at write time.

use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::types::{ToolConfig, ToolSettings};
use crate::catalog::{delete_resource_index, now, require, upsert_resource_index};
use crate::error::{Error, Result};
use crate::uri::{self, EntityKind};

pub fn create_tool_config(conn: &mut Connection, tool: &ToolConfig) -> Result<()> {
    require(&tool.id, "tool id")?;
    require(&tool.tenant_id, "tenant id")?;
    require(&tool.display_name, "display name")?;

    let resource_uri = uri::tool_uri(&tool.tenant_id, &tool.id)?;
    let settings_json = serde_json::to_string(&tool.settings)
        .map_err(|e| Error::validation(format!("settings not serializable: {e}")))?;
    let timestamp = now();

    let tx = conn.transaction()?;

    let tenant_exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM tenant WHERE id = ?1",
            params![tool.tenant_id],
            |row| row.get(0),
        )
        .optional()?;
    if tenant_exists.is_none() {
        return Err(Error::not_found("tenant", tool.tenant_id.clone()));
    }

    tx.execute(
        "INSERT INTO tool_config (id, tenant_id, display_name, description, settings_json, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tool.id,
            tool.tenant_id,
            tool.display_name,
            tool.description,
            settings_json,
            timestamp,
        ],
    )
    .map_err(|e| match Error::from(e) {
        Error::Conflict(_) => Error::conflict(format!("tool config already exists: {}", tool.id)),
        other => other,
    })?;

    upsert_resource_index(&tx, &resource_uri, EntityKind::Tool, &tool.id, &tool.tenant_id)?;

    tx.commit()?;
    Ok(())
}

pub fn get_tool_config(conn: &Connection, id: &str) -> Result<ToolConfig> {
    let row = conn
        .query_row(
            "SELECT id, tenant_id, display_name, description, settings_json \
             FROM tool_config WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| Error::not_found("tool config", id))?;

    let (id, tenant_id, display_name, description, settings_json) = row;
    let settings: ToolSettings = serde_json::from_str(&settings_json)
        .map_err(|e| Error::validation(format!("stored settings unreadable for {id}: {e}")))?;

    Ok(ToolConfig {
        tenant_id,
        display_name,
        description,
        settings,
        id,
    })
}

pub fn list_tool_configs_by_tenant(conn: &Connection, tenant_id: &str) -> Result<Vec<ToolConfig>> {
    let ids: Vec<String> = conn
        .prepare(
            "SELECT id FROM tool_config WHERE tenant_id = ?1 ORDER BY created_at DESC, id ASC",
        )?
        .query_map(params![tenant_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    ids.iter().map(|id| get_tool_config(conn, id)).collect()
}

pub fn delete_tool_config(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let rows = tx.execute("DELETE FROM tool_config WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found("tool config", id));
    }

    delete_resource_index(&tx, EntityKind::Tool, id)?;

    tx.commit()?;
    Ok(())
}
