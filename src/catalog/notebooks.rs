//! Notebook persistence — the full aggregate: notebook row, markdown body,
//! content-block forest, and notification targets.
//!
//! [`create_notebook`] and [`update_notebook`] validate the block forest
//! before touching the store and run the whole write in one transaction, so
//! a partial notebook is never visible. [`append_block`] serializes
//! concurrent appends to one notebook through an immediate transaction so
//! sibling order assignment never collides.

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::catalog::tree::{self, NewBlock};
use crate::catalog::types::{
    ContentBlock, Notebook, NotebookContents, NotebookData, NotebookStatus, Notification,
};
use crate::catalog::{delete_resource_index, now, require, upsert_resource_index};
use crate::error::{Error, Result};
use crate::uri::{self, EntityKind};

/// Create a notebook with its content tree and notifications in one
/// transaction. The library must exist and belong to the notebook's tenant;
/// the block forest must validate.
pub fn create_notebook(conn: &mut Connection, notebook: &Notebook) -> Result<()> {
    require(&notebook.id, "notebook id")?;
    require(&notebook.tenant_id, "tenant id")?;
    require(&notebook.library_id, "library id")?;
    require(&notebook.owner, "owner")?;
    require(&notebook.display_name, "display name")?;
    tree::validate(&notebook.contents.content_blocks)?;

    let resource_uri = uri::notebook_uri(&notebook.tenant_id, &notebook.id)?;
    let timestamp = now();

    let tx = conn.transaction()?;

    let library_tenant: Option<String> = tx
        .query_row(
            "SELECT tenant_id FROM library WHERE id = ?1",
            params![notebook.library_id],
            |row| row.get(0),
        )
        .optional()?;
    match library_tenant {
        None => return Err(Error::not_found("library", notebook.library_id.clone())),
        Some(owner) if owner != notebook.tenant_id => {
            return Err(Error::validation(format!(
                "library {} belongs to tenant {owner}, not {}",
                notebook.library_id, notebook.tenant_id
            )));
        }
        Some(_) => {}
    }

    tx.execute(
        "INSERT INTO notebook (id, tenant_id, library_id, status, owner, display_name, description, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            notebook.id,
            notebook.tenant_id,
            notebook.library_id,
            notebook.status.as_str(),
            notebook.owner,
            notebook.display_name,
            notebook.description,
            timestamp,
        ],
    )
    .map_err(|e| match Error::from(e) {
        Error::Conflict(_) => Error::conflict(format!("notebook already exists: {}", notebook.id)),
        other => other,
    })?;

    tx.execute(
        "INSERT INTO notebook_content (notebook_id, markdown) VALUES (?1, ?2)",
        params![notebook.id, notebook.contents.data.markdown],
    )?;

    insert_blocks(&tx, &notebook.id, &notebook.contents.content_blocks)?;
    insert_notifications(&tx, &notebook.id, &notebook.notifications)?;

    upsert_resource_index(
        &tx,
        &resource_uri,
        EntityKind::Notebook,
        &notebook.id,
        &notebook.tenant_id,
    )?;

    tx.commit()?;

    tracing::info!(
        notebook = %notebook.id,
        library = %notebook.library_id,
        blocks = notebook.contents.content_blocks.len(),
        "notebook created"
    );
    Ok(())
}

/// Fetch the full notebook aggregate: row, markdown, blocks (in the order
/// they were supplied), and notifications.
pub fn get_notebook(conn: &Connection, id: &str) -> Result<Notebook> {
    let header = conn
        .query_row(
            "SELECT id, tenant_id, library_id, status, owner, display_name, description \
             FROM notebook WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| Error::not_found("notebook", id))?;

    let (id, tenant_id, library_id, status, owner, display_name, description) = header;
    let status: NotebookStatus = status.parse()?;

    let markdown: String = conn
        .query_row(
            "SELECT markdown FROM notebook_content WHERE notebook_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or_default();

    Ok(Notebook {
        tenant_id,
        library_id,
        status,
        owner,
        display_name,
        description,
        contents: NotebookContents {
            data: NotebookData { markdown },
            content_blocks: fetch_blocks(conn, &id)?,
        },
        notifications: fetch_notifications(conn, &id)?,
        id,
    })
}

/// Notebook headers in one library, newest first, id tie-break. Contents
/// are loaded by [`get_notebook`], not here.
pub fn list_notebooks_by_library(conn: &Connection, library_id: &str) -> Result<Vec<Notebook>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, library_id, status, owner, display_name, description \
         FROM notebook WHERE library_id = ?1 ORDER BY created_at DESC, id ASC",
    )?;
    let rows = stmt
        .query_map(params![library_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut notebooks = Vec::with_capacity(rows.len());
    for (id, tenant_id, library_id, status, owner, display_name, description) in rows {
        notebooks.push(Notebook {
            id,
            tenant_id,
            library_id,
            status: status.parse()?,
            owner,
            display_name,
            description,
            contents: NotebookContents::default(),
            notifications: Vec::new(),
        });
    }
    Ok(notebooks)
}

/// Full replace of mutable fields: status, owner, names, markdown, the
/// block forest, and notifications, in one transaction.
pub fn update_notebook(conn: &mut Connection, notebook: &Notebook) -> Result<()> {
    require(&notebook.id, "notebook id")?;
    require(&notebook.owner, "owner")?;
    require(&notebook.display_name, "display name")?;
    tree::validate(&notebook.contents.content_blocks)?;

    let resource_uri = uri::notebook_uri(&notebook.tenant_id, &notebook.id)?;

    let tx = conn.transaction()?;

    let rows = tx.execute(
        "UPDATE notebook SET status = ?2, owner = ?3, display_name = ?4, description = ?5 \
         WHERE id = ?1",
        params![
            notebook.id,
            notebook.status.as_str(),
            notebook.owner,
            notebook.display_name,
            notebook.description,
        ],
    )?;
    if rows == 0 {
        return Err(Error::not_found("notebook", notebook.id.clone()));
    }

    tx.execute(
        "INSERT INTO notebook_content (notebook_id, markdown) VALUES (?1, ?2) \
         ON CONFLICT (notebook_id) DO UPDATE SET markdown = excluded.markdown",
        params![notebook.id, notebook.contents.data.markdown],
    )?;

    tx.execute(
        "DELETE FROM content_block WHERE notebook_id = ?1",
        params![notebook.id],
    )?;
    insert_blocks(&tx, &notebook.id, &notebook.contents.content_blocks)?;

    tx.execute(
        "DELETE FROM notebook_notification WHERE notebook_id = ?1",
        params![notebook.id],
    )?;
    insert_notifications(&tx, &notebook.id, &notebook.notifications)?;

    upsert_resource_index(
        &tx,
        &resource_uri,
        EntityKind::Notebook,
        &notebook.id,
        &notebook.tenant_id,
    )?;

    tx.commit()?;
    Ok(())
}

/// Delete a notebook and its dependents, retiring the resource-index row.
pub fn delete_notebook(conn: &mut Connection, id: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let rows = tx.execute("DELETE FROM notebook WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::not_found("notebook", id));
    }

    delete_resource_index(&tx, EntityKind::Notebook, id)?;

    tx.commit()?;
    tracing::info!(notebook = %id, "notebook deleted");
    Ok(())
}

/// Append a block as the last child of `parent_uid` (or as a new root).
///
/// Runs in an immediate transaction: concurrent appends to the same store
/// serialize, so two callers can never claim the same sibling order. The
/// assigned uid is a v7 UUID.
pub fn append_block(
    conn: &mut Connection,
    notebook_id: &str,
    content_type: &str,
    data: &str,
    types: &[String],
    parent_uid: Option<&str>,
) -> Result<ContentBlock> {
    require(notebook_id, "notebook id")?;
    require(content_type, "content type")?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exists: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM notebook WHERE id = ?1",
            params![notebook_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(Error::not_found("notebook", notebook_id));
    }

    let existing = fetch_blocks(&tx, notebook_id)?;

    let block = tree::append(
        &existing,
        NewBlock {
            uid: uuid::Uuid::now_v7().to_string(),
            content_type: content_type.to_string(),
            data: data.to_string(),
            types: types.to_vec(),
        },
        parent_uid,
    )?;

    let next_pos: i64 = tx.query_row(
        "SELECT ifnull(MAX(pos), -1) + 1 FROM content_block WHERE notebook_id = ?1",
        params![notebook_id],
        |row| row.get(0),
    )?;

    insert_block(&tx, notebook_id, &block, next_pos)?;

    tx.commit()?;

    tracing::debug!(
        notebook = %notebook_id,
        uid = %block.uid,
        order = block.order,
        "block appended"
    );
    Ok(block)
}

// ── Row helpers ───────────────────────────────────────────────────────────────

fn insert_blocks(tx: &Transaction, notebook_id: &str, blocks: &[ContentBlock]) -> Result<()> {
    for (pos, block) in blocks.iter().enumerate() {
        insert_block(tx, notebook_id, block, pos as i64)?;
    }
    Ok(())
}

fn insert_block(
    tx: &Transaction,
    notebook_id: &str,
    block: &ContentBlock,
    pos: i64,
) -> Result<()> {
    tx.execute(
        "INSERT INTO content_block (notebook_id, uid, parent_uid, content_type, data, ord, pos) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            notebook_id,
            block.uid,
            block.parent_uid,
            block.content_type,
            block.data,
            block.order,
            pos,
        ],
    )?;
    for type_name in &block.types {
        tx.execute(
            "INSERT INTO content_block_type (notebook_id, uid, type_name) VALUES (?1, ?2, ?3)",
            params![notebook_id, block.uid, type_name],
        )?;
    }
    Ok(())
}

fn insert_notifications(
    tx: &Transaction,
    notebook_id: &str,
    notifications: &[Notification],
) -> Result<()> {
    for (pos, notification) in notifications.iter().enumerate() {
        tx.execute(
            "INSERT INTO notebook_notification (notebook_id, pos, nurl) VALUES (?1, ?2, ?3)",
            params![notebook_id, pos as i64, notification.url],
        )?;
    }
    Ok(())
}

fn fetch_blocks(conn: &Connection, notebook_id: &str) -> Result<Vec<ContentBlock>> {
    let mut stmt = conn.prepare(
        "SELECT uid, parent_uid, content_type, data, ord \
         FROM content_block WHERE notebook_id = ?1 ORDER BY pos",
    )?;
    let mut blocks = stmt
        .query_map(params![notebook_id], |row| {
            Ok(ContentBlock {
                uid: row.get(0)?,
                parent_uid: row.get(1)?,
                content_type: row.get(2)?,
                data: row.get(3)?,
                order: row.get(4)?,
                types: Vec::new(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut type_stmt = conn.prepare(
        "SELECT type_name FROM content_block_type \
         WHERE notebook_id = ?1 AND uid = ?2 ORDER BY type_name",
    )?;
    for block in &mut blocks {
        block.types = type_stmt
            .query_map(params![notebook_id, block.uid], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
    }

    Ok(blocks)
}

fn fetch_notifications(conn: &Connection, notebook_id: &str) -> Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT nurl FROM notebook_notification WHERE notebook_id = ?1 ORDER BY pos",
    )?;
    let notifications = stmt
        .query_map(params![notebook_id], |row| {
            Ok(Notification { url: row.get(0)? })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(notifications)
}
