#![allow(dead_code)]

use rusqlite::Connection;
use std::collections::BTreeMap;
use synthesis::catalog::types::{
    ContentBlock, Library, Notebook, NotebookContents, NotebookData, NotebookStatus, Notification,
    Tenant,
};
use synthesis::catalog::{libraries, tenants};
use synthesis::db;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Generate a deterministic 384-dim embedding with a unit spike at position
/// `seed`. Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: u8) -> Vec<f32> {
    let mut v = vec![0.0f32; 384];
    v[seed as usize % 384] = 1.0;
    v
}

/// Generate an embedding similar to `base` with a small perturbation,
/// L2-normalized so similarity scores stay meaningful.
pub fn similar_embedding(base: &[f32]) -> Vec<f32> {
    let mut v = base.to_vec();
    for i in 0..5 {
        v[(i * 37) % 384] += 0.05;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

pub fn sample_tenant(id: &str) -> Tenant {
    Tenant {
        id: id.into(),
        owner: "owner@example.com".into(),
        display_name: format!("Tenant {id}"),
        description: "a test tenant".into(),
        labels: BTreeMap::new(),
        version: 0,
        last_modified: String::new(),
    }
}

pub fn sample_library(tenant_id: &str, id: &str) -> Library {
    Library {
        tenant_id: tenant_id.into(),
        id: id.into(),
        owner: "owner@example.com".into(),
        display_name: format!("Library {id}"),
        description: String::new(),
        labels: BTreeMap::new(),
    }
}

pub fn sample_notebook(tenant_id: &str, library_id: &str, id: &str) -> Notebook {
    Notebook {
        tenant_id: tenant_id.into(),
        id: id.into(),
        library_id: library_id.into(),
        status: NotebookStatus::Draft,
        owner: "owner@example.com".into(),
        display_name: format!("Notebook {id}"),
        description: String::new(),
        contents: NotebookContents {
            data: NotebookData {
                markdown: "# Title".into(),
            },
            content_blocks: Vec::new(),
        },
        notifications: Vec::new(),
    }
}

pub fn block(uid: &str, parent: Option<&str>, order: i64) -> ContentBlock {
    ContentBlock {
        uid: uid.into(),
        parent_uid: parent.map(str::to_string),
        content_type: "text/markdown".into(),
        data: format!("content of {uid}"),
        order,
        types: vec![],
    }
}

pub fn notification(url: &str) -> Notification {
    Notification { url: url.into() }
}

/// Create tenant `t1` and library `l1` under it — the usual fixture.
pub fn setup_tenant_and_library(conn: &mut Connection) {
    tenants::create_tenant(conn, &sample_tenant("t1")).unwrap();
    libraries::create_library(conn, &sample_library("t1", "l1")).unwrap();
}
