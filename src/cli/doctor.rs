//! CLI `doctor` command — run database diagnostics and print a health report.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::SynthesisConfig;
use crate::db::migrations;
use crate::index::sync;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &SynthesisConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `synthesis serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = super::open_from_config(config)
        .context("failed to open database (may be corrupt)")?;

    let schema_version = migrations::get_schema_version(&conn)?;
    let vec_version: String = conn.query_row("SELECT vec_version()", [], |r| r.get(0))?;
    let stored_dim = migrations::get_embedding_dim(&conn)?;
    let pending = sync::pending_drift(&conn)?;

    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |r| r.get(0))?;

    println!("Synthesis Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {schema_version}");
    println!("sqlite-vec:        v{vec_version}");
    println!();
    println!("Vector index:");
    println!(
        "  Stored dim:      {}",
        stored_dim.map(|d| d.to_string()).unwrap_or_else(|| "(not set)".into())
    );
    println!("  Binary dim:      {}", migrations::EMBEDDING_DIM);
    println!();
    println!("Row counts:");
    for (label, table) in [
        ("Tenants", "tenant"),
        ("Libraries", "library"),
        ("Notebooks", "notebook"),
        ("Content blocks", "content_block"),
        ("Features", "feature"),
        ("Resource index", "resource_index"),
        ("Embeddings", "embedding_record"),
        ("Graph edges", "graph_edge"),
    ] {
        println!("  {label:<16} {}", count(&conn, table)?);
    }
    println!();
    if pending.is_empty() {
        println!("Index drift:       none");
    } else {
        println!("Index drift:       {} pending entries", pending.len());
        for entry in &pending {
            println!(
                "  #{} {} {} ({})",
                entry.id, entry.operation, entry.entity_id, entry.created_at
            );
        }
        println!();
        println!("Run `synthesis reindex --sweep` to repair.");
    }
    println!();
    if integrity == "ok" {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({integrity})");
    }

    Ok(())
}

fn count(conn: &Connection, table: &str) -> Result<i64> {
    let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(n)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
