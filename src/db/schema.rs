//! SQL DDL for all synthesis tables.
//!
//! The primary store holds the entity tables (`tenant`, `library`,
//! `notebook` and its dependents, `feature`, `tool_config`, `type_def`) and
//! the `resource_index` lookup table. The secondary indices live in their
//! own tables: `embedding_record` + `embedding_vec` (vec0) for the vector
//! index and `graph_node`/`graph_edge` for the graph index, with
//! `index_journal` as the drift bookkeeping trail. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for the primary store and secondary indices.
const SCHEMA_SQL: &str = r#"
-- Tenants: root of each namespace. Version is bumped on every mutation.
CREATE TABLE IF NOT EXISTS tenant (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    display_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    labels_json TEXT,
    version INTEGER NOT NULL DEFAULT 1 CHECK(version >= 1),
    last_modified TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS library (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL REFERENCES tenant(id) ON DELETE CASCADE,
    owner TEXT NOT NULL,
    display_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    labels_json TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_library_tenant ON library(tenant_id);

CREATE TABLE IF NOT EXISTS notebook (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL REFERENCES tenant(id) ON DELETE CASCADE,
    library_id TEXT NOT NULL REFERENCES library(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft','published','archived')),
    owner TEXT NOT NULL,
    display_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notebook_tenant ON notebook(tenant_id);
CREATE INDEX IF NOT EXISTS idx_notebook_library ON notebook(library_id);

CREATE TABLE IF NOT EXISTS notebook_content (
    notebook_id TEXT PRIMARY KEY REFERENCES notebook(id) ON DELETE CASCADE,
    markdown TEXT NOT NULL DEFAULT ''
);

-- Content blocks form a forest per notebook; ord is unique per sibling
-- group (null parent is its own group). pos preserves the order blocks
-- were supplied in, independent of tree position.
CREATE TABLE IF NOT EXISTS content_block (
    notebook_id TEXT NOT NULL REFERENCES notebook(id) ON DELETE CASCADE,
    uid TEXT NOT NULL,
    parent_uid TEXT,
    content_type TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '',
    ord INTEGER NOT NULL,
    pos INTEGER NOT NULL,
    PRIMARY KEY (notebook_id, uid)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_content_block_sibling_order
    ON content_block(notebook_id, ifnull(parent_uid, ''), ord);

CREATE TABLE IF NOT EXISTS content_block_type (
    notebook_id TEXT NOT NULL,
    uid TEXT NOT NULL,
    type_name TEXT NOT NULL,
    PRIMARY KEY (notebook_id, uid, type_name),
    FOREIGN KEY (notebook_id, uid)
        REFERENCES content_block(notebook_id, uid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS notebook_notification (
    notebook_id TEXT NOT NULL REFERENCES notebook(id) ON DELETE CASCADE,
    pos INTEGER NOT NULL,
    nurl TEXT NOT NULL,
    PRIMARY KEY (notebook_id, pos)
);

CREATE TABLE IF NOT EXISTS feature (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL REFERENCES tenant(id) ON DELETE CASCADE,
    display_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    ttl_seconds INTEGER,
    values_json TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feature_tenant ON feature(tenant_id);

CREATE TABLE IF NOT EXISTS feature_resource (
    feature_id TEXT NOT NULL REFERENCES feature(id) ON DELETE CASCADE,
    pos INTEGER NOT NULL,
    url TEXT NOT NULL,
    PRIMARY KEY (feature_id, pos)
);

CREATE TABLE IF NOT EXISTS feature_notification (
    feature_id TEXT NOT NULL REFERENCES feature(id) ON DELETE CASCADE,
    pos INTEGER NOT NULL,
    nurl TEXT NOT NULL,
    PRIMARY KEY (feature_id, pos)
);

CREATE TABLE IF NOT EXISTS tool_config (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL REFERENCES tenant(id) ON DELETE CASCADE,
    display_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    settings_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tool_config_tenant ON tool_config(tenant_id);

-- Global content-type catalog; not tenant-scoped.
CREATE TABLE IF NOT EXISTS type_def (
    name TEXT PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    renderers_json TEXT,
    editors_json TEXT,
    constraints_json TEXT,
    labels_json TEXT,
    created_at TEXT NOT NULL
);

-- Denormalized URI -> entity lookup, one row per addressable entity.
CREATE TABLE IF NOT EXISTS resource_index (
    uri TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    tenant_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resource_entity ON resource_index(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_resource_tenant ON resource_index(tenant_id);

-- Vector index bookkeeping: embeddings keyed by (entity, model). The
-- vectors themselves live in the vec0 virtual table below.
CREATE TABLE IF NOT EXISTS embedding_record (
    entity_id TEXT NOT NULL,
    model TEXT NOT NULL,
    dim INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (entity_id, model)
);

-- Graph index: typed nodes and directed edges. (from, rel, to) is the
-- natural key; merges update properties instead of duplicating.
CREATE TABLE IF NOT EXISTS graph_node (
    id TEXT PRIMARY KEY,
    node_type TEXT NOT NULL,
    properties_json TEXT
);

CREATE TABLE IF NOT EXISTS graph_edge (
    from_id TEXT NOT NULL,
    rel_type TEXT NOT NULL,
    to_id TEXT NOT NULL,
    properties_json TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (from_id, rel_type, to_id)
);

CREATE INDEX IF NOT EXISTS idx_graph_edge_from ON graph_edge(from_id);
CREATE INDEX IF NOT EXISTS idx_graph_edge_to ON graph_edge(to_id);

-- Drift bookkeeping: every attempted secondary-index mutation lands here.
CREATE TABLE IF NOT EXISTS index_journal (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN
        ('upsert_embedding','delete_embedding','merge_edge','delete_edge','purge','reindex')),
    entity_id TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('applied','failed')),
    details TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_index_journal_status ON index_journal(status);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
/// Keys are `{entity_id}#{model}` so embeddings under different models
/// coexist as distinct rows.
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS embedding_vec USING vec0(
    entity_key TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
