//! Resource & index consistency layer for hierarchical notebooks.
//!
//! Synthesis stores notebooks organized under tenants and libraries and
//! keeps three heterogeneous indices consistent for every entity: the
//! primary relational record, a vector embedding for semantic similarity,
//! and a graph representation for relationship traversal.
//!
//! # Architecture
//!
//! - **Primary store**: SQLite in WAL mode; every write is one transaction,
//!   so partial entities are never visible
//! - **Vector index**: [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   `vec0` table keyed by `(entity, model)`
//! - **Graph index**: typed node/edge tables with merge-by-natural-key
//!   semantics and bounded BFS traversal
//! - **Consistency**: secondary updates run after the primary commit,
//!   at-least-once, with a journal that makes drift visible and a
//!   `reindex` repair path that heals it from primary-store truth
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite initialization, schema, and migrations
//! - [`error`] — The six-category error taxonomy
//! - [`uri`] — Canonical `synthesis://` URIs for every addressable entity
//! - [`catalog`] — Entity repositories and the content tree manager
//! - [`index`] — Secondary index synchronizer and drift repair
//! - [`query`] — Similarity search, graph traversal, and hydration

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod query;
pub mod uri;
