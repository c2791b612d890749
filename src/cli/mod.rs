pub mod doctor;
pub mod reindex;
pub mod stats;

use anyhow::Result;
use rusqlite::Connection;
use std::time::Duration;

use crate::config::SynthesisConfig;
use crate::db;

/// Open the configured database for an admin command.
pub fn open_from_config(config: &SynthesisConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    let busy_timeout = Duration::from_millis(config.storage.busy_timeout_ms);
    db::open_database(db_path, busy_timeout)
}
