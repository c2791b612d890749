//! CLI `reindex` command — repair resource-index and secondary-index drift
//! from primary-store truth.

use anyhow::{bail, Context, Result};

use crate::config::SynthesisConfig;
use crate::index::sync;

/// Reindex one entity by id.
pub fn reindex_entity(config: &SynthesisConfig, entity_id: &str) -> Result<()> {
    let mut conn = super::open_from_config(config)?;
    let outcome = sync::reindex(&mut conn, entity_id)
        .with_context(|| format!("reindex failed for {entity_id}"))?;

    println!("{entity_id}: {outcome:?}");
    Ok(())
}

/// Sweep the drift journal: reindex every entity with a failed entry.
pub fn reindex_sweep(config: &SynthesisConfig) -> Result<()> {
    let mut conn = super::open_from_config(config)?;

    let pending = sync::pending_drift(&conn)?;
    if pending.is_empty() {
        println!("No pending drift.");
        return Ok(());
    }

    println!("Repairing {} drift entries...", pending.len());
    let mut failures = 0usize;
    for entry in pending {
        match sync::reindex(&mut conn, &entry.entity_id) {
            Ok(outcome) => println!("  {} {:?}", entry.entity_id, outcome),
            Err(e) => {
                eprintln!("  {} failed: {e}", entry.entity_id);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} entities could not be repaired");
    }
    println!("Done.");
    Ok(())
}
