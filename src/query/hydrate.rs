//! Primary-store hydration for federated query results.
//!
//! Secondary indices can momentarily refer to entities the primary store no
//! longer holds. Hydration preserves the caller's ordering and silently
//! omits ids that don't resolve — logged, never an error.

use rusqlite::Connection;

use crate::catalog::features::get_feature;
use crate::catalog::notebooks::get_notebook;
use crate::catalog::types::{Feature, Notebook};
use crate::error::{Error, Result};

/// Batch-fetch notebook aggregates, preserving input order and omitting
/// unresolvable ids.
pub fn hydrate_notebooks(conn: &Connection, ids: &[String]) -> Result<Vec<Notebook>> {
    let mut notebooks = Vec::with_capacity(ids.len());
    for id in ids {
        match get_notebook(conn, id) {
            Ok(notebook) => notebooks.push(notebook),
            Err(Error::NotFound { .. }) => {
                tracing::warn!(notebook = %id, "index points at missing notebook, omitting");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(notebooks)
}

/// Batch-fetch feature aggregates, preserving input order and omitting
/// unresolvable ids.
pub fn hydrate_features(conn: &Connection, ids: &[String]) -> Result<Vec<Feature>> {
    let mut features = Vec::with_capacity(ids.len());
    for id in ids {
        match get_feature(conn, id) {
            Ok(feature) => features.push(feature),
            Err(Error::NotFound { .. }) => {
                tracing::warn!(feature = %id, "index points at missing feature, omitting");
            }
            Err(other) => return Err(other),
        }
    }
    Ok(features)
}
