//! Read-side federation: similarity ranking over the vector index, bounded
//! traversal over the graph index, and primary-store hydration. Reads never
//! fail because an index drifted — they degrade by omitting what no longer
//! resolves.

pub mod hydrate;
pub mod search;
pub mod traverse;
