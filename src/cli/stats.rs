//! CLI `stats` command — row counts per entity and index.

use anyhow::Result;

use crate::config::SynthesisConfig;

pub fn stats(config: &SynthesisConfig) -> Result<()> {
    let conn = super::open_from_config(config)?;

    println!("Synthesis Store Statistics");
    println!("==========================");
    for (label, table) in [
        ("tenants", "tenant"),
        ("libraries", "library"),
        ("notebooks", "notebook"),
        ("content blocks", "content_block"),
        ("features", "feature"),
        ("tool configs", "tool_config"),
        ("type defs", "type_def"),
        ("resource index rows", "resource_index"),
        ("embedding records", "embedding_record"),
        ("graph nodes", "graph_node"),
        ("graph edges", "graph_edge"),
        ("journal entries", "index_journal"),
    ] {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
        println!("{label:<22} {n}");
    }

    Ok(())
}
