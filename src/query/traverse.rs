//! Bounded relationship traversal over the graph index.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use crate::error::Result;

/// A node reached during traversal, with its hop distance from the start.
#[derive(Debug, Clone, Serialize)]
pub struct TraversedNode {
    pub id: String,
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    pub hops: u32,
}

/// Breadth-first walk of directed edges from `start_id`, visiting each node
/// at most once (cycle-safe) and stopping at `max_hops`. With a relation
/// filter, only edges of the named types are followed. `max_hops` of 0
/// returns just the start node if it exists in the graph, else an empty
/// result — never an error. Neighbors expand in id order, so output order
/// is deterministic: ascending hop distance, then id within a hop.
pub fn traverse_relationships(
    conn: &Connection,
    start_id: &str,
    max_hops: u32,
    rel_filter: Option<&[String]>,
) -> Result<Vec<TraversedNode>> {
    let Some(start) = load_node(conn, start_id, 0)? else {
        return Ok(Vec::new());
    };

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.id.clone());

    let mut result = vec![start];
    let mut queue: VecDeque<(String, u32)> = VecDeque::new();
    queue.push_back((start_id.to_string(), 0));

    while let Some((node_id, hops)) = queue.pop_front() {
        if hops >= max_hops {
            continue;
        }
        for neighbor_id in neighbors(conn, &node_id, rel_filter)? {
            if !visited.insert(neighbor_id.clone()) {
                continue;
            }
            if let Some(node) = load_node(conn, &neighbor_id, hops + 1)? {
                result.push(node);
            }
            queue.push_back((neighbor_id, hops + 1));
        }
    }

    Ok(result)
}

fn load_node(conn: &Connection, id: &str, hops: u32) -> Result<Option<TraversedNode>> {
    let node = conn
        .query_row(
            "SELECT node_type, properties_json FROM graph_node WHERE id = ?1",
            params![id],
            |row| {
                let properties: Option<String> = row.get(1)?;
                Ok(TraversedNode {
                    id: id.to_string(),
                    node_type: row.get(0)?,
                    properties: properties.and_then(|s| serde_json::from_str(&s).ok()),
                    hops,
                })
            },
        )
        .optional()?;
    Ok(node)
}

/// Outgoing neighbor ids in ascending order, optionally restricted to a
/// set of relationship types.
fn neighbors(
    conn: &Connection,
    from_id: &str,
    rel_filter: Option<&[String]>,
) -> Result<Vec<String>> {
    match rel_filter {
        None => {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT to_id FROM graph_edge WHERE from_id = ?1 ORDER BY to_id",
            )?;
            let ids = stmt
                .query_map(params![from_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        }
        Some(types) if types.is_empty() => Ok(Vec::new()),
        Some(types) => {
            // Build a parameterized IN clause: ?2, ?3, ...
            let placeholders: Vec<String> =
                (2..2 + types.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT DISTINCT to_id FROM graph_edge \
                 WHERE from_id = ?1 AND rel_type IN ({}) ORDER BY to_id",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;

            let mut sql_params: Vec<&dyn rusqlite::types::ToSql> =
                vec![&from_id as &dyn rusqlite::types::ToSql];
            for rel_type in types {
                sql_params.push(rel_type as &dyn rusqlite::types::ToSql);
            }

            let ids = stmt
                .query_map(sql_params.as_slice(), |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        }
    }
}
