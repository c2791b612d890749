//! Content tree validation and materialization.
//!
//! A notebook's content blocks are stored flat, each row carrying a parent
//! pointer and a sibling order. This module validates the structural
//! invariants (resolvable parents, no cycles, unique sibling order),
//! converts between the flat rows and a tree view, and computes order
//! assignment for appends. Everything here is a pure, deterministic
//! function of its input — storage never enters the picture.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::types::ContentBlock;
use crate::error::{Error, Result};

/// A block with its ordered children, for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub block: ContentBlock,
    pub children: Vec<BlockNode>,
}

/// Fields of a block before it is placed in a tree. `append` fills in the
/// parent pointer and sibling order.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub uid: String,
    pub content_type: String,
    pub data: String,
    pub types: Vec<String>,
}

/// Verify the structural invariants over the full block set of one
/// notebook: uids unique, every non-null parent resolves within the set,
/// parent chains terminate (no cycles), and `order` is unique per sibling
/// group. Violations name the offending block(s); blocks are never
/// reordered or dropped.
pub fn validate(blocks: &[ContentBlock]) -> Result<()> {
    let mut uids: HashSet<&str> = HashSet::with_capacity(blocks.len());
    for block in blocks {
        if !uids.insert(block.uid.as_str()) {
            return Err(Error::structural(format!(
                "duplicate block uid: {}",
                block.uid
            )));
        }
    }

    let parent_of: HashMap<&str, Option<&str>> = blocks
        .iter()
        .map(|b| (b.uid.as_str(), b.parent_uid.as_deref()))
        .collect();

    for block in blocks {
        if let Some(parent) = block.parent_uid.as_deref() {
            if !uids.contains(parent) {
                return Err(Error::structural(format!(
                    "block {} references missing parent {parent}",
                    block.uid
                )));
            }
        }

        // The parent chain must reach a root within |blocks| hops.
        let mut current = block.parent_uid.as_deref();
        let mut hops = 0usize;
        while let Some(uid) = current {
            hops += 1;
            if hops > blocks.len() {
                return Err(Error::structural(format!(
                    "cycle in parent chain at block {}",
                    block.uid
                )));
            }
            current = parent_of.get(uid).copied().flatten();
        }
    }

    let mut sibling_orders: HashMap<(Option<&str>, i64), &str> = HashMap::new();
    for block in blocks {
        let key = (block.parent_uid.as_deref(), block.order);
        if let Some(other) = sibling_orders.insert(key, block.uid.as_str()) {
            return Err(Error::structural(format!(
                "blocks {other} and {} share sibling order {}",
                block.uid, block.order
            )));
        }
    }

    Ok(())
}

/// Build the tree view from flat rows. Validates first; children are
/// ordered by sibling order (unique post-validation, so the ordering is
/// total and deterministic).
pub fn assemble(blocks: &[ContentBlock]) -> Result<Vec<BlockNode>> {
    validate(blocks)?;

    // BTreeMap keyed by order gives sorted children without a second pass.
    let mut children_of: HashMap<Option<&str>, BTreeMap<i64, &ContentBlock>> = HashMap::new();
    for block in blocks {
        children_of
            .entry(block.parent_uid.as_deref())
            .or_default()
            .insert(block.order, block);
    }

    fn build(
        parent: Option<&str>,
        children_of: &HashMap<Option<&str>, BTreeMap<i64, &ContentBlock>>,
    ) -> Vec<BlockNode> {
        children_of
            .get(&parent)
            .map(|siblings| {
                siblings
                    .values()
                    .map(|block| BlockNode {
                        block: (*block).clone(),
                        children: build(Some(block.uid.as_str()), children_of),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    Ok(build(None, &children_of))
}

/// Invert `assemble`: walk the tree depth-first and emit the flat rows.
pub fn flatten(roots: &[BlockNode]) -> Vec<ContentBlock> {
    fn walk(nodes: &[BlockNode], out: &mut Vec<ContentBlock>) {
        for node in nodes {
            out.push(node.block.clone());
            walk(&node.children, out);
        }
    }

    let mut out = Vec::new();
    walk(roots, &mut out);
    out
}

/// Place a new block as the last child of `parent_uid` (or as a new root
/// when `None`), assigning order one past the current maximum sibling
/// order, 0 if there are no siblings. The parent must resolve to a block
/// in the same set.
pub fn append(
    blocks: &[ContentBlock],
    new: NewBlock,
    parent_uid: Option<&str>,
) -> Result<ContentBlock> {
    if blocks.iter().any(|b| b.uid == new.uid) {
        return Err(Error::conflict(format!("block uid already exists: {}", new.uid)));
    }

    if let Some(parent) = parent_uid {
        if !blocks.iter().any(|b| b.uid == parent) {
            return Err(Error::not_found("content block", parent));
        }
    }

    let order = blocks
        .iter()
        .filter(|b| b.parent_uid.as_deref() == parent_uid)
        .map(|b| b.order)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);

    Ok(ContentBlock {
        uid: new.uid,
        parent_uid: parent_uid.map(str::to_string),
        content_type: new.content_type,
        data: new.data,
        order,
        types: new.types,
    })
}
