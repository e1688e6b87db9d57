//! Block splitting.
//!
//! Removing edges from a block can disconnect it. [`split`] recomputes the
//! components over the remaining valid edges; [`split_block`] applies the
//! result to an event.

use log::debug;
use papas_core::{
    Block, Category, EdgeKey, Error, Event, Graph, Identifier, IdentifierRegistry, Result, Subtype,
};
use std::collections::BTreeSet;

/// Splits `block` after removing the edges named by `remove`.
///
/// Every output block gets a fresh identifier and keeps the block's
/// remaining edges among its members. The union of the outputs equals the
/// input members. Fails if an edge key does not belong to the block.
pub fn split(block: &Block, remove: &[EdgeKey], registry: &IdentifierRegistry) -> Result<Vec<Block>> {
    let removed: BTreeSet<EdgeKey> = remove.iter().copied().collect();
    for &key in &removed {
        if block.edge(key).is_none() {
            return Err(Error::EdgeNotInBlock {
                block: block.id(),
                edge: key,
            });
        }
    }

    let mut reduced = Graph::connectivity();
    for &id in block.element_ids() {
        reduced.add_node(id);
    }
    for edge in block.linked_edges() {
        let key = edge.key();
        if !removed.contains(&key) {
            reduced.link(key.first(), key.second())?;
        }
    }

    let components = reduced.connected_components();
    let covered: usize = components.iter().map(BTreeSet::len).sum();
    let union: BTreeSet<Identifier> = components.iter().flatten().copied().collect();
    if covered != block.len() || union.iter().ne(block.element_ids().iter()) {
        return Err(Error::SplitInvariant(block.id()));
    }

    let mut blocks = Vec::with_capacity(components.len());
    for component in components {
        let id = registry.make_id(Category::Block, Subtype::Reconstructed)?;
        let edges = block
            .edges()
            .iter()
            .filter(|edge| !removed.contains(&edge.key()))
            .copied();
        blocks.push(Block::new(id, component, edges));
    }
    Ok(blocks)
}

/// Splits a stored block in place.
///
/// The original block is deactivated and becomes the provenance parent of
/// each new block; elements are linked to their new block as well. Removed
/// edges are also dropped from the event's connectivity graph. Returns the
/// new block identifiers.
pub fn split_block(
    event: &mut Event,
    block_id: Identifier,
    remove: &[EdgeKey],
    registry: &IdentifierRegistry,
) -> Result<Vec<Identifier>> {
    split_block_with(event, block_id, remove, registry, true)
}

/// Like [`split_block`], with element to block provenance links recorded
/// only when `record_element_history` is set, matching
/// [`BlockBuilderConfig::record_block_history`](crate::BlockBuilderConfig).
///
/// The original to new block links are always recorded.
pub fn split_block_with(
    event: &mut Event,
    block_id: Identifier,
    remove: &[EdgeKey],
    registry: &IdentifierRegistry,
    record_element_history: bool,
) -> Result<Vec<Identifier>> {
    let block = event
        .blocks
        .get(&block_id)
        .ok_or(Error::UnknownIdentifier(block_id))?;
    if !block.is_active() {
        return Err(Error::InactiveBlock(block_id));
    }

    let pieces = split(block, remove, registry)?;
    debug!(
        "split block {block_id} ({}) into {} blocks",
        block.signature(),
        pieces.len()
    );

    for key in remove {
        if event.connectivity.contains(key.first()) && event.connectivity.contains(key.second()) {
            event.connectivity.unlink(key.first(), key.second())?;
        }
    }

    let mut ids = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let id = piece.id();
        let members = piece.element_ids().to_vec();
        event.add_block(piece)?;
        event.add_history_link(block_id, id)?;
        if record_element_history {
            for member in members {
                event.add_history_link(member, id)?;
            }
        }
        ids.push(id);
    }

    if let Some(block) = event.blocks.get_mut(&block_id) {
        block.deactivate();
    }
    Ok(ids)
}

/// Pure-function entry point, for callers that prefer a named type.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSplitter;

impl BlockSplitter {
    /// See [`split`].
    pub fn split(
        block: &Block,
        remove: &[EdgeKey],
        registry: &IdentifierRegistry,
    ) -> Result<Vec<Block>> {
        split(block, remove, registry)
    }
}
