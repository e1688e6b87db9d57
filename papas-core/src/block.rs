//! Blocks: maximal groups of elements connected by valid edges.

use crate::edge::{Edge, EdgeKey};
use crate::identifier::{Category, Identifier};
use std::fmt::Write as _;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-category element counts of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockCounts {
    /// Number of ecal clusters.
    pub ecal: usize,
    /// Number of hcal clusters.
    pub hcal: usize,
    /// Number of tracks.
    pub tracks: usize,
}

/// A connected component of the connectivity graph.
///
/// Immutable once built; splitting produces new blocks and deactivates the
/// original.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    id: Identifier,
    element_ids: Vec<Identifier>,
    /// Sorted by key.
    edges: Vec<Edge>,
    counts: BlockCounts,
    is_active: bool,
}

impl Block {
    /// Creates a block from its members and the edges evaluated among them.
    ///
    /// Members are sorted and de-duplicated. Edges with an endpoint outside
    /// the member set are discarded.
    pub fn new<I, E>(id: Identifier, elements: I, edges: E) -> Self
    where
        I: IntoIterator<Item = Identifier>,
        E: IntoIterator<Item = Edge>,
    {
        let mut element_ids: Vec<Identifier> = elements.into_iter().collect();
        element_ids.sort_unstable();
        element_ids.dedup();

        let mut edges: Vec<Edge> = edges
            .into_iter()
            .filter(|edge| {
                let key = edge.key();
                element_ids.binary_search(&key.first()).is_ok()
                    && element_ids.binary_search(&key.second()).is_ok()
            })
            .collect();
        edges.sort_by_key(Edge::key);
        edges.dedup_by_key(|edge| edge.key());

        let mut counts = BlockCounts::default();
        for element in &element_ids {
            match element.category() {
                Category::EcalCluster => counts.ecal += 1,
                Category::HcalCluster => counts.hcal += 1,
                Category::Track => counts.tracks += 1,
                Category::Particle | Category::Block => {}
            }
        }

        Self {
            id,
            element_ids,
            edges,
            counts,
            is_active: true,
        }
    }

    /// Block identifier.
    #[must_use]
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Member identifiers in ascending order.
    #[must_use]
    pub fn element_ids(&self) -> &[Identifier] {
        &self.element_ids
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.element_ids.len()
    }

    /// True if the block has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element_ids.is_empty()
    }

    /// True if `id` is a member.
    #[must_use]
    pub fn contains(&self, id: Identifier) -> bool {
        self.element_ids.binary_search(&id).is_ok()
    }

    /// All evaluated edges between members, valid or not.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Looks up the edge for `key`.
    #[must_use]
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges
            .binary_search_by_key(&key, Edge::key)
            .ok()
            .map(|index| &self.edges[index])
    }

    /// Edges that connect members in the connectivity graph.
    pub fn linked_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|edge| edge.is_linked)
    }

    /// Per-category counts.
    #[must_use]
    pub fn counts(&self) -> BlockCounts {
        self.counts
    }

    /// Number of ecal clusters.
    #[must_use]
    pub fn count_ecal(&self) -> usize {
        self.counts.ecal
    }

    /// Number of hcal clusters.
    #[must_use]
    pub fn count_hcal(&self) -> usize {
        self.counts.hcal
    }

    /// Number of tracks.
    #[must_use]
    pub fn count_tracks(&self) -> usize {
        self.counts.tracks
    }

    /// Composition signature such as `"E1H1T1"`; zero counts are omitted.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut signature = String::new();
        for (letter, count) in [
            ('E', self.counts.ecal),
            ('H', self.counts.hcal),
            ('T', self.counts.tracks),
        ] {
            if count > 0 {
                let _ = write!(signature, "{letter}{count}");
            }
        }
        signature
    }

    /// False once the block has been superseded by a split.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Marks the block as superseded.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
