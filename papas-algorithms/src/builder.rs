//! Block building.
//!
//! Measures every unordered pair of elements with a [`Ruler`], links valid
//! pairs in the event's connectivity graph and turns each connected
//! component of the given elements into a [`Block`].

use log::{debug, trace};
use papas_core::{
    Block, Category, Edge, Event, Graph, Identifier, IdentifierRegistry, ObjectRef, Result,
    Ruler, Subtype,
};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Configuration for [`BlockBuilder`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockBuilderConfig {
    /// Evaluate pairs on the rayon pool. The partition is unaffected.
    pub parallel: bool,
    /// Record each block as a provenance child of its elements.
    pub record_block_history: bool,
}

impl Default for BlockBuilderConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            record_block_history: true,
        }
    }
}

impl BlockBuilderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets parallel pair evaluation.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets whether blocks are recorded in the provenance graph.
    #[must_use]
    pub fn with_block_history(mut self, record: bool) -> Self {
        self.record_block_history = record;
        self
    }
}

/// Builds blocks from an event's elements using a ruler.
#[derive(Debug, Clone)]
pub struct BlockBuilder<R> {
    ruler: R,
    config: BlockBuilderConfig,
}

impl<R: Ruler> BlockBuilder<R> {
    /// Creates a builder with default configuration.
    pub fn new(ruler: R) -> Self {
        Self::with_config(ruler, BlockBuilderConfig::default())
    }

    /// Creates a builder with custom configuration.
    pub fn with_config(ruler: R, config: BlockBuilderConfig) -> Self {
        Self { ruler, config }
    }

    /// Current configuration.
    pub fn config(&self) -> &BlockBuilderConfig {
        &self.config
    }

    /// Measures every unordered pair of `ids` once, in `(i, j)`, `i < j` order.
    ///
    /// The first ruler failure is returned.
    pub fn measure_pairs(&self, event: &Event, ids: &[Identifier]) -> Result<Vec<Edge>> {
        let objects: Vec<ObjectRef<'_>> = ids
            .iter()
            .map(|&id| event.get_object(id))
            .collect::<Result<_>>()?;

        let pairs: Vec<(usize, usize)> = (0..objects.len())
            .flat_map(|i| ((i + 1)..objects.len()).map(move |j| (i, j)))
            .collect();

        let measure = |&(i, j): &(usize, usize)| -> Result<Edge> {
            let (a, b) = (objects[i], objects[j]);
            let link = self.ruler.measure(a, b)?;
            trace!(
                "{} {} {}: linked={} distance={}",
                self.ruler.name(),
                a.id(),
                b.id(),
                link.is_linked,
                link.distance
            );
            Ok(Edge::new(a.id(), b.id(), link))
        };

        if self.config.parallel {
            pairs.par_iter().map(measure).collect()
        } else {
            pairs.iter().map(measure).collect()
        }
    }

    /// Builds blocks over `element_ids` and stores them in `event`.
    ///
    /// Duplicate ids are ignored. Every element ends up in exactly one block;
    /// an element without valid links forms a singleton. Returns the new
    /// block identifiers in creation order.
    pub fn build(
        &self,
        event: &mut Event,
        element_ids: &[Identifier],
        registry: &IdentifierRegistry,
    ) -> Result<Vec<Identifier>> {
        let ids: Vec<Identifier> = element_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let edges = self.measure_pairs(event, &ids)?;

        // Components come from this call's links only; the event graph may
        // already hold links from earlier builds.
        let mut local = Graph::connectivity();
        for &id in &ids {
            local.add_node(id);
            event.connectivity.add_node(id);
        }
        for edge in edges.iter().filter(|edge| edge.is_linked) {
            let key = edge.key();
            local.link(key.first(), key.second())?;
            event.connectivity.link(key.first(), key.second())?;
        }

        let mut component_of: BTreeMap<Identifier, usize> = BTreeMap::new();
        let mut components: Vec<BTreeSet<Identifier>> = Vec::new();
        for &seed in &ids {
            if component_of.contains_key(&seed) {
                continue;
            }
            let component = local.flood_fill(seed)?;
            for &member in &component {
                component_of.insert(member, components.len());
            }
            components.push(component);
        }

        let mut block_edges: Vec<Vec<Edge>> = vec![Vec::new(); components.len()];
        for edge in edges {
            let key = edge.key();
            match (component_of.get(&key.first()), component_of.get(&key.second())) {
                (Some(a), Some(b)) if a == b => block_edges[*a].push(edge),
                _ => {}
            }
        }

        let mut block_ids = Vec::with_capacity(components.len());
        for (component, edges) in components.into_iter().zip(block_edges) {
            let id = registry.make_id(Category::Block, Subtype::Reconstructed)?;
            let block = Block::new(id, component, edges);
            debug!("block {id}: {} ({} elements)", block.signature(), block.len());

            let members = block.element_ids().to_vec();
            event.add_block(block)?;
            if self.config.record_block_history {
                for member in members {
                    event.add_history_link(member, id)?;
                }
            }
            block_ids.push(id);
        }

        debug!(
            "built {} blocks from {} elements",
            block_ids.len(),
            ids.len()
        );
        Ok(block_ids)
    }
}
