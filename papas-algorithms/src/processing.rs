//! High-level processing helpers that combine block building and reconstruction.

use crate::builder::{BlockBuilder, BlockBuilderConfig};
use crate::reconstructor::{ReconstructionStatistics, Reconstructor};
use log::info;
use papas_core::{Event, Identifier, IdentifierRegistry, Result, Ruler};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`process_event`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Block builder settings.
    pub builder: BlockBuilderConfig,
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block builder configuration.
    #[must_use]
    pub fn with_builder(mut self, builder: BlockBuilderConfig) -> Self {
        self.builder = builder;
        self
    }
}

/// Outcome of one event pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventSummary {
    /// Blocks built, in creation order.
    pub blocks: Vec<Identifier>,
    /// Reconstructed particles, in creation order.
    pub particles: Vec<Identifier>,
    /// Reconstruction counters.
    pub statistics: ReconstructionStatistics,
}

/// Build blocks over every track and cluster of `event`, then reconstruct them.
pub fn process_event<R: Ruler>(
    event: &mut Event,
    ruler: R,
    registry: &IdentifierRegistry,
    config: &PipelineConfig,
) -> Result<EventSummary> {
    let elements = event.element_ids();
    let builder = BlockBuilder::with_config(ruler, config.builder.clone());
    let blocks = builder.build(event, &elements, registry)?;

    let reconstruction = Reconstructor::new().reconstruct(event, registry)?;
    info!(
        "event: {} elements, {} blocks, {} particles ({} unmatched blocks)",
        elements.len(),
        blocks.len(),
        reconstruction.particles.len(),
        reconstruction.statistics.unmatched_blocks
    );

    Ok(EventSummary {
        blocks,
        particles: reconstruction.particles,
        statistics: reconstruction.statistics,
    })
}

/// Process a sequence of events sharing one registry, one after another.
pub fn process_events<'a, R, I>(
    events: I,
    ruler: &R,
    registry: &IdentifierRegistry,
    config: &PipelineConfig,
) -> Result<Vec<EventSummary>>
where
    R: Ruler,
    I: IntoIterator<Item = &'a mut Event>,
{
    events
        .into_iter()
        .map(|event| process_event(event, ruler, registry, config))
        .collect()
}
