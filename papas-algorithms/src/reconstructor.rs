//! Rule-based particle reconstruction from blocks.
//!
//! Rules are tried in order and the first match wins:
//!
//! | Block composition            | Particles                                   |
//! |------------------------------|---------------------------------------------|
//! | one ecal cluster             | photon from the cluster                     |
//! | one ecal + one track         | charged hadron from both                    |
//! | one ecal + one track + hcal  | photon from the hcal, hadron from the rest  |
//! | anything else                | nothing                                     |
//!
//! The three-element rule hands the hcal cluster to a separate photon. This
//! is kept for compatibility with existing outputs.

use log::debug;
use papas_core::{
    Block, Category, Event, Identifier, IdentifierRegistry, ReconstructedParticle, Result,
    Subtype, CHARGED_HADRON, PHOTON,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reconstruction rule selected for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BlockRule {
    /// Lone ecal cluster.
    Photon,
    /// One ecal cluster and one track.
    ChargedHadron,
    /// One ecal cluster, one track and one hcal cluster.
    HadronAndPhoton,
    /// No rule applies.
    Unmatched,
}

impl BlockRule {
    /// Selects the first rule matching the block composition.
    #[must_use]
    pub fn classify(block: &Block) -> Self {
        let counts = block.counts();
        match (block.len(), counts.ecal, counts.tracks, counts.hcal) {
            (1, 1, 0, 0) => BlockRule::Photon,
            (2, 1, 1, 0) => BlockRule::ChargedHadron,
            (3, 1, 1, 1) => BlockRule::HadronAndPhoton,
            _ => BlockRule::Unmatched,
        }
    }
}

/// Counters collected during one reconstruction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconstructionStatistics {
    /// Active blocks visited.
    pub blocks: usize,
    /// Blocks for which no rule applied.
    pub unmatched_blocks: usize,
    /// Photons produced.
    pub photons: usize,
    /// Charged hadrons produced.
    pub charged_hadrons: usize,
}

impl ReconstructionStatistics {
    /// Total particles produced.
    #[must_use]
    pub fn particles(&self) -> usize {
        self.photons + self.charged_hadrons
    }
}

/// Output of [`Reconstructor::reconstruct`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstruction {
    /// New particle identifiers in creation order.
    pub particles: Vec<Identifier>,
    /// Pass counters.
    pub statistics: ReconstructionStatistics,
}

/// Applies the block rules to an event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconstructor;

impl Reconstructor {
    /// Creates a reconstructor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reconstructs every active block of `event` in identifier order.
    pub fn reconstruct(
        &self,
        event: &mut Event,
        registry: &IdentifierRegistry,
    ) -> Result<Reconstruction> {
        let block_ids: Vec<Identifier> = event.active_blocks().map(Block::id).collect();
        let mut output = Reconstruction::default();

        for block_id in block_ids {
            output.statistics.blocks += 1;
            let (rule, particles) = self.reconstruct_block(event, block_id, registry)?;
            match rule {
                BlockRule::Photon => output.statistics.photons += 1,
                BlockRule::ChargedHadron => output.statistics.charged_hadrons += 1,
                BlockRule::HadronAndPhoton => {
                    output.statistics.photons += 1;
                    output.statistics.charged_hadrons += 1;
                }
                BlockRule::Unmatched => output.statistics.unmatched_blocks += 1,
            }
            output.particles.extend(particles);
        }

        Ok(output)
    }

    /// Reconstructs a single block, returning the rule applied and the new
    /// particle identifiers.
    pub fn reconstruct_block(
        &self,
        event: &mut Event,
        block_id: Identifier,
        registry: &IdentifierRegistry,
    ) -> Result<(BlockRule, Vec<Identifier>)> {
        let block = event
            .blocks
            .get(&block_id)
            .ok_or(papas_core::Error::UnknownIdentifier(block_id))?;
        let rule = BlockRule::classify(block);
        let elements = block.element_ids().to_vec();
        let signature = block.signature();

        let particles = match rule {
            BlockRule::Photon => vec![make_particle(event, registry, PHOTON, &elements)?],
            BlockRule::ChargedHadron => {
                vec![make_particle(event, registry, CHARGED_HADRON, &elements)?]
            }
            BlockRule::HadronAndPhoton => {
                let mut particles = Vec::with_capacity(2);
                let mut hadron_parents = Vec::with_capacity(2);
                for &element in &elements {
                    if element.is_hcal() {
                        particles.push(make_particle(event, registry, PHOTON, &[element])?);
                    } else {
                        hadron_parents.push(element);
                    }
                }
                particles.push(make_particle(
                    event,
                    registry,
                    CHARGED_HADRON,
                    &hadron_parents,
                )?);
                particles
            }
            BlockRule::Unmatched => {
                debug!("block {block_id} ({signature}): no reconstruction rule");
                Vec::new()
            }
        };

        if !particles.is_empty() {
            debug!(
                "block {block_id} ({signature}): {:?} -> {} particles",
                rule,
                particles.len()
            );
        }
        Ok((rule, particles))
    }
}

fn make_particle(
    event: &mut Event,
    registry: &IdentifierRegistry,
    pdg_id: i32,
    parents: &[Identifier],
) -> Result<Identifier> {
    let id = registry.make_id(Category::Particle, Subtype::Reconstructed)?;
    event.add_reconstructed_particle(ReconstructedParticle::new(id, pdg_id), parents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use papas_core::{Cluster, Edge, Track, Traversal};

    fn element(event: &mut Event, registry: &IdentifierRegistry, category: Category) -> Identifier {
        let id = registry.make_id(category, Subtype::Detector).unwrap();
        match category {
            Category::Track => event.add_track(Track::new(id, 1.0)).unwrap(),
            Category::EcalCluster => event.add_ecal_cluster(Cluster::new(id, 1.0)).unwrap(),
            Category::HcalCluster => event.add_hcal_cluster(Cluster::new(id, 1.0)).unwrap(),
            _ => unreachable!(),
        }
    }

    fn block_of(event: &mut Event, registry: &IdentifierRegistry, members: &[Identifier]) -> Identifier {
        let id = registry.make_id(Category::Block, Subtype::Reconstructed).unwrap();
        event
            .add_block(Block::new(id, members.iter().copied(), Vec::<Edge>::new()))
            .unwrap()
    }

    fn parents_of(event: &Event, particle: Identifier) -> Vec<Identifier> {
        event.history.node(particle).unwrap().parents().collect()
    }

    #[test]
    fn test_classify() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        let t = element(&mut event, &registry, Category::Track);
        let e = element(&mut event, &registry, Category::EcalCluster);
        let h = element(&mut event, &registry, Category::HcalCluster);
        let e2 = element(&mut event, &registry, Category::EcalCluster);
        let id = |members: &[Identifier]| {
            Block::new(
                registry.make_id(Category::Block, Subtype::Reconstructed).unwrap(),
                members.iter().copied(),
                Vec::<Edge>::new(),
            )
        };

        assert_eq!(BlockRule::classify(&id(&[e])), BlockRule::Photon);
        assert_eq!(BlockRule::classify(&id(&[t, e])), BlockRule::ChargedHadron);
        assert_eq!(BlockRule::classify(&id(&[t, e, h])), BlockRule::HadronAndPhoton);
        assert_eq!(BlockRule::classify(&id(&[t])), BlockRule::Unmatched);
        assert_eq!(BlockRule::classify(&id(&[h])), BlockRule::Unmatched);
        assert_eq!(BlockRule::classify(&id(&[e, e2])), BlockRule::Unmatched);
        assert_eq!(BlockRule::classify(&id(&[t, e, e2])), BlockRule::Unmatched);
    }

    #[test]
    fn test_three_element_rule_splits_parents() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        let t = element(&mut event, &registry, Category::Track);
        let e = element(&mut event, &registry, Category::EcalCluster);
        let h = element(&mut event, &registry, Category::HcalCluster);
        let block = block_of(&mut event, &registry, &[t, e, h]);

        let (rule, particles) = Reconstructor::new()
            .reconstruct_block(&mut event, block, &registry)
            .unwrap();

        assert_eq!(rule, BlockRule::HadronAndPhoton);
        assert_eq!(particles.len(), 2);
        let photon = event.reconstructed_particles[&particles[0]];
        let hadron = event.reconstructed_particles[&particles[1]];
        assert_eq!(photon.pdg_id, PHOTON);
        assert_eq!(hadron.pdg_id, CHARGED_HADRON);
        assert_eq!(parents_of(&event, photon.id), vec![h]);
        assert_eq!(parents_of(&event, hadron.id), vec![t, e]);
    }

    #[test]
    fn test_inactive_blocks_are_skipped() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        let e = element(&mut event, &registry, Category::EcalCluster);
        let lone_track = element(&mut event, &registry, Category::Track);
        let stale = block_of(&mut event, &registry, &[e]);
        block_of(&mut event, &registry, &[lone_track]);
        event.blocks.get_mut(&stale).unwrap().deactivate();

        let output = Reconstructor::new().reconstruct(&mut event, &registry).unwrap();
        assert!(output.particles.is_empty());
        assert_eq!(output.statistics.blocks, 1);
        assert_eq!(output.statistics.unmatched_blocks, 1);
    }

    #[test]
    fn test_particle_ids_strictly_increase() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        for _ in 0..4 {
            let e = element(&mut event, &registry, Category::EcalCluster);
            block_of(&mut event, &registry, &[e]);
        }
        let output = Reconstructor::new().reconstruct(&mut event, &registry).unwrap();
        assert_eq!(output.statistics.photons, 4);
        assert!(output.particles.windows(2).all(|pair| pair[0] < pair[1]));
        for particle in &output.particles {
            let up = event.history.breadth_first_search(*particle, Traversal::Parents).unwrap();
            assert_eq!(up.len(), 2);
        }
    }
}
