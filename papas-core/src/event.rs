//! Event-scoped container owning every object, node and block of one pass.

use crate::block::Block;
use crate::element::{Cluster, ObjectRef, ReconstructedParticle, SimParticle, Track};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::identifier::{Category, Identifier, Subtype};
use std::collections::BTreeMap;

/// All objects of one event, keyed by identifier, plus the provenance
/// (`history`) and connectivity graphs.
///
/// Built fresh for every event; only the identifier registry outlives it.
#[derive(Debug, Clone)]
pub struct Event {
    /// Tracks.
    pub tracks: BTreeMap<Identifier, Track>,
    /// Ecal clusters.
    pub ecal_clusters: BTreeMap<Identifier, Cluster>,
    /// Hcal clusters.
    pub hcal_clusters: BTreeMap<Identifier, Cluster>,
    /// Generator-level particles.
    pub sim_particles: BTreeMap<Identifier, SimParticle>,
    /// Particles produced by reconstruction.
    pub reconstructed_particles: BTreeMap<Identifier, ReconstructedParticle>,
    /// Blocks, including superseded ones.
    pub blocks: BTreeMap<Identifier, Block>,
    /// Directed provenance graph; every stored object has a node here.
    pub history: Graph,
    /// Undirected connectivity graph between elements.
    pub connectivity: Graph,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            tracks: BTreeMap::new(),
            ecal_clusters: BTreeMap::new(),
            hcal_clusters: BTreeMap::new(),
            sim_particles: BTreeMap::new(),
            reconstructed_particles: BTreeMap::new(),
            blocks: BTreeMap::new(),
            history: Graph::provenance(),
            connectivity: Graph::connectivity(),
        }
    }
}

fn require_category(id: Identifier, category: Category, subtype: Option<Subtype>) -> Result<()> {
    let subtype_ok = subtype.is_none_or(|subtype| id.subtype() == subtype);
    if id.category() == category && subtype_ok {
        Ok(())
    } else {
        Err(Error::CategoryMismatch {
            id,
            expected: category,
        })
    }
}

impl Event {
    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, id: Identifier) -> Result<()> {
        if self.history.add_node(id) {
            Ok(())
        } else {
            Err(Error::DuplicateIdentifier(id))
        }
    }

    /// Stores a track and creates its history node.
    pub fn add_track(&mut self, track: Track) -> Result<Identifier> {
        require_category(track.id, Category::Track, None)?;
        self.register(track.id)?;
        self.tracks.insert(track.id, track);
        Ok(track.id)
    }

    /// Stores an ecal cluster and creates its history node.
    pub fn add_ecal_cluster(&mut self, cluster: Cluster) -> Result<Identifier> {
        require_category(cluster.id, Category::EcalCluster, None)?;
        self.register(cluster.id)?;
        self.ecal_clusters.insert(cluster.id, cluster);
        Ok(cluster.id)
    }

    /// Stores an hcal cluster and creates its history node.
    pub fn add_hcal_cluster(&mut self, cluster: Cluster) -> Result<Identifier> {
        require_category(cluster.id, Category::HcalCluster, None)?;
        self.register(cluster.id)?;
        self.hcal_clusters.insert(cluster.id, cluster);
        Ok(cluster.id)
    }

    /// Stores a simulated particle and creates its history node.
    pub fn add_sim_particle(&mut self, particle: SimParticle) -> Result<Identifier> {
        require_category(particle.id, Category::Particle, Some(Subtype::Generated))?;
        self.register(particle.id)?;
        self.sim_particles.insert(particle.id, particle);
        Ok(particle.id)
    }

    /// Stores a reconstructed particle and links it as a child of every parent.
    pub fn add_reconstructed_particle(
        &mut self,
        particle: ReconstructedParticle,
        parents: &[Identifier],
    ) -> Result<Identifier> {
        require_category(particle.id, Category::Particle, Some(Subtype::Reconstructed))?;
        for &parent in parents {
            if !self.history.contains(parent) {
                return Err(Error::UnknownIdentifier(parent));
            }
        }
        self.register(particle.id)?;
        self.reconstructed_particles.insert(particle.id, particle);
        for &parent in parents {
            self.history.add_child(parent, particle.id)?;
        }
        Ok(particle.id)
    }

    /// Stores a block and creates its history node.
    pub fn add_block(&mut self, block: Block) -> Result<Identifier> {
        let id = block.id();
        require_category(id, Category::Block, None)?;
        self.register(id)?;
        self.blocks.insert(id, block);
        Ok(id)
    }

    /// Records that `parent` gave rise to `child`.
    pub fn add_history_link(&mut self, parent: Identifier, child: Identifier) -> Result<()> {
        self.history.add_child(parent, child)
    }

    /// Resolves an identifier to the object it names.
    ///
    /// Dispatches on the decoded category and subtype; an identifier that is
    /// not stored in its collection is an error.
    pub fn get_object(&self, id: Identifier) -> Result<ObjectRef<'_>> {
        let object = match (id.category(), id.subtype()) {
            (Category::Track, _) => self.tracks.get(&id).map(ObjectRef::Track),
            (Category::EcalCluster, _) => self.ecal_clusters.get(&id).map(ObjectRef::EcalCluster),
            (Category::HcalCluster, _) => self.hcal_clusters.get(&id).map(ObjectRef::HcalCluster),
            (Category::Particle, Subtype::Generated) => {
                self.sim_particles.get(&id).map(ObjectRef::SimParticle)
            }
            (Category::Particle, Subtype::Reconstructed) => self
                .reconstructed_particles
                .get(&id)
                .map(ObjectRef::ReconstructedParticle),
            (Category::Particle, Subtype::Detector) => None,
            (Category::Block, _) => self.blocks.get(&id).map(ObjectRef::Block),
        };
        object.ok_or(Error::UnknownIdentifier(id))
    }

    /// Identifiers of every track and cluster, in ascending order.
    #[must_use]
    pub fn element_ids(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self
            .tracks
            .keys()
            .chain(self.ecal_clusters.keys())
            .chain(self.hcal_clusters.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Blocks that have not been superseded by a split.
    pub fn active_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values().filter(|block| block.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Traversal;
    use crate::identifier::IdentifierRegistry;

    #[test]
    fn test_get_object_dispatch() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        let track = event
            .add_track(Track::new(registry.make_id(Category::Track, Subtype::Detector).unwrap(), 3.0))
            .unwrap();
        let hcal = event
            .add_hcal_cluster(Cluster::new(
                registry.make_id(Category::HcalCluster, Subtype::Detector).unwrap(),
                7.0,
            ))
            .unwrap();
        let sim = event
            .add_sim_particle(SimParticle::new(
                registry.make_id(Category::Particle, Subtype::Generated).unwrap(),
                211,
            ))
            .unwrap();

        assert!(matches!(event.get_object(track), Ok(ObjectRef::Track(t)) if t.id == track));
        assert!(matches!(event.get_object(hcal), Ok(ObjectRef::HcalCluster(_))));
        assert!(matches!(event.get_object(sim), Ok(ObjectRef::SimParticle(p)) if p.pdg_id == 211));
        assert_eq!(event.element_ids(), vec![track, hcal]);
    }

    #[test]
    fn test_get_object_unknown_is_error() {
        let registry = IdentifierRegistry::new();
        let event = Event::new();
        let missing = registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap();
        assert!(matches!(
            event.get_object(missing),
            Err(Error::UnknownIdentifier(id)) if id == missing
        ));
    }

    #[test]
    fn test_rejects_wrong_category_and_duplicates() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        let ecal_id = registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap();

        assert!(matches!(
            event.add_track(Track::new(ecal_id, 1.0)),
            Err(Error::CategoryMismatch { .. })
        ));
        event.add_ecal_cluster(Cluster::new(ecal_id, 1.0)).unwrap();
        assert_eq!(
            event.add_ecal_cluster(Cluster::new(ecal_id, 2.0)),
            Err(Error::DuplicateIdentifier(ecal_id))
        );
    }

    #[test]
    fn test_reconstructed_particle_parents() {
        let registry = IdentifierRegistry::new();
        let mut event = Event::new();
        let ecal = event
            .add_ecal_cluster(Cluster::new(
                registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap(),
                1.0,
            ))
            .unwrap();
        let photon = ReconstructedParticle::new(
            registry.make_id(Category::Particle, Subtype::Reconstructed).unwrap(),
            22,
        );
        let id = event.add_reconstructed_particle(photon, &[ecal]).unwrap();

        assert_eq!(
            event.history.breadth_first_search(id, Traversal::Parents).unwrap(),
            vec![id, ecal]
        );
    }
}
