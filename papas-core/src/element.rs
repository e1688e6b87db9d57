//! Measurement and particle types held by an event.

use crate::block::Block;
use crate::identifier::{Category, Identifier};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// PDG code of a photon.
pub const PHOTON: i32 = 22;
/// PDG code of a positive pion, used for charged hadrons.
pub const CHARGED_HADRON: i32 = 211;

/// Reconstructed charged track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    /// Unique identifier.
    pub id: Identifier,
    /// Track energy.
    pub energy: f64,
}

impl Track {
    /// Creates a new track.
    #[must_use]
    pub fn new(id: Identifier, energy: f64) -> Self {
        Self { id, energy }
    }
}

/// Calorimeter cluster; ecal and hcal clusters share this type.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Unique identifier.
    pub id: Identifier,
    /// Deposited energy.
    pub energy: f64,
}

impl Cluster {
    /// Creates a new cluster.
    #[must_use]
    pub fn new(id: Identifier, energy: f64) -> Self {
        Self { id, energy }
    }
}

/// Generator-level particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimParticle {
    /// Unique identifier.
    pub id: Identifier,
    /// PDG particle code.
    pub pdg_id: i32,
}

impl SimParticle {
    /// Creates a new simulated particle.
    #[must_use]
    pub fn new(id: Identifier, pdg_id: i32) -> Self {
        Self { id, pdg_id }
    }
}

/// Particle produced by the reconstructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconstructedParticle {
    /// Unique identifier.
    pub id: Identifier,
    /// PDG particle code.
    pub pdg_id: i32,
}

impl ReconstructedParticle {
    /// Creates a new reconstructed particle.
    #[must_use]
    pub fn new(id: Identifier, pdg_id: i32) -> Self {
        Self { id, pdg_id }
    }
}

/// Borrowed view of any object in an event, resolved from its identifier.
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    /// Track.
    Track(&'a Track),
    /// Ecal cluster.
    EcalCluster(&'a Cluster),
    /// Hcal cluster.
    HcalCluster(&'a Cluster),
    /// Simulated particle.
    SimParticle(&'a SimParticle),
    /// Reconstructed particle.
    ReconstructedParticle(&'a ReconstructedParticle),
    /// Block.
    Block(&'a Block),
}

impl ObjectRef<'_> {
    /// Identifier of the referenced object.
    #[must_use]
    pub fn id(&self) -> Identifier {
        match self {
            ObjectRef::Track(t) => t.id,
            ObjectRef::EcalCluster(c) | ObjectRef::HcalCluster(c) => c.id,
            ObjectRef::SimParticle(p) => p.id,
            ObjectRef::ReconstructedParticle(p) => p.id,
            ObjectRef::Block(b) => b.id(),
        }
    }

    /// Category of the referenced object.
    #[must_use]
    pub fn category(&self) -> Category {
        self.id().category()
    }

    /// Energy of a detector element; `None` for particles and blocks.
    #[must_use]
    pub fn energy(&self) -> Option<f64> {
        match self {
            ObjectRef::Track(t) => Some(t.energy),
            ObjectRef::EcalCluster(c) | ObjectRef::HcalCluster(c) => Some(c.energy),
            _ => None,
        }
    }
}
