//! papas-core: Core types for block building and particle reconstruction.
//!
//! This crate provides the identifier scheme, the provenance and
//! connectivity graph primitive, the edge and ruler contract, blocks, and
//! the event container that owns them.
//!

pub mod block;
pub mod edge;
pub mod element;
pub mod error;
pub mod event;
pub mod graph;
pub mod identifier;
pub mod ruler;

pub use block::{Block, BlockCounts};
pub use edge::{Edge, EdgeKey, LinkKind};
pub use element::{
    Cluster, ObjectRef, ReconstructedParticle, SimParticle, Track, CHARGED_HADRON, PHOTON,
};
pub use error::{Error, Result};
pub use event::Event;
pub use graph::{Graph, GraphKind, Node, Traversal};
pub use identifier::{Category, Identifier, IdentifierRegistry, Subtype};
pub use ruler::{FnRuler, Link, Ruler};
