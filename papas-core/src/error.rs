//! Error types for papas-core.

use crate::edge::EdgeKey;
use crate::graph::GraphKind;
use crate::identifier::{Category, Identifier};
use thiserror::Error;

/// Result type alias for papas operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for papas operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Identifier is not present in the collection it decodes to.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(Identifier),

    /// Raw value does not decode to a valid identifier.
    #[error("invalid identifier bits: {0:#018x}")]
    InvalidIdentifier(u64),

    /// Per-category sequence counter overflowed.
    #[error("identifier sequence exhausted for category {0:?}")]
    IdentifierExhausted(Category),

    /// Identifier already registered in the event.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(Identifier),

    /// Object stored under an identifier of another category.
    #[error("identifier {id} is not a {expected:?}")]
    CategoryMismatch {
        /// Offending identifier.
        id: Identifier,
        /// Category required by the collection.
        expected: Category,
    },

    /// Relation not supported by this graph kind.
    #[error("{operation} is not supported on a {kind:?} graph")]
    WrongGraphKind {
        /// Operation attempted.
        operation: &'static str,
        /// Kind of the graph the operation was applied to.
        kind: GraphKind,
    },

    /// Adding the provenance edge would close a cycle.
    #[error("provenance edge {parent} -> {child} would create a cycle")]
    CycleDetected {
        /// Proposed parent.
        parent: Identifier,
        /// Proposed child.
        child: Identifier,
    },

    /// A node cannot relate to itself.
    #[error("node {0} cannot be related to itself")]
    SelfLink(Identifier),

    /// Ruler was asked to compare objects without comparable attributes.
    #[error("cannot measure distance between {0} and {1}")]
    Incomparable(Identifier, Identifier),

    /// Edge does not belong to the block being split.
    #[error("edge {edge} does not belong to block {block}")]
    EdgeNotInBlock {
        /// Block being split.
        block: Identifier,
        /// Offending edge key.
        edge: EdgeKey,
    },

    /// Block has already been superseded by a split.
    #[error("block {0} is no longer active")]
    InactiveBlock(Identifier),

    /// Split output does not preserve the input elements.
    #[error("splitting block {0} would lose or duplicate elements")]
    SplitInvariant(Identifier),
}
