//! papas-algorithms: Block building and particle reconstruction.
//!
//! This crate provides:
//! - **Block builder** - pairwise ruler evaluation and connected components
//! - **Block splitter** - edge removal and re-partitioning of a block
//! - **Reconstructor** - first-match composition rules producing particles
//!
#![warn(missing_docs)]

mod builder;
mod processing;
mod reconstructor;
pub mod splitter;

pub use builder::{BlockBuilder, BlockBuilderConfig};
pub use processing::{process_event, process_events, EventSummary, PipelineConfig};
pub use reconstructor::{BlockRule, Reconstruction, ReconstructionStatistics, Reconstructor};
pub use splitter::{split, split_block, split_block_with, BlockSplitter};

// Re-export core types used at this crate's boundary
pub use papas_core::{Block, Event, IdentifierRegistry, Ruler};
