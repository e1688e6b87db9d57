//! Self-decoding identifiers and the run-scoped registry that allocates them.
//!
//! An [`Identifier`] packs a category, a subtype and a per-category sequence
//! number into a single `u64`:
//!
//! ```text
//!  63    60 59      52 51                                   0
//! +--------+----------+--------------------------------------+
//! |category| subtype  |               sequence               |
//! +--------+----------+--------------------------------------+
//! ```
//!
//! Decoding needs no lookup table, and the natural integer ordering groups
//! identifiers by category, then subtype, then allocation order.
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CATEGORY_SHIFT: u32 = 60;
const SUBTYPE_SHIFT: u32 = 52;
const SUBTYPE_MASK: u64 = 0xFF;

/// Largest sequence number a category can allocate.
pub const MAX_SEQUENCE: u64 = (1 << SUBTYPE_SHIFT) - 1;

/// Object category encoded in an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Category {
    /// Reconstructed charged track.
    Track = 1,
    /// Electromagnetic calorimeter cluster.
    EcalCluster = 2,
    /// Hadronic calorimeter cluster.
    HcalCluster = 3,
    /// Generated or reconstructed particle.
    Particle = 4,
    /// Block of linked elements.
    Block = 5,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 5;

    /// All categories in encoding order.
    pub const ALL: [Category; Self::COUNT] = [
        Category::Track,
        Category::EcalCluster,
        Category::HcalCluster,
        Category::Particle,
        Category::Block,
    ];

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Category::Track),
            2 => Some(Category::EcalCluster),
            3 => Some(Category::HcalCluster),
            4 => Some(Category::Particle),
            5 => Some(Category::Block),
            _ => None,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize - 1
    }

    /// Short letter used in display strings.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Category::Track => 't',
            Category::EcalCluster => 'e',
            Category::HcalCluster => 'h',
            Category::Particle => 'p',
            Category::Block => 'b',
        }
    }
}

/// Provenance subtype encoded in an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Subtype {
    /// Generator-level (truth) object.
    Generated = b'g',
    /// Object produced by reconstruction.
    Reconstructed = b'r',
    /// Detector-level measurement.
    Detector = b't',
}

impl Subtype {
    /// All subtypes.
    pub const ALL: [Subtype; 3] = [Subtype::Generated, Subtype::Reconstructed, Subtype::Detector];

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            b'g' => Some(Subtype::Generated),
            b'r' => Some(Subtype::Reconstructed),
            b't' => Some(Subtype::Detector),
            _ => None,
        }
    }

    /// Short letter used in display strings.
    #[must_use]
    pub fn letter(self) -> char {
        char::from(self as u8)
    }
}

/// Unique, self-decoding identifier for any object in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
pub struct Identifier(u64);

impl Identifier {
    #[inline]
    fn pack(category: Category, subtype: Subtype, sequence: u64) -> Self {
        Self(
            (u64::from(category as u8) << CATEGORY_SHIFT)
                | (u64::from(subtype as u8) << SUBTYPE_SHIFT)
                | sequence,
        )
    }

    /// Validates and wraps a raw identifier value.
    pub fn from_raw(raw: u64) -> Result<Self> {
        let category = Category::from_bits((raw >> CATEGORY_SHIFT) as u8);
        let subtype = Subtype::from_bits(((raw >> SUBTYPE_SHIFT) & SUBTYPE_MASK) as u8);
        match (category, subtype) {
            (Some(_), Some(_)) => Ok(Self(raw)),
            _ => Err(Error::InvalidIdentifier(raw)),
        }
    }

    /// Returns the raw packed value.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Decodes the category.
    #[inline]
    #[must_use]
    pub fn category(self) -> Category {
        match Category::from_bits((self.0 >> CATEGORY_SHIFT) as u8) {
            Some(category) => category,
            None => unreachable!("identifiers are validated on construction"),
        }
    }

    /// Decodes the subtype.
    #[inline]
    #[must_use]
    pub fn subtype(self) -> Subtype {
        match Subtype::from_bits(((self.0 >> SUBTYPE_SHIFT) & SUBTYPE_MASK) as u8) {
            Some(subtype) => subtype,
            None => unreachable!("identifiers are validated on construction"),
        }
    }

    /// Decodes the per-category sequence number.
    #[inline]
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0 & MAX_SEQUENCE
    }

    /// True for tracks.
    #[inline]
    #[must_use]
    pub fn is_track(self) -> bool {
        self.category() == Category::Track
    }

    /// True for ecal clusters.
    #[inline]
    #[must_use]
    pub fn is_ecal(self) -> bool {
        self.category() == Category::EcalCluster
    }

    /// True for hcal clusters.
    #[inline]
    #[must_use]
    pub fn is_hcal(self) -> bool {
        self.category() == Category::HcalCluster
    }

    /// True for particles of either subtype.
    #[inline]
    #[must_use]
    pub fn is_particle(self) -> bool {
        self.category() == Category::Particle
    }

    /// True for blocks.
    #[inline]
    #[must_use]
    pub fn is_block(self) -> bool {
        self.category() == Category::Block
    }

    /// True for detector-level elements that take part in blocking.
    #[inline]
    #[must_use]
    pub fn is_element(self) -> bool {
        matches!(
            self.category(),
            Category::Track | Category::EcalCluster | Category::HcalCluster
        )
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}#{}",
            self.category().letter(),
            self.subtype().letter(),
            self.sequence()
        )
    }
}

impl TryFrom<u64> for Identifier {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<Identifier> for u64 {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Run-scoped allocator holding one monotonic counter per category.
///
/// Counters are atomic, so a single registry can be shared by reference
/// between events processed on different threads. [`reset`](Self::reset)
/// takes `&mut self` and therefore cannot race with allocation; call it only
/// between independent runs.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    counters: [AtomicU64; Category::COUNT],
}

impl IdentifierRegistry {
    /// Creates a registry with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next identifier for `category`.
    pub fn make_id(&self, category: Category, subtype: Subtype) -> Result<Identifier> {
        let sequence = self.counters[category.index()].fetch_add(1, Ordering::Relaxed) + 1;
        if sequence > MAX_SEQUENCE {
            return Err(Error::IdentifierExhausted(category));
        }
        Ok(Identifier::pack(category, subtype, sequence))
    }

    /// Number of identifiers allocated so far for `category`.
    #[must_use]
    pub fn allocated(&self, category: Category) -> u64 {
        self.counters[category.index()]
            .load(Ordering::Relaxed)
            .min(MAX_SEQUENCE)
    }

    /// Clears all counters, starting a new run.
    pub fn reset(&mut self) {
        for counter in &mut self.counters {
            *counter.get_mut() = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_trip_all_combinations() {
        let registry = IdentifierRegistry::new();
        for category in Category::ALL {
            for subtype in Subtype::ALL {
                let id = registry.make_id(category, subtype).unwrap();
                assert_eq!(id.category(), category);
                assert_eq!(id.subtype(), subtype);
            }
        }
    }

    #[test]
    fn test_sequences_are_per_category() {
        let registry = IdentifierRegistry::new();
        let t1 = registry.make_id(Category::Track, Subtype::Detector).unwrap();
        let e1 = registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap();
        let t2 = registry.make_id(Category::Track, Subtype::Detector).unwrap();

        assert_eq!(t1.sequence(), 1);
        assert_eq!(e1.sequence(), 1);
        assert_eq!(t2.sequence(), 2);
        assert!(t1 < t2);
        assert_eq!(registry.allocated(Category::Track), 2);
        assert_eq!(registry.allocated(Category::Block), 0);
    }

    #[test]
    fn test_reset_restarts_sequences() {
        let mut registry = IdentifierRegistry::new();
        let first = registry.make_id(Category::Particle, Subtype::Generated).unwrap();
        registry.make_id(Category::Particle, Subtype::Generated).unwrap();
        registry.reset();
        let again = registry.make_id(Category::Particle, Subtype::Generated).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_predicates() {
        let registry = IdentifierRegistry::new();
        let ecal = registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap();
        let hcal = registry.make_id(Category::HcalCluster, Subtype::Detector).unwrap();
        let block = registry.make_id(Category::Block, Subtype::Reconstructed).unwrap();

        assert!(ecal.is_ecal() && ecal.is_element() && !ecal.is_hcal());
        assert!(hcal.is_hcal() && !hcal.is_track());
        assert!(block.is_block() && !block.is_element());
    }

    #[test]
    fn test_from_raw_rejects_garbage() {
        assert_eq!(Identifier::from_raw(0), Err(Error::InvalidIdentifier(0)));
        let registry = IdentifierRegistry::new();
        let id = registry.make_id(Category::HcalCluster, Subtype::Detector).unwrap();
        assert_eq!(Identifier::from_raw(id.raw()), Ok(id));
    }

    #[test]
    fn test_display() {
        let registry = IdentifierRegistry::new();
        let id = registry.make_id(Category::Particle, Subtype::Reconstructed).unwrap();
        assert_eq!(id.to_string(), "pr#1");
    }

    proptest! {
        #[test]
        fn prop_decode_matches_encode(cat in 0usize..Category::COUNT, sub in 0usize..3, seq in 1u64..=MAX_SEQUENCE) {
            let id = Identifier::pack(Category::ALL[cat], Subtype::ALL[sub], seq);
            prop_assert_eq!(id.category(), Category::ALL[cat]);
            prop_assert_eq!(id.subtype(), Subtype::ALL[sub]);
            prop_assert_eq!(id.sequence(), seq);
            prop_assert_eq!(Identifier::from_raw(id.raw()), Ok(id));
        }
    }
}
