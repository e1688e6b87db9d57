//! Undirected distance edges between two elements.

use crate::identifier::{Category, Identifier};
use crate::ruler::Link;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pair tag describing which element categories an edge connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinkKind {
    /// Track to track.
    TrackTrack,
    /// Track to ecal cluster.
    TrackEcal,
    /// Track to hcal cluster.
    TrackHcal,
    /// Ecal cluster to ecal cluster.
    EcalEcal,
    /// Ecal cluster to hcal cluster.
    EcalHcal,
    /// Hcal cluster to hcal cluster.
    HcalHcal,
    /// Any pair involving a non-element category.
    Other,
}

impl LinkKind {
    /// Derives the tag from the two endpoint categories, in either order.
    #[must_use]
    pub fn between(a: Category, b: Category) -> Self {
        use Category::{EcalCluster, HcalCluster, Track};
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match (lo, hi) {
            (Track, Track) => LinkKind::TrackTrack,
            (Track, EcalCluster) => LinkKind::TrackEcal,
            (Track, HcalCluster) => LinkKind::TrackHcal,
            (EcalCluster, EcalCluster) => LinkKind::EcalEcal,
            (EcalCluster, HcalCluster) => LinkKind::EcalHcal,
            (HcalCluster, HcalCluster) => LinkKind::HcalHcal,
            _ => LinkKind::Other,
        }
    }
}

/// Unordered endpoint pair identifying an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeKey(Identifier, Identifier);

impl EdgeKey {
    /// Builds the key; argument order does not matter.
    #[must_use]
    pub fn new(a: Identifier, b: Identifier) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Smaller endpoint.
    #[must_use]
    pub fn first(&self) -> Identifier {
        self.0
    }

    /// Larger endpoint.
    #[must_use]
    pub fn second(&self) -> Identifier {
        self.1
    }

    /// True if `id` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, id: Identifier) -> bool {
        self.0 == id || self.1 == id
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Result of measuring one unordered pair of elements.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edge {
    key: EdgeKey,
    /// Pair tag reported by the ruler.
    pub kind: LinkKind,
    /// Whether the pair is linked within tolerance.
    pub is_linked: bool,
    /// Distance reported by the ruler.
    pub distance: f64,
}

impl Edge {
    /// Creates an edge from a ruler measurement.
    #[must_use]
    pub fn new(a: Identifier, b: Identifier, link: Link) -> Self {
        Self {
            key: EdgeKey::new(a, b),
            kind: link.kind,
            is_linked: link.is_linked,
            distance: link.distance,
        }
    }

    /// Unordered identity of this edge.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        self.key
    }

    /// Endpoint opposite to `id`, if `id` is an endpoint.
    #[must_use]
    pub fn other(&self, id: Identifier) -> Option<Identifier> {
        if self.key.0 == id {
            Some(self.key.1)
        } else if self.key.1 == id {
            Some(self.key.0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{IdentifierRegistry, Subtype};
    use approx::assert_relative_eq;

    #[test]
    fn test_key_is_unordered() {
        let registry = IdentifierRegistry::new();
        let t = registry.make_id(Category::Track, Subtype::Detector).unwrap();
        let e = registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap();
        assert_eq!(EdgeKey::new(t, e), EdgeKey::new(e, t));
        assert_eq!(EdgeKey::new(e, t).first(), t);
        assert!(EdgeKey::new(t, e).touches(e));
    }

    #[test]
    fn test_link_kind_between() {
        use Category::*;
        assert_eq!(LinkKind::between(EcalCluster, Track), LinkKind::TrackEcal);
        assert_eq!(LinkKind::between(HcalCluster, EcalCluster), LinkKind::EcalHcal);
        assert_eq!(LinkKind::between(HcalCluster, HcalCluster), LinkKind::HcalHcal);
        assert_eq!(LinkKind::between(Particle, Track), LinkKind::Other);
    }

    #[test]
    fn test_edge_from_link() {
        let registry = IdentifierRegistry::new();
        let t = registry.make_id(Category::Track, Subtype::Detector).unwrap();
        let h = registry.make_id(Category::HcalCluster, Subtype::Detector).unwrap();
        let edge = Edge::new(h, t, Link::new(LinkKind::TrackHcal, true, 0.25));

        assert!(edge.is_linked);
        assert_relative_eq!(edge.distance, 0.25);
        assert_eq!(edge.other(t), Some(h));
        assert_eq!(edge.other(h), Some(t));
    }
}
