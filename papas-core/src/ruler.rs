//! Distance ruler contract.
//!
//! Concrete distance formulas live outside this crate; the block builder only
//! relies on the [`Ruler`] trait.

use crate::edge::LinkKind;
use crate::element::ObjectRef;
use crate::error::{Error, Result};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Measurement returned by a ruler for one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Link {
    /// Pair tag.
    pub kind: LinkKind,
    /// Whether the pair is within tolerance.
    pub is_linked: bool,
    /// Measured distance.
    pub distance: f64,
}

impl Link {
    /// Creates a measurement.
    #[must_use]
    pub fn new(kind: LinkKind, is_linked: bool, distance: f64) -> Self {
        Self {
            kind,
            is_linked,
            distance,
        }
    }
}

/// Pairwise distance and validity predicate between two objects.
///
/// Implementations must be pure and symmetric: `measure(a, b)` and
/// `measure(b, a)` agree on `is_linked` and `distance`. The builder evaluates
/// each unordered pair once, possibly from several threads.
pub trait Ruler: Send + Sync {
    /// Measures the pair, failing if the objects cannot be compared.
    fn measure(&self, a: ObjectRef<'_>, b: ObjectRef<'_>) -> Result<Link>;

    /// Returns the name of the ruler.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<R: Ruler + ?Sized> Ruler for &R {
    fn measure(&self, a: ObjectRef<'_>, b: ObjectRef<'_>) -> Result<Link> {
        (**self).measure(a, b)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Ruler backed by a closure; see [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnRuler<F>(F);

impl<F> fmt::Debug for FnRuler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnRuler")
    }
}

impl<F> Ruler for FnRuler<F>
where
    F: Fn(ObjectRef<'_>, ObjectRef<'_>) -> Result<Link> + Send + Sync,
{
    fn measure(&self, a: ObjectRef<'_>, b: ObjectRef<'_>) -> Result<Link> {
        (self.0)(a, b)
    }
}

/// Wraps a closure as a [`Ruler`].
pub fn from_fn<F>(f: F) -> FnRuler<F>
where
    F: Fn(ObjectRef<'_>, ObjectRef<'_>) -> Result<Link> + Send + Sync,
{
    FnRuler(f)
}

/// Fails with [`Error::Incomparable`] unless both objects are detector elements.
pub fn require_elements(a: ObjectRef<'_>, b: ObjectRef<'_>) -> Result<()> {
    if a.id().is_element() && b.id().is_element() {
        Ok(())
    } else {
        Err(Error::Incomparable(a.id(), b.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Cluster, SimParticle, Track};
    use crate::identifier::{Category, IdentifierRegistry, Subtype};

    #[test]
    fn test_closure_ruler() {
        let registry = IdentifierRegistry::new();
        let track = Track::new(registry.make_id(Category::Track, Subtype::Detector).unwrap(), 5.0);
        let ecal = Cluster::new(
            registry.make_id(Category::EcalCluster, Subtype::Detector).unwrap(),
            4.5,
        );
        let ruler = from_fn(|a, b| {
            require_elements(a, b)?;
            let distance = (a.energy().unwrap_or(0.0) - b.energy().unwrap_or(0.0)).abs();
            Ok(Link::new(
                LinkKind::between(a.category(), b.category()),
                distance < 1.0,
                distance,
            ))
        });

        let link = ruler
            .measure(ObjectRef::Track(&track), ObjectRef::EcalCluster(&ecal))
            .unwrap();
        assert!(link.is_linked);
        assert_eq!(link.kind, LinkKind::TrackEcal);
        assert_eq!(ruler.name(), "custom");
    }

    #[test]
    fn test_require_elements_rejects_particles() {
        let registry = IdentifierRegistry::new();
        let track = Track::new(registry.make_id(Category::Track, Subtype::Detector).unwrap(), 1.0);
        let particle = SimParticle::new(
            registry.make_id(Category::Particle, Subtype::Generated).unwrap(),
            22,
        );
        assert_eq!(
            require_elements(ObjectRef::Track(&track), ObjectRef::SimParticle(&particle)),
            Err(Error::Incomparable(track.id, particle.id))
        );
    }
}
