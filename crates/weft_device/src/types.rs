//! Shared data types for device routing-graph models.

use serde::{Deserialize, Serialize};

/// A timing delay with min/typical/max corners, in nanoseconds.
///
/// Represents the propagation delay through a routing resource across
/// process/voltage/temperature corners. The router costs edges by
/// [`avg_ns`](Self::avg_ns).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    /// Minimum delay in nanoseconds (fast corner).
    pub min_ns: f64,
    /// Typical delay in nanoseconds (nominal corner).
    pub typ_ns: f64,
    /// Maximum delay in nanoseconds (slow corner).
    pub max_ns: f64,
}

impl Delay {
    /// A zero delay (no propagation time).
    pub const ZERO: Self = Self {
        min_ns: 0.0,
        typ_ns: 0.0,
        max_ns: 0.0,
    };

    /// Creates a new delay with the given min/typ/max values.
    pub fn new(min_ns: f64, typ_ns: f64, max_ns: f64) -> Self {
        Self {
            min_ns,
            typ_ns,
            max_ns,
        }
    }

    /// Creates a delay with all three corners equal.
    pub fn uniform(ns: f64) -> Self {
        Self::new(ns, ns, ns)
    }

    /// The average of the fast and slow corners, used as the routing cost.
    pub fn avg_ns(&self) -> f64 {
        (self.min_ns + self.max_ns) / 2.0
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::ZERO
    }
}

/// How firmly a resource is bound to a net.
///
/// The router itself only ever binds with [`Strength::Weak`]; stronger
/// bindings come from fixed or user-locked routing and are not evicted by
/// rip-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strength {
    /// Router-placed binding; may be ripped up and rerouted.
    Weak,
    /// Deliberate binding that rip-up must not evict.
    Strong,
    /// Binding fixed by the device model (e.g. dedicated connections).
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_zero() {
        let d = Delay::ZERO;
        assert_eq!(d.avg_ns(), 0.0);
    }

    #[test]
    fn delay_avg() {
        let d = Delay::new(1.0, 2.0, 3.0);
        assert_eq!(d.avg_ns(), 2.0);
    }

    #[test]
    fn delay_uniform() {
        let d = Delay::uniform(5.0);
        assert_eq!(d.min_ns, 5.0);
        assert_eq!(d.typ_ns, 5.0);
        assert_eq!(d.max_ns, 5.0);
        assert_eq!(d.avg_ns(), 5.0);
    }

    #[test]
    fn delay_default_is_zero() {
        assert_eq!(Delay::default(), Delay::ZERO);
    }

    #[test]
    fn strength_variants_distinct() {
        assert_ne!(Strength::Weak, Strength::Strong);
        assert_ne!(Strength::Strong, Strength::Fixed);
    }

    #[test]
    fn delay_serde_roundtrip() {
        let d = Delay::new(0.5, 1.0, 1.5);
        let json = serde_json::to_string(&d).unwrap();
        let restored: Delay = serde_json::from_str(&json).unwrap();
        assert_eq!(d, restored);
    }
}
