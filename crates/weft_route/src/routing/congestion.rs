//! Congestion history for negotiated rip-up routing.
//!
//! Counters grow each time a resource is reclaimed from another net during a
//! rip-up back-trace, and they never shrink within one routing invocation.
//! The path search charges contested resources in proportion to these
//! counters, so chronically fought-over wires and PIPs become progressively
//! more expensive until one of the contenders routes around them.

use std::collections::HashMap;
use weft_common::Ident;
use weft_device::{PipId, WireId};

/// Two-tier conflict history.
///
/// The per-resource tier says "this wire is usually contested"; the
/// per-(net, resource) tier says "this particular net keeps claiming this
/// wire". The search attenuates the first (divided by 8) so it guides
/// without overwhelming, and applies the second at full weight to push the
/// repeat offender hardest.
#[derive(Debug, Default)]
pub struct RipupScoreboard {
    wire_scores: HashMap<WireId, u32>,
    pip_scores: HashMap<PipId, u32>,
    // (net, resource) pairs packed into one u64 key.
    net_wire_scores: HashMap<u64, u32>,
    net_pip_scores: HashMap<u64, u32>,
}

fn pair_key(net: Ident, resource_raw: u32) -> u64 {
    ((net.as_raw() as u64) << 32) | resource_raw as u64
}

impl RipupScoreboard {
    /// Creates an empty scoreboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Conflict count for a wire.
    pub fn wire_score(&self, wire: WireId) -> u32 {
        self.wire_scores.get(&wire).copied().unwrap_or(0)
    }

    /// Conflict count for a PIP.
    pub fn pip_score(&self, pip: PipId) -> u32 {
        self.pip_scores.get(&pip).copied().unwrap_or(0)
    }

    /// Conflict count for one net on one wire.
    pub fn net_wire_score(&self, net: Ident, wire: WireId) -> u32 {
        self.net_wire_scores
            .get(&pair_key(net, wire.as_raw()))
            .copied()
            .unwrap_or(0)
    }

    /// Conflict count for one net on one PIP.
    pub fn net_pip_score(&self, net: Ident, pip: PipId) -> u32 {
        self.net_pip_scores
            .get(&pair_key(net, pip.as_raw()))
            .copied()
            .unwrap_or(0)
    }

    /// Records a conflict on a wire.
    pub fn bump_wire(&mut self, wire: WireId) {
        *self.wire_scores.entry(wire).or_insert(0) += 1;
    }

    /// Records a conflict on a PIP.
    pub fn bump_pip(&mut self, pip: PipId) {
        *self.pip_scores.entry(pip).or_insert(0) += 1;
    }

    /// Records one net's involvement in a wire conflict.
    pub fn bump_net_wire(&mut self, net: Ident, wire: WireId) {
        *self
            .net_wire_scores
            .entry(pair_key(net, wire.as_raw()))
            .or_insert(0) += 1;
    }

    /// Records one net's involvement in a PIP conflict.
    pub fn bump_net_pip(&mut self, net: Ident, pip: PipId) {
        *self
            .net_pip_scores
            .entry(pair_key(net, pip.as_raw()))
            .or_insert(0) += 1;
    }
}
