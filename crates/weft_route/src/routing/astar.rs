//! Best-first path search from source wires to one destination wire.
//!
//! The search explores the implicit routing graph through downhill PIP
//! queries, costing each edge by its average delay plus congestion penalties
//! from the [`RipupScoreboard`]. Cost ties are broken by a random tag drawn
//! at push time, so equal-cost frontiers are explored in a different order
//! on every attempt and failed routes diversify across rip-up iterations.

use crate::context::MutateHandle;
use crate::routing::congestion::RipupScoreboard;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use weft_common::Ident;
use weft_device::{PipId, WireId};

/// One frontier record of the search.
///
/// `delay` is the accumulated arrival cost, `togo` the heuristic remaining
/// estimate. The priority queue pops the least `(delay + togo, randtag)`
/// first.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueuedWire {
    pub wire: WireId,
    /// The PIP used to arrive here; `None` for source wires.
    pub pip: Option<PipId>,
    pub delay: f64,
    pub togo: f64,
    pub randtag: u32,
}

impl QueuedWire {
    fn priority(&self) -> f64 {
        self.delay + self.togo
    }
}

impl PartialEq for QueuedWire {
    fn eq(&self, other: &Self) -> bool {
        self.priority() == other.priority() && self.randtag == other.randtag
    }
}

impl Eq for QueuedWire {}

impl Ord for QueuedWire {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest entry first.
        other
            .priority()
            .total_cmp(&self.priority())
            .then_with(|| other.randtag.cmp(&self.randtag))
    }
}

impl PartialOrd for QueuedWire {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dense wire-indexed map of the best known arrival at each wire.
///
/// Backed by a flat array with epoch stamps so a reset between searches is
/// O(1) instead of O(wires).
#[derive(Debug)]
pub(crate) struct VisitMap {
    entries: Vec<QueuedWire>,
    stamp: Vec<u32>,
    epoch: u32,
}

impl VisitMap {
    pub fn new(wire_count: u32) -> Self {
        let blank = QueuedWire {
            wire: WireId::NONE,
            pip: None,
            delay: 0.0,
            togo: 0.0,
            randtag: 0,
        };
        Self {
            entries: vec![blank; wire_count as usize],
            stamp: vec![0; wire_count as usize],
            epoch: 1,
        }
    }

    pub fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamp.fill(0);
            self.epoch = 1;
        }
    }

    pub fn contains(&self, wire: WireId) -> bool {
        self.stamp[wire.as_raw() as usize] == self.epoch
    }

    pub fn get(&self, wire: WireId) -> Option<&QueuedWire> {
        let idx = wire.as_raw() as usize;
        (self.stamp[idx] == self.epoch).then(|| &self.entries[idx])
    }

    pub fn insert(&mut self, qw: QueuedWire) {
        let idx = qw.wire.as_raw() as usize;
        self.entries[idx] = qw;
        self.stamp[idx] = self.epoch;
    }
}

/// Weighted best-first search state, reused across the sinks of one net.
#[derive(Debug)]
pub(crate) struct PathFinder {
    /// The net being routed; `None` for probe searches.
    net_name: Option<Ident>,
    ripup: bool,
    ripup_penalty: f64,
    pub visited: VisitMap,
    pub visit_cnt: u32,
    pub revisit_cnt: u32,
    pub overtime_revisit_cnt: u32,
}

impl PathFinder {
    pub fn new(wire_count: u32, net_name: Option<Ident>, ripup: bool, ripup_penalty: f64) -> Self {
        Self {
            net_name,
            ripup,
            ripup_penalty,
            visited: VisitMap::new(wire_count),
            visit_cnt: 0,
            revisit_cnt: 0,
            overtime_revisit_cnt: 0,
        }
    }

    /// Populates the visited map with the best arrival at every explored
    /// wire. If `dst_wire` is reachable under current availability and
    /// congestion policy it ends up present with its best [`QueuedWire`].
    ///
    /// After the destination is first settled the search continues for 50%
    /// additional edge examinations in case a cheaper path appears, then
    /// stops. This is a bounded-quality trade, not an exhaustive search.
    pub fn route(
        &mut self,
        proxy: &mut MutateHandle<'_>,
        scores: &RipupScoreboard,
        src_wires: &HashMap<WireId, f64>,
        dst_wire: WireId,
    ) {
        let mut queue: BinaryHeap<QueuedWire> = BinaryHeap::new();
        let epsilon = proxy.delay_epsilon();

        self.visited.clear();

        for (&wire, &delay) in src_wires {
            let qw = QueuedWire {
                wire,
                pip: None,
                delay,
                togo: proxy.estimate_delay(wire, dst_wire),
                randtag: proxy.rng(),
            };
            queue.push(qw);
            self.visited.insert(qw);
        }

        let mut this_visit_cnt: u32 = 0;
        let mut this_visit_cnt_limit: u32 = 0;

        while this_visit_cnt_limit == 0 || this_visit_cnt < this_visit_cnt_limit {
            let Some(qw) = queue.pop() else {
                break;
            };

            if this_visit_cnt_limit == 0 && self.visited.contains(dst_wire) {
                this_visit_cnt_limit = (this_visit_cnt * 3) / 2;
            }

            // Stale heap entry: a cheaper arrival has already been relaxed in.
            if let Some(best) = self.visited.get(qw.wire) {
                if best.delay < qw.delay {
                    continue;
                }
            }

            for &pip in proxy.pips_downhill(qw.wire) {
                let mut next_delay = qw.delay + proxy.pip_delay(pip).avg_ns();
                let next_wire = proxy.pip_dst_wire(pip);
                let mut found_ripup_net = false;
                this_visit_cnt += 1;

                if !proxy.check_wire_avail(next_wire) {
                    if !self.ripup {
                        continue;
                    }
                    // A structurally half-bound wire can report unavailable
                    // with no owning net; nothing to evict there.
                    let Some(wire_net) = proxy.conflicting_wire_net(next_wire) else {
                        continue;
                    };
                    if Some(wire_net) == self.net_name {
                        continue;
                    }

                    next_delay +=
                        (scores.wire_score(next_wire) as f64 * self.ripup_penalty) / 8.0;
                    next_delay +=
                        scores.net_wire_score(wire_net, next_wire) as f64 * self.ripup_penalty;
                    found_ripup_net = true;
                }

                if !proxy.check_pip_avail(pip) {
                    if !self.ripup {
                        continue;
                    }
                    let Some(pip_net) = proxy.conflicting_pip_net(pip) else {
                        continue;
                    };
                    if Some(pip_net) == self.net_name {
                        continue;
                    }

                    next_delay += (scores.pip_score(pip) as f64 * self.ripup_penalty) / 8.0;
                    next_delay += scores.net_pip_score(pip_net, pip) as f64 * self.ripup_penalty;
                    found_ripup_net = true;
                }

                if found_ripup_net {
                    next_delay += self.ripup_penalty;
                }

                assert!(next_delay >= 0.0);

                if let Some(prev) = self.visited.get(next_wire) {
                    if prev.delay <= next_delay + epsilon {
                        continue;
                    }
                    log::debug!(
                        "found better route to {}: old delay {:.3}, new {:.3}",
                        proxy.wire_name(next_wire),
                        prev.delay,
                        next_delay
                    );
                    if this_visit_cnt_limit == 0 {
                        self.revisit_cnt += 1;
                    } else {
                        self.overtime_revisit_cnt += 1;
                    }
                }

                let next_qw = QueuedWire {
                    wire: next_wire,
                    pip: Some(pip),
                    delay: next_delay,
                    togo: proxy.estimate_delay(next_wire, dst_wire),
                    randtag: proxy.rng(),
                };
                self.visited.insert(next_qw);
                queue.push(next_qw);
            }
        }

        self.visit_cnt += this_visit_cnt;
    }
}
