//! Routing engine for placed netlists.
//!
//! Connects each net's driver pin to its sink pins through the device's
//! routing fabric, using iterative rip-up-and-reroute with negotiated
//! congestion: conflicts are tentatively allowed in rip-up passes, penalized
//! through the [`RipupScoreboard`], and rerouted until no resource is
//! claimed by more than one net.

mod astar;
mod congestion;
mod net;
mod pathfinder;

pub use congestion::RipupScoreboard;
pub use pathfinder::route_all;

use crate::context::Context;
use weft_device::WireId;

/// Measures the best achievable delay from `src_wire` to `dst_wire` under
/// the current bindings, without binding anything.
///
/// Returns `None` if no path exists. Uses the same path search as net
/// routing (with rip-up disabled), so the result reflects what a routed
/// connection between the two wires would actually cost right now.
pub fn actual_route_delay(ctx: &mut Context, src_wire: WireId, dst_wire: WireId) -> Option<f64> {
    let router = net::NetRouter::route_wires(ctx, src_wire, dst_wire);
    if router.routed_okay {
        let entry = router
            .finder
            .visited
            .get(dst_wire)
            .expect("probe succeeded but destination is unvisited");
        Some(entry.delay)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_device::{Delay, FabricDevice};

    #[test]
    fn probe_measures_path_delay() {
        let mut dev = FabricDevice::new("probe");
        let s = dev.add_wire("S");
        let m = dev.add_wire("M");
        let d = dev.add_wire("D");
        dev.add_pip(s, m, Delay::uniform(2.0));
        dev.add_pip(m, d, Delay::uniform(3.0));
        let mut ctx = Context::new(Box::new(dev), 1);

        assert_eq!(actual_route_delay(&mut ctx, s, d), Some(5.0));
        // Unreachable in the reverse direction.
        assert_eq!(actual_route_delay(&mut ctx, d, s), None);
    }

    #[test]
    fn probe_is_repeatable() {
        let mut dev = FabricDevice::new("probe2");
        let s = dev.add_wire("S");
        let d = dev.add_wire("D");
        dev.add_pip(s, d, Delay::uniform(4.0));
        let mut ctx = Context::new(Box::new(dev), 9);

        let first = actual_route_delay(&mut ctx, s, d);
        let second = actual_route_delay(&mut ctx, s, d);
        assert_eq!(first, second);
        assert_eq!(first, Some(4.0));
    }
}
