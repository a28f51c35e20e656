//! Per-net routing: source resolution, sink-by-sink path search, and the
//! binding back-trace.
//!
//! Routing a net either binds every sink's path through the proxy or leaves
//! the net fully unbound. In rip-up mode the back-trace may evict other
//! nets from contested resources; every evicted net is recorded so the
//! rip-up loop can requeue it.

use crate::context::Context;
use crate::error::RouteError;
use crate::routing::astar::PathFinder;
use crate::routing::congestion::RipupScoreboard;
use std::collections::{HashMap, HashSet};
use weft_common::Ident;
use weft_device::{Device, Strength, WireId};

/// The outcome of routing one net (or one probe search).
#[derive(Debug)]
pub(crate) struct NetRouter {
    pub finder: PathFinder,
    /// Nets evicted during rip-up back-traces, to be rerouted later.
    pub ripped_nets: HashSet<Ident>,
    pub routed_okay: bool,
    /// The sink wire a failed routing could not reach.
    pub failed_dest: WireId,
    /// Worst arrival delay over the net's sinks.
    pub max_delay: f64,
}

impl NetRouter {
    /// Routes all sinks of `net_name`, binding resources through the proxy.
    ///
    /// A path-search miss is reported through `routed_okay = false` with the
    /// net left fully unbound; missing placement data is a hard error.
    pub fn route_net(
        ctx: &mut Context,
        scores: &mut RipupScoreboard,
        net_name: Ident,
        ripup: bool,
        ripup_penalty: f64,
    ) -> Result<NetRouter, RouteError> {
        let mut finder = PathFinder::new(
            ctx.device().wire_count(),
            Some(net_name),
            ripup,
            ripup_penalty,
        );
        let mut ripped_nets = HashSet::new();
        let mut max_delay: f64 = 0.0;

        let mut proxy = ctx.rwproxy();

        log::debug!("routing net {}", proxy.name(net_name));

        let driver = proxy
            .net(net_name)
            .driver
            .expect("routing a net with no driver");

        let src_wire = {
            let cell = proxy.cell(driver.cell);
            if cell.bel.is_none() {
                return Err(RouteError::UnplacedCell {
                    cell: proxy.name(driver.cell).to_string(),
                    ctype: proxy.name(cell.ctype).to_string(),
                });
            }
            let wire = proxy.port_wire(driver.cell, driver.port);
            if wire.is_none() {
                return Err(RouteError::NoPinWire {
                    cell: proxy.name(driver.cell).to_string(),
                    port: proxy.name(driver.port).to_string(),
                    bel: proxy.bel_name(cell.bel).to_string(),
                });
            }
            wire
        };

        log::debug!("  source wire: {}", proxy.wire_name(src_wire));

        let mut src_wires: HashMap<WireId, f64> = HashMap::new();
        src_wires.insert(src_wire, 0.0);

        proxy.ripup_net(net_name);
        proxy.bind_wire(src_wire, net_name, Strength::Weak);

        let mut users = proxy.net(net_name).users.clone();
        proxy.shuffle(&mut users);

        for user in users {
            let dst_wire = {
                let cell = proxy.cell(user.cell);
                if cell.bel.is_none() {
                    return Err(RouteError::UnplacedCell {
                        cell: proxy.name(user.cell).to_string(),
                        ctype: proxy.name(cell.ctype).to_string(),
                    });
                }
                let wire = proxy.port_wire(user.cell, user.port);
                if wire.is_none() {
                    return Err(RouteError::NoPinWire {
                        cell: proxy.name(user.cell).to_string(),
                        port: proxy.name(user.port).to_string(),
                        bel: proxy.bel_name(cell.bel).to_string(),
                    });
                }
                wire
            };

            log::debug!("  route to: {}", proxy.wire_name(dst_wire));

            finder.route(&mut proxy, scores, &src_wires, dst_wire);

            if !finder.visited.contains(dst_wire) {
                if ripup {
                    log::info!(
                        "failed to route {} -> {}",
                        proxy.wire_name(src_wire),
                        proxy.wire_name(dst_wire)
                    );
                } else {
                    log::debug!(
                        "failed to route {} -> {}",
                        proxy.wire_name(src_wire),
                        proxy.wire_name(dst_wire)
                    );
                }
                proxy.ripup_net(net_name);
                return Ok(NetRouter {
                    finder,
                    ripped_nets,
                    routed_okay: false,
                    failed_dest: dst_wire,
                    max_delay,
                });
            }

            let arrival = finder
                .visited
                .get(dst_wire)
                .expect("destination settled but absent from the visited map")
                .delay;
            log::debug!("  final path delay: {arrival:.3}");
            max_delay = max_delay.max(arrival);

            let mut cursor = dst_wire;
            while !src_wires.contains_key(&cursor) {
                if let Some(conflict) = proxy.conflicting_wire_net(cursor) {
                    assert!(ripup, "wire conflict survived a non-ripup search");
                    assert_ne!(conflict, net_name);

                    proxy.unbind_wire(cursor);

                    ripped_nets.insert(conflict);
                    scores.bump_wire(cursor);
                    scores.bump_net_wire(net_name, cursor);
                    scores.bump_net_wire(conflict, cursor);
                }

                let entry = *finder
                    .visited
                    .get(cursor)
                    .expect("back-trace stepped off the visited map");
                let pip = entry.pip.expect("non-source wire settled without a pip");

                if let Some(conflict) = proxy.conflicting_pip_net(pip) {
                    assert!(ripup, "pip conflict survived a non-ripup search");
                    assert_ne!(conflict, net_name);

                    proxy.unbind_pip(pip);

                    ripped_nets.insert(conflict);
                    scores.bump_pip(pip);
                    scores.bump_net_pip(net_name, pip);
                    scores.bump_net_pip(conflict, pip);
                }

                proxy.bind_pip(pip, net_name, Strength::Weak);
                // Later sinks may branch off anywhere along this path.
                src_wires.insert(cursor, entry.delay);
                cursor = proxy.pip_src_wire(pip);
            }
        }

        Ok(NetRouter {
            finder,
            ripped_nets,
            routed_okay: true,
            failed_dest: WireId::NONE,
            max_delay,
        })
    }

    /// Probe search between two wires: no net, no rip-up, no binding.
    pub fn route_wires(ctx: &mut Context, src_wire: WireId, dst_wire: WireId) -> NetRouter {
        let scores = RipupScoreboard::new();
        let mut finder = PathFinder::new(ctx.device().wire_count(), None, false, 0.0);
        let mut src_wires = HashMap::new();
        src_wires.insert(src_wire, 0.0);

        {
            let mut proxy = ctx.rwproxy();
            finder.route(&mut proxy, &scores, &src_wires, dst_wire);

            if log::log_enabled!(log::Level::Debug) && finder.visited.contains(dst_wire) {
                log::debug!("route (from destination to source):");
                let mut cursor = dst_wire;
                loop {
                    let entry = finder.visited.get(cursor).expect("path left visited map");
                    log::debug!("  {:8.3} {}", entry.delay, proxy.wire_name(cursor));
                    if cursor == src_wire {
                        break;
                    }
                    let pip = entry.pip.expect("non-source wire settled without a pip");
                    cursor = proxy.pip_src_wire(pip);
                }
            }
        }

        let routed_okay = finder.visited.contains(dst_wire);
        NetRouter {
            finder,
            ripped_nets: HashSet::new(),
            routed_okay,
            failed_dest: WireId::NONE,
            max_delay: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_device::{BelId, Delay, FabricDevice, PipId};

    // Chain device: DRV.O -> S -> (pip 5ns) -> D <- SNK.I, with bels wired up.
    fn chain_ctx() -> (Context, Ident, WireId, WireId, PipId) {
        let mut dev = FabricDevice::new("chain");
        let s = dev.add_wire("S");
        let d = dev.add_wire("D");
        let p = dev.add_pip(s, d, Delay::uniform(5.0));
        let drv = dev.add_bel("DRV");
        let snk = dev.add_bel("SNK");
        dev.set_bel_pin(drv, "O", s);
        dev.set_bel_pin(snk, "I", d);

        let mut ctx = Context::new(Box::new(dev), 1);
        let c_drv = ctx.add_cell("u_drv", "LUT1", drv);
        let c_snk = ctx.add_cell("u_snk", "DFF", snk);
        let net = ctx.add_net("n0");
        ctx.set_driver(net, c_drv, "O");
        ctx.add_user(net, c_snk, "I");
        (ctx, net, s, d, p)
    }

    #[test]
    fn routes_single_sink_net() {
        let (mut ctx, net, s, d, p) = chain_ctx();
        let mut scores = RipupScoreboard::new();
        let router = NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap();

        assert!(router.routed_okay);
        assert_eq!(router.max_delay, 5.0);
        assert_eq!(router.finder.visit_cnt, 1);
        assert_eq!(router.finder.revisit_cnt, 0);
        assert!(router.ripped_nets.is_empty());

        let wires = &ctx.nets[&net].wires;
        assert_eq!(wires.len(), 2);
        assert_eq!(wires[&s].pip, None);
        assert_eq!(wires[&d].pip, Some(p));
        ctx.check().unwrap();
    }

    #[test]
    fn unplaced_driver_is_hard_error() {
        let (mut ctx, net, ..) = chain_ctx();
        let floating = ctx.add_cell("u_float", "LUT1", BelId::NONE);
        ctx.set_driver(net, floating, "O");

        let mut scores = RipupScoreboard::new();
        let err = NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap_err();
        assert!(matches!(err, RouteError::UnplacedCell { .. }));
    }

    #[test]
    fn unmapped_pin_is_hard_error() {
        let (mut ctx, net, ..) = chain_ctx();
        let drv_cell = ctx.id("u_drv");
        // Remap the driver port to a pin the BEL does not have.
        ctx.set_cell_pin_map(drv_cell, "O", "O6");

        let mut scores = RipupScoreboard::new();
        let err = NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap_err();
        match err {
            RouteError::NoPinWire { cell, port, bel } => {
                assert_eq!(cell, "u_drv");
                assert_eq!(port, "O");
                assert_eq!(bel, "DRV");
            }
            other => panic!("expected NoPinWire, got {other}"),
        }
    }

    #[test]
    fn unreachable_sink_leaves_net_unbound() {
        let mut dev = FabricDevice::new("island");
        let s = dev.add_wire("S");
        let d = dev.add_wire("D");
        // No pip joins the two wires.
        let drv = dev.add_bel("DRV");
        let snk = dev.add_bel("SNK");
        dev.set_bel_pin(drv, "O", s);
        dev.set_bel_pin(snk, "I", d);

        let mut ctx = Context::new(Box::new(dev), 1);
        let c_drv = ctx.add_cell("u_drv", "LUT1", drv);
        let c_snk = ctx.add_cell("u_snk", "DFF", snk);
        let net = ctx.add_net("n0");
        ctx.set_driver(net, c_drv, "O");
        ctx.add_user(net, c_snk, "I");

        let mut scores = RipupScoreboard::new();
        let router = NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap();
        assert!(!router.routed_okay);
        assert_eq!(router.failed_dest, d);
        assert!(ctx.nets[&net].wires.is_empty());
        ctx.check().unwrap();
    }

    #[test]
    fn reroute_is_idempotent_ripup() {
        let (mut ctx, net, ..) = chain_ctx();
        let mut scores = RipupScoreboard::new();
        NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap();
        let first = ctx.checksum();
        // Routing again rips up the previous binding and rebuilds it.
        NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap();
        assert_eq!(ctx.checksum(), first);
        ctx.check().unwrap();
    }

    #[test]
    fn ripup_mode_evicts_and_records_conflicting_net() {
        let (mut ctx, net, _s, d, p) = chain_ctx();
        let squatter = ctx.add_net("squatter");
        ctx.rwproxy().bind_pip(p, squatter, Strength::Weak);

        let mut scores = RipupScoreboard::new();
        let router = NetRouter::route_net(&mut ctx, &mut scores, net, true, 5.0).unwrap();

        assert!(router.routed_okay);
        assert!(router.ripped_nets.contains(&squatter));
        assert!(ctx.nets[&squatter].wires.is_empty());
        assert_eq!(ctx.nets[&net].wires[&d].pip, Some(p));
        assert_eq!(scores.wire_score(d), 1);
        assert_eq!(scores.net_wire_score(net, d), 1);
        assert_eq!(scores.net_wire_score(squatter, d), 1);
        ctx.check().unwrap();
    }

    #[test]
    fn multi_sink_reuses_spine() {
        // DRV.O -> S -> W (2ns), then W -> D1 (1ns) and W -> D2 (1ns).
        let mut dev = FabricDevice::new("fanout");
        let s = dev.add_wire("S");
        let w = dev.add_wire("W");
        let d1 = dev.add_wire("D1");
        let d2 = dev.add_wire("D2");
        let p_sw = dev.add_pip(s, w, Delay::uniform(2.0));
        dev.add_pip(w, d1, Delay::uniform(1.0));
        dev.add_pip(w, d2, Delay::uniform(1.0));
        let drv = dev.add_bel("DRV");
        let k1 = dev.add_bel("K1");
        let k2 = dev.add_bel("K2");
        dev.set_bel_pin(drv, "O", s);
        dev.set_bel_pin(k1, "I", d1);
        dev.set_bel_pin(k2, "I", d2);

        let mut ctx = Context::new(Box::new(dev), 1);
        let c_drv = ctx.add_cell("u_drv", "LUT1", drv);
        let c_k1 = ctx.add_cell("u_k1", "DFF", k1);
        let c_k2 = ctx.add_cell("u_k2", "DFF", k2);
        let net = ctx.add_net("fan");
        ctx.set_driver(net, c_drv, "O");
        ctx.add_user(net, c_k1, "I");
        ctx.add_user(net, c_k2, "I");

        let mut scores = RipupScoreboard::new();
        let router = NetRouter::route_net(&mut ctx, &mut scores, net, false, 0.0).unwrap();
        assert!(router.routed_okay);
        assert_eq!(router.max_delay, 3.0);

        // One shared spine pip plus one branch pip per sink; four wires total.
        let wires = &ctx.nets[&net].wires;
        assert_eq!(wires.len(), 4);
        assert_eq!(wires[&w].pip, Some(p_sw));
        ctx.check().unwrap();
    }

    #[test]
    fn probe_reaches_without_binding() {
        let (mut ctx, _, s, d, _) = chain_ctx();
        let before = ctx.checksum();
        let router = NetRouter::route_wires(&mut ctx, s, d);
        assert!(router.routed_okay);
        assert_eq!(router.finder.visited.get(d).unwrap().delay, 5.0);
        assert_eq!(ctx.checksum(), before);
        assert!(ctx.nets.values().all(|n| n.wires.is_empty()));
    }
}
