//! The outer rip-up-and-reroute scheduler.
//!
//! Each iteration routes the queued nets in two passes: first with rip-up
//! disabled (pass A), then retrying the failures with rip-up enabled
//! (pass B). Nets evicted during pass B go back on the queue for the next
//! iteration. The rip-up penalty grows on a fixed schedule, so resources
//! contested across many iterations become expensive enough that one of the
//! contenders eventually routes around them.

use crate::context::Context;
use crate::error::RouteError;
use crate::routing::congestion::RipupScoreboard;
use crate::routing::net::NetRouter;
use std::collections::HashSet;
use weft_common::Ident;
use weft_device::Device;

/// Maximum number of rip-up iterations before declaring failure.
const MAX_ITERATIONS: u32 = 200;

/// Iterations at whose end the rip-up penalty grows by another nominal step.
const PENALTY_BOOST_ITERATIONS: [u32; 5] = [8, 16, 32, 64, 128];

/// Routes every unrouted net in the context.
///
/// A net is unrouted if it has a driver and occupies no wires. On success
/// every such net is fully bound; on error the binding state may hold a
/// partial routing, which the caller is expected to discard.
pub fn route_all(ctx: &mut Context) -> Result<(), RouteError> {
    let mut scores = RipupScoreboard::new();
    let mut ripup_penalty = ctx.device().ripup_delay_penalty();

    log::info!("routing..");

    let mut nets_queue: HashSet<Ident> = ctx
        .nets
        .iter()
        .filter(|(_, net)| net.driver.is_some() && net.wires.is_empty())
        .map(|(&name, _)| name)
        .collect();

    if nets_queue.is_empty() {
        log::info!("found no unrouted nets. no routing necessary.");
        return Ok(());
    }

    log::info!(
        "found {} unrouted nets. starting routing procedure.",
        nets_queue.len()
    );

    // Lower bound on total path delay from the heuristic alone, logged so a
    // wildly off final delay is visible without a timing analyzer.
    let mut estimated_total = 0.0f64;
    let mut estimated_cnt = 0u32;
    {
        let proxy = ctx.rproxy();
        for &net_name in &nets_queue {
            let net = proxy.net(net_name);
            let Some(driver) = net.driver else { continue };
            if proxy.cell(driver.cell).bel.is_none() {
                continue;
            }
            let src_wire = proxy.port_wire(driver.cell, driver.port);
            if src_wire.is_none() {
                continue;
            }
            for user in &net.users {
                if proxy.cell(user.cell).bel.is_none() {
                    continue;
                }
                let dst_wire = proxy.port_wire(user.cell, user.port);
                if dst_wire.is_none() {
                    continue;
                }
                estimated_total += proxy.device().estimate_delay(src_wire, dst_wire);
                estimated_cnt += 1;
            }
        }
    }
    if estimated_cnt > 0 {
        log::info!(
            "estimated total wire delay: {:.2} (avg {:.2})",
            estimated_total,
            estimated_total / estimated_cnt as f64
        );
    }

    let mut iter_cnt: u32 = 0;
    let mut total_visit_cnt: u64 = 0;
    let mut total_revisit_cnt: u64 = 0;
    let mut total_overtime_revisit_cnt: u64 = 0;

    while !nets_queue.is_empty() {
        if iter_cnt == MAX_ITERATIONS {
            log::warn!("giving up after {iter_cnt} iterations.");
            log::info!("checksum: {}", ctx.checksum());
            if cfg!(debug_assertions) {
                ctx.check()?;
            }
            return Err(RouteError::IterationLimit {
                iterations: iter_cnt,
            });
        }

        iter_cnt += 1;
        if ctx.verbose {
            log::info!("-- {iter_cnt} --");
        }

        let mut visit_cnt: u64 = 0;
        let mut revisit_cnt: u64 = 0;
        let mut overtime_revisit_cnt: u64 = 0;
        let mut net_cnt: usize = 0;
        let mut ripup_queue: HashSet<Ident> = HashSet::new();

        if ctx.verbose || iter_cnt == 1 {
            log::info!("routing queue contains {} nets.", nets_queue.len());
        }

        let mut nets_array: Vec<Ident> = nets_queue.drain().collect();
        ctx.sorted_shuffle(&mut nets_array);

        for net_name in nets_array {
            let router = NetRouter::route_net(ctx, &mut scores, net_name, false, 0.0)?;

            net_cnt += 1;
            visit_cnt += router.finder.visit_cnt as u64;
            revisit_cnt += router.finder.revisit_cnt as u64;
            overtime_revisit_cnt += router.finder.overtime_revisit_cnt as u64;

            if !router.routed_okay {
                log::debug!(
                    "  failed to route net {} to {}.",
                    ctx.name(net_name),
                    ctx.device().wire_name(router.failed_dest)
                );
                ripup_queue.insert(net_name);
            }
        }

        let normal_route_cnt = net_cnt - ripup_queue.len();
        if ctx.verbose || iter_cnt == 1 {
            log::info!(
                "  processed {} nets. ({} routed, {} failed)",
                net_cnt,
                normal_route_cnt,
                ripup_queue.len()
            );
        }
        if ctx.verbose && visit_cnt > 0 {
            log::info!(
                "  visited {} pips ({:.2}% revisits, {:.2}% overtime revisits).",
                visit_cnt,
                (100.0 * revisit_cnt as f64) / visit_cnt as f64,
                (100.0 * overtime_revisit_cnt as f64) / visit_cnt as f64
            );
        }

        if !ripup_queue.is_empty() {
            if ctx.verbose || iter_cnt == 1 {
                log::info!(
                    "failed to route {} nets. re-routing in ripup mode.",
                    ripup_queue.len()
                );
            }

            let mut ripup_array: Vec<Ident> = ripup_queue.iter().copied().collect();
            ctx.sorted_shuffle(&mut ripup_array);

            let mut rip_cnt: usize = 0;
            for net_name in ripup_array {
                let router = NetRouter::route_net(ctx, &mut scores, net_name, true, ripup_penalty)?;

                visit_cnt += router.finder.visit_cnt as u64;
                revisit_cnt += router.finder.revisit_cnt as u64;
                overtime_revisit_cnt += router.finder.overtime_revisit_cnt as u64;

                if !router.routed_okay {
                    if cfg!(debug_assertions) {
                        ctx.check()?;
                    }
                    return Err(RouteError::Unroutable {
                        net: ctx.name(net_name).to_string(),
                        dest_wire: ctx.device().wire_name(router.failed_dest).to_string(),
                    });
                }

                rip_cnt += router.ripped_nets.len();
                for ripped in router.ripped_nets {
                    nets_queue.insert(ripped);
                }
            }

            if ctx.verbose {
                log::info!("  routed {} nets, ripped {rip_cnt} nets.", ripup_queue.len());
                if !nets_queue.is_empty() {
                    log::info!(
                        "  ripped up {} previously routed nets. continue routing.",
                        nets_queue.len()
                    );
                }
            }
        }

        if !ctx.verbose {
            log::info!(
                "iteration {iter_cnt}: routed {normal_route_cnt} nets without ripup, \
                 routed {} nets with ripup.",
                ripup_queue.len()
            );
        }

        total_visit_cnt += visit_cnt;
        total_revisit_cnt += revisit_cnt;
        total_overtime_revisit_cnt += overtime_revisit_cnt;

        if PENALTY_BOOST_ITERATIONS.contains(&iter_cnt) {
            ripup_penalty += ctx.device().ripup_delay_penalty();
        }
    }

    log::info!("routing complete after {iter_cnt} iterations.");
    if total_visit_cnt > 0 {
        log::info!(
            "visited {} pips ({:.2}% revisits, {:.2}% overtime revisits).",
            total_visit_cnt,
            (100.0 * total_revisit_cnt as f64) / total_visit_cnt as f64,
            (100.0 * total_overtime_revisit_cnt as f64) / total_visit_cnt as f64
        );
    }
    log::info!("checksum: {}", ctx.checksum());
    if cfg!(debug_assertions) {
        ctx.check()?;
    }
    Ok(())
}
