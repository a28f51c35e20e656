//! Device routing-graph models for the weft router.
//!
//! This crate provides the [`Device`] trait that abstracts over FPGA device
//! families for routing purposes: wire/PIP connectivity, delay queries, and
//! BEL pin resolution. The router core talks to the device exclusively
//! through this trait.
//!
//! A table-driven implementation, [`FabricDevice`], is provided for tests
//! and for device families whose routing graph is loaded from data files.

#![warn(missing_docs)]

pub mod fabric;
pub mod ids;
pub mod types;

pub use fabric::FabricDevice;
pub use ids::{BelId, PipId, WireId};
pub use types::{Delay, Strength};

/// The query interface between a device model and the router core.
///
/// Wires and PIPs are identified by dense `u32` handles; `wire_count` and
/// `pip_count` bound the valid ranges so the router can use flat arrays
/// keyed by raw ID. All queries are read-only; net-to-resource bindings are
/// owned by the routing context, not the device.
pub trait Device: std::fmt::Debug {
    /// Returns the canonical family name (e.g., "fabric").
    fn family_name(&self) -> &str;

    /// Returns the device part name.
    fn device_name(&self) -> &str;

    /// Returns the number of wires in the device. Valid wire handles are
    /// `0..wire_count()`.
    fn wire_count(&self) -> u32;

    /// Returns the number of PIPs in the device. Valid PIP handles are
    /// `0..pip_count()`.
    fn pip_count(&self) -> u32;

    /// Estimates the minimum achievable delay between two wires.
    ///
    /// Used as the search heuristic. Must not overestimate the true minimum
    /// arrival delay, or the path search may settle suboptimal routes.
    fn estimate_delay(&self, from: WireId, to: WireId) -> f64;

    /// Returns the PIPs whose source is the given wire.
    fn pips_downhill(&self, wire: WireId) -> &[PipId];

    /// Returns the wire driving the given PIP.
    fn pip_src_wire(&self, pip: PipId) -> WireId;

    /// Returns the wire driven by the given PIP.
    fn pip_dst_wire(&self, pip: PipId) -> WireId;

    /// Returns the delay through the given PIP.
    fn pip_delay(&self, pip: PipId) -> Delay;

    /// Returns the slack used when comparing two path delays for equality.
    fn delay_epsilon(&self) -> f64;

    /// Returns the nominal penalty added to contested resources during
    /// rip-up routing. The rip-up loop escalates in multiples of this value.
    fn ripup_delay_penalty(&self) -> f64;

    /// Resolves a BEL pin to the wire it connects to.
    ///
    /// Returns [`WireId::NONE`] if the BEL has no such pin or the pin is
    /// not routed to the general fabric.
    fn bel_pin_wire(&self, bel: BelId, pin: &str) -> WireId;

    /// Returns the name of a wire, for logging.
    fn wire_name(&self, wire: WireId) -> &str;

    /// Returns the name of a BEL, for logging.
    fn bel_name(&self, bel: BelId) -> &str;
}
