//! Error types for routing operations.

use weft_common::InternalError;

/// Errors that can abort a routing invocation.
///
/// Soft per-net route misses are not errors; they feed the rip-up pipeline
/// internally. An error from [`route_all`](crate::route_all) means the
/// design, as placed, could not be routed at all.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// A net's driver or sink cell has no BEL assignment.
    #[error("cell {cell} ({ctype}) is not mapped to a bel")]
    UnplacedCell {
        /// The unplaced cell's name.
        cell: String,
        /// The cell's type.
        ctype: String,
    },

    /// A cell pin could not be resolved to a fabric wire.
    #[error("no wire found for port {port} on cell {cell} (bel {bel})")]
    NoPinWire {
        /// The cell's name.
        cell: String,
        /// The unresolvable port.
        port: String,
        /// The BEL the cell is placed on.
        bel: String,
    },

    /// A net failed to route even in rip-up mode.
    #[error("net {net} is impossible to route (sink wire {dest_wire})")]
    Unroutable {
        /// The unroutable net's name.
        net: String,
        /// The sink wire the rip-up search could not reach.
        dest_wire: String,
    },

    /// The rip-up loop hit its iteration cap without converging.
    #[error("routing did not converge after {iterations} iterations")]
    IterationLimit {
        /// Number of iterations attempted.
        iterations: u32,
    },

    /// The binding state failed a consistency check.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
