//! Negotiated-congestion signal router for placed netlists.
//!
//! Given a netlist whose cells are already placed on device BELs, this crate
//! assigns every net a conflict-free tree of routing wires and PIPs. The
//! strategy is iterative rip-up-and-reroute: nets are first routed greedily,
//! failures are retried in a mode that may evict other nets from contested
//! resources, and a growing congestion penalty
//! ([`RipupScoreboard`](routing::RipupScoreboard)) steers repeat offenders
//! apart until the routing converges.
//!
//! # Usage
//!
//! ```
//! use weft_device::{Delay, FabricDevice};
//! use weft_route::{route_all, Context};
//!
//! let mut dev = FabricDevice::new("demo");
//! let s = dev.add_wire("S");
//! let d = dev.add_wire("D");
//! dev.add_pip(s, d, Delay::uniform(5.0));
//! let drv = dev.add_bel("DRV");
//! let snk = dev.add_bel("SNK");
//! dev.set_bel_pin(drv, "O", s);
//! dev.set_bel_pin(snk, "I", d);
//!
//! let mut ctx = Context::new(Box::new(dev), 42);
//! let c_drv = ctx.add_cell("u_drv", "LUT1", drv);
//! let c_snk = ctx.add_cell("u_snk", "DFF", snk);
//! let net = ctx.add_net("n0");
//! ctx.set_driver(net, c_drv, "O");
//! ctx.add_user(net, c_snk, "I");
//!
//! route_all(&mut ctx).unwrap();
//! assert!(!ctx.nets[&net].wires.is_empty());
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod data;
pub mod error;
pub mod routing;

pub use context::{Context, MutateHandle, ReadHandle, RngState};
pub use data::{BindingState, CellInfo, NetInfo, NetWire, PortRef};
pub use error::RouteError;
pub use routing::{actual_route_delay, route_all, RipupScoreboard};
