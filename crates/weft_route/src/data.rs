//! The routing view of a placed netlist.
//!
//! Defines the net/cell records the router reads and the binding state it
//! mutates: each net knows the wires it currently occupies and the PIP that
//! drives each of them, while reverse maps answer "who owns this resource"
//! in O(1) for conflict detection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_common::Ident;
use weft_device::{BelId, PipId, Strength, WireId};

/// A reference to one pin of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// The cell's name.
    pub cell: Ident,
    /// The logical port on that cell.
    pub port: Ident,
}

/// A placed cell, as the router sees it.
///
/// `pins` maps logical port names to physical BEL pin names for cells whose
/// placement remapped ports (e.g. LUT input permutation). Ports absent from
/// the map resolve to themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellInfo {
    /// The cell's name.
    pub name: Ident,
    /// The cell's type, for error reporting.
    pub ctype: Ident,
    /// The BEL this cell is placed on; [`BelId::NONE`] if unplaced.
    pub bel: BelId,
    /// Logical port name to physical pin name remapping.
    pub pins: HashMap<Ident, Ident>,
}

/// How one wire of a net is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetWire {
    /// The PIP driving this wire, or `None` for the net's source wire.
    pub pip: Option<PipId>,
    /// The binding strength recorded when the wire was claimed.
    pub strength: Strength,
}

/// A logical net: one driver, one or more users, and its current routing.
///
/// `wires` is the authoritative set of fabric resources bound to this net.
/// An unrouted net has an empty `wires` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetInfo {
    /// The net's name.
    pub name: Ident,
    /// The pin driving this net, if known.
    pub driver: Option<PortRef>,
    /// The pins this net fans out to.
    pub users: Vec<PortRef>,
    /// Wires currently bound to this net, with the PIP driving each.
    pub wires: HashMap<WireId, NetWire>,
}

/// Reverse resource-to-net maps, kept in lockstep with [`NetInfo::wires`].
#[derive(Debug, Clone, Default)]
pub struct BindingState {
    pub(crate) wire_to_net: HashMap<WireId, Ident>,
    pub(crate) pip_to_net: HashMap<PipId, Ident>,
}

impl BindingState {
    /// Creates an empty binding state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound wires.
    pub fn bound_wire_count(&self) -> usize {
        self.wire_to_net.len()
    }

    /// Number of bound PIPs.
    pub fn bound_pip_count(&self) -> usize {
        self.pip_to_net.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrouted_net_has_no_wires() {
        let net = NetInfo {
            name: Ident::from_raw(0),
            driver: None,
            users: Vec::new(),
            wires: HashMap::new(),
        };
        assert!(net.wires.is_empty());
    }

    #[test]
    fn portref_equality() {
        let a = PortRef {
            cell: Ident::from_raw(1),
            port: Ident::from_raw(2),
        };
        let b = PortRef {
            cell: Ident::from_raw(1),
            port: Ident::from_raw(2),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn empty_binding_state() {
        let b = BindingState::new();
        assert_eq!(b.bound_wire_count(), 0);
        assert_eq!(b.bound_pip_count(), 0);
    }
}
