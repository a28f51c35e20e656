//! Table-driven device model.
//!
//! [`FabricDevice`] holds explicit wire, PIP, and BEL tables built up through
//! its `add_*` methods. It backs the router's test scenarios and any device
//! family whose routing graph is loaded from data files rather than computed
//! on the fly.

use crate::ids::{BelId, PipId, WireId};
use crate::types::Delay;
use crate::Device;
use std::collections::HashMap;

#[derive(Debug)]
struct WireData {
    name: String,
}

#[derive(Debug)]
struct PipData {
    src: WireId,
    dst: WireId,
    delay: Delay,
}

#[derive(Debug)]
struct BelData {
    name: String,
    pins: HashMap<String, WireId>,
}

/// A device model backed by explicit resource tables.
///
/// Wires, PIPs, and BELs are registered one by one; downhill PIP lists are
/// maintained incrementally so [`Device::pips_downhill`] is a slice lookup.
/// The delay estimate defaults to zero (always admissible) and can be
/// overridden per wire pair for devices with meaningful placement geometry.
#[derive(Debug)]
pub struct FabricDevice {
    device: String,
    wires: Vec<WireData>,
    pips: Vec<PipData>,
    downhill: Vec<Vec<PipId>>,
    bels: Vec<BelData>,
    estimates: HashMap<(WireId, WireId), f64>,
    delay_epsilon: f64,
    ripup_penalty: f64,
}

impl FabricDevice {
    /// Creates an empty device with the given part name.
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            wires: Vec::new(),
            pips: Vec::new(),
            downhill: Vec::new(),
            bels: Vec::new(),
            estimates: HashMap::new(),
            delay_epsilon: 0.001,
            ripup_penalty: 5.0,
        }
    }

    /// Adds a wire and returns its handle.
    pub fn add_wire(&mut self, name: &str) -> WireId {
        let id = WireId::from_raw(self.wires.len() as u32);
        self.wires.push(WireData {
            name: name.to_string(),
        });
        self.downhill.push(Vec::new());
        id
    }

    /// Adds a PIP from `src` to `dst` and returns its handle.
    pub fn add_pip(&mut self, src: WireId, dst: WireId, delay: Delay) -> PipId {
        let id = PipId::from_raw(self.pips.len() as u32);
        self.pips.push(PipData { src, dst, delay });
        self.downhill[src.as_raw() as usize].push(id);
        id
    }

    /// Adds a BEL and returns its handle.
    pub fn add_bel(&mut self, name: &str) -> BelId {
        let id = BelId::from_raw(self.bels.len() as u32);
        self.bels.push(BelData {
            name: name.to_string(),
            pins: HashMap::new(),
        });
        id
    }

    /// Connects a BEL pin to a wire.
    pub fn set_bel_pin(&mut self, bel: BelId, pin: &str, wire: WireId) {
        self.bels[bel.as_raw() as usize]
            .pins
            .insert(pin.to_string(), wire);
    }

    /// Overrides the delay estimate for one (from, to) wire pair.
    pub fn set_estimate(&mut self, from: WireId, to: WireId, ns: f64) {
        self.estimates.insert((from, to), ns);
    }

    /// Sets the delay comparison slack.
    pub fn set_delay_epsilon(&mut self, epsilon: f64) {
        self.delay_epsilon = epsilon;
    }

    /// Sets the nominal rip-up penalty.
    pub fn set_ripup_penalty(&mut self, penalty: f64) {
        self.ripup_penalty = penalty;
    }
}

impl Device for FabricDevice {
    fn family_name(&self) -> &str {
        "fabric"
    }

    fn device_name(&self) -> &str {
        &self.device
    }

    fn wire_count(&self) -> u32 {
        self.wires.len() as u32
    }

    fn pip_count(&self) -> u32 {
        self.pips.len() as u32
    }

    fn estimate_delay(&self, from: WireId, to: WireId) -> f64 {
        self.estimates.get(&(from, to)).copied().unwrap_or(0.0)
    }

    fn pips_downhill(&self, wire: WireId) -> &[PipId] {
        &self.downhill[wire.as_raw() as usize]
    }

    fn pip_src_wire(&self, pip: PipId) -> WireId {
        self.pips[pip.as_raw() as usize].src
    }

    fn pip_dst_wire(&self, pip: PipId) -> WireId {
        self.pips[pip.as_raw() as usize].dst
    }

    fn pip_delay(&self, pip: PipId) -> Delay {
        self.pips[pip.as_raw() as usize].delay
    }

    fn delay_epsilon(&self) -> f64 {
        self.delay_epsilon
    }

    fn ripup_delay_penalty(&self) -> f64 {
        self.ripup_penalty
    }

    fn bel_pin_wire(&self, bel: BelId, pin: &str) -> WireId {
        self.bels[bel.as_raw() as usize]
            .pins
            .get(pin)
            .copied()
            .unwrap_or(WireId::NONE)
    }

    fn wire_name(&self, wire: WireId) -> &str {
        &self.wires[wire.as_raw() as usize].name
    }

    fn bel_name(&self, bel: BelId) -> &str {
        &self.bels[bel.as_raw() as usize].name
    }
}
