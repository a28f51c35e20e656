//! Opaque ID newtypes for device routing resources.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`. Raw values are dense indices into the device's
//! resource tables, so `from_raw(0)` is a valid ID; the reserved `NONE`
//! sentinel is `u32::MAX`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// The "no such resource" sentinel.
            pub const NONE: Self = Self(u32::MAX);

            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns `true` if this is the `NONE` sentinel.
            pub fn is_none(self) -> bool {
                self.0 == u32::MAX
            }

            /// Returns `true` if this refers to an actual resource.
            pub fn is_some(self) -> bool {
                self.0 != u32::MAX
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a routing wire segment in the device fabric.
    WireId
);

define_id!(
    /// Opaque, copyable ID for a programmable interconnect point (PIP)
    /// joining two wires.
    PipId
);

define_id!(
    /// Opaque, copyable ID for a BEL (placed logic site) in the device.
    BelId
);
