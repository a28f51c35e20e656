//! Shared foundational types used across the weft router workspace.
//!
//! This crate provides interned identifiers, a state checksum for
//! reproducibility reporting, and common result types.

#![warn(missing_docs)]

pub mod checksum;
pub mod ident;
pub mod result;

pub use checksum::Checksum;
pub use ident::{Ident, Interner};
pub use result::{InternalError, WeftResult};
