//! ThinkPad Embedded Controller access over the legacy KCS-style
//! port interface.
//!
//! Layering is strict: `port` is the only module allowed to reach real
//! hardware, `kcs` implements the byte-level handshake on top of it,
//! and `regmap` gives the raw register space its ThinkPad meaning
//! (fan level, fan tachometer, temperature sensors).

#![forbid(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod hw;
pub mod kcs;
pub mod port;
pub mod regmap;
pub mod sim;

pub use error::{EcError, Stage};
pub use kcs::EcBus;
pub use port::{PortIo, RawPortIo};
pub use regmap::{Ec, FanLevel};
