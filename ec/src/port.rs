//! Port Access Layer: the only module permitted to reach I/O ports.

use tpfan_lib::io;

use crate::error::EcError;
use crate::hw::{EC_DATA_PORT, EC_STATUS_PORT};

/// Single-byte port access, the seam between the protocol engine and
/// the host. Implemented by [`RawPortIo`] for real hardware and by
/// [`crate::sim::SimEc`] for tests. Pure pass-through: no retries, no
/// interpretation of the bits.
pub trait PortIo {
    fn read_port(&mut self, port: u16) -> Result<u8, EcError>;
    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EcError>;
}

/// Pass-through to real `in`/`out` instructions.
///
/// Construction is the initialization contract: [`RawPortIo::acquire`]
/// either grants usable ports for the rest of the process lifetime or
/// fails fast with the `ioperm` errno. Without the privilege the ports
/// would read back garbage, so there is deliberately no way to build
/// this type unchecked.
pub struct RawPortIo {
    _priv: (),
}

impl RawPortIo {
    pub fn acquire() -> Result<Self, EcError> {
        for port in [EC_DATA_PORT, EC_STATUS_PORT] {
            io::request_port_access(port, 1).map_err(EcError::PortAccess)?;
        }
        Ok(Self { _priv: () })
    }
}

impl PortIo for RawPortIo {
    fn read_port(&mut self, port: u16) -> Result<u8, EcError> {
        // Access was granted in acquire(); the instruction itself
        // cannot fail.
        Ok(unsafe { io::inb(port) })
    }

    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EcError> {
        unsafe { io::outb(port, value) };
        Ok(())
    }
}
