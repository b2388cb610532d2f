//! KCS-style handshake with the embedded controller.
//!
//! Every transaction is a fixed sequence of port operations interleaved
//! with bounded busy-wait polls on the status flags. The invariant: IBF
//! must be observed clear before any byte goes to the EC, and OBF must
//! be observed set before a byte is consumed from it. The EC offers no
//! recovery path, so getting the ordering wrong desynchronizes its
//! state machine for every transaction that follows.

use core::hint::spin_loop;
use core::time::Duration;
use std::time::Instant;

use crate::error::{EcError, Stage};
use crate::hw::{
    EC_COMMAND_PORT, EC_DATA_PORT, EC_POLL_TIMEOUT, EC_READ_CMD, EC_STATUS_PORT, EC_WRITE_CMD,
    EcStatus,
};
use crate::port::PortIo;

/// The protocol engine. Single-threaded and blocking: a transaction
/// runs to completion (or timeout) on the calling thread, with no
/// suspension point other than the spin-wait itself.
pub struct EcBus<P: PortIo> {
    ports: P,
    timeout: Duration,
}

impl<P: PortIo> EcBus<P> {
    pub fn new(ports: P) -> Self {
        Self::with_timeout(ports, EC_POLL_TIMEOUT)
    }

    pub fn with_timeout(ports: P, timeout: Duration) -> Self {
        Self { ports, timeout }
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn into_ports(self) -> P {
        self.ports
    }

    fn status(&mut self) -> Result<EcStatus, EcError> {
        let raw = self.ports.read_port(EC_STATUS_PORT)?;
        Ok(EcStatus::from_bits_truncate(raw))
    }

    /// Spin until IBF clears. No sleeping: the wait window is short and
    /// latency matters more than the CPU burned inside it. At least one
    /// status read happens even with a zero timeout.
    fn wait_ibf_clear(&mut self, stage: Stage) -> Result<(), EcError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if !self.status()?.contains(EcStatus::IBF) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EcError::Timeout(stage));
            }
            spin_loop();
        }
    }

    /// Spin until OBF sets, same deadline rules as [`Self::wait_ibf_clear`].
    fn wait_obf_set(&mut self, stage: Stage) -> Result<(), EcError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if self.status()?.contains(EcStatus::OBF) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EcError::Timeout(stage));
            }
            spin_loop();
        }
    }

    /// Read one byte from EC register `offset`.
    pub fn read_register(&mut self, offset: u8) -> Result<u8, EcError> {
        self.wait_ibf_clear(Stage::IbfBeforeReadCmd)?;
        self.ports.write_port(EC_COMMAND_PORT, EC_READ_CMD)?;
        self.wait_ibf_clear(Stage::IbfBeforeOffset)?;
        self.ports.write_port(EC_DATA_PORT, offset)?;
        self.wait_obf_set(Stage::ObfAfterOffset)?;
        let value = self.ports.read_port(EC_DATA_PORT)?;
        // One more status read so the hardware drops OBF; the next
        // transaction must start from a clean state.
        let _ = self.ports.read_port(EC_STATUS_PORT)?;
        Ok(value)
    }

    /// Write one byte to EC register `offset`.
    pub fn write_register(&mut self, offset: u8, value: u8) -> Result<(), EcError> {
        self.wait_ibf_clear(Stage::IbfBeforeWriteCmd)?;
        self.ports.write_port(EC_COMMAND_PORT, EC_WRITE_CMD)?;
        self.wait_ibf_clear(Stage::IbfAfterWriteCmd)?;
        self.ports.write_port(EC_DATA_PORT, offset)?;
        self.wait_ibf_clear(Stage::IbfAfterOffset)?;
        self.ports.write_port(EC_DATA_PORT, value)?;
        // The final wait confirms the EC consumed the data byte.
        self.wait_ibf_clear(Stage::IbfAfterData)
    }
}
