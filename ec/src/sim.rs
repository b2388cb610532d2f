//! Software model of the EC side of the KCS handshake.
//!
//! Test support. `SimEc` implements [`PortIo`] over a 256-byte register
//! file with enough state-machine fidelity to exercise the protocol
//! engine: command decode for the read/write commands, IBF latched on
//! every host byte and released while the byte is consumed, OBF raised
//! when a read produces data and dropped when the host takes it.
//!
//! Fault injection covers the failure modes the engine must report:
//! a permanently busy controller ([`SimEc::force_ibf`]), a controller
//! that stops consuming mid-transaction ([`SimEc::stall_after`]), and
//! one that never produces output ([`SimEc::wedge_obf`]).

use crate::error::EcError;
use crate::hw::{EC_DATA_PORT, EC_READ_CMD, EC_STATUS_PORT, EC_WRITE_CMD, EcStatus};
use crate::port::PortIo;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pending {
    Idle,
    ReadOffset,
    WriteOffset,
    WriteData(u8),
}

pub struct SimEc {
    regs: [u8; 256],
    pending: Pending,
    /// Byte the host wrote that the EC has not consumed yet (its port
    /// decides the meaning). IBF is set exactly while this is occupied.
    incoming: Option<(u16, u8)>,
    /// Output byte waiting for the host. OBF mirrors this.
    data_out: Option<u8>,
    /// Status reads a host byte sits unconsumed before the EC takes it.
    latency: u8,
    delay_left: u8,
    /// Host bytes consumed so far (commands, offsets, data).
    consumed: u32,
    stall_after: Option<u32>,
    force_ibf: bool,
    wedge_obf: bool,
    status_garbage: u8,
    port_ops: u32,
    write_counts: [u32; 256],
    read_log: Vec<u8>,
}

impl SimEc {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            pending: Pending::Idle,
            incoming: None,
            data_out: None,
            latency: 0,
            delay_left: 0,
            consumed: 0,
            stall_after: None,
            force_ibf: false,
            wedge_obf: false,
            status_garbage: 0,
            port_ops: 0,
            write_counts: [0; 256],
            read_log: Vec::new(),
        }
    }

    /// Preload a register value.
    pub fn load(&mut self, offset: u8, value: u8) {
        self.regs[offset as usize] = value;
    }

    pub fn register(&self, offset: u8) -> u8 {
        self.regs[offset as usize]
    }

    /// Total port operations seen, status reads included.
    pub fn port_ops(&self) -> u32 {
        self.port_ops
    }

    /// Completed register writes landing on `offset`.
    pub fn writes_to(&self, offset: u8) -> u32 {
        self.write_counts[offset as usize]
    }

    /// Register offsets read so far, in order.
    pub fn read_log(&self) -> &[u8] {
        &self.read_log
    }

    /// Make every host byte linger for `n` status reads before the EC
    /// consumes it, so poll loops actually iterate.
    pub fn set_latency(&mut self, n: u8) {
        self.latency = n;
    }

    /// OR'd into every status byte; exercises flag masking.
    pub fn set_status_garbage(&mut self, bits: u8) {
        self.status_garbage = bits;
    }

    /// Report IBF set on every status read, as a hung controller would.
    pub fn force_ibf(&mut self) {
        self.force_ibf = true;
    }

    /// Stop consuming host bytes after the first `n`; the next byte
    /// leaves IBF stuck for good.
    pub fn stall_after(&mut self, n: u32) {
        self.stall_after = Some(n);
    }

    /// Never raise OBF; read transactions stall at the data stage.
    pub fn wedge_obf(&mut self) {
        self.wedge_obf = true;
    }

    fn consume(&mut self, port: u16, byte: u8) {
        if port == EC_STATUS_PORT {
            self.pending = match byte {
                EC_READ_CMD => Pending::ReadOffset,
                EC_WRITE_CMD => Pending::WriteOffset,
                _ => Pending::Idle,
            };
            return;
        }
        match self.pending {
            Pending::ReadOffset => {
                if !self.wedge_obf {
                    self.data_out = Some(self.regs[byte as usize]);
                }
                self.read_log.push(byte);
                self.pending = Pending::Idle;
            }
            Pending::WriteOffset => {
                self.pending = Pending::WriteData(byte);
            }
            Pending::WriteData(offset) => {
                self.regs[offset as usize] = byte;
                self.write_counts[offset as usize] += 1;
                self.pending = Pending::Idle;
            }
            Pending::Idle => {}
        }
    }

    fn status_byte(&mut self) -> u8 {
        // The EC "runs" while the host polls: a pending byte is
        // consumed once its linger delay is used up. A wedged
        // controller never consumes anything.
        if self.incoming.is_some() && !self.force_ibf {
            if self.delay_left > 0 {
                self.delay_left -= 1;
            } else {
                let (port, byte) = self.incoming.take().unwrap();
                self.consume(port, byte);
                self.consumed += 1;
            }
        }
        let mut status = EcStatus::empty();
        if self.incoming.is_some() || self.force_ibf {
            status |= EcStatus::IBF;
        }
        if self.data_out.is_some() {
            status |= EcStatus::OBF;
        }
        status.bits() | self.status_garbage
    }
}

impl Default for SimEc {
    fn default() -> Self {
        Self::new()
    }
}

impl PortIo for SimEc {
    fn read_port(&mut self, port: u16) -> Result<u8, EcError> {
        self.port_ops += 1;
        match port {
            EC_STATUS_PORT => Ok(self.status_byte()),
            EC_DATA_PORT => Ok(self.data_out.take().unwrap_or(0)),
            _ => panic!("SimEc: read from unexpected port {:#x}", port),
        }
    }

    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EcError> {
        self.port_ops += 1;
        if port != EC_STATUS_PORT && port != EC_DATA_PORT {
            panic!("SimEc: write to unexpected port {:#x}", port);
        }
        if let Some(limit) = self.stall_after {
            if self.consumed >= limit {
                // The EC went deaf: latch IBF and never consume.
                self.incoming = Some((port, value));
                self.force_ibf = true;
                return Ok(());
            }
        }
        self.incoming = Some((port, value));
        self.delay_left = self.latency;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_after_configured_latency() {
        let mut sim = SimEc::new();
        sim.set_latency(3);
        sim.write_port(EC_STATUS_PORT, EC_READ_CMD).unwrap();
        // Three lingering polls, then the byte is taken.
        for _ in 0..3 {
            let status = sim.read_port(EC_STATUS_PORT).unwrap();
            assert_ne!(status & EcStatus::IBF.bits(), 0);
        }
        let status = sim.read_port(EC_STATUS_PORT).unwrap();
        assert_eq!(status & EcStatus::IBF.bits(), 0);
    }

    #[test]
    fn data_read_drops_obf() {
        let mut sim = SimEc::new();
        sim.load(0x05, 0x99);
        sim.write_port(EC_STATUS_PORT, EC_READ_CMD).unwrap();
        sim.read_port(EC_STATUS_PORT).unwrap();
        sim.write_port(EC_DATA_PORT, 0x05).unwrap();
        let status = sim.read_port(EC_STATUS_PORT).unwrap();
        assert_ne!(status & EcStatus::OBF.bits(), 0);
        assert_eq!(sim.read_port(EC_DATA_PORT).unwrap(), 0x99);
        let status = sim.read_port(EC_STATUS_PORT).unwrap();
        assert_eq!(status & EcStatus::OBF.bits(), 0);
    }
}
