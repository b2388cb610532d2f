//! ThinkPad register-map semantics on top of the raw byte protocol.

use core::fmt;
use core::time::Duration;

use spin::Mutex;

use crate::error::EcError;
use crate::hw::{
    FAN_LEVEL_AUTO, FAN_LEVEL_FULL, FAN_LEVEL_MAX, FAN_RPM_LSB_REG, FAN_RPM_MSB_REG,
    FAN_STATUS_REG, TEMP_BASE_REG, TEMP_SENSOR_COUNT, TEMP_UNAVAILABLE,
};
use crate::kcs::EcBus;
use crate::port::PortIo;

/// Fan level accepted by the EC: a discrete step, full tilt, or
/// firmware-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanLevel {
    /// BIOS/EC automatic control.
    Auto,
    /// Maximum speed, unregulated.
    Full,
    /// Discrete level 0-7.
    Level(u8),
}

impl FanLevel {
    pub fn from_raw(raw: u8) -> Result<Self, EcError> {
        match raw {
            FAN_LEVEL_AUTO => Ok(FanLevel::Auto),
            FAN_LEVEL_FULL => Ok(FanLevel::Full),
            0..=FAN_LEVEL_MAX => Ok(FanLevel::Level(raw)),
            _ => Err(EcError::InvalidArgument("fan level out of range")),
        }
    }

    /// Register encoding. `Level` above 7 is a caller error, caught
    /// here so it never reaches the hardware.
    pub fn to_raw(self) -> Result<u8, EcError> {
        match self {
            FanLevel::Auto => Ok(FAN_LEVEL_AUTO),
            FanLevel::Full => Ok(FAN_LEVEL_FULL),
            FanLevel::Level(n) if n <= FAN_LEVEL_MAX => Ok(n),
            FanLevel::Level(_) => Err(EcError::InvalidArgument("fan level out of range")),
        }
    }
}

impl fmt::Display for FanLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanLevel::Auto => f.write_str("auto"),
            FanLevel::Full => f.write_str("full"),
            FanLevel::Level(n) => write!(f, "level {}", n),
        }
    }
}

/// Shared handle to the EC.
///
/// The mutex is the single in-process exclusion boundary around port
/// access: the EC is one hardware resource with no locking of its own,
/// and interleaved handshakes from two callers corrupt both. A guard
/// spans a whole transaction including its timeout path, and spans both
/// halves of an RPM read so the pair cannot tear.
pub struct Ec<P: PortIo> {
    bus: Mutex<EcBus<P>>,
}

impl<P: PortIo> Ec<P> {
    pub fn new(ports: P) -> Self {
        Self {
            bus: Mutex::new(EcBus::new(ports)),
        }
    }

    pub fn with_timeout(ports: P, timeout: Duration) -> Self {
        Self {
            bus: Mutex::new(EcBus::with_timeout(ports, timeout)),
        }
    }

    pub fn read_register(&self, offset: u8) -> Result<u8, EcError> {
        self.bus.lock().read_register(offset)
    }

    pub fn write_register(&self, offset: u8, value: u8) -> Result<(), EcError> {
        self.bus.lock().write_register(offset, value)
    }

    /// Raw fan-status byte, as the EC currently holds it.
    pub fn fan_level_raw(&self) -> Result<u8, EcError> {
        self.read_register(FAN_STATUS_REG)
    }

    /// Fan speed in RPM.
    ///
    /// LSB before MSB: the EC latches the pair on the LSB read, so the
    /// reverse order hands back stale or torn values. 0xFFFF means the
    /// tach has nothing to report and is returned as 0.
    pub fn fan_rpm(&self) -> Result<u16, EcError> {
        let mut bus = self.bus.lock();
        let lsb = bus.read_register(FAN_RPM_LSB_REG)?;
        let msb = bus.read_register(FAN_RPM_MSB_REG)?;
        let rpm = u16::from_le_bytes([lsb, msb]);
        Ok(if rpm == 0xFFFF { 0 } else { rpm })
    }

    /// Temperature of `sensor` (0-7) in whole degrees Celsius, or
    /// `None` when the sensor is absent or disabled (raw 0x80). The
    /// raw byte is two's-complement signed.
    pub fn temperature(&self, sensor: u8) -> Result<Option<i16>, EcError> {
        if sensor >= TEMP_SENSOR_COUNT {
            return Err(EcError::InvalidArgument("sensor index out of range"));
        }
        let raw = self.read_register(TEMP_BASE_REG + sensor)?;
        if raw == TEMP_UNAVAILABLE {
            return Ok(None);
        }
        Ok(Some(i16::from(raw as i8)))
    }

    pub fn set_fan_level(&self, level: FanLevel) -> Result<(), EcError> {
        let raw = level.to_raw()?;
        self.write_register(FAN_STATUS_REG, raw)
    }

    /// Hand back the underlying port access (test support).
    pub fn into_ports(self) -> P {
        self.bus.into_inner().into_ports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimEc;

    #[test]
    fn fan_rpm_combines_lsb_then_msb() {
        let mut sim = SimEc::new();
        sim.load(FAN_RPM_LSB_REG, 0x2C);
        sim.load(FAN_RPM_MSB_REG, 0x0B);
        let ec = Ec::new(sim);
        assert_eq!(ec.fan_rpm().unwrap(), 2860);
        let sim = ec.into_ports();
        assert_eq!(sim.read_log(), &[FAN_RPM_LSB_REG, FAN_RPM_MSB_REG]);
    }

    #[test]
    fn fan_rpm_all_ones_means_stopped() {
        let mut sim = SimEc::new();
        sim.load(FAN_RPM_LSB_REG, 0xFF);
        sim.load(FAN_RPM_MSB_REG, 0xFF);
        let ec = Ec::new(sim);
        assert_eq!(ec.fan_rpm().unwrap(), 0);
    }

    #[test]
    fn temperature_decodes_signed_bytes() {
        let mut sim = SimEc::new();
        sim.load(TEMP_BASE_REG, 0x46);
        sim.load(TEMP_BASE_REG + 3, 0xF6);
        let ec = Ec::new(sim);
        assert_eq!(ec.temperature(0).unwrap(), Some(70));
        assert_eq!(ec.temperature(3).unwrap(), Some(-10));
    }

    #[test]
    fn temperature_0x80_is_unavailable() {
        let mut sim = SimEc::new();
        sim.load(TEMP_BASE_REG + 2, TEMP_UNAVAILABLE);
        let ec = Ec::new(sim);
        assert_eq!(ec.temperature(2).unwrap(), None);
    }

    #[test]
    fn sensor_index_validated_before_port_access() {
        let ec = Ec::new(SimEc::new());
        assert_eq!(
            ec.temperature(TEMP_SENSOR_COUNT),
            Err(EcError::InvalidArgument("sensor index out of range"))
        );
        assert_eq!(ec.into_ports().port_ops(), 0);
    }

    #[test]
    fn fan_level_from_raw() {
        for raw in 0..=FAN_LEVEL_MAX {
            assert_eq!(FanLevel::from_raw(raw), Ok(FanLevel::Level(raw)));
        }
        assert_eq!(FanLevel::from_raw(FAN_LEVEL_FULL), Ok(FanLevel::Full));
        assert_eq!(FanLevel::from_raw(FAN_LEVEL_AUTO), Ok(FanLevel::Auto));
        assert!(FanLevel::from_raw(8).is_err());
        assert!(FanLevel::from_raw(0x10).is_err());
    }

    #[test]
    fn set_fan_level_writes_status_register() {
        let ec = Ec::new(SimEc::new());
        ec.set_fan_level(FanLevel::Level(3)).unwrap();
        assert_eq!(ec.read_register(FAN_STATUS_REG).unwrap(), 3);
        ec.set_fan_level(FanLevel::Auto).unwrap();
        assert_eq!(ec.read_register(FAN_STATUS_REG).unwrap(), FAN_LEVEL_AUTO);
        ec.set_fan_level(FanLevel::Full).unwrap();
        assert_eq!(ec.read_register(FAN_STATUS_REG).unwrap(), FAN_LEVEL_FULL);
    }

    #[test]
    fn invalid_fan_level_never_touches_ports() {
        let ec = Ec::new(SimEc::new());
        assert!(ec.set_fan_level(FanLevel::Level(9)).is_err());
        assert_eq!(ec.into_ports().port_ops(), 0);
    }
}
