//! ThinkPad EC port and register definitions.
//!
//! Port interface per the standard KCS layout; register offsets per the
//! Linux kernel's thinkpad_acpi driver. These must match the hardware
//! exactly; nothing here is probed or auto-detected.

use core::time::Duration;

use bitflags::bitflags;

// ============================================================================
// KCS Interface Ports
// ============================================================================

/// EC data port - carries register offsets and data bytes both ways
pub const EC_DATA_PORT: u16 = 0x62;
/// EC status port (read) / command port (write)
pub const EC_STATUS_PORT: u16 = 0x66;
/// EC command port (alias for writes to the status port)
pub const EC_COMMAND_PORT: u16 = 0x66;

/// Read-register command
pub const EC_READ_CMD: u8 = 0x80;
/// Write-register command
pub const EC_WRITE_CMD: u8 = 0x81;

bitflags! {
    /// Flags in the EC status byte. Transient: re-derived from every
    /// status read, never cached.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EcStatus: u8 {
        /// Output buffer full: the EC has a byte waiting on the data port.
        const OBF = 0x01;
        /// Input buffer full: the EC has not yet consumed our last byte.
        const IBF = 0x02;
    }
}

// ============================================================================
// ThinkPad EC Register Offsets
// ============================================================================

/// Fan level: 0-7, `FAN_LEVEL_FULL`, or `FAN_LEVEL_AUTO`
pub const FAN_STATUS_REG: u8 = 0x2F;
/// Fan selection (0 = fan 1, 1 = fan 2). Never written: the switching
/// handshake is undocumented for the supported models.
pub const FAN_SELECT_REG: u8 = 0x31;
/// Fan tachometer, low byte. Must be read before the high byte.
pub const FAN_RPM_LSB_REG: u8 = 0x84;
/// Fan tachometer, high byte.
pub const FAN_RPM_MSB_REG: u8 = 0x85;
/// First of eight consecutive temperature sensor registers.
pub const TEMP_BASE_REG: u8 = 0x78;
pub const TEMP_SENSOR_COUNT: u8 = 8;

/// Raw temperature byte meaning "sensor disabled or unreadable".
pub const TEMP_UNAVAILABLE: u8 = 0x80;

pub const FAN_LEVEL_AUTO: u8 = 0x80;
pub const FAN_LEVEL_FULL: u8 = 0x40;
pub const FAN_LEVEL_MAX: u8 = 7;

/// Per-poll deadline, verified against real hardware. Polling spins
/// without sleeping, so this also bounds the CPU burned per wait.
pub const EC_POLL_TIMEOUT: Duration = Duration::from_millis(200);
