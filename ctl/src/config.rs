//! Runtime parameters for the control loop.
//!
//! Loading and parsing live elsewhere; consumers hand over an
//! already-built `FanConfig`.

use core::time::Duration;

use crate::curve::FanCurve;

#[derive(Debug, Clone)]
pub struct FanConfig {
    /// Temperature sensor driving the curve (0-7).
    pub sensor: u8,
    /// Delay between control cycles.
    pub interval: Duration,
    pub curve: FanCurve,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            sensor: 0,
            interval: Duration::from_secs(5),
            curve: FanCurve::default(),
        }
    }
}
