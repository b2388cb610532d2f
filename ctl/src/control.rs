//! Periodic closed-loop fan control.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::thread;
use std::time::Instant;

use tpfan_ec::{Ec, FanLevel, PortIo};
use tpfan_lib::{ulog_debug, ulog_error, ulog_info, ulog_warn};

use crate::config::FanConfig;

/// Upper bound on how long a stop request can sit unnoticed inside the
/// interval sleep.
const STOP_POLL_SLICE: Duration = Duration::from_millis(200);

/// Drives the fan from the configured curve.
///
/// Holding one of these means the fan may be under manual control, so
/// dropping it always hands the fan back to the firmware - whatever
/// state the loop stopped in, and on panic paths too.
pub struct FanController<'a, P: PortIo> {
    ec: &'a Ec<P>,
    config: FanConfig,
    /// Last level written; the EC is only touched when the target moves
    /// away from this. Starts at `Auto`, the firmware's own state.
    current: FanLevel,
}

impl<'a, P: PortIo> FanController<'a, P> {
    pub fn new(ec: &'a Ec<P>, config: FanConfig) -> Self {
        Self {
            ec,
            config,
            current: FanLevel::Auto,
        }
    }

    /// One control cycle: sample the sensor, map it through the curve,
    /// and program the fan if the target changed. A failed cycle leaves
    /// the previous level in place; the next interval retries with a
    /// fresh transaction.
    pub fn cycle(&mut self) {
        let reading = match self.ec.temperature(self.config.sensor) {
            Ok(reading) => reading,
            Err(err) => {
                ulog_warn!("sensor {} read failed: {}", self.config.sensor, err);
                return;
            }
        };
        if reading.is_none() {
            ulog_warn!("sensor {} unavailable, targeting auto", self.config.sensor);
        }
        let target = self.config.curve.target_level(reading);
        if target == self.current {
            ulog_debug!("fan unchanged at {}", self.current);
            return;
        }
        match self.ec.set_fan_level(target) {
            Ok(()) => {
                match reading {
                    Some(temp) => ulog_info!("{} C on sensor {}: fan {}", temp, self.config.sensor, target),
                    None => ulog_info!("fan {}", target),
                }
                self.current = target;
            }
            Err(err) => ulog_error!("failed to set fan {}: {}", target, err),
        }
    }

    /// Run until `stop` is raised. The flag is checked between cycles
    /// and while sleeping; an in-flight EC transaction always completes
    /// first, so stop-to-effect latency is bounded by the poll timeout
    /// plus [`STOP_POLL_SLICE`].
    pub fn run(&mut self, stop: &AtomicBool) {
        ulog_info!(
            "fan control running: sensor {}, every {:?}",
            self.config.sensor,
            self.config.interval
        );
        while !stop.load(Ordering::SeqCst) {
            self.cycle();
            sleep_until_stop(self.config.interval, stop);
        }
        ulog_info!("fan control stopping");
    }
}

impl<P: PortIo> Drop for FanController<'_, P> {
    fn drop(&mut self) {
        // Last-known state is irrelevant: always hand the fan back.
        match self.ec.set_fan_level(FanLevel::Auto) {
            Ok(()) => ulog_info!("fan restored to automatic control"),
            Err(err) => ulog_error!("failed to restore fan to auto: {}", err),
        }
    }
}

fn sleep_until_stop(interval: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(STOP_POLL_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpfan_ec::hw::{FAN_LEVEL_AUTO, FAN_STATUS_REG, TEMP_BASE_REG, TEMP_UNAVAILABLE};
    use tpfan_ec::sim::SimEc;

    fn ec_with_temp(raw: u8) -> Ec<SimEc> {
        let mut sim = SimEc::new();
        sim.load(TEMP_BASE_REG, raw);
        Ec::new(sim)
    }

    #[test]
    fn cycle_programs_level_from_curve() {
        let ec = ec_with_temp(60);
        let mut ctl = FanController::new(&ec, FanConfig::default());
        ctl.cycle();
        assert_eq!(ec.fan_level_raw().unwrap(), 2);
    }

    #[test]
    fn unchanged_target_writes_once() {
        let ec = ec_with_temp(60);
        {
            let mut ctl = FanController::new(&ec, FanConfig::default());
            ctl.cycle();
            ctl.cycle();
            ctl.cycle();
        }
        // One write for the level change, one for the drop restore.
        assert_eq!(ec.into_ports().writes_to(FAN_STATUS_REG), 2);
    }

    #[test]
    fn drop_restores_automatic_control() {
        let ec = ec_with_temp(90);
        {
            let mut ctl = FanController::new(&ec, FanConfig::default());
            ctl.cycle();
            assert_eq!(ec.fan_level_raw().unwrap(), 7);
        }
        assert_eq!(ec.fan_level_raw().unwrap(), FAN_LEVEL_AUTO);
    }

    #[test]
    fn unavailable_sensor_targets_auto() {
        let ec = ec_with_temp(TEMP_UNAVAILABLE);
        {
            let mut ctl = FanController::new(&ec, FanConfig::default());
            ctl.cycle();
        }
        // Target equals the initial Auto state, so the only write is
        // the restore on drop.
        assert_eq!(ec.into_ports().writes_to(FAN_STATUS_REG), 1);
    }

    #[test]
    fn failed_cycle_is_skipped() {
        let mut sim = SimEc::new();
        sim.load(TEMP_BASE_REG, 60);
        sim.force_ibf();
        let ec = Ec::with_timeout(sim, Duration::ZERO);
        let mut ctl = FanController::new(&ec, FanConfig::default());
        ctl.cycle();
        // The read timed out; no level write happened.
        assert_eq!(ctl.current, FanLevel::Auto);
    }

    #[test]
    fn sleep_returns_quickly_once_stopped() {
        let stop = AtomicBool::new(true);
        let begin = Instant::now();
        sleep_until_stop(Duration::from_secs(30), &stop);
        assert!(begin.elapsed() < Duration::from_secs(1));
    }
}
