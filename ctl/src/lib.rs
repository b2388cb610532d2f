//! Fan policy: temperature curve, runtime configuration, and the
//! periodic control loop driving the EC.

pub mod config;
pub mod control;
pub mod curve;

pub use config::FanConfig;
pub use control::FanController;
pub use curve::{CurvePoint, FanCurve};
