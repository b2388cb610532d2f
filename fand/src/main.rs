//! ThinkPad fan control daemon.
//!
//! Acquires EC port access, then runs the curve-driven control loop
//! until SIGINT/SIGTERM. The controller's drop guard hands the fan
//! back to the firmware on the way out.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use tpfan_ctl::{FanConfig, FanController};
use tpfan_ec::{Ec, EcError, RawPortIo};
use tpfan_lib::ulog::{self, LogLevel};
use tpfan_lib::{ulog_error, ulog_info};

const EPERM: i32 = 1;
const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;

static STOP: AtomicBool = AtomicBool::new(false);

extern "C" fn request_stop(_signum: i32) {
    STOP.store(true, Ordering::SeqCst);
}

unsafe extern "C" {
    fn signal(signum: i32, handler: extern "C" fn(i32)) -> usize;
}

fn install_stop_handlers() {
    unsafe {
        signal(SIGINT, request_stop);
        signal(SIGTERM, request_stop);
    }
}

fn main() -> ExitCode {
    ulog::set_level(LogLevel::Info);

    let ports = match RawPortIo::acquire() {
        Ok(ports) => ports,
        Err(EcError::PortAccess(EPERM)) => {
            ulog_error!("EC port access denied; fand needs root (ioperm)");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            ulog_error!("cannot acquire EC ports: {}", err);
            return ExitCode::FAILURE;
        }
    };

    install_stop_handlers();

    let ec = Ec::new(ports);
    match ec.fan_rpm() {
        Ok(rpm) => ulog_info!("EC reachable, fan at {} rpm", rpm),
        Err(err) => ulog_error!("initial EC probe failed: {}", err),
    }

    // Configuration is owned by an external loader; defaults here.
    let mut controller = FanController::new(&ec, FanConfig::default());
    controller.run(&STOP);
    ExitCode::SUCCESS
}
