//! Leveled logging to stderr.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[inline(always)]
fn is_enabled(level: LogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

pub fn set_level(level: LogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_level() -> LogLevel {
    LogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

pub fn log_args(level: LogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let _ = write!(out, "[{}] ", level.tag());
    let _ = out.write_fmt(args);
    let _ = out.write_all(b"\n");
}

#[macro_export]
macro_rules! ulog_error {
    ($($arg:tt)*) => {
        $crate::ulog::log_args($crate::ulog::LogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! ulog_warn {
    ($($arg:tt)*) => {
        $crate::ulog::log_args($crate::ulog::LogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! ulog_info {
    ($($arg:tt)*) => {
        $crate::ulog::log_args($crate::ulog::LogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! ulog_debug {
    ($($arg:tt)*) => {
        $crate::ulog::log_args($crate::ulog::LogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trip() {
        let saved = get_level();
        set_level(LogLevel::Debug);
        assert_eq!(get_level(), LogLevel::Debug);
        assert!(is_enabled(LogLevel::Warn));
        set_level(LogLevel::Error);
        assert!(!is_enabled(LogLevel::Info));
        set_level(saved);
    }
}
