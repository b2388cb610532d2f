#![forbid(unsafe_op_in_unsafe_fn)]

pub mod io;
pub mod ulog;

pub use ulog::LogLevel;
