//! Error taxonomy for EC access.

use core::fmt;

/// Protocol stage that missed its deadline. The tag names the flag
/// being waited on and where in the transaction the wait sits, so a
/// timeout in the field pinpoints the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    IbfBeforeReadCmd,
    IbfBeforeOffset,
    ObfAfterOffset,
    IbfBeforeWriteCmd,
    IbfAfterWriteCmd,
    IbfAfterOffset,
    IbfAfterData,
}

impl Stage {
    pub const fn tag(self) -> &'static str {
        match self {
            Stage::IbfBeforeReadCmd => "ibf-before-read-cmd",
            Stage::IbfBeforeOffset => "ibf-before-offset",
            Stage::ObfAfterOffset => "obf-after-offset",
            Stage::IbfBeforeWriteCmd => "ibf-before-write-cmd",
            Stage::IbfAfterWriteCmd => "ibf-after-write-cmd",
            Stage::IbfAfterOffset => "ibf-after-offset",
            Stage::IbfAfterData => "ibf-after-data",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcError {
    /// The port-I/O mechanism is unavailable (errno from `ioperm`).
    /// Not recoverable without a privilege change.
    PortAccess(i32),
    /// A protocol stage did not complete within the deadline. The
    /// transaction is dead; the caller may retry with a fresh one.
    Timeout(Stage),
    /// Caller-supplied value out of range. Rejected before any port
    /// access.
    InvalidArgument(&'static str),
}

impl fmt::Display for EcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcError::PortAccess(errno) => {
                write!(f, "port access unavailable (os error {})", errno)
            }
            EcError::Timeout(stage) => write!(f, "EC timeout at {}", stage),
            EcError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
        }
    }
}
