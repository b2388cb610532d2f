//! Raw x86 I/O port access from ring 3.
//!
//! `in`/`out` are privileged instructions; a userland process may issue
//! them only after `ioperm(2)` has granted it the specific ports.
//! Acquisition lives here so nothing else in the workspace touches the
//! syscall directly.

use core::arch::asm;

unsafe extern "C" {
    fn ioperm(from: u64, num: u64, turn_on: i32) -> i32;
}

/// Ask the kernel for access to `count` consecutive ports starting at
/// `from`. Needs CAP_SYS_RAWIO, which in practice means root. On
/// failure returns the errno (EPERM when the privilege is missing).
pub fn request_port_access(from: u16, count: u16) -> Result<(), i32> {
    let rc = unsafe { ioperm(u64::from(from), u64::from(count), 1) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error().raw_os_error().unwrap_or(-1))
    }
}

/// # Safety
/// Port I/O can have arbitrary side effects on hardware state, and the
/// process must hold `ioperm` access to `port`.
#[inline(always)]
pub unsafe fn inb(port: u16) -> u8 {
    let value: u8;
    unsafe {
        asm!(
            "in al, dx",
            out("al") value,
            in("dx") port,
            options(nomem, nostack, preserves_flags)
        );
    }
    value
}

/// # Safety
/// Port I/O can have arbitrary side effects on hardware state, and the
/// process must hold `ioperm` access to `port`.
#[inline(always)]
pub unsafe fn outb(port: u16, value: u8) {
    unsafe {
        asm!(
            "out dx, al",
            in("dx") port,
            in("al") value,
            options(nomem, nostack, preserves_flags)
        );
    }
}
