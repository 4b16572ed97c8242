//! Timestamp counter access.
//!
//! Trimmed to the one primitive the rest of the kernel needs: a
//! monotonically increasing cycle count used as a cheap time source before
//! the PIT-driven millisecond tick has produced enough samples to be useful
//! on its own (see [`crate::arch::timer`]).

/// Read the CPU's cycle counter.
#[cfg(target_arch = "x86_64")]
pub fn read_timestamp() -> u64 {
    // SAFETY: RDTSC is available on every x86_64 CPU this kernel targets; it
    // has no side effects and cannot fault.
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(not(target_arch = "x86_64"))]
pub fn read_timestamp() -> u64 {
    0
}
