//! Millisecond tick source, driven by the legacy PIT on IRQ0.
//!
//! The timer interrupt handler in [`crate::arch::x86_64::idt`] increments
//! [`TICKS`] on every fire and calls [`on_tick`] so the terminal engine can
//! be exercised from genuine hardirq context, the same way a heartbeat LED
//! or watchdog kick would be.

use core::sync::atomic::{AtomicU64, Ordering};

/// PIT divisor chosen so IRQ0 fires at roughly 100 Hz (PIT_FREQUENCY / 100).
/// Only takes effect once programmed into the PIT's channel 0 (ports
/// 0x43/0x40, mode 3) by [`crate::arch::x86_64::init`] -- without that write
/// the hardware stays at its BIOS-default ~18.2 Hz free-run rate and every
/// tick count derived here would be off by roughly 5.5x.
pub const PIT_DIVISOR: u16 = 11932;

/// How many ticks make up one reported "millisecond" at the configured
/// divisor. At ~100 Hz a tick is ~10 ms; tracked separately from wall time
/// since this kernel has no RTC.
const MS_PER_TICK: u64 = 10;

static TICKS: AtomicU64 = AtomicU64::new(0);

/// Number of heartbeat ticks between terminal heartbeat writes.
const HEARTBEAT_PERIOD_TICKS: u64 = 50;

/// Called once per PIT interrupt, from the timer ISR.
///
/// Returns `true` on ticks where the heartbeat should fire, so the caller
/// can decide whether to poke the terminal engine from hardirq context.
pub fn on_tick() -> bool {
    let n = TICKS.fetch_add(1, Ordering::Relaxed) + 1;
    n % HEARTBEAT_PERIOD_TICKS == 0
}

/// Milliseconds elapsed since the timer was enabled.
pub fn get_timestamp_ms() -> u64 {
    TICKS.load(Ordering::Relaxed) * MS_PER_TICK
}

/// Raw tick count, for tests that care about tick granularity rather than
/// the derived millisecond value.
pub fn get_ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}
