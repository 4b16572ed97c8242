//! Architecture abstraction layer.
//!
//! Only x86_64 is implemented. The module re-exports the handful of
//! primitives the rest of the kernel needs: boot-time `init()`, `halt()`,
//! the interrupt-masking guard, and a millisecond tick source.

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(target_arch = "x86_64")]
pub use self::x86_64::{disable_interrupts, halt, init, InterruptGuard};

pub mod entropy;
pub mod timer;

/// Halt the CPU in a loop, forever. Used by fatal exception handlers that
/// cannot safely return.
pub fn halt_loop() -> ! {
    loop {
        halt();
    }
}
