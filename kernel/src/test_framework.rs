//! Custom `#[no_std]` test harness.
//!
//! Host-side `cargo test` uses the ordinary libtest harness; this module
//! only matters for `cargo test --target x86_64-unknown-none`, where there
//! is no OS to report results, so a passing or failing run instead exits
//! QEMU with a status code via the `isa-debug-exit` device on port `0xf4`.

use core::panic::PanicInfo;

/// Exit code written to the `isa-debug-exit` device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum QemuExitCode {
    Success = 0x10,
    Failed = 0x11,
}

/// Anything that can report its own name before running, the way a libtest
/// closure reports its function path.
pub trait Testable {
    fn run(&self);
}

impl<T: Fn()> Testable for T {
    fn run(&self) {
        crate::serial_print!("{}...\t", core::any::type_name::<T>());
        self();
        crate::serial_println!("[ok]");
    }
}

pub fn test_runner(tests: &[&dyn Testable]) {
    crate::serial_println!("Running {} tests", tests.len());
    for test in tests {
        test.run();
    }
    exit_qemu(QemuExitCode::Success);
}

pub fn test_panic_handler(info: &PanicInfo) -> ! {
    crate::serial_println!("[failed]\n");
    crate::serial_println!("Error: {}\n", info);
    exit_qemu(QemuExitCode::Failed);
    crate::arch::halt_loop();
}

pub fn exit_qemu(exit_code: QemuExitCode) {
    // SAFETY: port 0xf4 is the isa-debug-exit device configured on this
    // kernel's QEMU invocation (`-device isa-debug-exit,iobase=0xf4`); it
    // exists only in that test environment.
    unsafe {
        crate::arch::x86_64::outl(0xf4, exit_code as u32);
    }
}

#[macro_export]
macro_rules! kernel_assert {
    ($cond:expr) => {
        if !$cond {
            panic!("assertion failed: {}", stringify!($cond));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            panic!($($arg)+);
        }
    };
}

/// Register a test case whose body returns a
/// [`crate::error::KernelError`] instead of panicking on failure, so a test
/// that drives a fallible API can use `?` the way the rest of the kernel
/// does rather than `unwrap`.
#[macro_export]
macro_rules! kernel_test {
    ($name:ident, $test:expr) => {
        #[test_case]
        const $name: &dyn $crate::test_framework::Testable = &|| {
            let result: Result<(), $crate::error::KernelError> = (|| $test)();
            if let Err(e) = result {
                panic!("{}", e);
            }
        };
    };
}

#[macro_export]
macro_rules! kernel_assert_eq {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                if *left_val != *right_val {
                    panic!(
                        "assertion failed: `(left == right)`\n  left: `{:?}`\n right: `{:?}`",
                        left_val, right_val
                    );
                }
            }
        }
    };
}
