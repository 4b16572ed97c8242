//! Generic serial interface, used as the terminal engine's mirror sink.
//!
//! Wraps `uart_16550::SerialPort` on COM1. Per spec.md §6/§7, the serial
//! mirror is fire-and-forget: a failed or dropped byte is never reported to
//! the caller, so `write_byte` discards its `fmt::Write` result instead of
//! unwrapping it.
//!
//! The real UART is port-mapped I/O, which is a privileged operation the
//! host process running `cargo test` cannot perform. `write_byte`/`_print`
//! therefore compile to a recording stand-in under `cfg(test)` rather than
//! touching hardware, the same role [`crate::term::backend::recording`]
//! plays for the video back-end.

use core::fmt;

#[cfg(not(test))]
mod hardware {
    use lazy_static::lazy_static;
    use spin::Mutex;
    use uart_16550::SerialPort;

    lazy_static! {
        pub(super) static ref SERIAL1: Mutex<SerialPort> = {
            // SAFETY: 0x3F8 is the standard I/O base address for COM1. No
            // other code constructs a SerialPort over this port, so
            // exclusive access is maintained by the enclosing Mutex.
            let mut serial_port = unsafe { SerialPort::new(0x3F8) };
            serial_port.init();
            Mutex::new(serial_port)
        };
    }
}

/// Write a single byte to the serial mirror, ignoring failures.
///
/// The UART is assumed non-blocking in practice (the back-end drops bytes
/// if it is not ready); `uart_16550::SerialPort::send` already spin-waits on
/// the line-status register rather than returning an error, so there is
/// nothing here to discard beyond masking interrupts around the write.
#[cfg(not(test))]
pub fn write_byte(byte: u8) {
    use x86_64::instructions::interrupts;

    interrupts::without_interrupts(|| {
        hardware::SERIAL1.lock().send(byte);
    });
}

#[cfg(not(test))]
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use x86_64::instructions::interrupts;

    interrupts::without_interrupts(|| {
        let _ = hardware::SERIAL1.lock().write_fmt(args);
    });
}

/// Host-test stand-in for the mirror: records bytes instead of touching a
/// UART. `term`'s tests can inspect [`test_mirror::take`] to assert on what
/// would have gone out the serial port.
#[cfg(test)]
pub mod test_mirror {
    use spin::Mutex;
    use std::vec::Vec;

    static LOG: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    pub(super) fn record(byte: u8) {
        LOG.lock().push(byte);
    }

    /// Drain and return everything recorded since the last call.
    pub fn take() -> Vec<u8> {
        core::mem::take(&mut *LOG.lock())
    }
}

#[cfg(test)]
pub fn write_byte(byte: u8) {
    test_mirror::record(byte);
}

#[cfg(test)]
#[doc(hidden)]
pub fn _print(_args: fmt::Arguments) {}

#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => {
        $crate::serial_print!("{}\n", format_args!($($arg)*))
    };
}
