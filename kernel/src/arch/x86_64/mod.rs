//! x86_64 architecture support: GDT/TSS, IDT, PIC initialization, and the
//! interrupt-masking guard the terminal engine's action ring relies on.

pub mod gdt;
pub mod idt;

use core::sync::atomic::{AtomicBool, Ordering};

use x86_64::instructions::interrupts;

/// Primary PIC command/data ports.
const PIC1_COMMAND: u16 = 0x20;
const PIC1_DATA: u16 = 0x21;
/// Secondary PIC command/data ports.
const PIC2_COMMAND: u16 = 0xA0;
const PIC2_DATA: u16 = 0xA1;

/// Vector offset the primary PIC's IRQ0..7 are remapped to, clear of the
/// CPU exception range (0..32).
pub const PIC1_OFFSET: u8 = 32;
/// Vector offset the secondary PIC's IRQ8..15 are remapped to.
pub const PIC2_OFFSET: u8 = 40;

/// PIT command/mode register.
const PIT_COMMAND: u16 = 0x43;
/// PIT channel 0 data port, wired to IRQ0.
const PIT_CHANNEL0: u16 = 0x40;
/// Channel 0, lobyte/hibyte access, mode 3 (square wave generator).
const PIT_CHANNEL0_MODE3: u8 = 0x36;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Bring up the architecture: GDT/TSS, IDT, the legacy PIC, and the PIT.
///
/// Must run with interrupts disabled and before any code touches the
/// terminal engine, since the timer handler installed here calls into it.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    interrupts::disable();

    gdt::init();
    idt::init();
    unsafe { init_pic() };
    unsafe { init_pit() };

    interrupts::enable();
}

/// Remap and partially mask the 8259 PIC: IRQ0 (timer) stays unmasked,
/// everything else stays masked until a driver asks for it.
///
/// # Safety
/// Must only run once, during [`init`], with interrupts disabled; it
/// performs raw port I/O against PIC hardware state shared with no other
/// code in this kernel.
unsafe fn init_pic() {
    let saved_mask1 = inb(PIC1_DATA);
    let saved_mask2 = inb(PIC2_DATA);

    // ICW1: start initialization sequence, expect ICW4.
    outb(PIC1_COMMAND, 0x11);
    io_wait();
    outb(PIC2_COMMAND, 0x11);
    io_wait();

    // ICW2: vector offsets.
    outb(PIC1_DATA, PIC1_OFFSET);
    io_wait();
    outb(PIC2_DATA, PIC2_OFFSET);
    io_wait();

    // ICW3: tell each PIC about the other through the cascade line.
    outb(PIC1_DATA, 1 << 2);
    io_wait();
    outb(PIC2_DATA, 2);
    io_wait();

    // ICW4: 8086 mode.
    outb(PIC1_DATA, 0x01);
    io_wait();
    outb(PIC2_DATA, 0x01);
    io_wait();

    // Restore masks but keep IRQ0 (timer) unmasked so the heartbeat fires.
    outb(PIC1_DATA, saved_mask1 & !0x01);
    outb(PIC2_DATA, saved_mask2);
}

/// Program PIT channel 0 to fire IRQ0 at the rate
/// [`crate::arch::timer::PIT_DIVISOR`] implies, so `timer::on_tick`'s count
/// actually advances at the `MS_PER_TICK` the rest of the kernel assumes
/// when reading it. Without this the PIT is left at its BIOS-default
/// ~18.2 Hz free-run rate.
///
/// # Safety
/// Must only run once, during [`init`], with interrupts disabled; it
/// performs raw port I/O against PIT hardware state shared with no other
/// code in this kernel.
unsafe fn init_pit() {
    let divisor = crate::arch::timer::PIT_DIVISOR;
    outb(PIT_COMMAND, PIT_CHANNEL0_MODE3);
    io_wait();
    outb(PIT_CHANNEL0, (divisor & 0xFF) as u8);
    io_wait();
    outb(PIT_CHANNEL0, (divisor >> 8) as u8);
}

/// Send end-of-interrupt to the PIC(s) responsible for `irq`.
///
/// # Safety
/// Must only be called from an interrupt handler for the matching IRQ.
pub unsafe fn send_eoi(irq: u8) {
    if irq >= 8 {
        outb(PIC2_COMMAND, 0x20);
    }
    outb(PIC1_COMMAND, 0x20);
}

/// Halt the CPU until the next interrupt.
pub fn halt() {
    x86_64::instructions::hlt();
}

/// RAII guard that disables interrupts on construction and restores the
/// prior IF flag on drop, including on unwind.
///
/// This is the sole synchronization primitive protecting the terminal
/// engine's action ring: enqueue and dequeue both run inside a guard's
/// scope, so a nested interrupt on the same core can never observe a
/// torn head/tail update.
///
/// Under `cfg(test)` this does not touch the real IF flag: host unit tests
/// run in ring 3 under the ordinary libtest harness (see `lib.rs`), where
/// `cli`/`sti` are privileged and would fault. There is no interrupt
/// controller to race against on the host, and `term`'s own `TEST_LOCK`
/// already serializes the tests that touch shared engine state, so the
/// guard degrades to a no-op marker rather than real masking.
pub struct InterruptGuard {
    #[cfg(not(test))]
    was_enabled: bool,
}

impl InterruptGuard {
    #[cfg(not(test))]
    fn new() -> Self {
        let was_enabled = interrupts::are_enabled();
        interrupts::disable();
        Self { was_enabled }
    }

    #[cfg(test)]
    fn new() -> Self {
        Self {}
    }
}

#[cfg(not(test))]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.was_enabled {
            interrupts::enable();
        }
    }
}

/// Disable interrupts for the lifetime of the returned guard.
pub fn disable_interrupts() -> InterruptGuard {
    InterruptGuard::new()
}

/// Write a byte to an I/O port.
///
/// # Safety
/// `port` must name a port this kernel is allowed to own; writing to
/// arbitrary ports can corrupt unrelated hardware state.
pub unsafe fn outb(port: u16, value: u8) {
    use x86_64::instructions::port::Port;
    let mut p: Port<u8> = Port::new(port);
    p.write(value);
}

/// Read a byte from an I/O port.
///
/// # Safety
/// `port` must name a port safe to read; some ports have read side effects.
pub unsafe fn inb(port: u16) -> u8 {
    use x86_64::instructions::port::Port;
    let mut p: Port<u8> = Port::new(port);
    p.read()
}

/// Write a 32-bit value to an I/O port, e.g. the `isa-debug-exit` test
/// device.
///
/// # Safety
/// Same caveats as [`outb`].
pub unsafe fn outl(port: u16, value: u32) {
    use x86_64::instructions::port::Port;
    let mut p: Port<u32> = Port::new(port);
    p.write(value);
}

/// Burn a handful of cycles via a write to an unused port, for PIC
/// initialization sequences that require a delay between commands on real
/// hardware.
fn io_wait() {
    // SAFETY: port 0x80 is the conventional "POST diagnostic" scratch port,
    // universally safe to write to as a delay.
    unsafe { outb(0x80, 0) };
}
