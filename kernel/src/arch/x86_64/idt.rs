//! Interrupt Descriptor Table.
//!
//! CPU exception handlers report through the kernel's serial/VGA `println!`
//! (which is itself backed by the terminal engine), and the timer handler
//! (IRQ0, vector 32) doubles as the kernel's only genuine hardirq source:
//! it feeds [`crate::arch::timer`] and, periodically, writes a heartbeat
//! character through [`crate::term`] directly from interrupt context. That
//! periodic write is the crate's one real-world exercise of the terminal
//! engine's nested-submit discipline, rather than just a simulated one in
//! tests.

use lazy_static::lazy_static;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame, PageFaultErrorCode};

use super::gdt::DOUBLE_FAULT_IST_INDEX;
use super::PIC1_OFFSET;

/// Vector the timer (IRQ0) is remapped to.
pub const TIMER_VECTOR: u8 = PIC1_OFFSET;

lazy_static! {
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();
        idt.breakpoint.set_handler_fn(breakpoint_handler);
        idt.page_fault.set_handler_fn(page_fault_handler);
        idt.general_protection_fault
            .set_handler_fn(general_protection_fault_handler);
        // SAFETY: DOUBLE_FAULT_IST_INDEX names a stack installed by
        // gdt::init, which always runs before this.
        unsafe {
            idt.double_fault
                .set_handler_fn(double_fault_handler)
                .set_stack_index(DOUBLE_FAULT_IST_INDEX);
        }
        idt[TIMER_VECTOR as usize].set_handler_fn(timer_interrupt_handler);
        idt
    };
}

/// Load the IDT. Must run after [`super::gdt::init`].
pub fn init() {
    IDT.load();
}

extern "x86-interrupt" fn breakpoint_handler(stack_frame: InterruptStackFrame) {
    crate::println!("EXCEPTION: BREAKPOINT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn page_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: PageFaultErrorCode,
) {
    let addr = x86_64::registers::control::Cr2::read();
    crate::println!(
        "EXCEPTION: PAGE FAULT\nAccessed address: {:?}\nError code: {:?}\n{:#?}",
        addr,
        error_code,
        stack_frame
    );
    crate::arch::halt_loop();
}

extern "x86-interrupt" fn general_protection_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: u64,
) {
    crate::println!(
        "EXCEPTION: GENERAL PROTECTION FAULT\nError code: {}\n{:#?}",
        error_code,
        stack_frame
    );
    crate::arch::halt_loop();
}

extern "x86-interrupt" fn double_fault_handler(
    stack_frame: InterruptStackFrame,
    _error_code: u64,
) -> ! {
    panic!("EXCEPTION: DOUBLE FAULT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn timer_interrupt_handler(_stack_frame: InterruptStackFrame) {
    if crate::arch::timer::on_tick() {
        crate::term::write_char(b'.');
    }

    // SAFETY: called only from the timer ISR itself, matching IRQ0.
    unsafe { super::send_eoi(0) };
}
