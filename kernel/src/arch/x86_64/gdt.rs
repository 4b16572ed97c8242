//! Global Descriptor Table and Task State Segment setup.
//!
//! The only reason this kernel needs a TSS is to give the double-fault
//! handler its own stack (IST index 0): a stack overflow that double-faults
//! while the normal stack is already exhausted must not try to push onto
//! that same exhausted stack.

use lazy_static::lazy_static;
use x86_64::instructions::segmentation::{Segment, CS, SS};
use x86_64::instructions::tables::load_tss;
use x86_64::structures::gdt::{Descriptor, GlobalDescriptorTable, SegmentSelector};
use x86_64::structures::tss::TaskStateSegment;
use x86_64::VirtAddr;

pub const DOUBLE_FAULT_IST_INDEX: u16 = 0;

const STACK_SIZE: usize = 4096 * 5;

lazy_static! {
    static ref TSS: TaskStateSegment = {
        let mut tss = TaskStateSegment::new();
        tss.interrupt_stack_table[DOUBLE_FAULT_IST_INDEX as usize] = {
            static mut STACK: [u8; STACK_SIZE] = [0; STACK_SIZE];
            // SAFETY: STACK is only ever referenced here, to compute its end
            // address for the IST entry; nothing reads or writes through
            // this reference afterwards, the CPU just switches %rsp to it.
            let stack_start = VirtAddr::from_ptr(unsafe { core::ptr::addr_of!(STACK) });
            stack_start + STACK_SIZE as u64
        };
        tss
    };
}

struct Selectors {
    code_selector: SegmentSelector,
    tss_selector: SegmentSelector,
}

lazy_static! {
    static ref GDT: (GlobalDescriptorTable, Selectors) = {
        let mut gdt = GlobalDescriptorTable::new();
        let code_selector = gdt.append(Descriptor::kernel_code_segment());
        let _data_selector = gdt.append(Descriptor::kernel_data_segment());
        let tss_selector = gdt.append(Descriptor::tss_segment(&TSS));
        (
            gdt,
            Selectors {
                code_selector,
                tss_selector,
            },
        )
    };
}

/// Load the GDT, reload the code/stack segment registers, and install the
/// TSS. Must run before [`super::idt::init`] installs the double-fault
/// handler's IST index.
pub fn init() {
    GDT.0.load();
    // SAFETY: the selectors above were just appended to the now-loaded GDT,
    // so they name valid descriptors. Reloading CS/SS and loading the TSS
    // is the standard segment-setup sequence for a freshly loaded GDT.
    unsafe {
        CS::set_reg(GDT.1.code_selector);
        SS::set_reg(SegmentSelector::NULL);
        load_tss(GDT.1.tss_selector);
    }
}
