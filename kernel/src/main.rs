//! Kernel entry point.
//!
//! Brings up the architecture (GDT/IDT/PIC), the log service, the VGA
//! text-mode terminal engine, and then either runs the custom test harness
//! (`cfg(test)` bare-metal integration tests) or drops into the idle halt
//! loop.

#![no_std]
#![no_main]
#![feature(custom_test_frameworks)]
#![test_runner(term_engine_kernel::test_framework::test_runner)]
#![reexport_test_harness_main = "test_main"]

use bootloader_api::config::{BootloaderConfig, Mapping};
use bootloader_api::{entry_point, BootInfo};
use term_engine_kernel::term::backend::{VgaTextBackend, VGA_PHYS_ADDR};
use term_engine_kernel::{arch, log_service, println, term};

static BOOTLOADER_CONFIG: BootloaderConfig = {
    let mut config = BootloaderConfig::new_default();
    config.mappings.physical_memory = Some(Mapping::Dynamic);
    config
};

entry_point!(kernel_main, config = &BOOTLOADER_CONFIG);

static VGA_BACKEND: spin::Once<VgaTextBackend> = spin::Once::new();

fn kernel_main(boot_info: &'static mut BootInfo) -> ! {
    arch::init();
    log_service::log_init();
    log_service::klog(
        log_service::LogLevel::Info,
        "boot",
        "architecture initialized",
    );

    let phys_mem_offset = boot_info
        .physical_memory_offset
        .into_option()
        .expect("bootloader did not map physical memory");

    let vga_virt_addr = phys_mem_offset + VGA_PHYS_ADDR;
    // SAFETY: vga_virt_addr is the virtual address the bootloader mapped
    // VGA_PHYS_ADDR to, per the BOOTLOADER_CONFIG above; nothing else in
    // this kernel writes through it.
    let backend = VGA_BACKEND.call_once(|| unsafe { VgaTextBackend::new(term::COLS, vga_virt_addr) });

    term::init(backend, term::ROWS, term::COLS, term::DEFAULT_COLOR)
        .expect("terminal engine failed to initialize");

    log_service::klog(log_service::LogLevel::Info, "boot", "terminal ready");
    println!("term-engine-kernel booting...");

    #[cfg(test)]
    test_main();

    arch::halt_loop();
}

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("KERNEL PANIC: {}", info);
    arch::halt_loop();
}

#[cfg(test)]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    term_engine_kernel::test_framework::test_panic_handler(info)
}
