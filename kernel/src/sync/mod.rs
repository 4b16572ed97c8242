//! Synchronization primitives.
//!
//! Safe global state management, kept minimal: this crate has exactly one
//! process-wide singleton (the terminal engine), initialized once during
//! boot before interrupts are enabled.

pub mod once_lock;

pub use once_lock::GlobalState;
