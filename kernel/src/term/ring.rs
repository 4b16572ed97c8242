//! The action ring and the submit/drain discipline.
//!
//! `submit` can be called from any context, including nested interrupt
//! handlers: it enqueues the action, and if the ring was empty before the
//! enqueue, the calling context becomes the sole drain-loop owner and
//! executes every action currently in the ring (including ones enqueued by
//! still-nested callers while it drains). A caller that finds the ring
//! already non-empty just enqueues and returns immediately; it never
//! drains, so two contexts never execute actions concurrently.
//!
//! Every access to the ring's head/tail/buffer happens inside an
//! [`crate::arch::disable_interrupts`] guard, the ring's only synchronization.
//! A `spin::Mutex` would deadlock here: a nested interrupt that tried to
//! lock it while the preempted owner held it would spin forever, since the
//! owner cannot run again until the interrupt returns.

use core::cell::UnsafeCell;

use super::action::Action;
use crate::arch;

pub(crate) const CAPACITY: usize = 32;

struct Inner {
    buf: [u32; CAPACITY],
    /// Index of the next slot to write.
    head: usize,
    /// Index of the next slot to read.
    tail: usize,
    len: usize,
}

/// Fixed-capacity, interrupt-safe single/multi-producer ring of actions.
pub(crate) struct ActionRing {
    inner: UnsafeCell<Inner>,
}

// SAFETY: every field access to `inner` happens inside an
// `arch::disable_interrupts()` guard (see `submit`/`try_pop`), so on a
// single core there is never more than one context mutating it at a time.
unsafe impl Sync for ActionRing {}

impl ActionRing {
    pub(crate) const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(Inner {
                buf: [0; CAPACITY],
                head: 0,
                tail: 0,
                len: 0,
            }),
        }
    }

    /// Enqueue `action`. Returns `true` if the ring was empty immediately
    /// before this enqueue, meaning the caller is now responsible for
    /// draining.
    ///
    /// Returns `Err(())` if the ring is full; per the engine's design this
    /// is a fatal invariant violation handled by the caller, not a
    /// recoverable condition (a full 32-slot ring means actions are being
    /// submitted faster than any context can ever drain them).
    fn submit_raw(&self, action: Action) -> Result<bool, ()> {
        // SAFETY: called only from `submit`, which holds an interrupt guard
        // for the duration of this call.
        let inner = unsafe { &mut *self.inner.get() };
        let was_empty = inner.len == 0;
        if inner.len == CAPACITY {
            return Err(());
        }
        inner.buf[inner.head] = action.into_raw();
        inner.head = (inner.head + 1) % CAPACITY;
        inner.len += 1;
        Ok(was_empty)
    }

    fn pop_raw(&self) -> Option<Action> {
        // SAFETY: called only from `try_pop`, which holds an interrupt guard
        // for the duration of this call.
        let inner = unsafe { &mut *self.inner.get() };
        if inner.len == 0 {
            return None;
        }
        let raw = inner.buf[inner.tail];
        inner.tail = (inner.tail + 1) % CAPACITY;
        inner.len -= 1;
        Some(Action::from_raw(raw))
    }

    /// Enqueue `action` under an interrupt-masking guard.
    pub(crate) fn submit(&self, action: Action) -> Result<bool, ()> {
        let _guard = arch::disable_interrupts();
        self.submit_raw(action)
    }

    /// Dequeue the oldest action, if any, under an interrupt-masking guard.
    pub(crate) fn try_pop(&self) -> Option<Action> {
        let _guard = arch::disable_interrupts();
        self.pop_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let ring = ActionRing::new();
        assert_eq!(ring.submit(Action::set_color(1)), Ok(true));
        assert_eq!(ring.submit(Action::set_color(2)), Ok(false));
        assert_eq!(ring.submit(Action::set_color(3)), Ok(false));

        assert_eq!(ring.try_pop(), Some(Action::set_color(1)));
        assert_eq!(ring.try_pop(), Some(Action::set_color(2)));
        assert_eq!(ring.try_pop(), Some(Action::set_color(3)));
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn was_empty_flag_reflects_state_before_this_push() {
        let ring = ActionRing::new();
        assert_eq!(ring.submit(Action::set_color(1)), Ok(true));
        assert_eq!(ring.submit(Action::set_color(2)), Ok(false));
        let _ = ring.try_pop();
        let _ = ring.try_pop();
        assert_eq!(ring.submit(Action::set_color(3)), Ok(true));
    }

    #[test]
    fn full_ring_rejects_submit() {
        let ring = ActionRing::new();
        for i in 0..CAPACITY {
            assert!(ring.submit(Action::set_color(i as u8)).is_ok());
        }
        assert_eq!(ring.submit(Action::set_color(0xFF)), Err(()));
    }

    #[test]
    fn wraps_around_capacity() {
        let ring = ActionRing::new();
        for i in 0..CAPACITY {
            assert!(ring.submit(Action::set_color(i as u8)).is_ok());
        }
        for i in 0..CAPACITY {
            assert_eq!(ring.try_pop(), Some(Action::set_color(i as u8)));
        }
        assert_eq!(ring.submit(Action::set_color(9)), Ok(true));
        assert_eq!(ring.try_pop(), Some(Action::set_color(9)));
    }
}
