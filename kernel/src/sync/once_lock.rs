//! Safe global initialization.
//!
//! Provides a safe alternative to `static mut` for global state that is
//! initialized once (outside of any concurrent access window) and then only
//! read or locked thereafter.

use spin::Mutex;

/// Safe global state with a mutex.
///
/// `GlobalState<T>` starts empty and is filled in exactly once by `init`.
/// Every other access goes through `with`/`with_mut`, which take the
/// `spin::Mutex` internally.
pub struct GlobalState<T> {
    inner: Mutex<Option<T>>,
}

impl<T> GlobalState<T> {
    /// Create new uninitialized global state.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Initialize the global state. Returns `Err(value)` if already
    /// initialized.
    pub fn init(&self, value: T) -> Result<(), T> {
        let mut lock = self.inner.lock();
        if lock.is_some() {
            Err(value)
        } else {
            *lock = Some(value);
            Ok(())
        }
    }

    /// True once `init` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Get reference with closure.
    pub fn with<R, F: FnOnce(&T) -> R>(&self, f: F) -> Option<R> {
        let lock = self.inner.lock();
        lock.as_ref().map(f)
    }

    /// Get mutable reference with closure.
    pub fn with_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> Option<R> {
        let mut lock = self.inner.lock();
        lock.as_mut().map(f)
    }
}

impl<T> Default for GlobalState<T> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: GlobalState<T> can be sent across threads if T: Send. The inner
// spin::Mutex provides mutual exclusion, so the contained Option<T> is only
// accessed by one thread at a time. Transferring ownership is safe when T
// itself supports cross-thread transfer.
unsafe impl<T: Send> Send for GlobalState<T> {}
// SAFETY: GlobalState<T> can be shared across threads if T: Send. The
// spin::Mutex serializes all access to the inner Option<T>, preventing data
// races. T only needs to be Send (not Sync) because the Mutex ensures no
// concurrent access -- each caller gets exclusive access through the lock
// guard.
unsafe impl<T: Send> Sync for GlobalState<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_state() {
        let state = GlobalState::new();
        assert!(!state.is_initialized());
        assert!(state.init(42u32).is_ok());
        assert!(state.is_initialized());
        assert!(state.init(100u32).is_err());

        state.with(|v| {
            assert_eq!(*v, 42);
        });

        state.with_mut(|v| {
            *v += 1;
        });

        state.with(|v| {
            assert_eq!(*v, 43);
        });
    }
}
