//! Text-mode terminal engine.
//!
//! Four pieces compose the engine:
//!
//! - [`cell::Cell`] — the glyph+attribute storage unit.
//! - A scrollback store (see [`scrollback`]): a ring of `BUFFER_ROWS` rows,
//!   of which [`ROWS`] are visible at a time through `scroll`.
//! - A render/cursor layer (see [`render`]): the current cursor position
//!   and color, and the handlers that turn each action into scrollback and
//!   backend calls.
//! - The action ring ([`ring::ActionRing`]) and its submit/drain discipline,
//!   which makes every public entry point safe to call from nested
//!   interrupt context.
//!
//! The engine owns no heap allocation: the scrollback store is a static
//! array sized for [`BUFFER_ROWS`] * [`COLS`] cells, and the action ring is
//! a fixed 32-slot array. Both are reference-configuration sizes; a caller
//! asking for a different geometry gets [`crate::error::KernelError::InvalidArgument`]
//! rather than a resize.

mod action;
pub mod backend;
mod cell;
mod render;
mod ring;
mod scrollback;

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

use self::action::Action;
use self::backend::VideoBackend;
use self::cell::Cell;
use self::ring::ActionRing;
use crate::error::{KernelError, KernelResult};

/// Visible columns.
pub const COLS: usize = 80;
/// Visible rows.
pub const ROWS: usize = 25;
/// Scrollback depth: a fixed multiple of [`ROWS`], so every visible row has
/// nine rows of history behind it.
pub const BUFFER_ROWS: usize = ROWS * 10;

/// Default VGA attribute byte: light grey on black.
pub const DEFAULT_COLOR: u8 = 0x07;

struct EngineState {
    cells: [Cell; BUFFER_ROWS * COLS],
    /// Total number of logical rows ever opened, starting at [`ROWS`] (the
    /// initial blank screen). `total_rows - ROWS` is how many rows have
    /// scrolled off the top since boot; it only ever grows.
    total_rows: usize,
    /// How many rows back from the live bottom the visible window sits.
    /// 0 means the window shows the newest [`ROWS`] rows.
    scroll: usize,
    /// Largest legal value for `scroll`; grows as more rows are appended,
    /// capped at `BUFFER_ROWS - ROWS`.
    max_scroll: usize,
    /// Current cursor row, screen-relative (`0..ROWS`).
    row: usize,
    /// Current cursor column, screen-relative (`0..COLS`).
    col: usize,
    color: u8,
    backend: Option<&'static dyn VideoBackend>,
}

impl EngineState {
    const fn new() -> Self {
        Self {
            cells: [Cell::BLANK; BUFFER_ROWS * COLS],
            total_rows: ROWS,
            scroll: 0,
            max_scroll: 0,
            row: 0,
            col: 0,
            color: DEFAULT_COLOR,
            backend: None,
        }
    }

    fn backend(&self) -> &'static dyn VideoBackend {
        self.backend
            .expect("term engine used before term::init completed")
    }
}

/// Holder for the engine's singleton state.
///
/// Deliberately *not* a `spin::Mutex`: the same hazard documented on
/// [`ring::ActionRing`] applies here. `drain` only ever runs in the
/// context that won the ring's was-empty election, so at most one context
/// is ever mutating `EngineState` at a time -- a nested interrupt that
/// also wins that election runs its own `drain` to completion (including
/// any further nesting) before the preempted outer context resumes, so
/// the two never overlap despite both reaching for `&mut`. A `Mutex`
/// would turn that safe nesting into a self-deadlock the moment a nested
/// drain owner raced the outer one while the outer held the lock.
struct EngineCell(UnsafeCell<EngineState>);

// SAFETY: see the single-drain-owner discipline documented above and on
// `ring::ActionRing`; `engine()` is only called from `init` (before the
// ring can receive a submission) and from `drain` (one owner at a time).
unsafe impl Sync for EngineCell {}

static ENGINE: EngineCell = EngineCell(UnsafeCell::new(EngineState::new()));
static RING: ActionRing = ActionRing::new();
static INITIALIZED: spin::Once<()> = spin::Once::new();

/// Color used by subsequent plain [`write_char`] calls, mirrored outside
/// `EngineState` so a producer context can read it without reaching into
/// the engine's single-owner state (see [`EngineCell`]).
static CURRENT_COLOR: AtomicU8 = AtomicU8::new(DEFAULT_COLOR);

/// # Safety
/// Caller must be either `init` or `drain`; see [`EngineCell`].
fn engine() -> &'static mut EngineState {
    // SAFETY: upheld by callers per the doc comment above.
    unsafe { &mut *ENGINE.0.get() }
}

/// Bring the terminal engine up: clear the backend, enable the cursor, and
/// home it at (0, 0) with `default_color`.
///
/// `rows`/`cols` must equal [`ROWS`]/[`COLS`] -- the engine's storage is
/// sized at compile time for the reference configuration, so any other
/// geometry is rejected rather than silently clamped.
///
/// Must run with interrupts disabled and before any other code in this
/// crate can reach `backend`.
pub fn init(
    backend: &'static dyn VideoBackend,
    rows: usize,
    cols: usize,
    default_color: u8,
) -> KernelResult<()> {
    if rows != ROWS {
        return Err(KernelError::InvalidArgument {
            name: "rows",
            value: "must equal term::ROWS",
        });
    }
    if cols != COLS {
        return Err(KernelError::InvalidArgument {
            name: "cols",
            value: "must equal term::COLS",
        });
    }

    let state = engine();
    state.backend = Some(backend);
    state.color = default_color;
    state.row = 0;
    state.col = 0;
    state.scroll = 0;
    state.max_scroll = 0;
    state.total_rows = ROWS;
    state.cells = [Cell::BLANK; BUFFER_ROWS * COLS];

    for physical_row in 0..ROWS {
        state.clear_physical_row(physical_row, default_color);
    }
    state.render_viewport();
    backend.move_cursor(0, 0);
    backend.set_cursor_visible(true);

    CURRENT_COLOR.store(default_color, Ordering::Relaxed);
    INITIALIZED.call_once(|| ());
    Ok(())
}

pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}

/// Run every action currently in the ring, stopping the moment it is
/// observed empty. Only the context that found the ring empty on its own
/// `submit` ever calls this.
fn drain() {
    while let Some(action) = RING.try_pop() {
        let state = engine();
        match action.decode() {
            action::Decoded::WriteChar { ch, color } => state.act_write_char(ch, color),
            action::Decoded::MoveCursor { row, col } => {
                state.act_move_cursor(row as usize, col as usize)
            }
            action::Decoded::ScrollUp { rows } => state.act_scroll_up(rows as usize),
            action::Decoded::ScrollDown { rows } => state.act_scroll_down(rows as usize),
            action::Decoded::SetColor { color } => {
                state.act_set_color(color);
                CURRENT_COLOR.store(color, Ordering::Relaxed);
            }
            action::Decoded::Unknown => {
                panic!("term: corrupt action in ring")
            }
        }
    }
}

fn submit_and_maybe_drain(action: Action) {
    match RING.submit(action) {
        Ok(true) => drain(),
        Ok(false) => {}
        Err(()) => panic!("term: action ring full"),
    }
}

/// Write one character at the cursor, advancing it (or acting on `\n`,
/// `\r`, `\t`, `\b` per the engine's control-character handling).
pub fn write_char(ch: u8) {
    let color = CURRENT_COLOR.load(Ordering::Relaxed);
    submit_and_maybe_drain(Action::write_char(ch, color));
}

/// Write one character with an explicit color attribute, leaving the
/// engine's current color unchanged for subsequent plain `write_char` calls.
pub fn write_char_attr(ch: u8, color: u8) {
    submit_and_maybe_drain(Action::write_char(ch, color));
}

/// Move the cursor to `(row, col)`, clamped into `0..ROWS` / `0..COLS`.
pub fn move_cursor(row: u16, col: u16) {
    submit_and_maybe_drain(Action::move_cursor(row, col));
}

/// Scroll the viewport up (toward older history) by `rows`.
pub fn scroll_up(rows: u32) {
    submit_and_maybe_drain(Action::scroll_up(rows));
}

/// Scroll the viewport down (toward newer history) by `rows`.
pub fn scroll_down(rows: u32) {
    submit_and_maybe_drain(Action::scroll_down(rows));
}

/// Set the color attribute used by subsequent `write_char` calls.
pub fn set_color(color: u8) {
    submit_and_maybe_drain(Action::set_color(color));
}

#[cfg(test)]
mod tests {
    use super::backend::recording::RecordingBackend;
    use super::*;

    static BACKEND: RecordingBackend = RecordingBackend::new();

    /// `engine()`'s safety contract only allows `init`/`drain` to touch the
    /// singleton; `cargo test` also runs each `#[test]` fn on its own OS
    /// thread by default, so every test that drives the public API through
    /// `ENGINE`/`RING` first takes this lock to serialize that access. It
    /// has no counterpart in the bare-metal target, where there is only one
    /// core and reentrancy is nested, never truly concurrent.
    static TEST_LOCK: spin::Mutex<()> = spin::Mutex::new(());

    fn reset() -> (spin::MutexGuard<'static, ()>, &'static RecordingBackend) {
        let guard = TEST_LOCK.lock();
        BACKEND.clear();
        *engine() = EngineState::new();
        init(&BACKEND, ROWS, COLS, DEFAULT_COLOR).unwrap();
        (guard, &BACKEND)
    }

    #[test]
    fn init_rejects_wrong_geometry() {
        let _g = TEST_LOCK.lock();
        static BACKEND2: RecordingBackend = RecordingBackend::new();
        assert!(init(&BACKEND2, ROWS + 1, COLS, DEFAULT_COLOR).is_err());
        assert!(init(&BACKEND2, ROWS, COLS - 1, DEFAULT_COLOR).is_err());
    }

    #[test]
    fn write_char_advances_cursor() {
        let (_g, backend) = reset();
        write_char(b'a');
        let state = engine();
        assert_eq!((state.row, state.col), (0, 1));
        assert!(backend.len() > 0);
    }

    #[test]
    fn newline_moves_to_next_row_start() {
        let (_g, _backend) = reset();
        write_char(b'a');
        write_char(b'\n');
        let state = engine();
        assert_eq!(state.col, 0);
        assert_eq!(state.row, 1);
    }

    #[test]
    fn carriage_return_returns_to_column_zero() {
        let (_g, _backend) = reset();
        write_char(b'a');
        write_char(b'b');
        write_char(b'\r');
        let state = engine();
        assert_eq!(state.col, 0);
        assert_eq!(state.row, 0);
    }

    #[test]
    fn tab_is_a_no_op() {
        let (_g, _backend) = reset();
        write_char(b'\t');
        let state = engine();
        assert_eq!((state.row, state.col), (0, 0));
    }

    #[test]
    fn backspace_moves_cursor_left_and_erases() {
        let (_g, _backend) = reset();
        write_char(b'a');
        write_char(b'b');
        write_char(8);
        let state = engine();
        assert_eq!((state.row, state.col), (0, 1));
    }

    #[test]
    fn move_cursor_clamps_out_of_range() {
        let (_g, _backend) = reset();
        move_cursor(9999, 9999);
        let state = engine();
        assert_eq!(state.row, ROWS - 1);
        assert_eq!(state.col, COLS - 1);
    }

    #[test]
    fn writing_past_last_column_wraps_to_next_row() {
        let (_g, _backend) = reset();
        for _ in 0..COLS {
            write_char(b'x');
        }
        let state = engine();
        assert_eq!((state.row, state.col), (1, 0));
    }

    #[test]
    fn filling_last_row_scrolls_the_viewport() {
        let (_g, _backend) = reset();
        for _ in 0..ROWS {
            for _ in 0..COLS {
                write_char(b'x');
            }
        }
        let state = engine();
        assert_eq!(state.row, ROWS - 1);
        assert!(state.max_scroll > 0);
    }

    #[test]
    fn write_char_mirrors_to_serial() {
        let (_g, _backend) = reset();
        let _ = crate::serial::test_mirror::take();
        write_char(b'Q');
        assert_eq!(crate::serial::test_mirror::take(), std::vec![b'Q']);
    }
}
