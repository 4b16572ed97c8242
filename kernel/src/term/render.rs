//! Cursor, color, and the per-action handlers that turn a decoded
//! [`super::action::Action`] into scrollback mutations and backend calls.
//!
//! Control characters are limited to the four the engine understands:
//! `\n` (new row), `\r` (column 0), `\t` (no-op -- no tab stops), and
//! backspace (move left, does not erase). Anything else not listed here is
//! out of scope; an unrecognized ordinary byte is written as its own glyph.

use super::cell::Cell;
use super::{EngineState, COLS, ROWS};

const BACKSPACE: u8 = 0x08;

impl EngineState {
    fn cursor_logical_row(&self) -> usize {
        self.total_rows - ROWS + self.row
    }

    fn sync_backend_cursor(&self) {
        if self.scroll == 0 {
            self.backend().move_cursor(self.row, self.col);
        }
    }

    fn incr_row(&mut self) {
        if self.row == ROWS - 1 {
            let color = self.color;
            self.append_row(color);
            self.render_viewport();
        } else {
            self.row += 1;
        }
    }

    pub(super) fn act_write_char(&mut self, ch: u8, color: u8) {
        // Fire-and-forget diagnostics mirror; failures are the serial
        // driver's problem, never the engine's.
        crate::serial::write_byte(ch);

        // Writes always target the live bottom of the buffer.
        self.set_scroll(0);

        match ch {
            b'\n' => {
                self.col = 0;
                self.incr_row();
            }
            b'\r' => {
                self.col = 0;
            }
            b'\t' => {}
            BACKSPACE => {
                if self.col > 0 {
                    self.col -= 1;
                    let logical_row = self.cursor_logical_row();
                    self.put_cell(logical_row, self.col, Cell::new(b' ', color));
                    self.backend().set_char_at(self.row, self.col, b' ', color);
                }
            }
            _ => {
                let logical_row = self.cursor_logical_row();
                self.put_cell(logical_row, self.col, Cell::new(ch, color));
                self.backend().set_char_at(self.row, self.col, ch, color);
                self.col += 1;
                if self.col == COLS {
                    self.col = 0;
                    self.incr_row();
                }
            }
        }

        self.sync_backend_cursor();
    }

    pub(super) fn act_move_cursor(&mut self, row: usize, col: usize) {
        self.row = row.min(ROWS - 1);
        self.col = col.min(COLS - 1);
        self.sync_backend_cursor();
    }

    pub(super) fn act_scroll_up(&mut self, rows: usize) {
        self.set_scroll(self.scroll + rows);
    }

    pub(super) fn act_scroll_down(&mut self, rows: usize) {
        self.set_scroll(self.scroll.saturating_sub(rows));
    }

    pub(super) fn act_set_color(&mut self, color: u8) {
        self.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::super::backend::recording::{Call, RecordingBackend};
    use super::super::DEFAULT_COLOR;
    use super::*;

    fn fresh(backend: &'static RecordingBackend) -> EngineState {
        let mut state = EngineState::new();
        state.backend = Some(backend);
        for r in 0..ROWS {
            state.clear_physical_row(r, DEFAULT_COLOR);
        }
        state
    }

    #[test]
    fn ordinary_char_writes_and_advances() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        state.act_write_char(b'A', DEFAULT_COLOR);
        assert_eq!((state.row, state.col), (0, 1));
        assert_eq!(
            BACKEND.last(),
            Some(Call::MoveCursor { row: 0, col: 1 })
        );
    }

    #[test]
    fn newline_advances_row_and_zeroes_column() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        state.act_write_char(b'A', DEFAULT_COLOR);
        state.act_write_char(b'\n', DEFAULT_COLOR);
        assert_eq!((state.row, state.col), (1, 0));
    }

    #[test]
    fn last_row_newline_scrolls_instead_of_overflowing() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        state.row = ROWS - 1;
        state.act_write_char(b'\n', DEFAULT_COLOR);
        assert_eq!(state.row, ROWS - 1);
        assert_eq!(state.total_rows, ROWS + 1);
    }

    #[test]
    fn backspace_at_column_zero_is_a_no_op() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        let before = BACKEND.len();
        state.act_write_char(BACKSPACE, DEFAULT_COLOR);
        assert_eq!(state.col, 0);
        assert_eq!(BACKEND.len(), before);
    }

    #[test]
    fn backspace_erases_the_previous_cell() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        state.act_write_char(b'a', DEFAULT_COLOR);
        state.act_write_char(b'b', DEFAULT_COLOR);
        state.act_write_char(BACKSPACE, DEFAULT_COLOR);
        assert_eq!(state.col, 1);
        assert_eq!(state.get_cell(0, 1).glyph(), b' ');
        let mut saw_erase = false;
        BACKEND.for_each(|call| {
            if call
                == (Call::SetChar {
                    row: 0,
                    col: 1,
                    glyph: b' ',
                    attr: DEFAULT_COLOR,
                })
            {
                saw_erase = true;
            }
        });
        assert!(saw_erase, "backspace should repaint the erased cell");
    }

    #[test]
    fn backspace_sequence_matches_scenario_s6() {
        // "ab\b\bc": second \b moves col 1 -> 0, erasing 'a'; 'c' then lands
        // at col 0 and advances to col 1.
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        for ch in [b'a', b'b', BACKSPACE, BACKSPACE, b'c'] {
            state.act_write_char(ch, DEFAULT_COLOR);
        }
        assert_eq!(state.col, 1);
        assert_eq!(state.get_cell(0, 0).glyph(), b'c');
        assert_eq!(state.get_cell(0, 1).glyph(), b' ');
    }

    #[test]
    fn scrolling_back_hides_cursor_and_returning_shows_it() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        state.act_write_char(b'\n', DEFAULT_COLOR);
        state.act_scroll_up(1);
        assert!(BACKEND
            .last()
            .map(|c| c == Call::SetCursorVisible(false))
            .unwrap_or(false));

        state.act_scroll_down(1);
        assert_eq!(state.scroll, 0);
    }

    #[test]
    fn set_color_does_not_touch_backend() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        let before = BACKEND.len();
        state.act_set_color(0x1E);
        assert_eq!(state.color, 0x1E);
        assert_eq!(BACKEND.len(), before);
    }
}
