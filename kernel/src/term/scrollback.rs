//! Scrollback storage: a circular buffer of rows, addressed by a logical
//! row number that only ever increases. Physical storage wraps modulo
//! [`BUFFER_ROWS`].

use super::cell::Cell;
use super::{EngineState, BUFFER_ROWS, COLS, ROWS};

impl EngineState {
    fn physical_row(logical_row: usize) -> usize {
        logical_row % BUFFER_ROWS
    }

    fn cell_index(physical_row: usize, col: usize) -> usize {
        physical_row * COLS + col
    }

    /// Logical row number of the top of the current viewport.
    fn viewport_top(&self) -> usize {
        (self.total_rows - ROWS).saturating_sub(self.scroll)
    }

    pub(super) fn clear_physical_row(&mut self, physical_row: usize, color: u8) {
        let blank = Cell::new(b' ', color);
        for col in 0..COLS {
            self.cells[Self::cell_index(physical_row, col)] = blank;
        }
    }

    pub(super) fn get_cell(&self, logical_row: usize, col: usize) -> Cell {
        self.cells[Self::cell_index(Self::physical_row(logical_row), col)]
    }

    pub(super) fn put_cell(&mut self, logical_row: usize, col: usize, cell: Cell) {
        self.cells[Self::cell_index(Self::physical_row(logical_row), col)] = cell;
    }

    /// Append a new blank logical row at the bottom, scrolling older
    /// content out of the buffer once it is full. Resets the viewport to
    /// the live bottom.
    pub(super) fn append_row(&mut self, color: u8) {
        let new_logical = self.total_rows;
        self.total_rows += 1;
        self.clear_physical_row(Self::physical_row(new_logical), color);

        self.max_scroll = self
            .total_rows
            .saturating_sub(ROWS)
            .min(BUFFER_ROWS - ROWS);
        self.scroll = 0;
    }

    /// Redraw every visible row from scrollback storage to the backend.
    pub(super) fn render_viewport(&self) {
        let top = self.viewport_top();
        let backend = self.backend();
        for visible_row in 0..ROWS {
            let logical_row = top + visible_row;
            for col in 0..COLS {
                let cell = self.get_cell(logical_row, col);
                backend.set_char_at(visible_row, col, cell.glyph(), cell.attr());
            }
        }
    }

    /// Clamp and apply a new scroll offset, re-rendering if it changed.
    /// Hides the hardware cursor while scrolled away from the live bottom,
    /// since the logical cursor position is then off-screen.
    pub(super) fn set_scroll(&mut self, requested: usize) {
        let clamped = requested.min(self.max_scroll);
        if clamped == self.scroll {
            return;
        }
        self.scroll = clamped;
        self.render_viewport();

        let backend = self.backend();
        if self.scroll == 0 {
            backend.set_cursor_visible(true);
            backend.move_cursor(self.row, self.col);
        } else {
            backend.set_cursor_visible(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::backend::recording::RecordingBackend;
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
    fn append_row_grows_max_scroll_once_buffer_is_full_of_history() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        assert_eq!(state.max_scroll, 0);
        state.append_row(DEFAULT_COLOR);
        assert_eq!(state.max_scroll, 1);
        assert_eq!(state.total_rows, ROWS + 1);
    }

    #[test]
    fn max_scroll_caps_at_buffer_capacity() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        for _ in 0..(BUFFER_ROWS * 2) {
            state.append_row(DEFAULT_COLOR);
        }
        assert_eq!(state.max_scroll, BUFFER_ROWS - ROWS);
    }

    #[test]
    fn set_scroll_clamps_to_max_scroll() {
        static BACKEND: RecordingBackend = RecordingBackend::new();
        let mut state = fresh(&BACKEND);
        state.append_row(DEFAULT_COLOR);
        state.append_row(DEFAULT_COLOR);
        state.set_scroll(9999);
        assert_eq!(state.scroll, state.max_scroll);
    }
}
