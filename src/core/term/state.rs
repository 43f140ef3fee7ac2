//! Terminal state management
//!
//! This module defines the terminal's screen buffer, cursor state and the
//! current graphic rendition. Every operation here is total: inputs are
//! clamped into the grid, nothing ever fails.

use tracing::debug;

/// Width of a horizontal tab stop
const TAB_WIDTH: u16 = 8;

/// Cell color: the configured default or an entry of the 16-color palette
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Color {
    #[default]
    Default,
    /// Basic palette index 0-7 (SGR 30-37 / 40-47)
    Basic(u8),
    /// Bright palette index 0-7 (SGR 90-97 / 100-107)
    Bright(u8),
}

/// Active foreground/background pair applied to newly written cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rendition {
    pub fg: Color,
    pub bg: Color,
}

impl Rendition {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: Cell::BLANK,
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

impl Cell {
    /// Blank sentinel character
    pub const BLANK: char = ' ';

    /// A blank cell carrying the given rendition
    pub fn blank(rendition: &Rendition) -> Self {
        Self {
            ch: Self::BLANK,
            fg: rendition.fg,
            bg: rendition.bg,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.ch == Self::BLANK
    }
}

/// Cursor position (0-indexed)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub col: u16,
    pub row: u16,
}

/// Extent of an erase operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearMode {
    /// The whole screen (or line)
    Full,
    /// From the cursor to the end of the screen (or line)
    FromCursorToEnd,
}

/// Direction of a relative cursor movement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Screen buffer: `rows * cols` cells stored row-major in one allocation
pub struct ScreenBuffer {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl ScreenBuffer {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            cells: vec![Cell::default(); cols as usize * rows as usize],
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    fn index(&self, row: u16, col: u16) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    pub fn get(&self, row: u16, col: u16) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            self.cells.get(self.index(row, col))
        } else {
            None
        }
    }

    fn set(&mut self, row: u16, col: u16, cell: Cell) {
        if row < self.rows && col < self.cols {
            let idx = self.index(row, col);
            self.cells[idx] = cell;
        }
    }

    /// Cells of one row
    pub fn row(&self, row: u16) -> &[Cell] {
        if row >= self.rows {
            return &[];
        }
        let start = self.index(row, 0);
        &self.cells[start..start + self.cols as usize]
    }

    /// Fill `[from_col, to_col)` of a row with `fill`
    fn fill_row(&mut self, row: u16, from_col: u16, to_col: u16, fill: Cell) {
        if row >= self.rows {
            return;
        }
        let to_col = to_col.min(self.cols);
        if from_col >= to_col {
            return;
        }
        let start = self.index(row, from_col);
        let end = self.index(row, 0) + to_col as usize;
        self.cells[start..end].fill(fill);
    }

    /// Drop row 0 and append a row of `fill` at the bottom
    fn scroll_up(&mut self, fill: Cell) {
        let cols = self.cols as usize;
        self.cells.drain(..cols);
        self.cells.extend(std::iter::repeat(fill).take(cols));
    }

    /// Reallocate to the new size, keeping the overlapping top-left rectangle
    fn resize(&mut self, new_cols: u16, new_rows: u16) {
        let mut resized = ScreenBuffer::new(new_cols, new_rows);
        let keep_rows = self.rows.min(resized.rows);
        let keep_cols = self.cols.min(resized.cols) as usize;

        for row in 0..keep_rows {
            let src = self.index(row, 0);
            let dst = resized.index(row, 0);
            resized.cells[dst..dst + keep_cols].copy_from_slice(&self.cells[src..src + keep_cols]);
        }

        *self = resized;
    }
}

/// Terminal state holding all screen data
pub struct TerminalState {
    screen: ScreenBuffer,
    cursor: Cursor,
    rendition: Rendition,
}

impl TerminalState {
    /// Create a blank `cols` x `rows` terminal; both dimensions are clamped to at least 1.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            screen: ScreenBuffer::new(cols, rows),
            cursor: Cursor::default(),
            rendition: Rendition::default(),
        }
    }

    pub fn cols(&self) -> u16 {
        self.screen.cols
    }

    pub fn rows(&self) -> u16 {
        self.screen.rows
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.screen.get(row, col)
    }

    /// Cursor position, always inside the grid.
    ///
    /// After a character lands in the last column the column is held one past
    /// the edge until the next write wraps; it is reported clamped here.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            col: self.cursor.col.min(self.cols() - 1),
            row: self.cursor.row.min(self.rows() - 1),
        }
    }

    /// Cursor as stored, including the pending-wrap column
    #[cfg(test)]
    pub(crate) fn raw_cursor(&self) -> Cursor {
        self.cursor
    }

    #[cfg(test)]
    pub(crate) fn cell_count(&self) -> usize {
        self.screen.cells.len()
    }

    pub fn rendition(&self) -> Rendition {
        self.rendition
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.rendition.fg = color;
    }

    pub fn set_background(&mut self, color: Color) {
        self.rendition.bg = color;
    }

    pub fn reset_rendition(&mut self) {
        self.rendition.reset();
    }

    /// Text of one row with trailing blanks trimmed
    pub fn row_text(&self, row: u16) -> String {
        let text: String = self.screen.row(row).iter().map(|c| c.ch).collect();
        text.trim_end().to_string()
    }

    /// Resize the terminal. Returns false when the size is unchanged.
    pub fn resize(&mut self, cols: u16, rows: u16) -> bool {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols() && rows == self.rows() {
            return false;
        }

        debug!(
            "resize {}x{} -> {}x{}",
            self.cols(),
            self.rows(),
            cols,
            rows
        );
        self.screen.resize(cols, rows);
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.row = self.cursor.row.min(rows - 1);
        true
    }

    /// Put a character at the current cursor position
    pub fn put_char(&mut self, ch: char) {
        if self.cursor.col >= self.cols() {
            self.cursor.col = 0;
            self.linefeed();
        }
        if self.cursor.row >= self.rows() {
            self.scroll_up();
            self.cursor.row = self.rows() - 1;
        }

        let cell = Cell {
            ch,
            fg: self.rendition.fg,
            bg: self.rendition.bg,
        };
        self.screen.set(self.cursor.row, self.cursor.col, cell);
        self.cursor.col += 1;
    }

    /// Line feed - move cursor down, scroll if needed
    pub fn linefeed(&mut self) {
        let next = self.cursor.row.saturating_add(1);
        if next >= self.rows() {
            self.scroll_up();
            self.cursor.row = self.rows() - 1;
        } else {
            self.cursor.row = next;
        }
    }

    /// Carriage return - move cursor to column 0
    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
    }

    /// Destructive backspace: step left and blank the cell there
    pub fn backspace(&mut self) {
        self.cursor.col = self.cursor.col.saturating_sub(1);
        let blank = Cell::blank(&self.rendition);
        self.screen.set(self.cursor.row, self.cursor.col, blank);
    }

    /// Horizontal tab
    pub fn tab(&mut self) {
        let next = (self.cursor.col / TAB_WIDTH + 1).saturating_mul(TAB_WIDTH);
        self.cursor.col = next.min(self.cols() - 1);
    }

    fn scroll_up(&mut self) {
        let blank = Cell::blank(&self.rendition);
        self.screen.scroll_up(blank);
    }

    /// Clear the screen. `Full` also homes the cursor.
    pub fn clear(&mut self, mode: ClearMode) {
        self.erase_display(mode);
        if mode == ClearMode::Full {
            self.cursor = Cursor::default();
        }
    }

    /// Erase screen contents without moving the cursor
    pub fn erase_display(&mut self, mode: ClearMode) {
        let blank = Cell::blank(&self.rendition);
        let cols = self.cols();
        match mode {
            ClearMode::Full => {
                for row in 0..self.rows() {
                    self.screen.fill_row(row, 0, cols, blank);
                }
            }
            ClearMode::FromCursorToEnd => {
                self.screen
                    .fill_row(self.cursor.row, self.cursor.col, cols, blank);
                for row in self.cursor.row.saturating_add(1)..self.rows() {
                    self.screen.fill_row(row, 0, cols, blank);
                }
            }
        }
    }

    /// Erase within the cursor's line; the cursor does not move
    pub fn clear_line(&mut self, mode: ClearMode) {
        let blank = Cell::blank(&self.rendition);
        let from = match mode {
            ClearMode::Full => 0,
            ClearMode::FromCursorToEnd => self.cursor.col,
        };
        let cols = self.cols();
        self.screen.fill_row(self.cursor.row, from, cols, blank);
    }

    /// Set cursor position (1-indexed parameters)
    pub fn move_cursor_absolute(&mut self, row: u16, col: u16) {
        self.cursor.row = row.saturating_sub(1).min(self.rows() - 1);
        self.cursor.col = col.saturating_sub(1).min(self.cols() - 1);
    }

    /// Move the cursor `amount` cells, stopping at the grid edge
    pub fn move_cursor_relative(&mut self, direction: Direction, amount: u16) {
        let max_col = self.cols() - 1;
        let max_row = self.rows() - 1;
        let cursor = &mut self.cursor;
        match direction {
            Direction::Up => cursor.row = cursor.row.saturating_sub(amount).min(max_row),
            Direction::Down => cursor.row = cursor.row.saturating_add(amount).min(max_row),
            Direction::Left => cursor.col = cursor.col.saturating_sub(amount).min(max_col),
            Direction::Right => cursor.col = cursor.col.saturating_add(amount).min(max_col),
        }
    }
}
