//! VT terminal emulation: screen state and escape sequence parser.

pub mod parser;
pub mod state;

pub use parser::VtParser;
pub use state::{
    Cell, ClearMode, Color, Cursor, Direction, Rendition, ScreenBuffer, TerminalState,
};
