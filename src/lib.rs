//! vtpane - an embeddable VT terminal view
//!
//! vtpane keeps a character-cell screen, interprets the common subset of
//! ANSI/VT escape sequences arriving from a remote process, encodes key
//! presses back into the byte stream that process expects, and paints the
//! grid onto any pixel [`Surface`](ui::Surface).
//!
//! # Supported sequences
//!
//! | Sequence | Action |
//! |----------|--------|
//! | `ESC [ n ; m H` / `f` | Cursor position (1-based) |
//! | `ESC [ n A/B/C/D` | Cursor up/down/right/left |
//! | `ESC [ 0/2 J` | Erase to end of screen / whole screen |
//! | `ESC [ 0/2 K` | Erase to end of line / whole line |
//! | `ESC [ ... m` | Colors: 0, 30-37, 40-47, 90-97, 100-107 |
//!
//! # Example
//!
//! ```
//! use vtpane::{Config, Terminal};
//! use vtpane::ui::CellCanvas;
//!
//! let mut term: Terminal<CellCanvas> = Terminal::new(&Config::default());
//! term.open(CellCanvas::new(80, 24)).unwrap();
//! term.write("Hello\r\n\x1b[31mWorld\x1b[0m");
//! assert_eq!(term.state().row_text(1), "World");
//! ```

pub mod config;
pub mod core;
pub mod terminal;
pub mod ui;

pub use config::Config;
pub use terminal::{Terminal, TerminalError};
