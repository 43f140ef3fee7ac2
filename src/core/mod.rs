//! Core terminal emulation components.
//!
//! This module contains the low-level terminal emulation logic:
//!
//! - **term::state**: cell grid, cursor and graphic rendition
//! - **term::parser**: ANSI escape sequence interpreter
//!
//! # Architecture
//!
//! ```text
//! Terminal (crate::terminal)
//! ├── TerminalState
//! │   ├── ScreenBuffer (flat cell grid)
//! │   ├── Cursor
//! │   └── Rendition (current fg/bg)
//! ├── VtParser (Ground / Escape / CsiCollecting)
//! └── Renderer + Surface (crate::ui)
//! ```

pub mod term;
