//! Rendering and input handling.
//!
//! - **surface**: the pixel surface abstraction plus in-memory and console surfaces
//! - **renderer**: paints the cell grid and cursor onto a surface
//! - **keymapper**: keyboard input to output character sequence mapping

pub mod keymapper;
pub mod renderer;
pub mod surface;

pub use keymapper::{Key, KeyMapper, KeyPress, ModifierKey, Modifiers};
pub use renderer::{CellMetrics, DebugRenderer, Renderer};
pub use surface::{CanvasCell, CellCanvas, ConsoleSurface, FontSpec, Rect, Surface, SurfaceError};
