//! Terminal renderer
//!
//! Paints the terminal state onto a [`Surface`].

use tracing::warn;

use crate::config::ColorScheme;
use crate::core::term::TerminalState;
use crate::ui::surface::{Rect, Surface, SurfaceError};

/// Glyph used to measure the cell width
const MEASURE_GLYPH: char = 'M';

/// Pixel size of one character cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u32,
    pub height: u32,
}

impl CellMetrics {
    /// Measure the surface's current font
    pub fn measure<S: Surface + ?Sized>(surface: &S) -> Result<Self, SurfaceError> {
        let width = surface.measure_glyph(MEASURE_GLYPH);
        let height = surface.line_height();
        if !(width.is_finite() && height.is_finite()) || width < 0.5 || height < 0.5 {
            return Err(SurfaceError::InvalidMetrics { width, height });
        }
        Ok(Self {
            width: width.round() as u32,
            height: height.round() as u32,
        })
    }

    /// How many whole cells fit into a pixel area (at least 1x1)
    pub fn grid_size(&self, pixel_width: u32, pixel_height: u32) -> (u16, u16) {
        let cols = (pixel_width / self.width).clamp(1, u16::MAX as u32) as u16;
        let rows = (pixel_height / self.height).clamp(1, u16::MAX as u32) as u16;
        (cols, rows)
    }

    fn cell_rect(&self, row: u16, col: u16) -> Rect {
        Rect {
            x: col as u32 * self.width,
            y: row as u32 * self.height,
            width: self.width,
            height: self.height,
        }
    }
}

/// Terminal renderer
pub struct Renderer {
    scheme: ColorScheme,
    cursor_alpha: f32,
    metrics: Option<CellMetrics>,
}

impl Renderer {
    pub fn new(scheme: ColorScheme, cursor_alpha: f32) -> Self {
        Self {
            scheme,
            cursor_alpha,
            metrics: None,
        }
    }

    pub fn metrics(&self) -> Option<CellMetrics> {
        self.metrics
    }

    /// Fix the cell size; done once when a surface is attached
    pub fn set_metrics(&mut self, metrics: CellMetrics) {
        self.metrics = Some(metrics);
    }

    /// Paint every cell, then the cursor overlay
    pub fn render<S: Surface + ?Sized>(&self, state: &TerminalState, surface: &mut S) {
        let Some(metrics) = self.metrics else {
            return;
        };

        for row in 0..state.rows() {
            for (col, cell) in state.screen().row(row).iter().enumerate() {
                let rect = metrics.cell_rect(row, col as u16);
                surface.fill_rect(rect, self.scheme.resolve_bg(cell.bg), 1.0);
                if !cell.is_blank() {
                    surface.draw_glyph(cell.ch, rect.x, rect.y, self.scheme.resolve_fg(cell.fg));
                }
            }
        }

        let cursor = state.cursor();
        surface.fill_rect(
            metrics.cell_rect(cursor.row, cursor.col),
            self.scheme.foreground,
            self.cursor_alpha,
        );

        if let Err(e) = surface.present() {
            warn!("present failed: {}", e);
        }
    }
}

/// Simple debug renderer that outputs to a string
pub struct DebugRenderer;

impl DebugRenderer {
    /// Render state to string (for debugging)
    pub fn render(state: &TerminalState) -> String {
        let cursor = state.cursor();
        let mut output = String::new();

        output.push_str(&format!("=== Terminal {}x{} ===\n", state.cols(), state.rows()));
        output.push_str(&format!("Cursor: ({}, {})\n", cursor.col, cursor.row));
        output.push_str("─".repeat(state.cols() as usize).as_str());
        output.push('\n');

        for row in 0..state.rows() {
            // Row indicator
            output.push(if row == cursor.row { '>' } else { ' ' });
            for (col, cell) in state.screen().row(row).iter().enumerate() {
                if row == cursor.row && col == cursor.col as usize {
                    output.push('█');
                } else {
                    output.push(cell.ch);
                }
            }
            output.push('\n');
        }

        output.push_str("─".repeat(state.cols() as usize).as_str());
        output.push('\n');

        output
    }
}
