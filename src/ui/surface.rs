//! Pixel surfaces the terminal can be drawn onto.
//!
//! A [`Surface`] is anything offering a fixed-size drawable area with filled
//! rectangles and monospaced glyphs. Two implementations ship with the crate:
//!
//! - [`CellCanvas`]: in-memory surface where one pixel is one console cell
//! - [`ConsoleSurface`]: a `CellCanvas` presented on the host console via crossterm

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use thiserror::Error;
use tracing::info;

use crate::config::Rgb;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Drawing context unavailable: {0}")]
    Unavailable(String),

    #[error("Surface has no usable glyph metrics ({width}x{height})")]
    InvalidMetrics { width: f32, height: f32 },

    #[error("Surface I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Font request handed to a surface
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A drawable 2D surface
pub trait Surface {
    /// Acquire the drawing context. Called once when the terminal is opened.
    fn attach(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// Size in pixels (width, height)
    fn size(&self) -> (u32, u32);

    fn set_font(&mut self, font: &FontSpec);

    /// Advance width of `ch` in the current font
    fn measure_glyph(&self, ch: char) -> f32;

    /// Height of one text line in the current font
    fn line_height(&self) -> f32;

    /// Fill a rectangle, blending with `alpha` over what is already there
    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32);

    /// Draw one glyph with its top-left corner at (x, y)
    fn draw_glyph(&mut self, ch: char, x: u32, y: u32, color: Rgb);

    /// Push the finished frame to the display
    fn present(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// One pixel of a [`CellCanvas`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasCell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

/// In-memory surface whose pixels are character cells
pub struct CellCanvas {
    width: u32,
    height: u32,
    font: Option<FontSpec>,
    cells: Vec<CanvasCell>,
}

impl CellCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font: None,
            cells: vec![Self::EMPTY; width as usize * height as usize],
        }
    }

    const EMPTY: CanvasCell = CanvasCell {
        ch: ' ',
        fg: Rgb::new(255, 255, 255),
        bg: Rgb::new(0, 0, 0),
    };

    /// Change the pixel size; contents are discarded
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self {
            font: self.font.take(),
            ..Self::new(width, height)
        };
    }

    pub fn font(&self) -> Option<&FontSpec> {
        self.font.as_ref()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&CanvasCell> {
        if x < self.width && y < self.height {
            self.cells.get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut CanvasCell> {
        if x < self.width && y < self.height {
            self.cells.get_mut(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Characters of one pixel row
    pub fn line(&self, y: u32) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .map(|cell| cell.ch)
            .collect()
    }
}

impl Surface for CellCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font = Some(font.clone());
    }

    fn measure_glyph(&self, _ch: char) -> f32 {
        1.0
    }

    fn line_height(&self) -> f32 {
        1.0
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let right = rect.x.saturating_add(rect.width).min(self.width);
        let bottom = rect.y.saturating_add(rect.height).min(self.height);
        for y in rect.y..bottom {
            for x in rect.x..right {
                if let Some(cell) = self.get_mut(x, y) {
                    if alpha >= 1.0 {
                        *cell = CanvasCell {
                            ch: ' ',
                            fg: cell.fg,
                            bg: color,
                        };
                    } else {
                        // Translucent fills tint whatever is already drawn
                        cell.bg = color.blend_over(cell.bg, alpha);
                        cell.fg = color.blend_over(cell.fg, alpha);
                    }
                }
            }
        }
    }

    fn draw_glyph(&mut self, ch: char, x: u32, y: u32, color: Rgb) {
        if let Some(cell) = self.get_mut(x, y) {
            cell.ch = ch;
            cell.fg = color;
        }
    }
}

/// Host console presented through crossterm
pub struct ConsoleSurface {
    canvas: CellCanvas,
    attached: bool,
}

impl ConsoleSurface {
    /// Create a surface covering the current console
    pub fn new() -> Result<Self, SurfaceError> {
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            canvas: CellCanvas::new(cols as u32, rows as u32),
            attached: false,
        })
    }

    /// Follow a console resize event
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.canvas.resize(cols as u32, rows as u32);
    }

    /// Restore the console
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.attached = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, Show, LeaveAlternateScreen);
        let _ = stdout.flush();
        terminal::disable_raw_mode()
    }
}

impl Surface for ConsoleSurface {
    fn attach(&mut self) -> Result<(), SurfaceError> {
        terminal::enable_raw_mode()
            .map_err(|e| SurfaceError::Unavailable(format!("raw mode: {}", e)))?;
        self.attached = true;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide, MoveTo(0, 0))?;
        info!(
            "console surface attached ({}x{})",
            self.canvas.width, self.canvas.height
        );
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.canvas.size()
    }

    fn set_font(&mut self, font: &FontSpec) {
        // The console picks its own font; remember the request only
        self.canvas.set_font(font);
    }

    fn measure_glyph(&self, ch: char) -> f32 {
        self.canvas.measure_glyph(ch)
    }

    fn line_height(&self) -> f32 {
        self.canvas.line_height()
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        self.canvas.fill_rect(rect, color, alpha);
    }

    fn draw_glyph(&mut self, ch: char, x: u32, y: u32, color: Rgb) {
        self.canvas.draw_glyph(ch, x, y, color);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if !self.attached {
            return Ok(());
        }

        let mut stdout = io::stdout().lock();
        let mut current: Option<(Rgb, Rgb)> = None;

        for y in 0..self.canvas.height {
            queue!(stdout, MoveTo(0, y as u16))?;
            for x in 0..self.canvas.width {
                let Some(cell) = self.canvas.get(x, y) else {
                    continue;
                };
                if current != Some((cell.fg, cell.bg)) {
                    queue!(
                        stdout,
                        SetForegroundColor(cell.fg.to_crossterm()),
                        SetBackgroundColor(cell.bg.to_crossterm())
                    )?;
                    current = Some((cell.fg, cell.bg));
                }
                // Raw control characters would drive the host console
                let ch = if cell.ch.is_control() { ' ' } else { cell.ch };
                queue!(stdout, Print(ch))?;
            }
        }

        queue!(stdout, ResetColor)?;
        stdout.flush()?;
        Ok(())
    }
}

impl Drop for ConsoleSurface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_glyph() {
        let mut canvas = CellCanvas::new(4, 2);
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);

        canvas.fill_rect(Rect { x: 1, y: 0, width: 2, height: 2 }, blue, 1.0);
        canvas.draw_glyph('Z', 1, 1, red);

        assert_eq!(canvas.get(0, 0).map(|c| c.bg), Some(Rgb::new(0, 0, 0)));
        assert_eq!(canvas.get(2, 0).map(|c| c.bg), Some(blue));
        assert_eq!(canvas.get(1, 1), Some(&CanvasCell { ch: 'Z', fg: red, bg: blue }));
        assert_eq!(canvas.line(1), " Z  ");
    }

    #[test]
    fn test_translucent_fill_keeps_glyph() {
        let mut canvas = CellCanvas::new(1, 1);
        canvas.fill_rect(Rect { x: 0, y: 0, width: 1, height: 1 }, Rgb::new(0, 0, 0), 1.0);
        canvas.draw_glyph('a', 0, 0, Rgb::new(0, 0, 0));
        canvas.fill_rect(Rect { x: 0, y: 0, width: 1, height: 1 }, Rgb::new(200, 200, 200), 0.5);

        let cell = canvas.get(0, 0).copied().unwrap();
        assert_eq!(cell.ch, 'a');
        assert_eq!(cell.bg, Rgb::new(100, 100, 100));
    }

    #[test]
    fn test_fill_clipped_to_canvas() {
        let mut canvas = CellCanvas::new(2, 2);
        canvas.fill_rect(Rect { x: 1, y: 1, width: 10, height: 10 }, Rgb::new(1, 2, 3), 1.0);
        assert_eq!(canvas.get(1, 1).map(|c| c.bg), Some(Rgb::new(1, 2, 3)));
        assert_eq!(canvas.get(2, 2), None);
    }

    #[test]
    fn test_resize_keeps_font() {
        let mut canvas = CellCanvas::new(2, 2);
        canvas.set_font(&FontSpec { family: "monospace".into(), size: 12.0 });
        canvas.resize(5, 3);
        assert_eq!(canvas.size(), (5, 3));
        assert_eq!(canvas.font().map(|f| f.size), Some(12.0));
    }
}
