//! Terminal emulator core
//!
//! [`Terminal`] owns the screen state and escape parser, paints onto an
//! attached [`Surface`] and turns key presses into output for the transport.
//!
//! ```text
//! transport ──write(text)──► VtParser ──► TerminalState ──render──► Surface
//! keyboard ──key_down(key)──► KeyMapper ──on_output──► transport
//! ```
//!
//! Everything runs synchronously on the caller's thread. An escape sequence
//! may be split across any number of `write` calls.

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::term::{ClearMode, TerminalState, VtParser};
use crate::ui::keymapper::{KeyMapper, KeyPress};
use crate::ui::renderer::{CellMetrics, Renderer};
use crate::ui::surface::{CellCanvas, FontSpec, Surface, SurfaceError};

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Failed to attach surface: {0}")]
    Surface(#[from] SurfaceError),
}

type OutputCallback = Box<dyn FnMut(&str)>;

/// Terminal emulator bound to a pixel surface
pub struct Terminal<S: Surface = CellCanvas> {
    state: TerminalState,
    parser: VtParser,
    renderer: Renderer,
    font: FontSpec,
    surface: Option<S>,
    output: Option<OutputCallback>,
}

impl<S: Surface> Terminal<S> {
    /// Create a detached terminal sized from the configured initial grid
    pub fn new(config: &Config) -> Self {
        Self {
            state: TerminalState::new(config.cols, config.rows),
            parser: VtParser::new(),
            renderer: Renderer::new(config.color_scheme(), config.cursor_alpha()),
            font: FontSpec {
                family: config.font_family.clone(),
                size: config.font_size,
            },
            surface: None,
            output: None,
        }
    }

    /// Attach a surface: acquire its drawing context, measure the font once
    /// and fit the grid to the surface.
    pub fn open(&mut self, mut surface: S) -> Result<(), TerminalError> {
        surface.attach()?;
        surface.set_font(&self.font);
        let metrics = CellMetrics::measure(&surface)?;
        info!("surface attached, cell size {}x{}", metrics.width, metrics.height);

        self.renderer.set_metrics(metrics);
        self.surface = Some(surface);
        if !self.fit() {
            self.render();
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    /// Detach and return the surface
    pub fn close(&mut self) -> Option<S> {
        self.surface.take()
    }

    /// Register the callback receiving encoded key presses
    pub fn on_output<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.output = Some(Box::new(callback));
    }

    /// Feed text from the remote side, then render once
    pub fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if self.parser.advance(ch, &mut self.state) {
                continue;
            }
            match ch {
                '\n' => self.state.linefeed(),
                '\r' => self.state.carriage_return(),
                '\x08' => self.state.backspace(),
                '\t' => self.state.tab(),
                _ => self.state.put_char(ch),
            }
        }
        self.render();
    }

    /// Blank the screen and home the cursor. An in-flight escape sequence
    /// is left untouched.
    pub fn clear(&mut self) {
        self.state.clear(ClearMode::Full);
        self.render();
    }

    /// Resize the grid. Returns false (and skips the redraw) when unchanged.
    pub fn resize(&mut self, cols: u16, rows: u16) -> bool {
        if !self.state.resize(cols, rows) {
            return false;
        }
        self.render();
        true
    }

    /// Resize the grid to whatever fits the attached surface
    pub fn fit(&mut self) -> bool {
        let (Some(surface), Some(metrics)) = (self.surface.as_ref(), self.renderer.metrics()) else {
            return false;
        };
        let (width, height) = surface.size();
        let (cols, rows) = metrics.grid_size(width, height);
        debug!("fit {}x{} px -> {}x{} cells", width, height, cols, rows);
        self.resize(cols, rows)
    }

    /// Encode a key press and hand it to the output callback.
    /// Returns whether anything was produced.
    pub fn key_down(&mut self, press: &KeyPress) -> bool {
        let Some(encoded) = KeyMapper::encode(press) else {
            return false;
        };
        if let Some(output) = self.output.as_mut() {
            output(&encoded);
        }
        true
    }

    /// Paint the grid onto the attached surface
    pub fn render(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            self.renderer.render(&self.state, surface);
        }
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}
