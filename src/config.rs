//! Configuration and color scheme management for vtpane.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.vtpane/config.toml`
//! - Built-in 16-color schemes (default, dracula, gruvbox-dark, tokyo-night)
//! - Resolution of cell colors to RGB for rendering
//!
//! # Configuration File
//!
//! ```toml
//! font_size = 14.0
//! font_family = "monospace"
//!
//! # Grid size used until a surface is attached
//! cols = 80
//! rows = 24
//!
//! # Opacity of the block cursor overlay (0.0 - 1.0)
//! cursor_alpha = 0.5
//!
//! # Color scheme: default, dracula, gruvbox-dark, tokyo-night
//! color_scheme = "tokyo-night"
//!
//! # Optional overrides of the scheme's default colors
//! foreground = "#c0caf5"
//! background = "#1a1b26"
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::term::Color;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glyph size in pixels
    pub font_size: f32,
    /// Font family handed to the surface
    pub font_family: String,
    /// Initial column count (before a surface is attached)
    pub cols: u16,
    /// Initial row count (before a surface is attached)
    pub rows: u16,
    /// Cursor overlay opacity
    pub cursor_alpha: f32,
    /// Color scheme name
    pub color_scheme: String,
    /// Default foreground override
    pub foreground: Option<Rgb>,
    /// Default background override
    pub background: Option<Rgb>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            font_family: "monospace".to_string(),
            cols: 80,
            rows: 24,
            cursor_alpha: 0.5,
            color_scheme: "default".to_string(),
            foreground: None,
            background: None,
        }
    }
}

impl Config {
    /// Load configuration from `~/.vtpane/config.toml`, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Get config file path
    pub fn config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".vtpane").join("config.toml"))
    }

    /// The color scheme with any configured default-color overrides applied
    pub fn color_scheme(&self) -> ColorScheme {
        let mut scheme = ColorScheme::by_name(&self.color_scheme);
        if let Some(fg) = self.foreground {
            scheme.foreground = fg;
        }
        if let Some(bg) = self.background {
            scheme.background = bg;
        }
        scheme
    }

    /// Cursor opacity clamped to `[0, 1]`
    pub fn cursor_alpha(&self) -> f32 {
        if self.cursor_alpha.is_finite() {
            self.cursor_alpha.clamp(0.0, 1.0)
        } else {
            Self::default().cursor_alpha
        }
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn hex(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Blend `self` over `under` with the given opacity
    pub fn blend_over(self, under: Rgb, alpha: f32) -> Rgb {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |top: u8, bottom: u8| -> u8 {
            (top as f32 * alpha + bottom as f32 * (1.0 - alpha)).round() as u8
        };
        Rgb::new(mix(self.r, under.r), mix(self.g, under.g), mix(self.b, under.b))
    }

    /// Relative brightness, used to order palette entries
    pub fn luma(&self) -> u32 {
        299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let digits = value.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(format!("expected #rrggbb, got {:?}", value));
        }
        u32::from_str_radix(digits, 16)
            .map(Rgb::hex)
            .map_err(|_| format!("invalid hex color {:?}", value))
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Color scheme definition: default colors plus the 16-color palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: String,
    pub foreground: Rgb,
    pub background: Rgb,
    /// black, red, green, yellow, blue, magenta, cyan, white
    pub basic: [Rgb; 8],
    /// Bright variants in the same order
    pub bright: [Rgb; 8],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// Classic xterm colors
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),
            foreground: Rgb::hex(0xe5e5e5),
            background: Rgb::hex(0x000000),
            basic: [
                Rgb::hex(0x000000),
                Rgb::hex(0xcd0000),
                Rgb::hex(0x00cd00),
                Rgb::hex(0xcdcd00),
                Rgb::hex(0x0000ee),
                Rgb::hex(0xcd00cd),
                Rgb::hex(0x00cdcd),
                Rgb::hex(0xe5e5e5),
            ],
            bright: [
                Rgb::hex(0x7f7f7f),
                Rgb::hex(0xff0000),
                Rgb::hex(0x00ff00),
                Rgb::hex(0xffff00),
                Rgb::hex(0x5c5cff),
                Rgb::hex(0xff00ff),
                Rgb::hex(0x00ffff),
                Rgb::hex(0xffffff),
            ],
        }
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            foreground: Rgb::hex(0xf8f8f2),
            background: Rgb::hex(0x282a36),
            basic: [
                Rgb::hex(0x21222c),
                Rgb::hex(0xff5555),
                Rgb::hex(0x50fa7b),
                Rgb::hex(0xf1fa8c),
                Rgb::hex(0xbd93f9),
                Rgb::hex(0xff79c6),
                Rgb::hex(0x8be9fd),
                Rgb::hex(0xf8f8f2),
            ],
            bright: [
                Rgb::hex(0x6272a4),
                Rgb::hex(0xff6e6e),
                Rgb::hex(0x69ff94),
                Rgb::hex(0xffffa5),
                Rgb::hex(0xd6acff),
                Rgb::hex(0xff92df),
                Rgb::hex(0xa4ffff),
                Rgb::hex(0xffffff),
            ],
        }
    }

    /// Gruvbox Dark scheme
    pub fn gruvbox_dark() -> Self {
        Self {
            name: "gruvbox-dark".to_string(),
            foreground: Rgb::hex(0xebdbb2),
            background: Rgb::hex(0x282828),
            basic: [
                Rgb::hex(0x282828),
                Rgb::hex(0xcc241d),
                Rgb::hex(0x98971a),
                Rgb::hex(0xd79921),
                Rgb::hex(0x458588),
                Rgb::hex(0xb16286),
                Rgb::hex(0x689d6a),
                Rgb::hex(0xa89984),
            ],
            bright: [
                Rgb::hex(0x928374),
                Rgb::hex(0xfb4934),
                Rgb::hex(0xb8bb26),
                Rgb::hex(0xfabd2f),
                Rgb::hex(0x83a598),
                Rgb::hex(0xd3869b),
                Rgb::hex(0x8ec07c),
                Rgb::hex(0xebdbb2),
            ],
        }
    }

    /// Tokyo Night scheme
    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),
            foreground: Rgb::hex(0xc0caf5),
            background: Rgb::hex(0x1a1b26),
            basic: [
                Rgb::hex(0x15161e),
                Rgb::hex(0xf7768e),
                Rgb::hex(0x9ece6a),
                Rgb::hex(0xe0af68),
                Rgb::hex(0x7aa2f7),
                Rgb::hex(0xbb9af7),
                Rgb::hex(0x7dcfff),
                Rgb::hex(0xa9b1d6),
            ],
            bright: [
                Rgb::hex(0x414868),
                Rgb::hex(0xff899d),
                Rgb::hex(0x9fe044),
                Rgb::hex(0xfaba4a),
                Rgb::hex(0x8db0ff),
                Rgb::hex(0xc7a9ff),
                Rgb::hex(0xa4daff),
                Rgb::hex(0xc0caf5),
            ],
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "default" => Self::default_scheme(),
            "dracula" => Self::dracula(),
            "gruvbox-dark" | "gruvbox_dark" | "gruvbox" => Self::gruvbox_dark(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            other => {
                warn!("unknown color scheme {:?}, using default", other);
                Self::default_scheme()
            }
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "dracula", "gruvbox-dark", "tokyo-night"]
    }

    /// RGB for a cell foreground
    pub fn resolve_fg(&self, color: Color) -> Rgb {
        self.resolve(color).unwrap_or(self.foreground)
    }

    /// RGB for a cell background
    pub fn resolve_bg(&self, color: Color) -> Rgb {
        self.resolve(color).unwrap_or(self.background)
    }

    fn resolve(&self, color: Color) -> Option<Rgb> {
        match color {
            Color::Default => None,
            Color::Basic(n) => Some(self.basic[n as usize % 8]),
            Color::Bright(n) => Some(self.bright[n as usize % 8]),
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!((config.cols, config.rows), (80, 24));
        assert_eq!(config.font_family, "monospace");
        assert_eq!(config.cursor_alpha(), 0.5);
        assert_eq!(config.color_scheme().name, "default");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r##"
            font_size = 18.0
            color_scheme = "dracula"
            background = "#101010"
            "##,
        )
        .unwrap();

        assert_eq!(config.font_size, 18.0);
        assert_eq!(config.cols, 80);
        let scheme = config.color_scheme();
        assert_eq!(scheme.name, "dracula");
        assert_eq!(scheme.background, Rgb::new(0x10, 0x10, 0x10));
        assert_eq!(scheme.foreground, ColorScheme::dracula().foreground);
    }

    #[test]
    fn test_parse_rejects_bad_color() {
        let err = Config::parse(r##"foreground = "#12345""##).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/vtpane.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_cursor_alpha_clamped() {
        let config = Config {
            cursor_alpha: 3.0,
            ..Config::default()
        };
        assert_eq!(config.cursor_alpha(), 1.0);
    }

    #[test]
    fn test_rgb_round_trip_text() {
        let color = Rgb::try_from("#1A2b3c".to_string()).unwrap();
        assert_eq!(color, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_string(), "#1a2b3c");
    }

    #[test]
    fn test_blend() {
        let white = Rgb::new(255, 255, 255);
        let black = Rgb::new(0, 0, 0);
        assert_eq!(white.blend_over(black, 0.5), Rgb::new(128, 128, 128));
        assert_eq!(white.blend_over(black, 0.0), black);
        assert_eq!(white.blend_over(black, 1.0), white);
    }

    #[test]
    fn test_schemes_order_bright_black_above_black() {
        for name in ColorScheme::list() {
            let scheme = ColorScheme::by_name(name);
            assert_eq!(scheme.name, name);
            assert!(scheme.basic[0].luma() < scheme.bright[0].luma(), "{}", name);
            for i in 0..8 {
                assert_ne!(scheme.basic[i], scheme.bright[i], "{} index {}", name, i);
            }
        }
    }

    #[test]
    fn test_resolve_colors() {
        let scheme = ColorScheme::default_scheme();
        assert_eq!(scheme.resolve_fg(Color::Default), scheme.foreground);
        assert_eq!(scheme.resolve_bg(Color::Default), scheme.background);
        assert_eq!(scheme.resolve_fg(Color::Basic(1)), Rgb::hex(0xcd0000));
        assert_eq!(scheme.resolve_bg(Color::Bright(4)), Rgb::hex(0x5c5cff));
    }
}
