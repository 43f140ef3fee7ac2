//! VT sequence parser
//!
//! Recognizes `ESC [ ... final` control sequences in a character stream and
//! applies them to the terminal state. Characters that are not part of an
//! escape sequence are left for the caller to print.

use tracing::trace;

use super::state::{ClearMode, Color, Direction, TerminalState};

const ESC: char = '\x1b';

/// Upper bound on parameters kept per sequence. Further slots are still
/// consumed but not stored.
const MAX_CSI_PARAMS: usize = 1024;

/// Parser state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    CsiCollecting,
}

/// Escape sequence interpreter
#[derive(Debug, Default)]
pub struct VtParser {
    state: ParserState,
    params: CsiParams,
}

impl VtParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a sequence is partially received
    pub fn in_sequence(&self) -> bool {
        self.state != ParserState::Ground
    }

    /// Offer one character to the parser.
    ///
    /// Returns true when the character belongs to an escape sequence and has
    /// been consumed; false when the caller should handle it as text.
    pub fn advance(&mut self, ch: char, state: &mut TerminalState) -> bool {
        match self.state {
            ParserState::Ground => {
                if ch == ESC {
                    self.state = ParserState::Escape;
                    true
                } else {
                    false
                }
            }
            ParserState::Escape => {
                if ch == '[' {
                    self.params = CsiParams::default();
                    self.state = ParserState::CsiCollecting;
                } else {
                    trace!("dropping two-character escape ESC {:?}", ch);
                    self.state = ParserState::Ground;
                }
                true
            }
            ParserState::CsiCollecting => {
                if is_final_byte(ch) {
                    let params = std::mem::take(&mut self.params).finish();
                    execute_csi(ch, &params, state);
                    self.state = ParserState::Ground;
                } else {
                    self.params.push(ch);
                }
                true
            }
        }
    }
}

fn execute_csi(final_byte: char, params: &CsiParams, state: &mut TerminalState) {
    match final_byte {
        'm' => execute_sgr(params, state),
        'H' | 'f' => {
            let row = clamp_u16(params.get(0, 1));
            let col = clamp_u16(params.get(1, 1));
            state.move_cursor_absolute(row, col);
        }
        'A' => state.move_cursor_relative(Direction::Up, clamp_u16(params.get(0, 1))),
        'B' => state.move_cursor_relative(Direction::Down, clamp_u16(params.get(0, 1))),
        'C' => state.move_cursor_relative(Direction::Right, clamp_u16(params.get(0, 1))),
        'D' => state.move_cursor_relative(Direction::Left, clamp_u16(params.get(0, 1))),
        'J' => match params.get(0, 0) {
            0 => state.erase_display(ClearMode::FromCursorToEnd),
            2 => state.erase_display(ClearMode::Full),
            mode => trace!("ignoring erase-display mode {}", mode),
        },
        'K' => match params.get(0, 0) {
            0 => state.clear_line(ClearMode::FromCursorToEnd),
            2 => state.clear_line(ClearMode::Full),
            mode => trace!("ignoring erase-line mode {}", mode),
        },
        _ => {
            trace!(
                "Unknown CSI: params={:?}, final={:?}",
                params.values,
                final_byte
            );
        }
    }
}

/// Final bytes of a control sequence are `@` through `~`
fn is_final_byte(ch: char) -> bool {
    ('\x40'..='\x7e').contains(&ch)
}

fn clamp_u16(value: i64) -> u16 {
    value.clamp(0, u16::MAX as i64) as u16
}

/// One `;`-separated parameter slot while it is being received
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Slot {
    #[default]
    Empty,
    Sign { negative: bool },
    Number { negative: bool, magnitude: i64 },
    Invalid,
}

impl Slot {
    fn push(self, ch: char) -> Self {
        if let Some(digit) = ch.to_digit(10) {
            let digit = i64::from(digit);
            return match self {
                Slot::Empty => Slot::Number { negative: false, magnitude: digit },
                Slot::Sign { negative } => Slot::Number { negative, magnitude: digit },
                // Oversized values saturate and get clamped by the command
                Slot::Number { negative, magnitude } => Slot::Number {
                    negative,
                    magnitude: magnitude.saturating_mul(10).saturating_add(digit),
                },
                Slot::Invalid => Slot::Invalid,
            };
        }
        match (self, ch) {
            (Slot::Empty, '-') => Slot::Sign { negative: true },
            (Slot::Empty, '+') => Slot::Sign { negative: false },
            _ => Slot::Invalid,
        }
    }

    fn value(self) -> Option<i64> {
        match self {
            Slot::Number { negative: true, magnitude } => Some(-magnitude),
            Slot::Number { negative: false, magnitude } => Some(magnitude),
            _ => None,
        }
    }
}

/// Numeric parameters of a control sequence, parsed as they arrive.
///
/// Slots that are empty or not a number are kept as `None` so each command
/// can substitute its own default.
#[derive(Debug, Default, PartialEq, Eq)]
struct CsiParams {
    values: Vec<Option<i64>>,
    slot: Slot,
    private: bool,
    started: bool,
}

impl CsiParams {
    fn push(&mut self, ch: char) {
        // Private marker is accepted and otherwise ignored
        if ch == '?' && !self.started && !self.private {
            self.private = true;
            return;
        }
        self.started = true;
        if ch == ';' {
            self.end_slot();
        } else {
            self.slot = self.slot.push(ch);
        }
    }

    fn end_slot(&mut self) {
        let value = std::mem::take(&mut self.slot).value();
        if self.values.len() < MAX_CSI_PARAMS {
            self.values.push(value);
        }
    }

    /// Close the last slot. An empty body has no parameters at all.
    fn finish(mut self) -> Self {
        if self.started {
            self.end_slot();
        }
        self
    }

    #[cfg(test)]
    fn parse(body: &str) -> Self {
        let mut params = Self::default();
        for ch in body.chars() {
            params.push(ch);
        }
        params.finish()
    }

    fn get(&self, index: usize, default: i64) -> i64 {
        self.values.get(index).copied().flatten().unwrap_or(default)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn execute_sgr(params: &CsiParams, state: &mut TerminalState) {
    if params.is_empty() {
        state.reset_rendition();
        return;
    }

    for index in 0..params.len() {
        let code = params.get(index, 0);
        match code {
            0 => state.reset_rendition(),
            30..=37 => state.set_foreground(Color::Basic((code - 30) as u8)),
            40..=47 => state.set_background(Color::Basic((code - 40) as u8)),
            90..=97 => state.set_foreground(Color::Bright((code - 90) as u8)),
            100..=107 => state.set_background(Color::Bright((code - 100) as u8)),
            _ => trace!("ignoring SGR code {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::Cursor;

    /// Feed text the way the writer does: parser first, then printable characters
    fn feed(parser: &mut VtParser, state: &mut TerminalState, text: &str) {
        for ch in text.chars() {
            if !parser.advance(ch, state) {
                state.put_char(ch);
            }
        }
    }

    #[test]
    fn test_cursor_movement() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b[5;10H");
        assert_eq!(state.cursor(), Cursor { col: 9, row: 4 });

        feed(&mut parser, &mut state, "\x1b[2A\x1b[3D");
        assert_eq!(state.cursor(), Cursor { col: 6, row: 2 });

        feed(&mut parser, &mut state, "\x1b[B\x1b[C");
        assert_eq!(state.cursor(), Cursor { col: 7, row: 3 });

        feed(&mut parser, &mut state, "\x1b[f");
        assert_eq!(state.cursor(), Cursor { col: 0, row: 0 });
    }

    #[test]
    fn test_empty_param_uses_default() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b[;5H");
        assert_eq!(state.cursor(), Cursor { col: 4, row: 0 });

        feed(&mut parser, &mut state, "\x1b[.;:H");
        assert_eq!(state.cursor(), Cursor { col: 0, row: 0 });
    }

    #[test]
    fn test_relative_move_by_zero() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b[3;3H\x1b[0A");
        assert_eq!(state.cursor(), Cursor { col: 2, row: 2 });
    }

    #[test]
    fn test_private_marker_stripped() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b[?3;4H");
        assert_eq!(state.cursor(), Cursor { col: 3, row: 2 });

        // Unknown private modes are swallowed without output
        feed(&mut parser, &mut state, "\x1b[?25l\x1b[?1049h");
        assert_eq!(state.row_text(2), "");
        assert!(!parser.in_sequence());
    }

    #[test]
    fn test_sgr_colors() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b[31m");
        assert_eq!(state.rendition().fg, Color::Basic(1));

        feed(&mut parser, &mut state, "\x1b[44;93m");
        assert_eq!(state.rendition().bg, Color::Basic(4));
        assert_eq!(state.rendition().fg, Color::Bright(3));

        feed(&mut parser, &mut state, "\x1b[107m");
        assert_eq!(state.rendition().bg, Color::Bright(7));

        feed(&mut parser, &mut state, "\x1b[m");
        assert_eq!(state.rendition().fg, Color::Default);
        assert_eq!(state.rendition().bg, Color::Default);
    }

    #[test]
    fn test_sgr_unsupported_codes_skipped() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        // Bold, 256-color and underline are ignored; 32 still applies
        feed(&mut parser, &mut state, "\x1b[1;38;5;200;4;32m");
        assert_eq!(state.rendition().fg, Color::Basic(2));
        assert_eq!(state.rendition().bg, Color::Default);

        feed(&mut parser, &mut state, "\x1b[41;0;45m");
        assert_eq!(state.rendition().fg, Color::Default);
        assert_eq!(state.rendition().bg, Color::Basic(5));
    }

    #[test]
    fn test_erase_display_keeps_cursor() {
        let mut state = TerminalState::new(10, 3);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "abc\x1b[2;4H");
        feed(&mut parser, &mut state, "\x1b[2J");
        assert_eq!(state.row_text(0), "");
        assert_eq!(state.cursor(), Cursor { col: 3, row: 1 });
    }

    #[test]
    fn test_erase_display_mode_one_is_noop() {
        let mut state = TerminalState::new(10, 3);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "abc\x1b[1J");
        assert_eq!(state.row_text(0), "abc");
        feed(&mut parser, &mut state, "\x1b[1K\x1b[3J");
        assert_eq!(state.row_text(0), "abc");
    }

    #[test]
    fn test_erase_line() {
        let mut state = TerminalState::new(10, 3);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "abcdef\x1b[1;3H\x1b[K");
        assert_eq!(state.row_text(0), "ab");
        feed(&mut parser, &mut state, "\x1b[2K");
        assert_eq!(state.row_text(0), "");
    }

    #[test]
    fn test_sequence_split_across_feeds() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b");
        assert!(parser.in_sequence());
        feed(&mut parser, &mut state, "[3");
        feed(&mut parser, &mut state, "1");
        feed(&mut parser, &mut state, "mX");

        assert!(!parser.in_sequence());
        assert_eq!(state.cell(0, 0).map(|c| (c.ch, c.fg)), Some(('X', Color::Basic(1))));
    }

    #[test]
    fn test_malformed_escape_dropped() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1bZok");
        assert_eq!(state.row_text(0), "ok");
    }

    #[test]
    fn test_unknown_final_ignored() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "a\x1b[5Sb\x1b[6n");
        assert_eq!(state.row_text(0), "ab");
        assert!(!parser.in_sequence());
    }

    #[test]
    fn test_overlong_sequence_bounded() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        let long = format!("\x1b[{}H", "1;".repeat(10_000));
        feed(&mut parser, &mut state, &long);
        assert!(!parser.in_sequence());
        assert_eq!(state.cursor(), Cursor { col: 0, row: 0 });

        let params = CsiParams::parse(&"7;".repeat(10_000));
        assert_eq!(params.len(), MAX_CSI_PARAMS);
    }

    #[test]
    fn test_long_sgr_applies_every_parameter() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        let sgr = format!("\x1b[{}31mX", "0;".repeat(200));
        feed(&mut parser, &mut state, &sgr);
        assert_eq!(state.cell(0, 0).map(|c| (c.ch, c.fg)), Some(('X', Color::Basic(1))));
    }

    #[test]
    fn test_huge_parameter_clamped() {
        let mut state = TerminalState::new(80, 24);
        let mut parser = VtParser::new();

        feed(&mut parser, &mut state, "\x1b[99999999999999999999B");
        assert_eq!(state.cursor(), Cursor { col: 0, row: 23 });

        feed(&mut parser, &mut state, "\x1b[99999999999999999999;99999999999999999999H");
        assert_eq!(state.cursor(), Cursor { col: 79, row: 23 });

        // An out-of-range SGR code is skipped, not read as a reset
        feed(&mut parser, &mut state, "\x1b[31;99999999999999999999m");
        assert_eq!(state.rendition().fg, Color::Basic(1));
    }

    #[test]
    fn test_params_parse() {
        assert_eq!(CsiParams::parse("").len(), 0);
        let params = CsiParams::parse("?12;;abc;-3");
        assert_eq!(params.len(), 4);
        assert_eq!(params.get(0, 1), 12);
        assert_eq!(params.get(1, 7), 7);
        assert_eq!(params.get(2, 7), 7);
        assert_eq!(params.get(3, 7), -3);
        assert_eq!(params.get(9, 5), 5);

        assert_eq!(CsiParams::parse("?").len(), 0);
        assert_eq!(CsiParams::parse("99999999999999999999").get(0, 1), i64::MAX);
        assert_eq!(CsiParams::parse("-99999999999999999999").get(0, 1), -i64::MAX);
        assert_eq!(CsiParams::parse("+4;-;4-").values, vec![Some(4), None, None]);
    }

    #[test]
    fn test_whitespace_in_slot_uses_default() {
        let params = CsiParams::parse(" 5;6 ;7");
        assert_eq!(params.get(0, 1), 1);
        assert_eq!(params.get(1, 1), 1);
        assert_eq!(params.get(2, 1), 7);
    }
}
