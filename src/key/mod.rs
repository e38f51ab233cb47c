//! Key events and the incremental ANSI escape-sequence decoder.
//!
//! The decoder consumes one byte at a time and recognizes the `ESC [ ...`
//! (CSI) and `ESC O` (SS3) sequences emitted by terminals for cursor and
//! function keys. It retains no buffering beyond four numeric parameters and
//! a small state discriminant, so memory stays bounded regardless of how
//! long a malformed sequence runs.

/// Maximum number of numeric CSI parameters retained; extra separators are
/// ignored.
pub const MAX_PARAMS: usize = 4;

/// A logical key event produced by the escape decoder or the control-byte
/// map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Ctrl-A: move to beginning of line.
    CtrlA,
    /// Ctrl-B: move left.
    CtrlB,
    /// Ctrl-C: cancel/interrupt the current line.
    CtrlC,
    /// Ctrl-D: delete the character under the cursor.
    CtrlD,
    /// Ctrl-E: move to end of line.
    CtrlE,
    /// Ctrl-F: move right.
    CtrlF,
    /// Ctrl-K: kill from cursor to end of line.
    CtrlK,
    /// Ctrl-L: clear screen.
    CtrlL,
    /// Ctrl-N: next history entry.
    CtrlN,
    /// Ctrl-P: previous history entry.
    CtrlP,
    /// Ctrl-R: reverse search (reserved, no default action).
    CtrlR,
    /// Ctrl-T: transpose the characters around the cursor.
    CtrlT,
    /// Ctrl-U: kill from beginning of line to cursor.
    CtrlU,
    /// Ctrl-W: kill the word left of the cursor.
    CtrlW,
    /// Tab: completion.
    Tab,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Right arrow.
    Right,
    /// Left arrow.
    Left,
    /// Home.
    Home,
    /// End.
    End,
    /// Delete (forward).
    Delete,
    /// Insert.
    Insert,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Function key F1.
    F1,
    /// Function key F2.
    F2,
    /// Function key F3.
    F3,
    /// Function key F4.
    F4,
    /// Function key F5.
    F5,
    /// Function key F6.
    F6,
    /// Function key F7.
    F7,
    /// Function key F8.
    F8,
    /// Function key F9.
    F9,
    /// Function key F10.
    F10,
    /// Function key F11.
    F11,
    /// Function key F12.
    F12,
}

impl Key {
    /// Map a raw control byte (0x01..=0x1A) to its key event, if it has one.
    ///
    /// Enter (CR/LF) and Backspace are handled as plain bytes by the session
    /// and are deliberately absent here.
    pub fn from_control(byte: u8) -> Option<Key> {
        match byte {
            0x01 => Some(Key::CtrlA),
            0x02 => Some(Key::CtrlB),
            0x03 => Some(Key::CtrlC),
            0x04 => Some(Key::CtrlD),
            0x05 => Some(Key::CtrlE),
            0x06 => Some(Key::CtrlF),
            0x09 => Some(Key::Tab),
            0x0B => Some(Key::CtrlK),
            0x0C => Some(Key::CtrlL),
            0x0E => Some(Key::CtrlN),
            0x10 => Some(Key::CtrlP),
            0x12 => Some(Key::CtrlR),
            0x14 => Some(Key::CtrlT),
            0x15 => Some(Key::CtrlU),
            0x17 => Some(Key::CtrlW),
            _ => None,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Key {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", defmt::Debug2Format(self))
    }
}

/// Outcome of feeding one byte to the escape decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeResult {
    /// The byte is not part of an escape sequence; process it normally.
    NotEscape,
    /// The byte was consumed; the sequence is still in progress.
    Incomplete,
    /// The sequence finished. `None` means the final byte was unrecognized
    /// and the whole sequence is silently swallowed.
    Complete(Option<Key>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Escape,
    Csi,
    Ss3,
}

/// Incremental decoder for `ESC [ ... final` and `ESC O final` sequences.
///
/// Fully resets after every completed or aborted sequence.
#[derive(Debug)]
pub struct EscapeParser {
    phase: Phase,
    params: [u16; MAX_PARAMS],
    num_params: u8,
}

impl EscapeParser {
    /// Create an idle parser.
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            params: [0; MAX_PARAMS],
            num_params: 0,
        }
    }

    /// Reset to the idle state, discarding any partial sequence.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.params = [0; MAX_PARAMS];
        self.num_params = 0;
    }

    /// Feed one byte through the state machine.
    pub fn advance(&mut self, byte: u8) -> EscapeResult {
        match self.phase {
            Phase::Idle => {
                if byte == 0x1B {
                    self.phase = Phase::Escape;
                    EscapeResult::Incomplete
                } else {
                    EscapeResult::NotEscape
                }
            }
            Phase::Escape => match byte {
                b'[' => {
                    self.phase = Phase::Csi;
                    self.num_params = 0;
                    EscapeResult::Incomplete
                }
                b'O' => {
                    self.phase = Phase::Ss3;
                    EscapeResult::Incomplete
                }
                _ => {
                    // Lone ESC followed by an ordinary byte: drop the ESC
                    // and let the caller process this byte normally.
                    self.reset();
                    EscapeResult::NotEscape
                }
            },
            Phase::Csi => match byte {
                b'0'..=b'9' => {
                    if self.num_params == 0 {
                        self.num_params = 1;
                        self.params[0] = 0;
                    }
                    let i = (self.num_params - 1) as usize;
                    self.params[i] = self.params[i]
                        .wrapping_mul(10)
                        .wrapping_add(u16::from(byte - b'0'));
                    EscapeResult::Incomplete
                }
                b';' => {
                    if (self.num_params as usize) < MAX_PARAMS {
                        self.params[self.num_params as usize] = 0;
                        self.num_params += 1;
                    }
                    EscapeResult::Incomplete
                }
                final_byte => {
                    let key = self.finish_csi(final_byte);
                    self.reset();
                    EscapeResult::Complete(key)
                }
            },
            Phase::Ss3 => {
                let key = match byte {
                    b'P' => Some(Key::F1),
                    b'Q' => Some(Key::F2),
                    b'R' => Some(Key::F3),
                    b'S' => Some(Key::F4),
                    b'H' => Some(Key::Home),
                    b'F' => Some(Key::End),
                    _ => None,
                };
                self.reset();
                EscapeResult::Complete(key)
            }
        }
    }

    fn finish_csi(&self, final_byte: u8) -> Option<Key> {
        match final_byte {
            b'A' => Some(Key::Up),
            b'B' => Some(Key::Down),
            b'C' => Some(Key::Right),
            b'D' => Some(Key::Left),
            b'H' => Some(Key::Home),
            b'F' => Some(Key::End),
            // Shift+Tab, treat as Tab
            b'Z' => Some(Key::Tab),
            b'~' => {
                if self.num_params == 0 {
                    return None;
                }
                match self.params[0] {
                    1 => Some(Key::Home),
                    2 => Some(Key::Insert),
                    3 => Some(Key::Delete),
                    4 => Some(Key::End),
                    5 => Some(Key::PageUp),
                    6 => Some(Key::PageDown),
                    15 => Some(Key::F5),
                    17 => Some(Key::F6),
                    18 => Some(Key::F7),
                    19 => Some(Key::F8),
                    20 => Some(Key::F9),
                    21 => Some(Key::F10),
                    23 => Some(Key::F11),
                    24 => Some(Key::F12),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl Default for EscapeParser {
    fn default() -> Self {
        Self::new()
    }
}
