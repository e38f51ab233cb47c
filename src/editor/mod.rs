//! Line editor buffer.
//!
//! Owns the bytes of the line being edited, the cursor, and the single-slot
//! kill buffer. All operations are pure buffer manipulation; rendering is
//! the session's job, so every method that changes the buffer reports
//! whether anything changed and the caller decides whether to redraw.
//!
//! Editing is byte-oriented: the buffer is expected to hold printable ASCII
//! fed by the session, and oversized input is truncated rather than
//! rejected.

use core::fmt;
use core::str;

use heapless::Vec;

/// Line buffer capacity in bytes. The maximum line length is one less,
/// matching the terminator byte the wire-level protocol reserves.
pub const LINE_SIZE: usize = 128;

const MAX_LINE_LEN: usize = LINE_SIZE - 1;

/// The current line, cursor position, and most recently killed span.
pub struct LineBuffer {
    buf: Vec<u8, LINE_SIZE>,
    cursor: usize,
    killed: Vec<u8, LINE_SIZE>,
}

impl LineBuffer {
    /// Create an empty line with the cursor at column 0.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            cursor: 0,
            killed: Vec::new(),
        }
    }

    /// Current line length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` when the line is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Cursor position, 0 ..= [`len`](Self::len).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The line as a string slice.
    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.buf).unwrap_or("")
    }

    /// The line as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The most recently killed span.
    pub fn killed(&self) -> &str {
        str::from_utf8(&self.killed).unwrap_or("")
    }

    /// Empty the line and move the cursor home. The kill buffer survives.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.cursor = 0;
    }

    /// Replace the whole line, truncating to capacity, cursor to end.
    pub fn set(&mut self, line: &str) {
        self.buf.clear();
        let n = line.len().min(MAX_LINE_LEN);
        let _ = self.buf.extend_from_slice(&line.as_bytes()[..n]);
        self.cursor = self.buf.len();
    }

    /// Insert one byte at the cursor, shifting the tail right.
    ///
    /// Returns `false` (byte dropped) when the line is at capacity.
    pub fn insert_byte(&mut self, byte: u8) -> bool {
        if self.buf.len() >= MAX_LINE_LEN {
            return false;
        }
        let _ = self.buf.insert(self.cursor, byte);
        self.cursor += 1;
        true
    }

    /// Insert `text` at the cursor, truncating to the remaining capacity.
    ///
    /// Returns the number of bytes actually inserted.
    pub fn insert_str(&mut self, text: &str) -> usize {
        let available = MAX_LINE_LEN - self.buf.len();
        let n = text.len().min(available);
        for &byte in &text.as_bytes()[..n] {
            let _ = self.buf.insert(self.cursor, byte);
            self.cursor += 1;
        }
        n
    }

    /// Delete the byte left of the cursor. Returns `false` at column 0.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.buf.remove(self.cursor - 1);
        self.cursor -= 1;
        true
    }

    /// Delete the byte under the cursor, shifting the tail left.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor < self.buf.len() {
            self.buf.remove(self.cursor);
            true
        } else {
            false
        }
    }

    /// Move the cursor one column left. Returns `false` at column 0.
    pub fn move_left(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor one column right. Returns `false` at end of line.
    pub fn move_right(&mut self) -> bool {
        if self.cursor < self.buf.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor to column 0.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor to the end of the line.
    pub fn move_end(&mut self) {
        self.cursor = self.buf.len();
    }

    /// Kill from the cursor to the end of line into the kill buffer.
    pub fn kill_to_end(&mut self) -> bool {
        if self.cursor >= self.buf.len() {
            return false;
        }
        self.killed.clear();
        let _ = self.killed.extend_from_slice(&self.buf[self.cursor..]);
        self.buf.truncate(self.cursor);
        true
    }

    /// Kill from the beginning of the line to the cursor.
    pub fn kill_to_start(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.killed.clear();
        let _ = self.killed.extend_from_slice(&self.buf[..self.cursor]);
        let mut rest: Vec<u8, LINE_SIZE> = Vec::new();
        let _ = rest.extend_from_slice(&self.buf[self.cursor..]);
        self.buf = rest;
        self.cursor = 0;
        true
    }

    /// Kill the word left of the cursor: skip trailing whitespace first,
    /// then the contiguous non-whitespace run.
    pub fn kill_word_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let mut start = self.cursor;
        while start > 0 && self.buf[start - 1].is_ascii_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.buf[start - 1].is_ascii_whitespace() {
            start -= 1;
        }
        if start == self.cursor {
            return false;
        }
        self.killed.clear();
        let _ = self.killed.extend_from_slice(&self.buf[start..self.cursor]);
        let mut rest: Vec<u8, LINE_SIZE> = Vec::new();
        let _ = rest.extend_from_slice(&self.buf[..start]);
        let _ = rest.extend_from_slice(&self.buf[self.cursor..]);
        self.buf = rest;
        self.cursor = start;
        true
    }

    /// Swap the two characters around the cursor.
    ///
    /// Clamped so that transposing at end-of-line swaps the last two. The
    /// cursor does not move. Requires cursor > 0 and at least two
    /// characters.
    pub fn transpose(&mut self) -> bool {
        if self.cursor == 0 || self.buf.len() < 2 {
            return false;
        }
        let mut pos = self.cursor;
        if pos == self.buf.len() {
            pos -= 1;
        }
        if pos == 0 {
            return false;
        }
        self.buf.swap(pos - 1, pos);
        true
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuffer")
            .field("line", &self.as_str())
            .field("cursor", &self.cursor)
            .finish()
    }
}
