//! Command history ring.
//!
//! Fixed-size circular log of previously executed lines with a browsing
//! cursor. Starting a browse saves the in-progress line; stepping past the
//! most recent entry restores it and ends the browse. Recording skips empty
//! lines and lines identical to the single most recently recorded entry
//! (the original do-not-store-consecutive-duplicate rule; the rest of the
//! ring is not consulted).

use core::fmt;

use heapless::String;

use crate::editor::LINE_SIZE;

/// Number of history slots.
pub const HISTORY_SIZE: usize = 8;

/// Circular history with save/restore-on-browse semantics.
pub struct History {
    entries: [String<LINE_SIZE>; HISTORY_SIZE],
    /// Next slot to write.
    head: usize,
    count: usize,
    /// Ring index of the entry currently shown, `None` when not browsing.
    position: Option<usize>,
    /// In-progress line captured when browsing starts.
    saved: String<LINE_SIZE>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| String::new()),
            head: 0,
            count: 0,
            position: None,
            saved: String::new(),
        }
    }

    /// Number of stored entries, at most [`HISTORY_SIZE`].
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` while a browse is in progress.
    pub fn is_browsing(&self) -> bool {
        self.position.is_some()
    }

    /// Abandon any browse in progress without touching the entries.
    pub fn stop_browsing(&mut self) {
        self.position = None;
    }

    /// Record an executed line.
    ///
    /// Empty lines and a line identical to the most recently recorded entry
    /// are ignored. Once the ring is full, the oldest entry is overwritten.
    /// Lines longer than [`LINE_SIZE`](crate::editor::LINE_SIZE) are
    /// truncated.
    pub fn record(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if self.count > 0 {
            let last = (self.head + HISTORY_SIZE - 1) % HISTORY_SIZE;
            if self.entries[last].as_str() == line {
                return;
            }
        }
        let slot = &mut self.entries[self.head];
        slot.clear();
        for ch in line.chars() {
            if slot.push(ch).is_err() {
                break;
            }
        }
        self.head = (self.head + 1) % HISTORY_SIZE;
        self.count = (self.count + 1).min(HISTORY_SIZE);
    }

    /// Step to the previous (older) entry.
    ///
    /// The first call from the non-browsing state saves `current` and
    /// returns the most recent entry. Further calls walk older entries and
    /// return `None` once the oldest is already shown (no wraparound).
    pub fn browse_prev(&mut self, current: &str) -> Option<&str> {
        if self.count == 0 {
            return None;
        }
        match self.position {
            None => {
                self.saved.clear();
                for ch in current.chars() {
                    if self.saved.push(ch).is_err() {
                        break;
                    }
                }
                self.position = Some((self.head + HISTORY_SIZE - 1) % HISTORY_SIZE);
            }
            Some(pos) => {
                let oldest = (self.head + HISTORY_SIZE - self.count) % HISTORY_SIZE;
                if pos == oldest {
                    return None;
                }
                self.position = Some((pos + HISTORY_SIZE - 1) % HISTORY_SIZE);
            }
        }
        self.position.map(|pos| self.entries[pos].as_str())
    }

    /// Step to the next (newer) entry.
    ///
    /// Stepping past the most recent entry restores the saved in-progress
    /// line and ends the browse. Returns `None` when no browse is active.
    pub fn browse_next(&mut self) -> Option<&str> {
        let pos = self.position?;
        let next = (pos + 1) % HISTORY_SIZE;
        if next == self.head {
            self.position = None;
            Some(self.saved.as_str())
        } else {
            self.position = Some(next);
            Some(self.entries[next].as_str())
        }
    }

    /// Fetch a stored entry; index 0 is the oldest, `len() - 1` the most
    /// recent. Diagnostics accessor with no side effects.
    pub fn entry(&self, index: usize) -> Option<&str> {
        if index >= self.count {
            return None;
        }
        let start = (self.head + HISTORY_SIZE - self.count) % HISTORY_SIZE;
        Some(self.entries[(start + index) % HISTORY_SIZE].as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("count", &self.count)
            .field("browsing", &self.position.is_some())
            .finish()
    }
}
