//! Common error types for shell operations

/// A common error type for shell configuration operations.
///
/// This enum covers the failures that can occur while setting up a shell
/// instance. It is designed to be simple and portable for `no_std`
/// environments. Runtime input handling never produces an error: capacity
/// limited operations clamp or report through `bool`/`Option` returns
/// instead.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The bounded trie node pool could not hold every command name.
    ///
    /// This is a build-time condition: fix it by raising
    /// [`trie::MAX_NODES`](crate::trie::MAX_NODES) (or shortening command
    /// names), not by retrying at runtime.
    TrieOverflow,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::TrieOverflow => defmt::write!(f, "TrieOverflow"),
        }
    }
}
