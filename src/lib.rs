//! # nanoshell - Embedded Command Shell
//!
//! An interactive line-editing and command-dispatch engine for embedded
//! systems and `no_std` environments. It turns a raw byte stream (for example
//! UART receive interrupts) into edited command lines, dispatches them against
//! a statically registered command table, and renders terminal output through
//! a caller-supplied byte sink using a minimal ANSI escape subset.
//!
//! ## Features
//!
//! - **Zero-allocation**: every internal structure has a fixed capacity
//! - **Interrupt-safe input**: a lock-free single-producer/single-consumer
//!   byte queue bridges interrupt context and the main loop
//! - **Line editing**: cursor motion, kill/yank spans, transpose, clear
//!   screen, Ctrl-C interrupt
//! - **History**: bounded ring with in-progress line save/restore on browse
//! - **Tab completion**: built-in command-name completion with a
//!   multi-column candidate listing, or a full custom override
//! - **Key bindings**: per-key handler overrides consulted before the
//!   default actions
//! - **Login gate**: optional trigger-char/username/password state machine
//!   in front of the editor
//!
//! ## Usage
//!
//! ```rust
//! use nanoshell::queue::InputQueue;
//! use nanoshell::shell::{Command, HandlerContext, Shell};
//!
//! fn uart_tx(_byte: u8) {
//!     // write to the UART data register
//! }
//!
//! fn reboot(shell: &mut Shell<'_>, _args: &[&str], _context: Option<HandlerContext>) {
//!     shell.print("rebooting\r\n");
//! }
//!
//! static COMMANDS: &[Command] = &[Command {
//!     name: "reboot",
//!     description: "Restart the device",
//!     handler: reboot,
//!     context: None,
//! }];
//!
//! static QUEUE: InputQueue = InputQueue::new();
//!
//! let mut shell = Shell::new(&QUEUE, uart_tx, None);
//! shell.load_commands(COMMANDS).unwrap();
//!
//! // Interrupt handler side: enqueue received bytes.
//! for &byte in b"reboot\r" {
//!     QUEUE.push(byte);
//! }
//!
//! // Main loop side: each call handles at most one byte.
//! for _ in 0..8 {
//!     shell.run();
//! }
//! ```
//!
//! ## Concurrency model
//!
//! All session logic is single-threaded and non-blocking; [`shell::Shell::run`]
//! always returns promptly. The only concurrency boundary is the
//! [`queue::InputQueue`], which tolerates exactly one asynchronous producer
//! (an interrupt handler or callback) running concurrently with the single
//! consumer driving `run`.
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt formatting for diagnostics types

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Common error types for shell configuration and table loading.
pub mod error;

/// Line editor buffer: cursor motion, insert/delete, kill spans, transpose.
pub mod editor;

/// Command history ring with save/restore-on-browse semantics.
pub mod history;

/// Key events and the incremental ANSI escape-sequence decoder.
pub mod key;

/// Login gate state machine (trigger char, username, password).
pub mod login;

/// Lock-free single-producer/single-consumer input byte queue.
pub mod queue;

/// Session orchestration: key dispatch, completion, execution, rendering.
pub mod shell;

/// Bounded command-name trie backing lookup and prefix completion.
pub mod trie;
