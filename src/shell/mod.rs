//! Session orchestration.
//!
//! The [`Shell`] aggregates the input queue, escape decoder, command trie,
//! line editor, history ring, key bindings, and the optional login gate into
//! one state machine. The host drives it by calling [`Shell::run`] from its
//! main loop; each call handles at most one input byte and always returns
//! promptly, so it is safe to call from a tight polling loop or a
//! cooperative scheduler tick.
//!
//! # Setup
//!
//! ```rust
//! use nanoshell::queue::InputQueue;
//! use nanoshell::shell::{Command, HandlerContext, Shell};
//!
//! fn tx(_byte: u8) { /* UART */ }
//!
//! fn status(shell: &mut Shell<'_>, _args: &[&str], _ctx: Option<HandlerContext>) {
//!     shell.print("ok\r\n");
//! }
//!
//! static COMMANDS: &[Command] = &[Command {
//!     name: "status",
//!     description: "Show device status",
//!     handler: status,
//!     context: None,
//! }];
//!
//! static QUEUE: InputQueue = InputQueue::new();
//! let mut shell = Shell::new(&QUEUE, tx, None);
//! shell.load_commands(COMMANDS).unwrap();
//! ```

use core::any::Any;
use core::fmt::{self, Write as _};

use heapless::{String, Vec};

use crate::editor::{LINE_SIZE, LineBuffer};
use crate::error::Error;
use crate::history::History;
use crate::key::{EscapeParser, EscapeResult, Key};
use crate::login::{Login, LoginOutcome, VerifyFn};
use crate::queue::InputQueue;
use crate::trie::CommandTrie;

/// Maximum argv entries per executed line; excess tokens are silently
/// dropped.
pub const MAX_ARGS: usize = 8;

/// Maximum number of custom key bindings.
pub const MAX_KEYBINDS: usize = 16;

const PROMPT: &str = "> ";
const BELL: u8 = 0x07;
const LISTING_WIDTH: usize = 80;

// The fixed ANSI subset used for rendering; no capability negotiation.
const ANSI_CLEAR_LINE: &str = "\x1b[K";
const ANSI_CURSOR_HOME: &str = "\x1b[H";
const ANSI_CLEAR_SCREEN: &str = "\x1b[2J";

/// Byte-output sink. Mandatory; everything the shell renders goes through
/// it.
pub type PutcFn = fn(u8);

/// Optional polled byte source, consulted only when the input queue is
/// empty.
pub type GetcFn = fn() -> Option<u8>;

/// Opaque context bound to a command handler or key binding at
/// registration.
pub type HandlerContext = &'static (dyn Any + Send + Sync);

/// Command handler: `(shell, argv, context)`. `argv[0]` is the command
/// name. Handlers may call back into the shell (print, clear screen, ...)
/// but must not destroy it.
pub type CommandFn = fn(&mut Shell<'_>, &[&str], Option<HandlerContext>);

/// Key binding handler. Returning `true` marks the key handled and
/// suppresses the default action entirely.
pub type KeyHandlerFn = fn(&mut Shell<'_>, Key, Option<HandlerContext>) -> bool;

/// Tab-completion override. Receives the current line and is responsible
/// for its own rendering; registering one fully replaces the default
/// behavior.
pub type CompleteFn = fn(&mut Shell<'_>, &str);

/// One entry of the caller-owned command table.
///
/// The shell borrows the table and the trie stores indices into it; nothing
/// is copied.
#[derive(Clone, Copy)]
pub struct Command {
    /// Name as typed by the user. Case-sensitive; empty names are skipped
    /// at load time.
    pub name: &'static str,
    /// One-line description (diagnostics only at this layer).
    pub description: &'static str,
    /// Handler invoked on execution.
    pub handler: CommandFn,
    /// Opaque context passed back to the handler.
    pub context: Option<HandlerContext>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
struct KeyBinding {
    key: Key,
    handler: KeyHandlerFn,
    context: Option<HandlerContext>,
}

/// Runtime counters for diagnostics. Querying has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellStats {
    /// Peak trie node-pool usage since the last table load.
    pub trie_high_water: usize,
    /// Sticky flag: a table load ran out of trie nodes.
    pub trie_overflow: bool,
    /// Number of stored history entries.
    pub history_len: usize,
    /// Number of commands in the loaded table.
    pub command_count: usize,
    /// Number of registered key bindings.
    pub keybind_count: usize,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ShellStats {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ShellStats {{ trie_high_water: {}, trie_overflow: {}, history_len: {}, command_count: {}, keybind_count: {} }}",
            self.trie_high_water,
            self.trie_overflow,
            self.history_len,
            self.command_count,
            self.keybind_count
        )
    }
}

/// One interactive shell session.
///
/// Owns all mutable session state; multiple instances coexist without any
/// shared globals. The input queue is borrowed rather than owned so the
/// producer context (an interrupt handler) can keep its own shared
/// reference to it while the consumer holds the `Shell` mutably.
pub struct Shell<'a> {
    queue: &'a InputQueue,
    putc: PutcFn,
    getc: Option<GetcFn>,
    commands: Option<&'a [Command]>,
    trie: CommandTrie,
    line: LineBuffer,
    history: History,
    escape: EscapeParser,
    login: Option<Login>,
    logged_in: bool,
    bindings: Vec<KeyBinding, MAX_KEYBINDS>,
    completion: Option<CompleteFn>,
    echo: bool,
    prompt_shown: bool,
}

impl<'a> Shell<'a> {
    /// Create a session over the given input queue and byte sink.
    ///
    /// `getc` is an optional polled source consulted only when the queue is
    /// empty.
    pub fn new(queue: &'a InputQueue, putc: PutcFn, getc: Option<GetcFn>) -> Self {
        Self {
            queue,
            putc,
            getc,
            commands: None,
            trie: CommandTrie::new(),
            line: LineBuffer::new(),
            history: History::new(),
            escape: EscapeParser::new(),
            login: None,
            logged_in: false,
            bindings: Vec::new(),
            completion: None,
            echo: true,
            prompt_shown: false,
        }
    }

    /// Load the command table and (re)build the lookup trie.
    ///
    /// Fully resets any previously loaded table. Entries with empty names
    /// are skipped. Fails with [`Error::TrieOverflow`] when the bounded
    /// node pool cannot hold every name; raise
    /// [`trie::MAX_NODES`](crate::trie::MAX_NODES) and rebuild.
    pub fn load_commands(&mut self, table: &'a [Command]) -> Result<(), Error> {
        self.commands = Some(table);
        self.trie.clear();
        for (index, command) in table.iter().enumerate() {
            if command.name.is_empty() {
                continue;
            }
            self.trie.insert(command.name, index as u16)?;
        }
        Ok(())
    }

    /// Enable the login gate: `trigger` wakes the machine, `verify` decides
    /// on the collected credentials.
    pub fn set_login(&mut self, verify: VerifyFn, trigger: u8) {
        self.login = Some(Login::new(verify, trigger));
    }

    /// Force logout; the next input requires the trigger and credentials
    /// again.
    pub fn logout(&mut self) {
        self.logged_in = false;
        if let Some(login) = self.login.as_mut() {
            login.reset();
        }
    }

    /// Enqueue one input byte (interrupt-safe producer side).
    ///
    /// Returns `false` when the queue is full and the byte was dropped.
    pub fn feed(&self, byte: u8) -> bool {
        self.queue.push(byte)
    }

    /// Process at most one pending input byte.
    ///
    /// Drains the queue first, then the polled source if one was supplied;
    /// with no byte available the call is a no-op. Call repeatedly from the
    /// host loop.
    pub fn run(&mut self) {
        let Some(byte) = self.next_byte() else {
            return;
        };

        // First byte ever: without a login gate the session is immediately
        // live and shows its prompt.
        if !self.prompt_shown && self.login.is_none() {
            self.logged_in = true;
            self.prompt_shown = true;
            self.print(PROMPT);
        }

        if !self.logged_in {
            let putc = self.putc;
            if let Some(login) = self.login.as_mut() {
                if login.feed(byte, putc) == LoginOutcome::LoggedIn {
                    self.logged_in = true;
                    self.prompt_shown = true;
                    self.print(PROMPT);
                }
                return;
            }
        }

        self.handle_byte(byte);
    }

    /// Register a key binding, replacing the handler in place if `key` is
    /// already bound. Returns `false` when the binding table is full.
    pub fn bind_key(
        &mut self,
        key: Key,
        handler: KeyHandlerFn,
        context: Option<HandlerContext>,
    ) -> bool {
        for binding in self.bindings.iter_mut() {
            if binding.key == key {
                binding.handler = handler;
                binding.context = context;
                return true;
            }
        }
        self.bindings
            .push(KeyBinding {
                key,
                handler,
                context,
            })
            .is_ok()
    }

    /// Remove the binding for `key`, restoring the default action.
    pub fn unbind_key(&mut self, key: Key) {
        if let Some(index) = self.bindings.iter().position(|b| b.key == key) {
            self.bindings.remove(index);
        }
    }

    /// Install a Tab-completion override, replacing the default behavior.
    pub fn set_completion(&mut self, callback: CompleteFn) {
        self.completion = Some(callback);
    }

    /// Enable or disable echo, e.g. for password-style input. The buffer is
    /// still mutated while echo is off; only the insert rendering is
    /// suppressed.
    pub fn set_echo(&mut self, enabled: bool) {
        self.echo = enabled;
    }

    /// Current echo setting.
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// The current line buffer contents (useful inside completion and key
    /// handlers).
    pub fn line(&self) -> &str {
        self.line.as_str()
    }

    /// Insert text at the cursor (truncating to capacity) and redraw.
    pub fn insert_text(&mut self, text: &str) {
        if self.line.insert_str(text) > 0 {
            self.redraw_line();
        }
    }

    /// Record a line into history manually, with the usual empty/duplicate
    /// filtering.
    pub fn add_history(&mut self, line: &str) {
        self.history.record(line);
    }

    /// Fetch a history entry; index 0 is the oldest.
    pub fn history_entry(&self, index: usize) -> Option<&str> {
        self.history.entry(index)
    }

    /// Runtime counters for diagnostics.
    pub fn stats(&self) -> ShellStats {
        ShellStats {
            trie_high_water: self.trie.high_water(),
            trie_overflow: self.trie.overflowed(),
            history_len: self.history.len(),
            command_count: self.commands.map_or(0, <[Command]>::len),
            keybind_count: self.bindings.len(),
        }
    }

    /// Send text to the output sink.
    pub fn print(&mut self, text: &str) {
        let putc = self.putc;
        for &byte in text.as_bytes() {
            putc(byte);
        }
    }

    /// Clear the screen, home the cursor, and redraw the prompt and line.
    pub fn clear_screen(&mut self) {
        self.print(ANSI_CLEAR_SCREEN);
        self.print(ANSI_CURSOR_HOME);
        self.redraw_line();
    }

    /// Reprint the prompt and line from column 0 and reposition the cursor.
    ///
    /// Rendering is stateless with respect to the logical buffer: redrawing
    /// twice leaves the terminal exactly where one redraw does.
    pub fn redraw_line(&mut self) {
        self.print("\r");
        self.print(ANSI_CLEAR_LINE);
        self.print(PROMPT);
        let putc = self.putc;
        for &byte in self.line.as_bytes() {
            putc(byte);
        }
        self.reposition_cursor();
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.queue.pop().or_else(|| self.getc.and_then(|getc| getc()))
    }

    fn put(&mut self, byte: u8) {
        (self.putc)(byte);
    }

    fn reposition_cursor(&mut self) {
        self.print("\r");
        let column = self.line.cursor() + PROMPT.len();
        if column > 0 {
            let _ = write!(self, "\x1b[{}C", column);
        }
    }

    fn reset_line(&mut self) {
        self.line.clear();
        self.history.stop_browsing();
    }

    fn handle_byte(&mut self, byte: u8) {
        match self.escape.advance(byte) {
            EscapeResult::Incomplete => return,
            EscapeResult::Complete(key) => {
                if let Some(key) = key {
                    self.dispatch_key(key);
                }
                return;
            }
            EscapeResult::NotEscape => {}
        }

        if let Some(key) = Key::from_control(byte) {
            self.dispatch_key(key);
            return;
        }

        match byte {
            b'\r' | b'\n' => {
                self.execute_line();
                self.reset_line();
            }
            0x7F | 0x08 => {
                if self.line.backspace() {
                    self.redraw_line();
                }
            }
            0x20..=0x7E => {
                if self.line.insert_byte(byte) && self.echo {
                    self.redraw_line();
                }
            }
            _ => {}
        }
    }

    fn dispatch_key(&mut self, key: Key) {
        // Custom bindings first, in registration order; a handled key
        // suppresses the default action.
        let mut index = 0;
        while index < self.bindings.len() {
            let binding = self.bindings[index];
            if binding.key == key && (binding.handler)(self, key, binding.context) {
                return;
            }
            index += 1;
        }
        self.default_key_action(key);
    }

    fn default_key_action(&mut self, key: Key) {
        match key {
            Key::CtrlA | Key::Home => {
                self.line.move_home();
                self.reposition_cursor();
            }
            Key::CtrlE | Key::End => {
                self.line.move_end();
                self.reposition_cursor();
            }
            Key::CtrlB | Key::Left => {
                // Char-by-char motion avoids a full redraw.
                if self.line.move_left() {
                    self.put(0x08);
                }
            }
            Key::CtrlF | Key::Right => {
                if let Some(&byte) = self.line.as_bytes().get(self.line.cursor()) {
                    self.put(byte);
                    self.line.move_right();
                }
            }
            Key::CtrlD | Key::Delete => {
                if self.line.delete_forward() {
                    self.redraw_line();
                }
            }
            Key::CtrlK => {
                if self.line.kill_to_end() {
                    self.redraw_line();
                }
            }
            Key::CtrlU => {
                if self.line.kill_to_start() {
                    self.redraw_line();
                }
            }
            Key::CtrlW => {
                if self.line.kill_word_back() {
                    self.redraw_line();
                }
            }
            Key::CtrlT => {
                if self.line.transpose() {
                    self.redraw_line();
                }
            }
            Key::CtrlL => self.clear_screen(),
            Key::CtrlC => {
                self.print("^C\r\n");
                self.reset_line();
                self.print(PROMPT);
            }
            Key::CtrlP | Key::Up => self.history_prev(),
            Key::CtrlN | Key::Down => self.history_next(),
            Key::Tab => self.complete(),
            _ => {}
        }
    }

    fn history_prev(&mut self) {
        let mut shown: String<LINE_SIZE> = String::new();
        {
            let Some(text) = self.history.browse_prev(self.line.as_str()) else {
                return;
            };
            let _ = shown.push_str(text);
        }
        self.line.set(&shown);
        self.redraw_line();
    }

    fn history_next(&mut self) {
        let mut shown: String<LINE_SIZE> = String::new();
        {
            let Some(text) = self.history.browse_next() else {
                return;
            };
            let _ = shown.push_str(text);
        }
        self.line.set(&shown);
        self.redraw_line();
    }

    fn execute_line(&mut self) {
        self.print("\r\n");
        if self.line.is_empty() {
            self.print(PROMPT);
            return;
        }

        // Tokenization runs over a private copy; the canonical buffer is
        // never touched until the reset after execution.
        let mut copy: String<LINE_SIZE> = String::new();
        let _ = copy.push_str(self.line.as_str());

        self.history.record(&copy);

        let mut argv: Vec<&str, MAX_ARGS> = Vec::new();
        tokenize(&copy, &mut argv);
        if argv.is_empty() {
            self.print(PROMPT);
            return;
        }

        let command = self
            .trie
            .lookup(argv[0])
            .and_then(|index| self.commands.and_then(|table| table.get(index)))
            .copied();
        match command {
            Some(command) => (command.handler)(self, &argv, command.context),
            None => self.print("Command not found\r\n"),
        }

        self.print(PROMPT);
    }

    fn complete(&mut self) {
        if let Some(callback) = self.completion {
            let mut current: String<LINE_SIZE> = String::new();
            let _ = current.push_str(self.line.as_str());
            callback(self, &current);
            return;
        }

        // Default completion applies to the first word only, with the
        // cursor at end-of-line.
        if self.line.cursor() != self.line.len() || self.line.as_bytes().contains(&b' ') {
            self.put(BELL);
            return;
        }

        let mut typed: String<LINE_SIZE> = String::new();
        let _ = typed.push_str(self.line.as_str());
        let table = self.commands.unwrap_or(&[]);

        // Exact matches are excluded: a fully typed command name yields
        // zero candidates.
        let mut matches = 0usize;
        let mut single = "";
        let mut common = "";
        for command in table {
            if command.name.len() > typed.len() && command.name.starts_with(typed.as_str()) {
                matches += 1;
                single = command.name;
                common = if matches == 1 {
                    command.name
                } else {
                    common_prefix(common, command.name)
                };
            }
        }

        match matches {
            0 => self.put(BELL),
            1 => {
                let mut full: String<LINE_SIZE> = String::new();
                let _ = full.push_str(single);
                let _ = full.push(' ');
                self.line.set(&full);
                self.redraw_line();
            }
            _ => {
                if common.len() > typed.len() {
                    self.insert_text(&common[typed.len()..]);
                } else {
                    self.list_candidates(table, &typed);
                }
            }
        }
    }

    /// Print all candidates below the prompt in a fixed-width multi-column
    /// layout, then redraw the prompt and line unchanged.
    fn list_candidates(&mut self, table: &[Command], typed: &str) {
        self.print("\r\n");

        let mut longest = 0usize;
        for command in table {
            if command.name.len() > typed.len() && command.name.starts_with(typed) {
                longest = longest.max(command.name.len());
            }
        }
        let column_width = longest + 2;
        let columns = (LISTING_WIDTH / column_width).max(1);

        let mut column = 0usize;
        for command in table {
            if command.name.len() > typed.len() && command.name.starts_with(typed) {
                self.print(command.name);
                for _ in 0..column_width - command.name.len() {
                    self.put(b' ');
                }
                column += 1;
                if column >= columns {
                    self.print("\r\n");
                    column = 0;
                }
            }
        }
        if column > 0 {
            self.print("\r\n");
        }

        self.redraw_line();
    }
}

impl fmt::Write for Shell<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s);
        Ok(())
    }
}

impl fmt::Debug for Shell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("line", &self.line)
            .field("logged_in", &self.logged_in)
            .field("echo", &self.echo)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

/// Split a line into whitespace-delimited tokens, honoring double-quoted
/// spans (a quote starts a token running to the matching quote, not to
/// whitespace; an unclosed quote runs to end of line). Excess tokens beyond
/// `argv`'s capacity are silently dropped.
fn tokenize<'b>(line: &'b str, argv: &mut Vec<&'b str, MAX_ARGS>) {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && !argv.is_full() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start;
        let end;
        if bytes[i] == b'"' {
            i += 1;
            start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            end = i;
            if i < bytes.len() {
                i += 1; // closing quote
            }
        } else {
            start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            end = i;
        }
        let _ = argv.push(&line[start..end]);
    }
}

fn common_prefix<'s>(a: &'s str, b: &str) -> &'s str {
    let n = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..n]
}
