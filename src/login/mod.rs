//! Login gate state machine.
//!
//! An optional gate in front of the line editor: the session stays inert
//! until the configured trigger byte arrives, then collects a username
//! (echoed) and a password (not echoed) and hands both to a verification
//! callback. Failure prints a fixed message and drops straight back to the
//! idle state; retry counting or lockout is the caller's policy, not this
//! layer's.

use core::fmt;
use core::str;

use heapless::Vec;

use crate::editor::LINE_SIZE;
use crate::shell::PutcFn;

/// Verification callback: `(username, password)` to accept/reject.
/// Invoked synchronously; must not block indefinitely.
pub type VerifyFn = fn(user: &str, pass: &str) -> bool;

/// Result of feeding one byte through the login machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Still collecting the trigger or credentials.
    Pending,
    /// Credentials verified; the session may show its first prompt.
    LoggedIn,
    /// Verification rejected; the machine has reset to idle.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitingUser,
    AwaitingPass,
}

/// Trigger/username/password collection in front of the editor.
pub struct Login {
    verify: VerifyFn,
    trigger: u8,
    state: State,
    user: Vec<u8, LINE_SIZE>,
    pass: Vec<u8, LINE_SIZE>,
}

impl Login {
    /// Create an idle login gate with the given verifier and trigger byte.
    pub fn new(verify: VerifyFn, trigger: u8) -> Self {
        Self {
            verify,
            trigger,
            state: State::Idle,
            user: Vec::new(),
            pass: Vec::new(),
        }
    }

    /// Reset to idle and clear both credential scratch buffers.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.user.clear();
        self.pass.clear();
    }

    /// Process one input byte. Echo and prompts go through `putc`.
    pub fn feed(&mut self, byte: u8, putc: PutcFn) -> LoginOutcome {
        match self.state {
            State::Idle => {
                if byte == self.trigger {
                    self.state = State::AwaitingUser;
                    self.user.clear();
                    puts(putc, "login: ");
                }
                LoginOutcome::Pending
            }
            State::AwaitingUser => {
                match byte {
                    b'\r' | b'\n' => {
                        puts(putc, "\r\n");
                        self.state = State::AwaitingPass;
                        self.pass.clear();
                        puts(putc, "password: ");
                    }
                    0x7F | 0x08 => {
                        if self.user.pop().is_some() {
                            puts(putc, "\x08 \x08");
                        }
                    }
                    _ => {
                        if self.user.push(byte).is_ok() {
                            putc(byte);
                        }
                    }
                }
                LoginOutcome::Pending
            }
            State::AwaitingPass => match byte {
                b'\r' | b'\n' => {
                    puts(putc, "\r\n");
                    let accepted = {
                        let user = str::from_utf8(&self.user).unwrap_or("");
                        let pass = str::from_utf8(&self.pass).unwrap_or("");
                        (self.verify)(user, pass)
                    };
                    self.reset();
                    if accepted {
                        LoginOutcome::LoggedIn
                    } else {
                        puts(putc, "Login failed\r\n");
                        LoginOutcome::Failed
                    }
                }
                0x7F | 0x08 => {
                    // No echo erase: nothing was printed for the password.
                    self.pass.pop();
                    LoginOutcome::Pending
                }
                _ => {
                    let _ = self.pass.push(byte);
                    LoginOutcome::Pending
                }
            },
        }
    }
}

fn puts(putc: PutcFn, text: &str) {
    for &byte in text.as_bytes() {
        putc(byte);
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Credentials are deliberately omitted.
        f.debug_struct("Login")
            .field("state", &self.state)
            .field("trigger", &self.trigger)
            .finish()
    }
}
