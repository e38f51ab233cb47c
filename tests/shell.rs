use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use nanoshell::key::Key;
use nanoshell::queue::InputQueue;
use nanoshell::shell::{Command, HandlerContext, Shell};

thread_local! {
    static OUTPUT: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static BINDING_HITS: Cell<usize> = const { Cell::new(0) };
    static POLLED: RefCell<VecDeque<u8>> = const { RefCell::new(VecDeque::new()) };
}

fn capture(byte: u8) {
    OUTPUT.with(|output| output.borrow_mut().push(byte));
}

fn take_output() -> String {
    OUTPUT.with(|output| String::from_utf8(output.borrow_mut().drain(..).collect()).unwrap())
}

fn take_captured() -> Vec<String> {
    CAPTURED.with(|captured| captured.borrow_mut().drain(..).collect())
}

fn record_args(_shell: &mut Shell<'_>, args: &[&str], _ctx: Option<HandlerContext>) {
    CAPTURED.with(|captured| {
        captured
            .borrow_mut()
            .extend(args.iter().map(|arg| arg.to_string()))
    });
}

fn record_context(_shell: &mut Shell<'_>, _args: &[&str], ctx: Option<HandlerContext>) {
    let value = ctx.and_then(|ctx| ctx.downcast_ref::<&str>()).copied();
    CAPTURED.with(|captured| {
        captured
            .borrow_mut()
            .push(value.unwrap_or("missing").to_string())
    });
}

static GREETING: &str = "hi from context";

static COMMANDS: &[Command] = &[
    Command {
        name: "hello",
        description: "Say hello",
        handler: record_args,
        context: None,
    },
    Command {
        name: "help",
        description: "List commands",
        handler: record_args,
        context: None,
    },
    Command {
        name: "say",
        description: "Echo arguments",
        handler: record_args,
        context: None,
    },
    Command {
        name: "start",
        description: "Start",
        handler: record_args,
        context: None,
    },
    Command {
        name: "status",
        description: "Status",
        handler: record_args,
        context: None,
    },
    Command {
        name: "stop",
        description: "Stop",
        handler: record_args,
        context: None,
    },
    Command {
        name: "ctx",
        description: "Context check",
        handler: record_context,
        context: Some(&GREETING),
    },
];

fn session<'a>(queue: &'a InputQueue) -> Shell<'a> {
    let mut shell = Shell::new(queue, capture, None);
    shell.load_commands(COMMANDS).unwrap();
    shell
}

fn drive(shell: &mut Shell<'_>, bytes: &[u8]) {
    for &byte in bytes {
        assert!(shell.feed(byte), "input queue overflow in test driver");
        shell.run();
    }
}

fn verify_admin(user: &str, pass: &str) -> bool {
    user == "admin" && pass == "secret"
}

#[test]
fn first_byte_shows_prompt_and_echo() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"x");
    let output = take_output();
    assert!(output.starts_with("> "), "prompt first, got {:?}", output);
    assert!(output.contains("\x1b[K> x"), "redraw with the typed byte");
}

#[test]
fn executes_a_command() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"hello\r");
    assert_eq!(take_captured(), vec!["hello"]);
    let output = take_output();
    assert!(output.ends_with("> "), "fresh prompt after execution");
}

#[test]
fn arguments_and_quoting() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"say \"hello world\" now\r");
    assert_eq!(take_captured(), vec!["say", "hello world", "now"]);
    take_output();
}

#[test]
fn unclosed_quote_runs_to_end_of_line() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"say \"half open\r");
    assert_eq!(take_captured(), vec!["say", "half open"]);
    take_output();
}

#[test]
fn unknown_command_reports_and_reprompts() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"nope\r");
    assert!(take_captured().is_empty());
    let output = take_output();
    assert!(output.contains("Command not found"));
    assert!(output.ends_with("> "));
}

#[test]
fn empty_line_just_reprompts() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"\r");
    assert_eq!(take_output(), "> \r\n> ");
    assert!(take_captured().is_empty());
}

#[test]
fn backspace_edits_the_line() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"hellx\x7fo\r");
    assert_eq!(take_captured(), vec!["hello"]);
    take_output();
}

#[test]
fn cursor_motion_and_mid_line_editing() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    // Type "bd", jump home, insert "a", jump to end, append "e".
    drive(&mut shell, b"bd\x01a\x05e");
    assert_eq!(shell.line(), "abde");
    // Left arrow then backspace removes the 'd'.
    drive(&mut shell, b"\x1b[D\x7f");
    assert_eq!(shell.line(), "abe");
    take_output();
}

#[test]
fn kill_shortcuts() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);

    drive(&mut shell, b"hello\x15");
    assert_eq!(shell.line(), "", "Ctrl-U kills to start");

    drive(&mut shell, b"hello\x02\x02\x0b");
    assert_eq!(shell.line(), "hel", "Ctrl-K kills from cursor to end");
    drive(&mut shell, b"\x15");

    drive(&mut shell, b"one two\x17");
    assert_eq!(shell.line(), "one ", "Ctrl-W kills the previous word");
    take_output();
}

#[test]
fn transpose_shortcut() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"ab\x14");
    assert_eq!(shell.line(), "ba");
    take_output();
}

#[test]
fn ctrl_c_cancels_the_line() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"abc\x03");
    assert_eq!(shell.line(), "");
    let output = take_output();
    assert!(output.contains("^C\r\n"));
    assert!(output.ends_with("> "));
}

#[test]
fn ctrl_l_clears_the_screen() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"abc\x0c");
    let output = take_output();
    assert!(output.contains("\x1b[2J\x1b[H"));
    assert_eq!(shell.line(), "abc", "line survives the clear");
}

#[test]
fn history_recall_with_ctrl_p_and_ctrl_n() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"hello\r");
    drive(&mut shell, b"status\r");
    take_captured();

    drive(&mut shell, &[0x10]);
    assert_eq!(shell.line(), "status");
    drive(&mut shell, &[0x10]);
    assert_eq!(shell.line(), "hello");
    drive(&mut shell, &[0x0E]);
    assert_eq!(shell.line(), "status");
    // Past the newest entry: the (empty) in-progress line comes back.
    drive(&mut shell, &[0x0E]);
    assert_eq!(shell.line(), "");
    take_output();
}

#[test]
fn history_recall_preserves_typed_draft() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"hello\r");
    drive(&mut shell, b"dra");
    drive(&mut shell, b"\x1b[A");
    assert_eq!(shell.line(), "hello");
    drive(&mut shell, b"\x1b[B");
    assert_eq!(shell.line(), "dra");
    take_output();
}

#[test]
fn arrow_keys_browse_history() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"hello\r");
    take_captured();
    drive(&mut shell, b"\x1b[A");
    assert_eq!(shell.line(), "hello");
    drive(&mut shell, b"\r");
    assert_eq!(take_captured(), vec!["hello"]);
    take_output();
}

#[test]
fn tab_completes_a_single_match() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"sa\t");
    assert_eq!(shell.line(), "say ", "completed with a trailing space");
    take_output();
}

#[test]
fn tab_extends_to_common_prefix_then_lists() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"he\t");
    assert_eq!(shell.line(), "hel", "extended to the common prefix");

    drive(&mut shell, b"\t");
    assert_eq!(shell.line(), "hel", "listing leaves the line alone");
    let output = take_output();
    assert!(output.contains("hello"));
    assert!(output.contains("help"));
}

#[test]
fn tab_on_exact_name_beeps() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"say\t");
    assert_eq!(shell.line(), "say");
    assert!(take_output().contains('\x07'));
}

#[test]
fn tab_after_first_word_beeps() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"say x\t");
    assert_eq!(shell.line(), "say x");
    assert!(take_output().contains('\x07'));
}

#[test]
fn tab_with_cursor_mid_line_beeps() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"he\x02\t");
    assert_eq!(shell.line(), "he");
    assert!(take_output().contains('\x07'));
}

#[test]
fn tab_with_no_match_beeps() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"zz\t");
    assert_eq!(shell.line(), "zz");
    assert!(take_output().contains('\x07'));
}

fn custom_complete(shell: &mut Shell<'_>, line: &str) {
    CAPTURED.with(|captured| captured.borrow_mut().push(format!("complete:{}", line)));
    shell.print("!");
}

#[test]
fn completion_override_replaces_default() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.set_completion(custom_complete);
    drive(&mut shell, b"he\t");
    assert_eq!(take_captured(), vec!["complete:he"]);
    assert_eq!(shell.line(), "he", "default completion did not run");
    assert!(take_output().ends_with('!'));
}

fn swallow_key(_shell: &mut Shell<'_>, _key: Key, _ctx: Option<HandlerContext>) -> bool {
    BINDING_HITS.with(|hits| hits.set(hits.get() + 1));
    true
}

fn observe_key(_shell: &mut Shell<'_>, _key: Key, _ctx: Option<HandlerContext>) -> bool {
    BINDING_HITS.with(|hits| hits.set(hits.get() + 1));
    false
}

#[test]
fn key_binding_overrides_default_action() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    BINDING_HITS.with(|hits| hits.set(0));

    assert!(shell.bind_key(Key::Tab, swallow_key, None));
    drive(&mut shell, b"zz\t");
    assert_eq!(BINDING_HITS.with(Cell::get), 1);
    assert!(!take_output().contains('\x07'), "default beep suppressed");

    shell.unbind_key(Key::Tab);
    drive(&mut shell, b"\t");
    assert_eq!(BINDING_HITS.with(Cell::get), 1, "handler no longer called");
    assert!(take_output().contains('\x07'), "default action restored");
}

#[test]
fn key_binding_returning_false_falls_through() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    BINDING_HITS.with(|hits| hits.set(0));

    assert!(shell.bind_key(Key::CtrlT, observe_key, None));
    drive(&mut shell, b"ab\x14");
    assert_eq!(BINDING_HITS.with(Cell::get), 1);
    assert_eq!(shell.line(), "ba", "default transpose still ran");
    take_output();
}

#[test]
fn rebinding_a_key_replaces_in_place() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    BINDING_HITS.with(|hits| hits.set(0));

    assert!(shell.bind_key(Key::Tab, observe_key, None));
    assert!(shell.bind_key(Key::Tab, swallow_key, None));
    assert_eq!(shell.stats().keybind_count, 1);
    drive(&mut shell, b"\t");
    assert_eq!(BINDING_HITS.with(Cell::get), 1);
    take_output();
}

#[test]
fn handler_receives_its_context() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"ctx\r");
    assert_eq!(take_captured(), vec!["hi from context"]);
    take_output();
}

#[test]
fn login_gate_guards_the_session() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.set_login(verify_admin, b'!');

    // Ordinary bytes before the trigger are swallowed, no prompt appears.
    drive(&mut shell, b"hello\r");
    assert_eq!(take_output(), "");
    assert!(take_captured().is_empty());

    drive(&mut shell, b"!");
    assert_eq!(take_output(), "login: ");
    drive(&mut shell, b"admin\r");
    drive(&mut shell, b"secret\r");
    let output = take_output();
    assert!(output.ends_with("> "), "prompt after successful login");

    drive(&mut shell, b"hello\r");
    assert_eq!(take_captured(), vec!["hello"]);
    take_output();
}

#[test]
fn failed_login_returns_to_idle() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.set_login(verify_admin, b'!');

    drive(&mut shell, b"!admin\rwrong\r");
    let output = take_output();
    assert!(output.contains("Login failed"));
    assert!(!output.contains("> "), "no prompt without credentials");

    drive(&mut shell, b"!admin\rsecret\r");
    assert!(take_output().ends_with("> "));
}

#[test]
fn logout_requires_login_again() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.set_login(verify_admin, b'!');
    drive(&mut shell, b"!admin\rsecret\r");
    take_output();

    shell.logout();
    drive(&mut shell, b"hello\r");
    assert!(take_captured().is_empty(), "commands blocked after logout");
    assert_eq!(take_output(), "");

    drive(&mut shell, b"!");
    assert_eq!(take_output(), "login: ");
}

#[test]
fn echo_off_suppresses_insert_rendering() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.set_echo(false);
    assert!(!shell.echo());

    drive(&mut shell, b"hello");
    assert_eq!(take_output(), "> ", "prompt only, no echoed characters");

    drive(&mut shell, b"\r");
    assert_eq!(take_captured(), vec!["hello"]);
    take_output();
}

#[test]
fn echo_off_still_redraws_on_backspace() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.set_echo(false);
    drive(&mut shell, b"ab\x7f");
    let output = take_output();
    assert!(output.contains("\x1b[K> a"), "erase feedback is kept");
}

#[test]
fn redraw_is_idempotent() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    // Mid-line cursor so the reposition sequence is non-trivial.
    drive(&mut shell, b"hello\x02\x02");
    take_output();

    shell.redraw_line();
    let first = take_output();
    shell.redraw_line();
    let second = take_output();
    assert_eq!(first, second, "a second redraw must render identically");
    assert_eq!(shell.line(), "hello");
}

#[test]
fn byte_at_a_time_and_bulk_input_are_equivalent() {
    // Editing-heavy sequence: insert, arrow-left, forward delete, insert,
    // jump home, insert again.
    let input: &[u8] = b"ab\x1b[D\x1b[3~cd\x01e";

    let queue = InputQueue::new();
    let mut interleaved = session(&queue);
    drive(&mut interleaved, input);
    take_output();

    let queue = InputQueue::new();
    let mut bulk = session(&queue);
    for &byte in input {
        assert!(bulk.feed(byte));
    }
    while !queue.is_empty() {
        bulk.run();
    }
    take_output();

    assert_eq!(interleaved.line(), bulk.line());
    assert_eq!(interleaved.line(), "eacd");

    // Appending one more byte lands at the same cursor in both sessions.
    drive(&mut interleaved, b"z");
    bulk.feed(b'z');
    bulk.run();
    assert_eq!(interleaved.line(), bulk.line());
    assert_eq!(interleaved.line(), "ezacd");
    take_output();
}

#[test]
fn insert_text_and_line_accessor() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    drive(&mut shell, b"ac\x02");
    shell.insert_text("b");
    assert_eq!(shell.line(), "abc");
    take_output();
}

#[test]
fn manual_history_access() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.add_history("alpha");
    shell.add_history("alpha");
    shell.add_history("beta");
    assert_eq!(shell.history_entry(0), Some("alpha"));
    assert_eq!(shell.history_entry(1), Some("beta"));
    assert_eq!(shell.history_entry(2), None);
}

#[test]
fn stats_reflect_the_session() {
    let queue = InputQueue::new();
    let mut shell = session(&queue);
    shell.bind_key(Key::F1, observe_key, None);
    drive(&mut shell, b"hello\r");

    let stats = shell.stats();
    assert_eq!(stats.command_count, COMMANDS.len());
    assert_eq!(stats.keybind_count, 1);
    assert_eq!(stats.history_len, 1);
    assert!(!stats.trie_overflow);
    assert!(stats.trie_high_water > 1);
    take_captured();
    take_output();
}

fn poll_byte() -> Option<u8> {
    POLLED.with(|polled| polled.borrow_mut().pop_front())
}

#[test]
fn polled_source_feeds_the_session() {
    POLLED.with(|polled| polled.borrow_mut().extend(b"hello\r"));
    let queue = InputQueue::new();
    let mut shell = Shell::new(&queue, capture, Some(poll_byte));
    shell.load_commands(COMMANDS).unwrap();

    for _ in 0..10 {
        shell.run();
    }
    assert_eq!(take_captured(), vec!["hello"]);
    take_output();
}

#[test]
fn queued_bytes_take_precedence_over_polling() {
    POLLED.with(|polled| polled.borrow_mut().extend(b"zz"));
    let queue = InputQueue::new();
    let mut shell = Shell::new(&queue, capture, Some(poll_byte));
    shell.load_commands(COMMANDS).unwrap();

    shell.feed(b'a');
    shell.run();
    assert_eq!(shell.line(), "a", "queued byte consumed first");
    POLLED.with(|polled| polled.borrow_mut().clear());
    take_output();
}
