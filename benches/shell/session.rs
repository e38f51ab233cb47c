use criterion::{Criterion, Throughput};
use std::hint::black_box;

use nanoshell::editor::LineBuffer;
use nanoshell::queue::InputQueue;
use nanoshell::shell::{Command, HandlerContext, Shell};
use nanoshell::trie::CommandTrie;

fn sink(_byte: u8) {}

fn noop(_shell: &mut Shell<'_>, _args: &[&str], _ctx: Option<HandlerContext>) {}

static COMMANDS: &[Command] = &[
    Command {
        name: "status",
        description: "Show device status",
        handler: noop,
        context: None,
    },
    Command {
        name: "start",
        description: "Start the workload",
        handler: noop,
        context: None,
    },
    Command {
        name: "stop",
        description: "Stop the workload",
        handler: noop,
        context: None,
    },
    Command {
        name: "reboot",
        description: "Restart the device",
        handler: noop,
        context: None,
    },
    Command {
        name: "version",
        description: "Print firmware version",
        handler: noop,
        context: None,
    },
];

pub fn bench_trie_lookup(c: &mut Criterion) {
    let mut trie = CommandTrie::new();
    for (index, command) in COMMANDS.iter().enumerate() {
        trie.insert(command.name, index as u16).unwrap();
    }

    c.bench_function("trie_lookup", |b| {
        b.iter(|| {
            black_box(trie.lookup(black_box("version")));
            black_box(trie.lookup(black_box("missing")));
        })
    });
}

pub fn bench_editor_insert(c: &mut Criterion) {
    let line = b"status --verbose --format json";
    let mut group = c.benchmark_group("editor");
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("insert_line", |b| {
        b.iter(|| {
            let mut editor = LineBuffer::new();
            for &byte in line {
                editor.insert_byte(black_box(byte));
            }
            black_box(editor.len())
        })
    });
    group.finish();
}

pub fn bench_session_line(c: &mut Criterion) {
    let input = b"status\r";
    let mut group = c.benchmark_group("session");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("execute_line", |b| {
        let queue = InputQueue::new();
        let mut shell = Shell::new(&queue, sink, None);
        shell.load_commands(COMMANDS).unwrap();
        b.iter(|| {
            for &byte in input {
                shell.feed(byte);
                shell.run();
            }
        })
    });
    group.finish();
}
