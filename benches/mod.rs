use criterion::{criterion_group, criterion_main};

mod shell;

criterion_group!(
    benches,
    shell::session::bench_trie_lookup,
    shell::session::bench_editor_insert,
    shell::session::bench_session_line
);
criterion_main!(benches);
