// Integration tests for console output and the critical section

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{test_context, SharedBuffer, DEFAULT_TIMEOUT};
use vpool::{Console, PoolOptions};

#[test]
fn test_console_lines_from_workers_never_interleave() {
    let context = test_context();
    let buffer = SharedBuffer::default();
    let console = Console::with_writer(context.critical_section(), buffer.clone());
    let pool = context.construct("printer", PoolOptions::new().workers(4)).unwrap();

    let print = pool.wrap(move |index: usize| {
        console.line(format_args!("line {:03} {}", index, "x".repeat(64)));
    });
    for index in 0..200 {
        print.submit(index);
    }
    context.wait("printer").unwrap();

    let output = buffer.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 200);
    for line in lines {
        assert!(line.starts_with("[vpool-printer-"), "unexpected prefix: {}", line);
        assert!(line.ends_with(&"x".repeat(64)), "torn line: {}", line);
    }
    context.shutdown(DEFAULT_TIMEOUT).unwrap();
}

#[test]
fn test_console_without_thread_names() {
    let context = test_context();
    let buffer = SharedBuffer::default();
    let console = Console::with_writer(context.critical_section(), buffer.clone()).thread_names(false);
    console.line("plain");
    assert_eq!(buffer.contents(), "plain\n");
}

#[test]
fn test_atom_serializes_read_modify_write() {
    let context = test_context();
    let pool = context.construct("atomic", PoolOptions::new().workers(8)).unwrap();

    // load then store is only correct while the section excludes other workers
    let total = Arc::new(AtomicUsize::new(0));
    let shared = Arc::clone(&total);
    let add = context.critical_section().atom(move |by: usize| {
        let current = shared.load(Ordering::SeqCst);
        std::thread::yield_now();
        shared.store(current + by, Ordering::SeqCst);
    });
    let submit = pool.wrap(add);
    for _ in 0..400 {
        submit.submit(1);
    }
    context.wait("atomic").unwrap();

    assert_eq!(total.load(Ordering::SeqCst), 400);
    context.shutdown(DEFAULT_TIMEOUT).unwrap();
}

#[test]
fn test_task_can_print_while_holding_the_section() {
    let context = test_context();
    let buffer = SharedBuffer::default();
    let console = Console::with_writer(context.critical_section(), buffer.clone()).thread_names(false);
    let section = context.critical_section();
    let pool = context.construct("nested", PoolOptions::new().workers(2)).unwrap();

    pool.execute(move || {
        let _held = section.enter();
        console.line("first");
        console.line("second");
    });
    context.wait("nested").unwrap();

    assert_eq!(buffer.contents(), "first\nsecond\n");
    context.shutdown(DEFAULT_TIMEOUT).unwrap();
}
