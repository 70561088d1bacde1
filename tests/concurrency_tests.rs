//! Multi-producer / single-consumer tests

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::Collected;
use fifo_log::platform::host::HostPlatform;
use fifo_log::Fifo;

const PRODUCERS: usize = 4;
const MESSAGES: usize = 100;
const MSG_LEN: usize = 8;

/// `"<t>:<seq:05>\n"`, exactly 8 bytes.
fn message(thread: usize, seq: usize) -> Vec<u8> {
    let msg = format!("{}:{:05}\n", thread, seq).into_bytes();
    assert_eq!(msg.len(), MSG_LEN);
    msg
}

#[test]
fn test_concurrent_producers_messages_not_split() {
    common::init_tracing();

    let collected = Collected::new();
    let mut fifo: Fifo<HostPlatform, 8192, 64> = Fifo::new();
    fifo.init(collected.sink()).unwrap();
    fifo.start();

    let ctx = Arc::clone(fifo.context().unwrap());
    let enqueued = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|t| {
            let ctx = Arc::clone(&ctx);
            let enqueued = Arc::clone(&enqueued);
            thread::spawn(move || {
                for seq in 0..MESSAGES {
                    if ctx.push_bytes(&message(t, seq)) == MSG_LEN {
                        enqueued.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let expected = enqueued.load(Ordering::Relaxed) * MSG_LEN;
    assert!(collected.wait_for(expected));
    fifo.deinit();

    let bytes = collected.bytes();
    assert_eq!(bytes.len(), expected);
    // Ring is large enough for every message.
    assert_eq!(expected, PRODUCERS * MESSAGES * MSG_LEN);

    // Every 8-byte frame is one whole message, and each producer's
    // messages arrive in the order it pushed them.
    let mut next_seq = [0usize; PRODUCERS];
    for frame in bytes.chunks(MSG_LEN) {
        let text = std::str::from_utf8(frame).unwrap();
        let (t, rest) = text.split_once(':').expect("frame split across messages");
        let t: usize = t.parse().unwrap();
        let seq: usize = rest.trim_end_matches('\n').parse().unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(seq, next_seq[t], "producer {} out of order", t);
        next_seq[t] += 1;
    }
    assert_eq!(next_seq, [MESSAGES; PRODUCERS]);
}

#[test]
fn test_concurrent_overload_accounts_every_byte() {
    let collected = Collected::new();
    let mut fifo: Fifo<HostPlatform, 64, 64> = Fifo::new();
    fifo.init(collected.sink()).unwrap();
    fifo.start();

    let ctx = Arc::clone(fifo.context().unwrap());
    let stored = Arc::new(AtomicUsize::new(0));

    thread::scope(|s| {
        for t in 0..PRODUCERS {
            let ctx = &ctx;
            let stored = &stored;
            s.spawn(move || {
                for seq in 0..MESSAGES {
                    let n = ctx.push_bytes(&message(t, seq));
                    stored.fetch_add(n, Ordering::Relaxed);
                }
            });
        }
    });

    let stored = stored.load(Ordering::Relaxed);
    assert!(collected.wait_for(stored));
    fifo.deinit();

    // Overload sheds bytes, never invents or duplicates them.
    assert_eq!(collected.bytes().len(), stored);
    assert_eq!(stored + ctx.dropped(), PRODUCERS * MESSAGES * MSG_LEN);
}

#[test]
fn test_used_never_exceeds_capacity_under_load() {
    let collected = Collected::new();
    let mut fifo: Fifo<HostPlatform, 128, 64> = Fifo::new();
    fifo.init(collected.sink()).unwrap();
    fifo.start();

    let ctx = Arc::clone(fifo.context().unwrap());
    thread::scope(|s| {
        for t in 0..PRODUCERS {
            let ctx = &ctx;
            s.spawn(move || {
                for seq in 0..MESSAGES {
                    ctx.push_bytes(&message(t, seq));
                    assert!(ctx.used() <= ctx.capacity());
                }
            });
        }
    });

    fifo.deinit();
}
