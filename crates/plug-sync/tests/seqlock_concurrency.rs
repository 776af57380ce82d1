//! One monotonic writer, several readers: every observed value must be one
//! that was stored, and each reader's observations must never go backwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use bytemuck::{Pod, Zeroable};
use crossbeam_channel::unbounded;
use plug_sync::{seqlock_atomize, AtomicValue, RetryPolicy, SeqLock};
use plug_test_utils::{init_logging, Stamp};

const READERS: usize = 4;
const WRITES: u64 = 50_000;

/// Summary a reader sends back once the writer is done.
#[derive(Debug)]
struct ReaderReport {
    reads: u64,
    last: u64,
    torn: u64,
    regressions: u64,
}

fn read_until_done<F>(done: &AtomicBool, mut read: F) -> ReaderReport
where
    F: FnMut() -> Stamp,
{
    let mut report = ReaderReport {
        reads: 0,
        last: 0,
        torn: 0,
        regressions: 0,
    };
    loop {
        let finished = done.load(Ordering::Acquire);
        let stamp = read();
        report.reads += 1;
        match stamp.value() {
            Some(value) => {
                if value < report.last {
                    report.regressions += 1;
                }
                report.last = value;
            }
            None => report.torn += 1,
        }
        if finished {
            return report;
        }
    }
}

#[test]
fn seqlock_readers_see_whole_monotonic_values() {
    init_logging();
    let lock = Arc::new(SeqLock::new(Stamp::new(0)));
    let done = Arc::new(AtomicBool::new(false));
    let (tx, rx) = unbounded();

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let done = Arc::clone(&done);
            let tx = tx.clone();
            thread::spawn(move || {
                let report = read_until_done(&done, || lock.load());
                tx.send(report).unwrap();
            })
        })
        .collect();
    drop(tx);

    for value in 1..=WRITES {
        lock.store(Stamp::new(value));
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
    let reports: Vec<ReaderReport> = rx.iter().collect();
    assert_eq!(reports.len(), READERS);
    for report in &reports {
        assert_eq!(report.torn, 0, "{report:?}");
        assert_eq!(report.regressions, 0, "{report:?}");
        assert_eq!(report.last, WRITES, "final read must see the last store");
        assert!(report.reads > 0);
    }
    assert_eq!(
        lock.sequence(),
        SeqLock::<Stamp>::INITIAL_SEQUENCE + 2 * WRITES as usize
    );
}

#[test]
fn bounded_reads_succeed_once_writer_stops() {
    let lock = Arc::new(SeqLock::new(Stamp::new(0)));
    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            for value in 1..=10_000 {
                lock.store(Stamp::new(value));
            }
        })
    };
    let policy = RetryPolicy::realtime(64).unwrap();
    while !writer.is_finished() {
        if let Ok(stamp) = lock.load_bounded(&policy) {
            assert!(stamp.value().is_some());
        }
    }
    writer.join().unwrap();
    assert_eq!(lock.load_bounded(&policy), Ok(Stamp::new(10_000)));
}

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Transport {
    bar: u64,
    beat: u64,
    tick: u64,
}

seqlock_atomize!(Transport);

#[test]
fn atomic_value_fallback_is_never_torn() {
    let transport: Arc<AtomicValue<Transport>> = Arc::new(AtomicValue::new(Transport {
        bar: 0,
        beat: 0,
        tick: 0,
    }));
    assert!(!AtomicValue::<Transport>::IS_NATIVE);

    let reader = {
        let transport = Arc::clone(&transport);
        thread::spawn(move || {
            let mut last = 0;
            for _ in 0..20_000 {
                let t = transport.load();
                assert!(t.bar == t.beat && t.beat == t.tick, "torn: {t:?}");
                assert!(t.bar >= last);
                last = t.bar;
            }
        })
    };
    for n in 1..20_000u64 {
        transport.store(Transport {
            bar: n,
            beat: n,
            tick: n,
        });
    }
    reader.join().unwrap();
}
