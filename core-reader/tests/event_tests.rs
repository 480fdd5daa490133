//! Reader events delivered through the runtime event bus.

mod common;

use common::{counting_notifier, MemorySource};
use core_reader::{RandomAccessReader, ReaderConfig};
use core_runtime::events::{CoreEvent, EventBus, EventSeverity, EventStream, ReaderEvent};
use std::sync::atomic::Ordering;

const SIZE: u64 = 1_000_000;

fn config() -> ReaderConfig {
    ReaderConfig::default()
        .with_cache_buffer_size(65_536)
        .with_stream_offset(4096)
        .with_thread_count(4)
}

#[tokio::test]
async fn test_lifecycle_events() {
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();

    let source = MemorySource::new(SIZE);
    let reader = RandomAccessReader::builder(&source)
        .config(config())
        .event_bus(bus.clone())
        .open()
        .unwrap();

    let mut out = [0u8; 128];
    reader.read_at(10_000, &mut out);
    reader.read_at(10_000, &mut out);
    reader.close();

    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Reader(ReaderEvent::Opened {
            source_len: SIZE,
            buffer_count: 2,
            thread_count: 4,
        })
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Reader(ReaderEvent::Closed { hits: 1, misses: 1 })
    );
}

#[tokio::test]
async fn test_event_bus_as_integrity_notifier() {
    let bus = EventBus::new(16);
    let mut errors = EventStream::new(bus.subscribe())
        .filter(|event| event.severity() == EventSeverity::Error);

    let source = MemorySource::new(SIZE).with_corrupt_seeks(0..SIZE);
    let reader = RandomAccessReader::builder(&source)
        .config(config())
        .event_bus(bus.clone())
        .open()
        .unwrap();

    let mut out = [0u8; 128];
    assert_eq!(reader.read_at(10_000, &mut out), 0);
    assert_eq!(reader.read_at(500_000, &mut out), 0);
    drop(reader);

    let event = errors.recv().await.unwrap();
    match event {
        CoreEvent::Reader(ReaderEvent::IntegrityFault { message, .. }) => {
            assert!(message.contains("authentication tag mismatch"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Only one integrity event even though two fills faulted
    assert!(errors.try_recv().is_none());
}

#[tokio::test]
async fn test_degraded_fill_event() {
    let bus = EventBus::new(16);
    let mut warnings = EventStream::new(bus.subscribe())
        .filter(|event| event.severity() == EventSeverity::Warning);

    // Worker 1 of the fill starting at 10_000 - 4096 fails its seek
    let worker_one = 5_904 + 16_384;
    let source = MemorySource::new(SIZE).with_failing_seeks(worker_one..worker_one + 1);
    let reader = RandomAccessReader::builder(&source)
        .config(config())
        .event_bus(bus.clone())
        .open()
        .unwrap();

    let mut out = [0u8; 128];
    assert_eq!(reader.read_at(10_000, &mut out), 128);

    assert_eq!(
        warnings.recv().await.unwrap(),
        CoreEvent::Reader(ReaderEvent::FillDegraded {
            fill_start: 5_904,
            bytes: 3 * 16_384,
            integrity_faults: 0,
            io_faults: 1,
        })
    );
}

#[tokio::test]
async fn test_explicit_notifier_takes_precedence() {
    let bus = EventBus::new(16);
    let mut errors = EventStream::new(bus.subscribe())
        .filter(|event| event.severity() == EventSeverity::Error);
    let (calls, notifier) = counting_notifier();

    let source = MemorySource::new(SIZE).with_corrupt_seeks(0..SIZE);
    let reader = RandomAccessReader::builder(&source)
        .config(config())
        .notifier(notifier)
        .event_bus(bus.clone())
        .open()
        .unwrap();

    let mut out = [0u8; 128];
    reader.read_at(10_000, &mut out);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(errors.try_recv().is_none());
}
