//! `ReaderCursor` as a `Read + Seek` adapter over a shared reader.

mod common;

use bridge_traits::NoopNotifier;
use common::{expected, MemorySource};
use core_reader::{RandomAccessReader, ReaderConfig, ReaderCursor};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::sync::Arc;

fn small_config() -> ReaderConfig {
    ReaderConfig::default()
        .with_cache_buffer_size(4096)
        .with_stream_offset(512)
        .with_thread_count(3)
}

fn cursor(source: &MemorySource) -> ReaderCursor {
    let reader = RandomAccessReader::open(source, small_config(), Arc::new(NoopNotifier)).unwrap();
    ReaderCursor::new(Arc::new(reader))
}

#[test]
fn test_read_to_end_matches_plaintext() {
    let source = MemorySource::new(100_000);
    let mut cursor = cursor(&source);

    let mut all = Vec::new();
    cursor.read_to_end(&mut all).unwrap();

    assert_eq!(all.len(), 100_000);
    assert_eq!(all, expected(0..100_000));
    assert_eq!(cursor.position(), 100_000);
}

#[test]
fn test_seek_variants() {
    let source = MemorySource::new(100_000);
    let mut cursor = cursor(&source);

    assert_eq!(cursor.seek(SeekFrom::End(-10)).unwrap(), 99_990);
    let mut tail = Vec::new();
    cursor.read_to_end(&mut tail).unwrap();
    assert_eq!(tail, expected(99_990..100_000));

    assert_eq!(cursor.seek(SeekFrom::Start(50_000)).unwrap(), 50_000);
    assert_eq!(cursor.seek(SeekFrom::Current(-1_000)).unwrap(), 49_000);

    let mut chunk = [0u8; 256];
    cursor.read_exact(&mut chunk).unwrap();
    assert_eq!(&chunk[..], &expected(49_000..49_256)[..]);
}

#[test]
fn test_seek_before_start_is_rejected() {
    let source = MemorySource::new(1000);
    let mut cursor = cursor(&source);

    let err = cursor.seek(SeekFrom::Current(-1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_seek_past_end_reads_nothing() {
    let source = MemorySource::new(1000);
    let mut cursor = cursor(&source);

    cursor.seek(SeekFrom::Start(5000)).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(cursor.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_integrity_fault_is_invalid_data() {
    let source = MemorySource::new(100_000).with_corrupt_seeks(0..100_000);
    let mut cursor = cursor(&source);

    let mut buf = [0u8; 16];
    let err = cursor.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_cursors_share_one_reader() {
    let source = MemorySource::new(100_000);
    let mut first = cursor(&source);
    let mut second = first.clone();

    second.seek(SeekFrom::Start(70_000)).unwrap();

    let mut a = [0u8; 64];
    let mut b = [0u8; 64];
    first.read_exact(&mut a).unwrap();
    second.read_exact(&mut b).unwrap();

    assert_eq!(&a[..], &expected(0..64)[..]);
    assert_eq!(&b[..], &expected(70_000..70_064)[..]);
    assert!(Arc::ptr_eq(first.reader(), second.reader()));
    assert_eq!(first.reader().stats().misses, 2);
}
