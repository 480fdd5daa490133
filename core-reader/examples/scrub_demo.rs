//! Scrub through a synthetic source the way a media player would.
//!
//! Run with:
//! ```bash
//! cargo run -p core-reader --example scrub_demo
//! RUST_LOG=core_reader=trace cargo run -p core-reader --example scrub_demo
//! ```

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{BridgeError, DecryptingSource, DecryptingStream};
use core_reader::{RandomAccessReader, ReaderConfig, ReaderCursor};
use core_runtime::events::{CoreEvent, EventBus, ReaderEvent};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::Arc;

/// Keystream-style toy source: plaintext is a byte pattern, and one region
/// fails authentication.
struct ToySource {
    len: u64,
    tampered: Range<u64>,
}

struct ToyStream {
    len: u64,
    tampered: Range<u64>,
    cursor: u64,
}

impl DecryptingSource for ToySource {
    fn plaintext_len(&self) -> BridgeResult<u64> {
        Ok(self.len)
    }

    fn open_stream(&self, _read_ahead_hint: usize) -> BridgeResult<Box<dyn DecryptingStream>> {
        Ok(Box::new(ToyStream {
            len: self.len,
            tampered: self.tampered.clone(),
            cursor: 0,
        }))
    }
}

impl DecryptingStream for ToyStream {
    fn seek(&mut self, offset: u64) -> BridgeResult<()> {
        if offset > self.len {
            return Err(BridgeError::OutOfBounds {
                offset,
                len: self.len,
            });
        }
        self.cursor = offset;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> BridgeResult<usize> {
        let count = (self.len - self.cursor).min(buf.len() as u64);
        let range = self.cursor..self.cursor + count;
        if range.start < self.tampered.end && self.tampered.start < range.end {
            return Err(BridgeError::IntegrityFault(format!(
                "chunk at {} failed authentication",
                self.tampered.start
            )));
        }

        for (i, byte) in buf[..count as usize].iter_mut().enumerate() {
            *byte = ((self.cursor + i as u64) % 251) as u8;
        }
        self.cursor += count;
        Ok(count as usize)
    }

    fn close(&mut self) -> BridgeResult<()> {
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug)
            .with_thread_info(true),
    )?;

    let bus = EventBus::default();
    let mut events = bus.subscribe();

    let source = ToySource {
        len: 64 * 1024 * 1024,
        tampered: 40_000_000..40_065_536,
    };
    let reader = RandomAccessReader::builder(&source)
        .config(ReaderConfig::high_throughput())
        .event_bus(bus.clone())
        .open()?;

    let mut frame = vec![0u8; 65_536];
    for position in [0, 12_000_000, 11_900_000, 40_010_000, 63_000_000] {
        match reader.try_read_at(position, &mut frame) {
            Ok(read) => tracing::info!(position, read, "frame read"),
            Err(err) => tracing::warn!(position, error = %err, "frame unavailable"),
        }
    }

    let reader = Arc::new(reader);
    let mut cursor = ReaderCursor::new(Arc::clone(&reader));
    cursor.seek(SeekFrom::End(-4096))?;
    let mut tail = Vec::new();
    cursor.read_to_end(&mut tail)?;
    tracing::info!(bytes = tail.len(), "read trailer through cursor");

    let stats = reader.stats();
    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        hit_ratio = stats.hit_ratio(),
        "scrub finished"
    );
    reader.close();

    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Reader(ReaderEvent::IntegrityFault { offset, .. }) = &event {
            println!("host would show a corruption warning near offset {offset}");
        }
        println!("event: {}", serde_json::to_string(&event)?);
    }

    Ok(())
}
