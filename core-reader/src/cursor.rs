//! Sequential `std::io` adapter over a shared reader.

use crate::error::ReaderError;
use crate::reader::RandomAccessReader;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// `Read + Seek` cursor over a [`RandomAccessReader`].
///
/// Several cursors can share one reader; each keeps its own position.
/// A failed fill surfaces as an `io::Error` rather than a silent EOF, with
/// integrity faults mapped to [`io::ErrorKind::InvalidData`].
#[derive(Debug, Clone)]
pub struct ReaderCursor {
    reader: Arc<RandomAccessReader>,
    position: u64,
}

impl ReaderCursor {
    pub fn new(reader: Arc<RandomAccessReader>) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn reader(&self) -> &Arc<RandomAccessReader> {
        &self.reader
    }

    pub fn into_inner(self) -> Arc<RandomAccessReader> {
        self.reader
    }
}

impl Read for ReaderCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self
            .reader
            .try_read_at(self.position, buf)
            .map_err(into_io_error)?;
        self.position += read as u64;
        Ok(read)
    }
}

impl Seek for ReaderCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.reader.size().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };

        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

fn into_io_error(err: ReaderError) -> io::Error {
    let kind = if err.is_integrity_fault() {
        io::ErrorKind::InvalidData
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, err)
}
