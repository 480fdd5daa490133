//! Decrypting Stream Abstractions
//!
//! The core never decrypts anything itself. Hosts hand it a
//! [`DecryptingSource`] that knows how to open independent, seekable
//! plaintext views over one encrypted file; each view is a
//! [`DecryptingStream`] with its own cursor.

use crate::error::Result;

/// A forward-reading plaintext stream over chunked, authenticated ciphertext.
///
/// Implementations verify every integrity chunk they decrypt and report a
/// failed check as [`BridgeError::IntegrityFault`](crate::BridgeError::IntegrityFault).
/// Any other failure is treated by the core as a transient I/O fault.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::stream::DecryptingStream;
///
/// fn read_header(stream: &mut dyn DecryptingStream) -> Result<Vec<u8>> {
///     let mut header = vec![0u8; 64];
///     stream.seek(0)?;
///     let n = stream.read(&mut header)?;
///     header.truncate(n);
///     Ok(header)
/// }
/// ```
pub trait DecryptingStream: Send {
    /// Reposition the read cursor to an absolute plaintext offset.
    ///
    /// May fail with [`BridgeError::OutOfBounds`](crate::BridgeError::OutOfBounds)
    /// when `offset` lies past the end of the source.
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Read up to `buf.len()` plaintext bytes at the cursor.
    ///
    /// Returns `Ok(0)` on a clean end of stream. A short count does not imply EOF.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Release the underlying resources. Calling this more than once must be harmless.
    fn close(&mut self) -> Result<()>;
}

/// Factory for [`DecryptingStream`] handles over one logical source.
pub trait DecryptingSource: Send + Sync {
    /// Plaintext length of the source in bytes.
    fn plaintext_len(&self) -> Result<u64>;

    /// Open a fresh stream positioned at offset 0.
    ///
    /// `read_ahead_hint` is the number of bytes the caller expects to read
    /// after each seek; implementations may size internal buffers from it.
    fn open_stream(&self, read_ahead_hint: usize) -> Result<Box<dyn DecryptingStream>>;
}
