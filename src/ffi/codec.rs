//! # Fixed-capacity error buffer.
//!
//! The boundary reports errors as a zero-terminated UTF-8 string inside a byte
//! array of fixed width. An empty string means success.
//!
//! ## Rules
//! - At most `capacity - 1` message bytes are copied; a zero byte always follows them.
//! - Truncation may split a multi-byte character; decoding is lossy.
//! - A zero-capacity buffer is left untouched.

use std::borrow::Cow;
use std::fmt;

/// Width of the error field of [`CollectorInstance`](super::CollectorInstance).
pub const ERROR_CAPACITY: usize = 128;

/// Writes `msg` into `buf` as a zero-terminated string, truncating as needed.
///
/// Returns the number of message bytes written (terminator excluded).
pub fn encode_error(buf: &mut [u8], msg: &str) -> usize {
    let Some(room) = buf.len().checked_sub(1) else {
        return 0;
    };
    let n = msg.len().min(room);
    buf[..n].copy_from_slice(&msg.as_bytes()[..n]);
    buf[n] = 0;
    n
}

/// Reads the message stored in `buf`, up to the first zero byte.
pub fn decode_error(buf: &[u8]) -> Cow<'_, str> {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end])
}

/// Owned, zero-initialised error buffer (`""`, i.e. success).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ErrorBuffer<const N: usize = ERROR_CAPACITY> {
    bytes: [u8; N],
}

impl<const N: usize> ErrorBuffer<N> {
    /// Empty buffer.
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Buffer holding `msg`, truncated to fit.
    pub fn with_message(msg: &str) -> Self {
        let mut buf = Self::new();
        buf.write(msg);
        buf
    }

    /// Replaces the stored message.
    pub fn write(&mut self, msg: &str) -> usize {
        encode_error(&mut self.bytes, msg)
    }

    /// Stored message, decoded lossily; empty on success.
    pub fn message(&self) -> Cow<'_, str> {
        decode_error(&self.bytes)
    }

    /// True if no error is stored.
    pub fn is_success(&self) -> bool {
        self.bytes.first().is_none_or(|&b| b == 0)
    }

    /// Raw zero-terminated bytes, ready to copy into a C record.
    pub fn into_bytes(self) -> [u8; N] {
        self.bytes
    }

    /// Borrows the raw zero-terminated bytes.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for ErrorBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for ErrorBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorBuffer").field(&self.message()).finish()
    }
}
