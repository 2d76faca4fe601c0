//! HTTP bodies.

use bytes::{Bytes, BytesMut};
use std::fmt::Debug;
use std::io::Write;

/// An HTTP body held in memory.
///
/// Bodies are written through [`Write`] or the `write_*` helpers, and frozen into [`Bytes`] when a
/// response is captured into a cache generation. Cloning a body copies its bytes; cloning a frozen
/// body does not.
#[derive(Clone, Default)]
pub struct Body {
    buf: BytesMut,
}

impl Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Body {} bytes>", self.buf.len())
    }
}

impl Body {
    /// Get a new, empty HTTP body.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of bytes in the body.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the body contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the contents of the body.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Read the entirety of the body into a byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Freeze the body into an immutable, cheaply clonable buffer.
    pub fn into_shared(self) -> Bytes {
        self.buf.freeze()
    }

    /// Read the entirety of the body into a `String`, interpreting the bytes as UTF-8.
    ///
    /// # Panics
    ///
    /// If the body does not contain a valid UTF-8 string, this function will panic. To explicitly
    /// handle the possibility of invalid UTF-8 data, use [`into_bytes()`][`Self::into_bytes()`] and
    /// then convert the bytes explicitly with a function like [`String::from_utf8`].
    pub fn into_string(self) -> String {
        String::from_utf8(self.into_bytes()).expect("body is valid UTF-8")
    }

    /// Read the entirety of the body into a `String`, replacing invalid UTF-8 sequences.
    pub fn into_string_lossy(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    /// Append another body onto the end of this body.
    pub fn append(&mut self, other: Body) {
        self.buf.extend_from_slice(&other.buf);
    }

    /// Write a slice of bytes to the end of this body, and return the number of bytes written.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        self.buf.extend_from_slice(bytes);
        bytes.len()
    }

    /// Write a string slice to the end of this body, and return the number of bytes written.
    pub fn write_str(&mut self, string: &str) -> usize {
        self.write_bytes(string.as_bytes())
    }
}

impl Write for Body {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(self.write_bytes(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl From<&[u8]> for Body {
    fn from(s: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(s),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Self::from(v.as_slice())
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Self::from(b.as_ref())
    }
}
