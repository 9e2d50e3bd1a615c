use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::trace;

use crate::codec::{decode_size_header, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete size-prefixed replies from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete replies.
pub struct ReplyReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> ReplyReader<T> {
    /// Create a new reply reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new reply reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete reply payload (blocking).
    ///
    /// The returned buffer holds exactly the number of bytes the size header
    /// declared; the header itself is never part of it. A declared size of
    /// zero yields an empty buffer without touching the stream again.
    ///
    /// A stream that ends early fails with [`FrameError::TruncatedHeader`] or
    /// [`FrameError::TruncatedPayload`]. A read timeout, in the header or the
    /// payload, is returned as [`FrameError::Io`] with the timeout's
    /// `WouldBlock`/`TimedOut` kind, so callers see it as a socket error.
    pub fn read_reply(&mut self) -> Result<Bytes> {
        let mut header = [0u8; HEADER_SIZE];
        let received = self.fill(&mut header)?;
        if received < HEADER_SIZE {
            return Err(FrameError::TruncatedHeader { received });
        }

        let size = decode_size_header(&header)? as usize;
        if size > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.config.max_payload_size,
            });
        }
        if size == 0 {
            return Ok(Bytes::new());
        }

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(size)
            .map_err(|_| FrameError::Allocation { size })?;
        payload.resize(size, 0);

        let received = self.fill(&mut payload)?;
        if received < size {
            return Err(FrameError::TruncatedPayload {
                expected: size,
                received,
            });
        }

        trace!(size, "reply payload received");
        Ok(Bytes::from(payload))
    }

    /// Read until `buf` is full or the stream reports EOF.
    ///
    /// Returns the number of bytes actually placed in `buf`.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(filled)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent replies.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current reply reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
