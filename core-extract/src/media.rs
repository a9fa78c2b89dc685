//! Binary media buffer (recordings, greetings, prompts).
//!
//! Chunks are appended verbatim. No interpretation, no pagination.

use crate::growth::{BufferError, GrowableBuffer, GrowthPolicy};
use crate::output;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::BodySink;
use core_runtime::config::ExtractConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct MediaContent {
    buf: GrowableBuffer,
}

impl MediaContent {
    pub fn new() -> Self {
        Self::with_quantum(0)
    }

    /// Empty buffer growing in steps of `quantum` bytes (0 selects the default).
    pub fn with_quantum(quantum: usize) -> Self {
        Self {
            buf: GrowableBuffer::new(GrowthPolicy::new(quantum)),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::with_quantum(config.media_growth_quantum)
    }

    /// Drop the content, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.data.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.data
    }

    pub fn len(&self) -> usize {
        self.buf.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity
    }

    pub fn quantum(&self) -> usize {
        self.buf.policy().quantum()
    }

    /// Write the content to `path`. `None` when empty or on I/O failure.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        output::write_bytes(self.as_bytes(), path.as_ref())
    }

    fn ingest(&mut self, chunk: &[u8]) -> Result<(), BufferError> {
        let new_len = self
            .buf
            .data
            .len()
            .checked_add(chunk.len())
            .ok_or(BufferError::Overflow)?;
        if new_len >= self.buf.capacity {
            self.buf.grow_to(new_len)?;
        }
        self.buf.data.extend_from_slice(chunk);
        Ok(())
    }
}

impl BodySink for MediaContent {
    fn write_chunk(&mut self, chunk: &[u8]) -> BridgeResult<()> {
        self.ingest(chunk).map_err(Into::into)
    }
}
