//! Fixed-capacity credential arena.
//!
//! Fields are placed from the back of a 2048-byte region towards the front.
//! Each placement returns a [`Span`] naming where the bytes landed; the slab
//! never hands out raw pointers and never grows. Whatever remains at the front
//! (`[0, available)`) is scratch space for the token endpoint's response.

use crate::error::{Result, TokenError};
use std::ops::Range;

/// Hard capacity ceiling of the credential slab.
pub const SLAB_CAPACITY: usize = 2048;

/// Location of a field inside a [`CredentialSlab`].
///
/// `len` excludes the NUL terminator, if one was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: usize,
    len: usize,
}

impl Span {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

pub struct CredentialSlab {
    bytes: Box<[u8; SLAB_CAPACITY]>,
    /// Front of the placed region; everything before it is free.
    cursor: usize,
}

impl Default for CredentialSlab {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialSlab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSlab")
            .field("capacity", &SLAB_CAPACITY)
            .field("available", &self.cursor)
            .finish()
    }
}

impl CredentialSlab {
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0u8; SLAB_CAPACITY]),
            cursor: SLAB_CAPACITY,
        }
    }

    pub fn capacity(&self) -> usize {
        SLAB_CAPACITY
    }

    /// Bytes still free at the front of the slab.
    pub fn available(&self) -> usize {
        self.cursor
    }

    /// Copy `data` immediately in front of the previously placed field.
    ///
    /// With `nul_terminated`, one extra zero byte follows the data so the
    /// field stays a self-delimiting string. Fails with
    /// [`TokenError::OutOfSpace`] and leaves the slab unchanged when the
    /// field does not fit.
    pub fn place_back(&mut self, data: &[u8], nul_terminated: bool) -> Result<Span> {
        let need = data.len() + usize::from(nul_terminated);
        if need > self.cursor {
            return Err(TokenError::OutOfSpace);
        }

        let start = self.cursor - need;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        if nul_terminated {
            self.bytes[start + data.len()] = 0;
        }
        self.cursor = start;

        Ok(Span {
            start,
            len: data.len(),
        })
    }

    pub fn bytes(&self, span: Span) -> &[u8] {
        &self.bytes[span.range()]
    }

    /// Text of a field. Fields placed from `&str` are always valid UTF-8;
    /// anything else reads as empty.
    pub fn text(&self, span: Span) -> &str {
        std::str::from_utf8(self.bytes(span)).unwrap_or_default()
    }

    /// Bytes from the start of `first` through the end of `last`.
    ///
    /// Used for fields placed back-to-back without terminators, which read as
    /// one contiguous run.
    pub fn joined(&self, first: Span, last: Span) -> &[u8] {
        &self.bytes[first.start.min(last.start)..first.end().max(last.end())]
    }

    /// Free front region, used to receive the token endpoint's response.
    pub fn receive_region_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.cursor]
    }

    pub fn receive_region(&self) -> &[u8] {
        &self.bytes[..self.cursor]
    }

    /// Forget every placed field and zero the slab.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.cursor = SLAB_CAPACITY;
    }
}
