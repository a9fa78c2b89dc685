//! # JSON Pagination Buffer
//!
//! Accumulates paginated JSON responses into one logical document.
//!
//! ## Stitching
//!
//! The first page is stored whole. When a page completes,
//! [`JsonContent::finish_page`] finds the last `]` (the end of the page's
//! record array) and looks past it for a `"nextPage"` field holding an
//! `https://` link. If one is found, the committed length is cut back to that
//! `]`, which is overwritten with `,`, and the link becomes the next page's
//! URL. The first body chunk of every later page has everything up to and
//! including its first `[` dropped, so its records continue the array
//! already in the buffer.
//!
//! The final page keeps its closing bracket and trailing fields, so the
//! buffer ends as the same well-formed document a single page would have
//! been. A final page with no records (`[ ]` or `[ , ]`) leaves a dangling
//! comma, which is blanked out.
//!
//! ```text
//! page 1  [{"a":1}],"nextPage":"https://x/p2"   ->  [{"a":1},
//! page 2  [{"a":1}],"nextPage":"https://x/p3"   ->  [{"a":1},{"a":1},
//! page 3  [{"a":1}]                             ->  [{"a":1},{"a":1},{"a":1}]
//! ```

use crate::growth::{BufferError, GrowableBuffer, GrowthPolicy};
use crate::output;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::BodySink;
use core_runtime::config::ExtractConfig;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

const NEXT_PAGE_KEY: &[u8] = b"\"nextPage\"";
const SECURE_SCHEME: &[u8] = b"https://";

#[derive(Debug, Default)]
pub struct JsonContent {
    buf: GrowableBuffer,
    /// Logical end of committed content; bytes past it are scratch.
    end: usize,
    pages: usize,
    chunks: usize,
    next_page: Option<Range<usize>>,
}

impl JsonContent {
    /// Empty buffer with the default 1 MiB growth quantum.
    pub fn new() -> Self {
        Self::with_quantum(0)
    }

    /// Empty buffer growing in steps of `quantum` bytes (0 selects the default).
    pub fn with_quantum(quantum: usize) -> Self {
        Self {
            buf: GrowableBuffer::new(GrowthPolicy::new(quantum)),
            ..Self::default()
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::with_quantum(config.json_growth_quantum)
    }

    /// Forget all content and pagination state, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.data.clear();
        self.end = 0;
        self.pages = 0;
        self.chunks = 0;
        self.next_page = None;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.data[..self.end]
    }

    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity
    }

    pub fn quantum(&self) -> usize {
        self.buf.policy().quantum()
    }

    /// Pages merged so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Body chunks stored for the page currently being received.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Link to the next page, once the current page has been finished.
    pub fn next_page_url(&self) -> Option<&str> {
        let range = self.next_page.clone()?;
        std::str::from_utf8(self.buf.data.get(range)?).ok()
    }

    /// Write the committed content to `path`.
    ///
    /// Returns `None` when the buffer is empty or the file cannot be written.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        output::write_bytes(self.as_bytes(), path.as_ref())
    }

    /// Close the current page and splice it onto the previous ones.
    ///
    /// Returns the next page's URL, or `None` when pagination is over.
    pub fn finish_page(&mut self) -> Option<&str> {
        self.next_page = None;
        if self.end == 0 {
            return None;
        }

        self.pages += 1;
        self.chunks = 0;

        let data = &self.buf.data[..self.end];
        let close = match data.iter().rposition(|&b| b == b']') {
            Some(i) if i > 0 => i,
            _ => {
                debug!(pages = self.pages, "Response has no record array");
                return None;
            }
        };

        match locate_next_page(data, close) {
            NextPage::Found(url) => {
                self.buf.data[close] = b',';
                self.end = close + 1;
                self.next_page = Some(url);
                trace!(pages = self.pages, "Next page located");
            }
            NextPage::Absent => {
                self.bridge_trailing_commas(close);
                let tail = trim_ascii(&self.buf.data[close + 1..self.end]);
                if self.pages > 1 && !(tail.is_empty() || tail.ends_with(b"}")) {
                    warn!(
                        pages = self.pages,
                        "Final page has no nextPage link and an unterminated tail; treating it as the last page"
                    );
                } else {
                    debug!(pages = self.pages, "Last page reached");
                }
            }
            NextPage::Malformed => {
                self.bridge_trailing_commas(close);
                warn!(
                    pages = self.pages,
                    "nextPage field without a usable https link; treating page as the last"
                );
            }
        }

        self.next_page_url()
    }

    /// Blank out commas left before the closing bracket by an empty page.
    fn bridge_trailing_commas(&mut self, close: usize) {
        for byte in self.buf.data[..close].iter_mut().rev() {
            match *byte {
                b',' => *byte = b' ',
                b if b.is_ascii_whitespace() => continue,
                _ => break,
            }
        }
    }

    fn ingest(&mut self, chunk: &[u8]) -> Result<(), BufferError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.next_page = None;

        let usable = if self.pages == 0 || self.chunks > 0 {
            chunk
        } else {
            match chunk.iter().position(|&b| b == b'[') {
                Some(open) => &chunk[open + 1..],
                None => {
                    trace!(bytes = chunk.len(), "Skipping chunk before opening bracket");
                    return Ok(());
                }
            }
        };

        if usable.is_empty() {
            self.chunks += 1;
            return Ok(());
        }

        let new_len = self
            .end
            .checked_add(usable.len())
            .ok_or(BufferError::Overflow)?;
        self.buf.data.truncate(self.end);
        if new_len >= self.buf.capacity {
            self.buf.grow_to(new_len)?;
        }
        self.buf.data.extend_from_slice(usable);
        self.end = new_len;
        self.chunks += 1;
        Ok(())
    }
}

impl BodySink for JsonContent {
    fn write_chunk(&mut self, chunk: &[u8]) -> BridgeResult<()> {
        self.ingest(chunk).map_err(Into::into)
    }
}

enum NextPage {
    Found(Range<usize>),
    Absent,
    Malformed,
}

/// Look after `close` for `"nextPage"` followed by an `https://` link
/// terminated by a double quote.
fn locate_next_page(data: &[u8], close: usize) -> NextPage {
    let Some(key) = find(data, close + 1, NEXT_PAGE_KEY) else {
        return NextPage::Absent;
    };
    let Some(start) = find(data, key + NEXT_PAGE_KEY.len(), SECURE_SCHEME) else {
        return NextPage::Malformed;
    };
    match data[start..].iter().position(|&b| b == b'"') {
        Some(len) => NextPage::Found(start..start + len),
        None => NextPage::Malformed,
    }
}

fn find(data: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    data.get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}
