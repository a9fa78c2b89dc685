//! Output targets for direct-to-file extraction.

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::BodySink;
use core_runtime::logging::strip_path;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where extracted bytes ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Output::Stdout => None,
            Output::File(path) => Some(path),
        }
    }
}

/// Open `path` for writing, or standard output when no path is given.
pub fn open_target(path: Option<&Path>) -> io::Result<(Box<dyn Write>, Output)> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            Ok((
                Box::new(BufWriter::new(file)),
                Output::File(path.to_path_buf()),
            ))
        }
        None => Ok((Box::new(io::stdout().lock()), Output::Stdout)),
    }
}

/// Streams response chunks straight into a writer.
pub struct WriterSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> BodySink for WriterSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> BridgeResult<()> {
        self.writer.write_all(chunk).map_err(BridgeError::from)?;
        self.written += chunk.len() as u64;
        Ok(())
    }
}

/// Write `bytes` to `path`. Empty content produces no file.
pub fn write_bytes(bytes: &[u8], path: &Path) -> Option<PathBuf> {
    let file = log_name(path);
    if bytes.is_empty() {
        debug!(file = %file, "Nothing to write");
        return None;
    }

    match std::fs::write(path, bytes) {
        Ok(()) => {
            debug!(file = %file, bytes = bytes.len(), "Content written");
            Some(path.to_path_buf())
        }
        Err(e) => {
            warn!(file = %file, error = %e, "Failed to write content");
            None
        }
    }
}

/// Basename of `path` for log fields.
pub(crate) fn log_name(path: &Path) -> String {
    strip_path(&path.to_string_lossy()).to_string()
}
