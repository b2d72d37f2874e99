//! Byte sinks and console-line adaptation.

use std::sync::{Mutex, PoisonError};

use crate::error::SinkError;

/// Byte-oriented output contract: a single acknowledged write.
///
/// Implementations adapt whatever native primitive the host provides
/// (a direct byte writer, a text-decoding console logger, or a pumped
/// transform buffer) behind this one operation.
pub trait OutputSink: Send + Sync {
    /// Writes the bytes, returning once the host has accepted them.
    fn write(&self, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Decodes a console chunk at the last possible boundary, trimming only
/// trailing line terminators (console primitives append their own).
///
/// Exposed for custom console-style [`OutputSink`] implementations.
pub fn console_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches(['\n', '\r']).to_owned()
}

/// In-memory sink for hosts without a usable output primitive, and for
/// asserting on written bytes in tests.
#[derive(Default)]
pub struct MemorySink {
    buffer: Mutex<Vec<u8>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutputSink for MemorySink {
    fn write(&self, bytes: &[u8]) -> Result<(), SinkError> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(())
    }
}
