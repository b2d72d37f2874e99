//! Adapter for the general-purpose server host.
//!
//! Full capability: argument vector from `std::env::args`, host-native
//! environment store, and fd-backed byte writers for both standard streams.

use std::io::Write;
use std::sync::Arc;

use crate::detect::RuntimeKind;
use crate::env::EnvContainer;
use crate::error::{HostError, SinkError};
use crate::host::{HostAdapter, OutputSink};

pub(crate) struct NativeHost {
    env: EnvContainer,
    stdout: Arc<StdioSink>,
    stderr: Arc<StdioSink>,
}

impl NativeHost {
    pub(crate) fn new() -> Self {
        Self {
            env: EnvContainer::for_runtime(RuntimeKind::Native),
            stdout: Arc::new(StdioSink { stream: Stream::Out }),
            stderr: Arc::new(StdioSink { stream: Stream::Err }),
        }
    }
}

impl HostAdapter for NativeHost {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Native
    }

    fn env(&self) -> &EnvContainer {
        &self.env
    }

    fn args(&self) -> Result<Vec<String>, HostError> {
        Ok(std::env::args().collect())
    }

    fn stdout(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.stdout) as Arc<dyn OutputSink>
    }

    fn stderr(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.stderr) as Arc<dyn OutputSink>
    }
}

enum Stream {
    Out,
    Err,
}

/// Direct byte writer over a locked standard stream.
struct StdioSink {
    stream: Stream,
}

impl OutputSink for StdioSink {
    fn write(&self, bytes: &[u8]) -> Result<(), SinkError> {
        match self.stream {
            Stream::Out => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(bytes)?;
                handle.flush()?;
            }
            Stream::Err => {
                let stderr = std::io::stderr();
                let mut handle = stderr.lock();
                handle.write_all(bytes)?;
                handle.flush()?;
            }
        }
        Ok(())
    }
}
