//! Adapter for unrecognized hosts.
//!
//! Detection never fails; instead, operations that need capabilities this
//! host may not have fail here, at the point of use. Output falls back to
//! an in-memory sink so writes are never silently dropped; embedders can
//! still drain them.

use std::sync::Arc;

use crate::detect::RuntimeKind;
use crate::env::EnvContainer;
use crate::error::HostError;
use crate::host::{HostAdapter, MemorySink, OutputSink};

pub(crate) struct UnknownHost {
    kind: RuntimeKind,
    env: EnvContainer,
    stdout: Arc<MemorySink>,
    stderr: Arc<MemorySink>,
}

impl UnknownHost {
    pub(crate) fn new(kind: RuntimeKind) -> Self {
        tracing::warn!(%kind, "no dedicated host adapter on this target; degrading to unknown-host behavior");
        Self {
            kind,
            env: EnvContainer::for_runtime(kind),
            stdout: Arc::new(MemorySink::new()),
            stderr: Arc::new(MemorySink::new()),
        }
    }
}

impl HostAdapter for UnknownHost {
    fn kind(&self) -> RuntimeKind {
        self.kind
    }

    fn env(&self) -> &EnvContainer {
        &self.env
    }

    fn args(&self) -> Result<Vec<String>, HostError> {
        Err(HostError::Unsupported {
            kind: self.kind,
            operation: "args",
        })
    }

    fn stdout(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.stdout) as Arc<dyn OutputSink>
    }

    fn stderr(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.stderr) as Arc<dyn OutputSink>
    }
}
