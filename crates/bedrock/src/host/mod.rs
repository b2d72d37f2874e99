//! Per-host runtime I/O adapters.
//!
//! One [`HostAdapter`] implementation exists per [`RuntimeKind`], all
//! satisfying the same trait; the kinds share no behavior beyond the
//! contract, so there is no inheritance between them. The adapter for the
//! detected kind is built exactly once per process, inside the singleton
//! cache, so construction side effects (like attaching a console pump)
//! never re-run.

mod sink;

#[cfg(not(target_arch = "wasm32"))]
mod native;
mod unknown;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod web;

use std::sync::Arc;

pub use sink::{console_line, MemorySink, OutputSink};

use crate::detect::{detect, RuntimeKind};
use crate::env::EnvContainer;
use crate::error::HostError;
use crate::singleton::Singleton;

/// Uniform contract over one host's I/O capabilities.
pub trait HostAdapter: Send + Sync {
    /// The runtime kind this adapter serves.
    fn kind(&self) -> RuntimeKind;

    /// The merged environment view, composed for this kind.
    fn env(&self) -> &EnvContainer;

    /// The host's invocation arguments, in order.
    ///
    /// Fails with [`HostError::Unsupported`] on hosts that have no argument
    /// vector, rather than returning an empty default.
    fn args(&self) -> Result<Vec<String>, HostError>;

    /// The standard-output byte sink.
    fn stdout(&self) -> Arc<dyn OutputSink>;

    /// The standard-error byte sink.
    fn stderr(&self) -> Arc<dyn OutputSink>;
}

static SHARED: Singleton<Arc<dyn HostAdapter>> = Singleton::new();

/// The shared base adapter for this process, built on first use.
pub(crate) fn shared() -> Arc<dyn HostAdapter> {
    SHARED.get_or_init(|| build_adapter(detect()))
}

/// Forgets the shared adapter so the next acquisition reconstructs it.
pub(crate) fn reset_shared() {
    SHARED.reset();
}

fn build_adapter(kind: RuntimeKind) -> Arc<dyn HostAdapter> {
    match kind {
        #[cfg(not(target_arch = "wasm32"))]
        RuntimeKind::Native => Arc::new(native::NativeHost::new()),
        #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
        RuntimeKind::Deno => Arc::new(web::DenoHost::new()),
        #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
        RuntimeKind::Workerd => Arc::new(web::ConsoleHost::new(RuntimeKind::Workerd)),
        #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
        RuntimeKind::Browser => Arc::new(web::ConsoleHost::new(RuntimeKind::Browser)),
        // Kinds with no adapter compiled for this target degrade to the
        // unknown adapter: capability-dependent operations fail at the
        // point of use.
        other => Arc::new(unknown::UnknownHost::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_adapter_is_memoized() {
        let first = shared();
        let second = shared();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.kind(), detect());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_unknown_adapter_refuses_args() {
        let adapter = build_adapter(RuntimeKind::Workerd);
        assert_eq!(adapter.kind(), RuntimeKind::Workerd);
        let err = adapter.args().expect_err("workerd has no argument vector");
        assert!(matches!(err, HostError::Unsupported { .. }));
    }
}
