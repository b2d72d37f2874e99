//! Host runtime classification.
//!
//! Every capability probe in the crate funnels through [`detect`], which
//! classifies the current host into one [`RuntimeKind`] on first use and
//! caches the answer for the process lifetime. New host kinds are added
//! here and nowhere else.
//!
//! Detection never fails: an unrecognized host classifies as
//! [`RuntimeKind::Unknown`], and operations that depend on capabilities the
//! unknown host lacks fail explicitly at the point of use.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::singleton::Singleton;

/// Closed classification of the current host execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// General-purpose server host: full argument vector, host-native
    /// environment store, and fd-backed standard streams. Every non-wasm
    /// target classifies here, as does wasm running under a node-style host.
    Native,
    /// The Deno scripting host (wasm32 under `Deno`).
    Deno,
    /// A sandboxed worker host (e.g. Cloudflare workerd): no argument
    /// vector, no host-native environment store, console-only output.
    Workerd,
    /// A browser window or web worker global.
    Browser,
    /// Unrecognized host. Capability-dependent operations fail at the point
    /// of use rather than here.
    Unknown,
}

impl RuntimeKind {
    /// Whether this host exposes an invocation argument vector.
    pub fn has_args(self) -> bool {
        matches!(self, Self::Native | Self::Deno)
    }

    /// Whether this host has a native environment-variable store.
    pub fn has_host_env(self) -> bool {
        matches!(self, Self::Native | Self::Deno)
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Native => "native",
            Self::Deno => "deno",
            Self::Workerd => "workerd",
            Self::Browser => "browser",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

static DETECTED: Singleton<RuntimeKind> = Singleton::new();

/// Classifies the current host, probing once and caching thereafter.
pub fn detect() -> RuntimeKind {
    DETECTED.get_or_init(|| {
        let kind = probe();
        tracing::debug!(%kind, "classified host runtime");
        kind
    })
}

/// Forgets the cached classification so the next [`detect`] re-probes.
pub(crate) fn reset() {
    DETECTED.reset();
}

/// Probes host capabilities in a fixed, mutually exclusive order: the most
/// constrained sandbox first, then the secondary scripting host, then the
/// general-purpose server host, with a browser-like fallback.
#[cfg(not(target_arch = "wasm32"))]
fn probe() -> RuntimeKind {
    RuntimeKind::Native
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn probe() -> RuntimeKind {
    let global = js_sys::global();
    let has = |name: &str| {
        js_sys::Reflect::has(&global, &wasm_bindgen::JsValue::from_str(name)).unwrap_or(false)
    };

    if has("WebSocketPair") {
        RuntimeKind::Workerd
    } else if has("Deno") {
        RuntimeKind::Deno
    } else if has("process") {
        RuntimeKind::Native
    } else if has("window") || has("WorkerGlobalScope") {
        RuntimeKind::Browser
    } else {
        RuntimeKind::Unknown
    }
}

#[cfg(all(target_arch = "wasm32", not(target_os = "unknown")))]
fn probe() -> RuntimeKind {
    RuntimeKind::Unknown
}
