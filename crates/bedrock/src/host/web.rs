//! Adapters for wasm hosts reached through JS globals.
//!
//! Two shapes of host live here:
//!
//! - [`DenoHost`]: scripting host with an argument vector (`Deno.args`) and
//!   a native environment store (`Deno.env`); output goes straight to the
//!   console primitive.
//! - [`ConsoleHost`]: sandboxed worker and browser hosts with neither argv
//!   nor a native variable store; output is pumped from an internal buffer
//!   into the console primitive by a background task attached once at
//!   adapter construction.

use std::sync::Arc;

use futures::channel::mpsc;
use futures::StreamExt;
use wasm_bindgen::{JsCast, JsValue};

use crate::detect::RuntimeKind;
use crate::env::{
    EnvContainer, EnvSource, OverrideSource, PresetSource, StaticSource,
};
use crate::error::{HostError, SinkError};
use crate::host::sink::console_line;
use crate::host::{HostAdapter, OutputSink};

fn global_get(name: &str) -> Option<JsValue> {
    let value = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name)).ok()?;
    (!value.is_undefined()).then_some(value)
}

fn call_method(target: &JsValue, method: &str, args: &[&JsValue]) -> Option<JsValue> {
    let function = js_sys::Reflect::get(target, &JsValue::from_str(method))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()?;
    match args {
        [] => function.call0(target).ok(),
        [a] => function.call1(target, a).ok(),
        [a, b] => function.call2(target, a, b).ok(),
        _ => None,
    }
}

/// Which console primitive a sink feeds.
#[derive(Clone, Copy)]
enum ConsoleStream {
    Log,
    Error,
}

impl ConsoleStream {
    fn emit(self, line: &str) {
        let value = JsValue::from_str(line);
        match self {
            Self::Log => web_sys::console::log_1(&value),
            Self::Error => web_sys::console::error_1(&value),
        }
    }
}

/// Console sink without a pump: the host's console accepts synchronous
/// calls, so bytes are decoded and trimmed right at the write boundary.
struct DirectConsoleSink {
    stream: ConsoleStream,
}

impl OutputSink for DirectConsoleSink {
    fn write(&self, bytes: &[u8]) -> Result<(), SinkError> {
        self.stream.emit(&console_line(bytes));
        Ok(())
    }
}

/// Pump-backed console sink for output-sink-only hosts.
///
/// Writes land in an internal buffer; a background task drains chunks into
/// the console primitive for the life of the process. Pump failures are
/// reported, never fatal.
struct PumpedConsoleSink {
    chunks: mpsc::UnboundedSender<Vec<u8>>,
}

impl PumpedConsoleSink {
    fn spawn(stream: ConsoleStream) -> Self {
        let (chunks, mut drain) = mpsc::unbounded::<Vec<u8>>();
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(chunk) = drain.next().await {
                stream.emit(&console_line(&chunk));
            }
            tracing::warn!("console pump stopped draining; sink writes will fail");
        });
        Self { chunks }
    }
}

impl OutputSink for PumpedConsoleSink {
    fn write(&self, bytes: &[u8]) -> Result<(), SinkError> {
        self.chunks.unbounded_send(bytes.to_vec()).map_err(|_| {
            tracing::warn!("write after console pump shutdown");
            SinkError::Console {
                reason: "console pump is no longer draining".to_owned(),
            }
        })
    }
}

/// `Deno.env` as an environment source.
struct DenoEnvSource;

impl DenoEnvSource {
    fn env_object() -> Option<JsValue> {
        let deno = global_get("Deno")?;
        let env = js_sys::Reflect::get(&deno, &JsValue::from_str("env")).ok()?;
        (!env.is_undefined()).then_some(env)
    }
}

impl EnvSource for DenoEnvSource {
    fn name(&self) -> &'static str {
        "deno-env"
    }

    fn active(&self, kind: RuntimeKind) -> bool {
        kind == RuntimeKind::Deno
    }

    fn get(&self, key: &str) -> Option<String> {
        let env = Self::env_object()?;
        call_method(&env, "get", &[&JsValue::from_str(key)])?.as_string()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(env) = Self::env_object() {
            let _ = call_method(
                &env,
                "set",
                &[&JsValue::from_str(key), &JsValue::from_str(value)],
            );
        }
    }

    fn delete(&self, key: &str) {
        if let Some(env) = Self::env_object() {
            let _ = call_method(&env, "delete", &[&JsValue::from_str(key)]);
        }
    }

    fn keys(&self) -> Vec<String> {
        let Some(env) = Self::env_object() else {
            return Vec::new();
        };
        let Some(table) = call_method(&env, "toObject", &[]) else {
            return Vec::new();
        };
        let Ok(object) = table.dyn_into::<js_sys::Object>() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = js_sys::Object::keys(&object)
            .iter()
            .filter_map(|k| k.as_string())
            .collect();
        keys.sort_unstable();
        keys
    }

    fn host_native(&self) -> bool {
        true
    }
}

/// The Deno scripting host.
pub(crate) struct DenoHost {
    env: EnvContainer,
    stdout: Arc<DirectConsoleSink>,
    stderr: Arc<DirectConsoleSink>,
}

impl DenoHost {
    pub(crate) fn new() -> Self {
        let env = EnvContainer::with_sources(
            RuntimeKind::Deno,
            vec![
                Arc::new(OverrideSource::new()),
                Arc::new(PresetSource::new()),
                Arc::new(DenoEnvSource),
                Arc::new(StaticSource::new()),
            ],
        );
        Self {
            env,
            stdout: Arc::new(DirectConsoleSink {
                stream: ConsoleStream::Log,
            }),
            stderr: Arc::new(DirectConsoleSink {
                stream: ConsoleStream::Error,
            }),
        }
    }
}

impl HostAdapter for DenoHost {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Deno
    }

    fn env(&self) -> &EnvContainer {
        &self.env
    }

    fn args(&self) -> Result<Vec<String>, HostError> {
        let args = global_get("Deno")
            .and_then(|deno| js_sys::Reflect::get(&deno, &JsValue::from_str("args")).ok())
            .and_then(|args| args.dyn_into::<js_sys::Array>().ok())
            .map(|array| array.iter().filter_map(|v| v.as_string()).collect())
            .unwrap_or_default();
        Ok(args)
    }

    fn stdout(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.stdout) as Arc<dyn OutputSink>
    }

    fn stderr(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.stderr) as Arc<dyn OutputSink>
    }
}

/// Sandboxed worker and browser hosts: no argv, preset-backed environment,
/// pumped console output.
pub(crate) struct ConsoleHost {
    kind: RuntimeKind,
    env: EnvContainer,
    stdout: Arc<PumpedConsoleSink>,
    stderr: Arc<PumpedConsoleSink>,
}

impl ConsoleHost {
    pub(crate) fn new(kind: RuntimeKind) -> Self {
        Self {
            kind,
            env: EnvContainer::for_runtime(kind),
            stdout: Arc::new(PumpedConsoleSink::spawn(ConsoleStream::Log)),
            stderr: Arc::new(PumpedConsoleSink::spawn(ConsoleStream::Error)),
        }
    }
}

impl HostAdapter for ConsoleHost {
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
