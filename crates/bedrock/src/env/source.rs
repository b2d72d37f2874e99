//! Pluggable environment-variable sources.
//!
//! Each source owns one backing store (in-memory map, host-native variable
//! table, or an injected preset table) and an `active` predicate deciding
//! whether it participates under the current [`RuntimeKind`]. The
//! [`EnvContainer`](super::EnvContainer) composes sources into one merged,
//! precedence-ordered view.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::detect::RuntimeKind;
use crate::env::EnvContainer;

/// One ordered participant in the environment resolver.
pub trait EnvSource: Send + Sync {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this source participates for the given runtime kind.
    fn active(&self, kind: RuntimeKind) -> bool;

    /// Looks up a key in this source's own backing store.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a pair into this source's own backing store.
    fn set(&self, key: &str, value: &str);

    /// Removes a key from this source's own backing store.
    fn delete(&self, key: &str);

    /// All keys currently defined in this source, sorted.
    fn keys(&self) -> Vec<String>;

    /// Whether writes to this source land in the host's own variable table
    /// (and are therefore visible to child processes and host APIs).
    fn host_native(&self) -> bool {
        false
    }

    /// Pushes this source's current pairs into a downstream container.
    ///
    /// Used when another layer wants this source's view mirrored elsewhere,
    /// e.g. pushed down into host-native storage.
    fn register(&self, container: &EnvContainer) {
        for key in self.keys() {
            if let Some(value) = self.get(&key) {
                container.set(&key, &value);
            }
        }
    }
}

fn lock(table: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Explicit overrides: the designated primary mutation target.
///
/// Always active, highest priority. A key set here shadows the same key in
/// every lower-priority source.
#[derive(Default)]
pub struct OverrideSource {
    table: Mutex<BTreeMap<String, String>>,
}

impl OverrideSource {
    /// Creates an empty override table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvSource for OverrideSource {
    fn name(&self) -> &'static str {
        "override"
    }

    fn active(&self, _kind: RuntimeKind) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<String> {
        lock(&self.table).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.table).insert(key.to_owned(), value.to_owned());
    }

    fn delete(&self, key: &str) {
        lock(&self.table).remove(key);
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.table).keys().cloned().collect()
    }
}

static PRESETS: Mutex<BTreeMap<String, String>> = Mutex::new(BTreeMap::new());

/// Seeds a runtime-injected preset before facade acquisition.
///
/// Sandboxed hosts have no native variable store; embedders push their
/// bindings (e.g. worker configuration) through this table at startup.
pub fn inject_preset(key: &str, value: &str) {
    PRESETS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.to_owned(), value.to_owned());
}

/// Clears every injected preset. Test support.
pub(crate) fn clear_presets() {
    PRESETS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

/// Runtime-injected presets for hosts without a native variable store.
#[derive(Default)]
pub struct PresetSource;

impl PresetSource {
    /// Creates a view over the process-wide preset table.
    pub fn new() -> Self {
        Self
    }
}

impl EnvSource for PresetSource {
    fn name(&self) -> &'static str {
        "preset"
    }

    fn active(&self, kind: RuntimeKind) -> bool {
        matches!(
            kind,
            RuntimeKind::Workerd | RuntimeKind::Browser | RuntimeKind::Unknown
        )
    }

    fn get(&self, key: &str) -> Option<String> {
        lock(&PRESETS).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&PRESETS).insert(key.to_owned(), value.to_owned());
    }

    fn delete(&self, key: &str) {
        lock(&PRESETS).remove(key);
    }

    fn keys(&self) -> Vec<String> {
        lock(&PRESETS).keys().cloned().collect()
    }
}

/// The host-native variable table (`std::env` on native targets).
///
/// Active only where the host actually has one; writes through this source
/// are visible to the whole process and to spawned children.
#[derive(Default)]
pub struct ProcessSource;

impl ProcessSource {
    /// Creates a view over the host's variable table.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl EnvSource for ProcessSource {
    fn name(&self) -> &'static str {
        "process"
    }

    fn active(&self, kind: RuntimeKind) -> bool {
        kind.has_host_env()
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn delete(&self, key: &str) {
        std::env::remove_var(key);
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = std::env::vars().map(|(key, _)| key).collect();
        keys.sort_unstable();
        keys
    }

    fn host_native(&self) -> bool {
        true
    }
}

/// Static fallback defaults, lowest priority.
///
/// The table is fixed at composition time; `set`/`delete` are no-ops so the
/// fallback can never drift from what was composed.
#[derive(Default)]
pub struct StaticSource {
    table: BTreeMap<String, String>,
}

impl StaticSource {
    /// Creates an empty fallback table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fallback table from fixed defaults.
    pub fn with_defaults<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: defaults
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn active(&self, _kind: RuntimeKind) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<String> {
        self.table.get(key).cloned()
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn delete(&self, _key: &str) {}

    fn keys(&self) -> Vec<String> {
        self.table.keys().cloned().collect()
    }
}
