//! Merged environment-variable resolution.
//!
//! An [`EnvContainer`] is the precedence-ordered view over every
//! [`EnvSource`] active under the current runtime kind:
//!
//! 1. explicit overrides (the primary mutation target),
//! 2. runtime-injected presets,
//! 3. the host-native variable table,
//! 4. static fallback defaults.
//!
//! Reads short-circuit at the first source with a defined value; conflicting
//! values are never merged. `keys()` returns a sorted, de-duplicated union
//! so dumped environments are reproducible across runs; test fixtures
//! depend on that ordering.

mod source;

use std::collections::BTreeSet;
use std::sync::Arc;

pub use source::{
    inject_preset, EnvSource, OverrideSource, PresetSource, ProcessSource, StaticSource,
};

pub(crate) use source::clear_presets;

use crate::detect::RuntimeKind;

/// The merged, precedence-ordered view over active environment sources.
pub struct EnvContainer {
    kind: RuntimeKind,
    sources: Vec<Arc<dyn EnvSource>>,
}

impl EnvContainer {
    /// Composes the standard source chain for a runtime kind.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn for_runtime(kind: RuntimeKind) -> Self {
        Self::with_sources(
            kind,
            vec![
                Arc::new(OverrideSource::new()),
                Arc::new(PresetSource::new()),
                Arc::new(ProcessSource::new()),
                Arc::new(StaticSource::new()),
            ],
        )
    }

    #[cfg(target_arch = "wasm32")]
    pub fn for_runtime(kind: RuntimeKind) -> Self {
        Self::with_sources(
            kind,
            vec![
                Arc::new(OverrideSource::new()),
                Arc::new(PresetSource::new()),
                Arc::new(StaticSource::new()),
            ],
        )
    }

    /// Composes a custom chain. The first source is the designated primary
    /// mutation target; priority follows the vector order.
    pub fn with_sources(kind: RuntimeKind, sources: Vec<Arc<dyn EnvSource>>) -> Self {
        Self { kind, sources }
    }

    /// The runtime kind this container was composed for.
    pub fn kind(&self) -> RuntimeKind {
        self.kind
    }

    fn active_sources(&self) -> impl Iterator<Item = &Arc<dyn EnvSource>> + '_ {
        self.sources.iter().filter(|s| s.active(self.kind))
    }

    /// Returns the first defined value across active sources, in priority
    /// order.
    pub fn get(&self, key: &str) -> Option<String> {
        self.active_sources().find_map(|source| source.get(key))
    }

    /// Writes a pair into the primary source and, where the host has a
    /// native variable table, through to host storage as well.
    pub fn set(&self, key: &str, value: &str) {
        let mut sources = self.active_sources();
        if let Some(primary) = sources.next() {
            primary.set(key, value);
        }
        for source in sources {
            if source.host_native() {
                source.set(key, value);
            }
        }
    }

    /// Removes a key from the primary source and from host-native storage.
    ///
    /// Values composed into lower-priority non-native sources (presets,
    /// static defaults) are owned by composition and stay put.
    pub fn delete(&self, key: &str) {
        let mut sources = self.active_sources();
        if let Some(primary) = sources.next() {
            primary.delete(key);
        }
        for source in sources {
            if source.host_native() {
                source.delete(key);
            }
        }
    }

    /// The sorted, de-duplicated union of keys across active sources.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = BTreeSet::new();
        for source in self.active_sources() {
            keys.extend(source.keys());
        }
        keys.into_iter().collect()
    }

    /// Mirrors the fully resolved view into host-native storage, so that
    /// layers reading the OS-level store (child processes, host APIs) see
    /// the same environment this container resolves.
    pub fn register_into_host(&self) {
        let native: Vec<&Arc<dyn EnvSource>> =
            self.active_sources().filter(|s| s.host_native()).collect();
        if native.is_empty() {
            tracing::debug!(kind = %self.kind, "no host-native environment store to mirror into");
            return;
        }
        for key in self.keys() {
            if let Some(value) = self.get(&key) {
                for source in &native {
                    source.set(&key, &value);
                }
            }
        }
    }
}

impl std::fmt::Debug for EnvContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvContainer")
            .field("kind", &self.kind)
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_with_static(
        kind: RuntimeKind,
        defaults: &[(&str, &str)],
    ) -> EnvContainer {
        EnvContainer::with_sources(
            kind,
            vec![
                Arc::new(OverrideSource::new()),
                Arc::new(StaticSource::with_defaults(
                    defaults.iter().map(|(k, v)| (*k, *v)),
                )),
            ],
        )
    }

    #[test]
    fn test_override_shadows_lower_priority_source() {
        let env = container_with_static(RuntimeKind::Unknown, &[("SHARED", "fallback")]);
        assert_eq!(env.get("SHARED"), Some("fallback".to_owned()));

        env.set("SHARED", "override");
        assert_eq!(env.get("SHARED"), Some("override".to_owned()));

        // Deleting the override re-exposes the fallback value.
        env.delete("SHARED");
        assert_eq!(env.get("SHARED"), Some("fallback".to_owned()));
    }

    #[test]
    fn test_get_short_circuits_at_first_defined_value() {
        let high = Arc::new(OverrideSource::new());
        let low = Arc::new(OverrideSource::new());
        high.set("KEY", "high");
        low.set("KEY", "low");

        let env = EnvContainer::with_sources(RuntimeKind::Unknown, vec![high, low]);
        assert_eq!(env.get("KEY"), Some("high".to_owned()));
    }

    #[test]
    fn test_keys_union_is_sorted_and_deduplicated() {
        let env = container_with_static(RuntimeKind::Unknown, &[("B", "1"), ("A", "2")]);
        env.set("C", "3");
        env.set("A", "shadow");

        assert_eq!(env.keys(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_inactive_sources_do_not_participate() {
        // Preset source is inactive on the native kind, so an injected
        // preset must be invisible there.
        clear_presets();
        inject_preset("PRESET_ONLY_KEY", "bound");

        let native = EnvContainer::with_sources(
            RuntimeKind::Native,
            vec![Arc::new(OverrideSource::new()), Arc::new(PresetSource::new())],
        );
        assert_eq!(native.get("PRESET_ONLY_KEY"), None);

        let worker = EnvContainer::with_sources(
            RuntimeKind::Workerd,
            vec![Arc::new(OverrideSource::new()), Arc::new(PresetSource::new())],
        );
        assert_eq!(worker.get("PRESET_ONLY_KEY"), Some("bound".to_owned()));
        clear_presets();
    }

    #[test]
    fn test_register_pushes_source_pairs_downstream() {
        let upstream = StaticSource::with_defaults([("MIRRORED", "yes")]);
        let downstream = container_with_static(RuntimeKind::Unknown, &[]);

        upstream.register(&downstream);
        assert_eq!(downstream.get("MIRRORED"), Some("yes".to_owned()));
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod process_env {
        use super::*;
        use std::sync::Mutex;

        // Process-environment mutation is process-global; serialize the
        // tests that touch it.
        static ENV_LOCK: Mutex<()> = Mutex::new(());

        #[test]
        fn test_set_writes_through_to_host_storage() {
            let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let env = EnvContainer::for_runtime(RuntimeKind::Native);

            env.set("BEDROCK_TEST_WRITE_THROUGH", "visible");
            assert_eq!(
                std::env::var("BEDROCK_TEST_WRITE_THROUGH").ok(),
                Some("visible".to_owned())
            );

            env.delete("BEDROCK_TEST_WRITE_THROUGH");
            assert!(std::env::var("BEDROCK_TEST_WRITE_THROUGH").is_err());
        }

        #[test]
        fn test_register_into_host_mirrors_resolved_view() {
            let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let env = EnvContainer::with_sources(
                RuntimeKind::Native,
                vec![
                    Arc::new(OverrideSource::new()),
                    Arc::new(ProcessSource::new()),
                    Arc::new(StaticSource::with_defaults([(
                        "BEDROCK_TEST_MIRROR",
                        "from-static",
                    )])),
                ],
            );

            env.register_into_host();
            assert_eq!(
                std::env::var("BEDROCK_TEST_MIRROR").ok(),
                Some("from-static".to_owned())
            );
            std::env::remove_var("BEDROCK_TEST_MIRROR");
        }
    }
}
