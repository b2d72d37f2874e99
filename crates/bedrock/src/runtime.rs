//! Facade assembly: one object over host I/O and the service triad.
//!
//! [`acquire`] composes the process-wide base adapter (built at most once,
//! via the singleton cache) with a fresh deterministic service triad per
//! call. Stepped sequences live in the returned [`Runtime`]: re-acquiring
//! per call restarts them.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::detect::RuntimeKind;
use crate::env::EnvContainer;
use crate::error::{ConfigError, HostError};
use crate::host::{self, HostAdapter, OutputSink};
use crate::services::{ClockService, IdMode, IdService, RandomMode, RandomService, TimeMode};

/// Environment variable selecting the identity mode.
pub const ID_MODE_VAR: &str = "BEDROCK_ID_MODE";
/// Environment variable selecting the clock mode.
pub const TIME_MODE_VAR: &str = "BEDROCK_TIME_MODE";
/// Environment variable selecting the random mode.
pub const RANDOM_MODE_VAR: &str = "BEDROCK_RANDOM_MODE";

/// Per-acquisition mode selection for the service triad.
///
/// Absent a selection, every service delegates to the real host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeOptions {
    /// Identity generation behavior.
    pub id_mode: IdMode,
    /// Clock behavior.
    pub time_mode: TimeMode,
    /// Random behavior.
    pub random_mode: RandomMode,
}

impl RuntimeOptions {
    /// Fully stepped configuration: reproducible ids, time, and draws.
    pub fn stepped() -> Self {
        Self {
            id_mode: IdMode::Step,
            time_mode: TimeMode::Step,
            random_mode: RandomMode::Step,
        }
    }

    /// Reads the mode surface from environment variables
    /// ([`ID_MODE_VAR`], [`TIME_MODE_VAR`], [`RANDOM_MODE_VAR`]).
    ///
    /// Unset variables keep their defaults; an unrecognized value fails with
    /// [`ConfigError::UnknownMode`] rather than silently falling back to
    /// the real host.
    pub fn from_env(env: &EnvContainer) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(value) = env.get(ID_MODE_VAR) {
            options.id_mode = IdMode::from_str(&value)?;
        }
        if let Some(value) = env.get(TIME_MODE_VAR) {
            options.time_mode = TimeMode::from_str(&value)?;
        }
        if let Some(value) = env.get(RANDOM_MODE_VAR) {
            options.random_mode = RandomMode::from_str(&value)?;
        }
        Ok(options)
    }
}

/// One cohesive abstraction over the host: environment, arguments,
/// standard streams, time, randomness, and identity.
pub struct Runtime {
    host: Arc<dyn HostAdapter>,
    time: ClockService,
    random: RandomService,
    ident: IdService,
}

/// Acquires the runtime abstraction for the detected host.
///
/// The base adapter is shared across every acquisition in the process and
/// its construction side effects run at most once; the service triad is
/// fresh per call, configured by `options`.
pub fn acquire(options: RuntimeOptions) -> Runtime {
    Runtime {
        host: host::shared(),
        time: ClockService::new(options.time_mode),
        random: RandomService::new(options.random_mode),
        ident: IdService::new(options.id_mode),
    }
}

impl Runtime {
    /// The detected runtime kind the base adapter serves.
    pub fn kind(&self) -> RuntimeKind {
        self.host.kind()
    }

    /// The merged environment view.
    pub fn env(&self) -> &EnvContainer {
        self.host.env()
    }

    /// The host's invocation arguments, or [`HostError::Unsupported`] where
    /// the host has none.
    pub fn args(&self) -> Result<Vec<String>, HostError> {
        self.host.args()
    }

    /// The standard-output byte sink.
    pub fn stdout(&self) -> Arc<dyn OutputSink> {
        self.host.stdout()
    }

    /// The standard-error byte sink.
    pub fn stderr(&self) -> Arc<dyn OutputSink> {
        self.host.stderr()
    }

    /// The mode-configured clock.
    pub fn time(&self) -> &ClockService {
        &self.time
    }

    /// The mode-configured random source.
    pub fn random(&self) -> &RandomService {
        &self.random
    }

    /// The next identity string from the mode-configured generator.
    pub fn next_id(&self) -> String {
        self.ident.next_id()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("kind", &self.kind())
            .field("time_mode", &self.time.mode())
            .field("random_mode", &self.random.mode())
            .field("id_mode", &self.ident.mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EnvContainer, EnvSource, OverrideSource};
    use std::sync::Arc as StdArc;

    fn env_with(pairs: &[(&str, &str)]) -> EnvContainer {
        let source = StdArc::new(OverrideSource::new());
        for (key, value) in pairs {
            source.set(key, value);
        }
        EnvContainer::with_sources(RuntimeKind::Unknown, vec![source])
    }

    #[test]
    fn test_default_options_delegate_to_the_real_host() {
        let options = RuntimeOptions::default();
        assert_eq!(options.id_mode, IdMode::Uuid);
        assert_eq!(options.time_mode, TimeMode::Real);
        assert_eq!(options.random_mode, RandomMode::Real);
    }

    #[test]
    fn test_options_parse_from_environment() {
        let env = env_with(&[
            (ID_MODE_VAR, "step"),
            (TIME_MODE_VAR, "const"),
            (RANDOM_MODE_VAR, "STEP"),
        ]);
        let options = RuntimeOptions::from_env(&env).expect("valid modes");
        assert_eq!(options.id_mode, IdMode::Step);
        assert_eq!(options.time_mode, TimeMode::Const);
        assert_eq!(options.random_mode, RandomMode::Step);
    }

    #[test]
    fn test_unset_mode_variables_keep_defaults() {
        let env = env_with(&[(TIME_MODE_VAR, "step")]);
        let options = RuntimeOptions::from_env(&env).expect("valid modes");
        assert_eq!(options.id_mode, IdMode::Uuid);
        assert_eq!(options.time_mode, TimeMode::Step);
        assert_eq!(options.random_mode, RandomMode::Real);
    }

    #[test]
    fn test_unrecognized_mode_value_is_fatal() {
        let env = env_with(&[(RANDOM_MODE_VAR, "chaotic")]);
        let err = RuntimeOptions::from_env(&env).expect_err("must not fall back to real");
        assert!(matches!(
            err,
            ConfigError::UnknownMode {
                service: "random",
                ..
            }
        ));
    }

    #[test]
    fn test_acquired_runtimes_share_the_base_adapter() {
        let first = acquire(RuntimeOptions::default());
        let second = acquire(RuntimeOptions::stepped());
        assert!(StdArc::ptr_eq(&first.host, &second.host));
    }

    #[test]
    fn test_stepped_sequence_is_scoped_to_one_acquisition() {
        let runtime = acquire(RuntimeOptions::stepped());
        assert_eq!(runtime.next_id(), "STEPId-0");
        assert_eq!(runtime.next_id(), "STEPId-1");

        // A fresh acquisition restarts the sequence.
        let fresh = acquire(RuntimeOptions::stepped());
        assert_eq!(fresh.next_id(), "STEPId-0");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_facade_exposes_host_capabilities() {
        let runtime = acquire(RuntimeOptions::default());
        assert_eq!(runtime.kind(), RuntimeKind::Native);
        assert!(!runtime.args().expect("native argv").is_empty());
        runtime.stdout().write(b"").expect("stdout accepts writes");
    }
}
