//! Identity service: UUIDs, a constant id, or a stepped sequence.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The id CONST mode returns on every call.
pub const CONST_ID: &str = "CONSTId";

/// Prefix of STEP-mode ids (`STEPId-0`, `STEPId-1`, …).
pub const STEP_ID_PREFIX: &str = "STEPId-";

/// Identity behavior selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// Random v4 UUIDs from the host's entropy source.
    #[default]
    Uuid,
    /// The same fixed string on every call.
    Const,
    /// `STEPId-{n}` with `n` counting from 0, scoped to the instance.
    Step,
}

impl FromStr for IdMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uuid" => Ok(Self::Uuid),
            "const" => Ok(Self::Const),
            "step" => Ok(Self::Step),
            _ => Err(ConfigError::UnknownMode {
                service: "id",
                value: s.to_owned(),
                expected: "uuid, const, step",
            }),
        }
    }
}

enum Strategy {
    Uuid,
    Const,
    Step { counter: AtomicU64 },
}

/// Mode-configured identity generator.
pub struct IdService {
    mode: IdMode,
    strategy: Strategy,
}

impl IdService {
    /// Builds an identity generator with the given behavior.
    pub fn new(mode: IdMode) -> Self {
        let strategy = match mode {
            IdMode::Uuid => Strategy::Uuid,
            IdMode::Const => Strategy::Const,
            IdMode::Step => Strategy::Step {
                counter: AtomicU64::new(0),
            },
        };
        Self { mode, strategy }
    }

    /// The mode this generator was built with.
    pub fn mode(&self) -> IdMode {
        self.mode
    }

    /// The next identity string.
    pub fn next_id(&self) -> String {
        match &self.strategy {
            Strategy::Uuid => uuid::Uuid::new_v4().to_string(),
            Strategy::Const => CONST_ID.to_owned(),
            Strategy::Step { counter } => {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                format!("{STEP_ID_PREFIX}{n}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_differ_across_calls() {
        let ident = IdService::new(IdMode::Uuid);
        assert_ne!(ident.next_id(), ident.next_id());
    }

    #[test]
    fn test_uuid_ids_parse_as_uuids() {
        let ident = IdService::new(IdMode::Uuid);
        let id = ident.next_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_const_id_is_invariant() {
        let ident = IdService::new(IdMode::Const);
        for _ in 0..5 {
            assert_eq!(ident.next_id(), CONST_ID);
        }
    }

    #[test]
    fn test_step_ids_count_from_zero() {
        let ident = IdService::new(IdMode::Step);
        assert_eq!(ident.next_id(), "STEPId-0");
        assert_eq!(ident.next_id(), "STEPId-1");
        assert_eq!(ident.next_id(), "STEPId-2");
    }

    #[test]
    fn test_step_counter_is_per_instance() {
        let first = IdService::new(IdMode::Step);
        let second = IdService::new(IdMode::Step);
        assert_eq!(first.next_id(), "STEPId-0");
        assert_eq!(first.next_id(), "STEPId-1");
        assert_eq!(second.next_id(), "STEPId-0");
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = "ulid".parse::<IdMode>().expect_err("should reject");
        assert!(matches!(err, ConfigError::UnknownMode { service: "id", .. }));
    }
}
