//! # bedrock: deterministic runtime abstraction
//!
//! A facade over non-deterministic host primitives (wall-clock time,
//! randomness, identity generation, environment variables, standard
//! streams, and command-line arguments) that behaves uniformly across
//! host execution environments and can be switched, per acquisition, into
//! fully deterministic substitute modes. Code built on top of it is
//! unit-testable without real timers, real entropy, or real environment
//! state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    acquire(options)                     │
//! │                         Runtime                         │
//! │  env / args / stdout / stderr / time / random / next_id │
//! └───────────┬────────────────────────────┬────────────────┘
//!             │                            │
//! ┌───────────┴────────────┐  ┌────────────┴───────────────┐
//! │  shared HostAdapter    │  │  service triad (per call)  │
//! │  (Singleton, per kind) │  │  Clock / Random / Identity │
//! │  native │ deno │ worker│  │  REAL │ CONST │ STEP       │
//! └───────────┬────────────┘  └────────────────────────────┘
//!             │
//! ┌───────────┴────────────┐
//! │   detect() → kind      │
//! │   EnvContainer chain   │
//! └────────────────────────┘
//! ```
//!
//! # Determinism
//!
//! Each service in the triad is independently configurable:
//!
//! - **Clock**: `Real` (host timers), `Const` (frozen instant, instant
//!   sleeps), `Step` (virtual time advancing by the requested duration plus
//!   a fixed one-second overhead per sleep).
//! - **Random**: `Real` (host entropy), `Const` (midpoint), `Step`
//!   (1, 2, 3, … wrapping to 1 past the bound).
//! - **Identity**: `Uuid`, `Const` (fixed string), `Step`
//!   (`STEPId-0`, `STEPId-1`, …).
//!
//! Stepped state is scoped to the acquired [`Runtime`]; hold one instance
//! for the whole sequence you want to reproduce.
//!
//! # Example
//!
//! ```
//! use bedrock::{acquire, RuntimeOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rt = acquire(RuntimeOptions::stepped());
//! let start = rt.time().now_ms();
//! rt.time().sleep(500, None).await?;
//! assert_eq!(rt.time().time_since(start), 1_500); // 500 + fixed 1s overhead
//! assert_eq!(rt.next_id(), "STEPId-0");
//! assert_eq!(rt.random().random_to(10_000), 1);
//! # Ok(())
//! # }
//! ```

mod detect;
mod env;
mod error;
mod host;
mod runtime;
mod services;
mod singleton;

pub use detect::{detect, RuntimeKind};
pub use env::{
    inject_preset, EnvContainer, EnvSource, OverrideSource, PresetSource, ProcessSource,
    StaticSource,
};
pub use error::{ConfigError, HostError, SinkError, SleepError};
pub use host::{console_line, HostAdapter, MemorySink, OutputSink};
pub use runtime::{
    acquire, Runtime, RuntimeOptions, ID_MODE_VAR, RANDOM_MODE_VAR, TIME_MODE_VAR,
};
pub use services::{
    ClockService, IdMode, IdService, RandomMode, RandomService, TimeMode, CONST_ID, CONST_NOW_MS,
    STEP_ID_PREFIX, STEP_SLEEP_OVERHEAD_MS,
};
pub use singleton::Singleton;

// Re-exported so callers can hand `sleep` a cancellation signal without
// depending on tokio-util themselves.
pub use tokio_util::sync::CancellationToken;

/// Explicit resets for process-global state. Test support only.
pub mod test_support {
    /// Forgets the cached runtime classification.
    pub fn reset_detection() {
        crate::detect::reset();
    }

    /// Forgets the shared base adapter; the next acquisition reconstructs
    /// it (re-running construction side effects).
    pub fn reset_shared_host() {
        crate::host::reset_shared();
    }

    /// Clears every injected environment preset.
    pub fn clear_presets() {
        crate::env::clear_presets();
    }

    /// Resets all process-global state owned by this crate.
    pub fn reset_all() {
        reset_detection();
        reset_shared_host();
        clear_presets();
    }
}
