//! Clock service: real, constant, and stepped time.
//!
//! The strategy is selected once at construction; call sites never branch
//! on mode. All instants are milliseconds since the Unix epoch.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, SleepError};

/// The fixed instant CONST mode reports: 2020-01-01T00:00:00Z.
pub const CONST_NOW_MS: u64 = 1_577_836_800_000;

/// Fixed overhead added to every STEP-mode sleep, on top of the requested
/// duration (including a requested duration of zero). Guarantees at least
/// one second of virtual time between any two simulated events.
pub const STEP_SLEEP_OVERHEAD_MS: u64 = 1_000;

/// Clock behavior selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    /// Delegate to the host clock and timers.
    #[default]
    Real,
    /// `now` is frozen at [`CONST_NOW_MS`]; sleeps resolve immediately.
    Const,
    /// Virtual time advancing only through `sleep`.
    Step,
}

impl FromStr for TimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "real" => Ok(Self::Real),
            "const" => Ok(Self::Const),
            "step" => Ok(Self::Step),
            _ => Err(ConfigError::UnknownMode {
                service: "time",
                value: s.to_owned(),
                expected: "real, const, step",
            }),
        }
    }
}

enum Strategy {
    Real(RealClock),
    Const,
    Step {
        /// Virtual now; starts at the instance's creation instant and
        /// advances only through `sleep`.
        virtual_now_ms: AtomicU64,
    },
}

/// Mode-configured clock.
///
/// STEP state is scoped to one instance: callers relying on a stepped
/// sequence across multiple operations must hold on to the instance rather
/// than acquiring a fresh one per call.
pub struct ClockService {
    mode: TimeMode,
    strategy: Strategy,
}

impl ClockService {
    /// Builds a clock with the given behavior.
    pub fn new(mode: TimeMode) -> Self {
        let strategy = match mode {
            TimeMode::Real => Strategy::Real(RealClock::new()),
            TimeMode::Const => Strategy::Const,
            TimeMode::Step => Strategy::Step {
                virtual_now_ms: AtomicU64::new(host_unix_now_ms()),
            },
        };
        Self { mode, strategy }
    }

    /// The mode this clock was built with.
    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    /// Current instant in milliseconds since the Unix epoch.
    ///
    /// Non-decreasing across any sequence of calls on the same instance,
    /// in every mode.
    pub fn now_ms(&self) -> u64 {
        match &self.strategy {
            Strategy::Real(clock) => clock.now_ms(),
            Strategy::Const => CONST_NOW_MS,
            Strategy::Step { virtual_now_ms } => virtual_now_ms.load(Ordering::SeqCst),
        }
    }

    /// Milliseconds elapsed since `start_ms`, measured against this clock's
    /// notion of now.
    pub fn time_since(&self, start_ms: u64) -> u64 {
        self.now_ms().saturating_sub(start_ms)
    }

    /// Suspends the calling task until the duration elapses or the
    /// cancellation token fires.
    ///
    /// A token that is already cancelled at call time fails immediately
    /// without arming any timer. CONST mode resolves immediately; STEP mode
    /// advances virtual time by the requested duration plus
    /// [`STEP_SLEEP_OVERHEAD_MS`] and resolves immediately.
    pub async fn sleep(
        &self,
        duration_ms: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), SleepError> {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(SleepError::Cancelled);
            }
        }

        match &self.strategy {
            Strategy::Real(_) => host_sleep(duration_ms, cancel).await,
            Strategy::Const => Ok(()),
            Strategy::Step { virtual_now_ms } => {
                virtual_now_ms.fetch_add(duration_ms + STEP_SLEEP_OVERHEAD_MS, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

/// Host clock reading, shared by REAL `now` and the STEP creation instant.
#[cfg(not(target_arch = "wasm32"))]
fn host_unix_now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn host_unix_now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Real-mode clock.
///
/// On native targets the wall clock is anchored once and advanced by the
/// monotonic clock, so `now_ms` never goes backwards even if the system
/// clock jumps mid-process.
#[cfg(not(target_arch = "wasm32"))]
struct RealClock {
    realtime_anchor_ms: u64,
    monotonic_anchor: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl RealClock {
    fn new() -> Self {
        Self {
            realtime_anchor_ms: host_unix_now_ms(),
            monotonic_anchor: std::time::Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.realtime_anchor_ms + self.monotonic_anchor.elapsed().as_millis() as u64
    }
}

/// Real-mode clock for wasm hosts: `Date.now()` clamped to be
/// non-decreasing (JS wall clocks may be adjusted mid-process).
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
struct RealClock {
    last_seen_ms: AtomicU64,
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl RealClock {
    fn new() -> Self {
        Self {
            last_seen_ms: AtomicU64::new(host_unix_now_ms()),
        }
    }

    fn now_ms(&self) -> u64 {
        let now = host_unix_now_ms();
        self.last_seen_ms.fetch_max(now, Ordering::SeqCst);
        self.last_seen_ms.load(Ordering::SeqCst)
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn host_sleep(
    duration_ms: u64,
    cancel: Option<&CancellationToken>,
) -> Result<(), SleepError> {
    let wait = tokio::time::sleep(std::time::Duration::from_millis(duration_ms));
    match cancel {
        Some(token) => {
            tokio::select! {
                () = token.cancelled() => Err(SleepError::Cancelled),
                () = wait => Ok(()),
            }
        }
        None => {
            wait.await;
            Ok(())
        }
    }
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
async fn host_sleep(
    duration_ms: u64,
    cancel: Option<&CancellationToken>,
) -> Result<(), SleepError> {
    use futures::future::{select, Either};

    let timer = js_timeout(duration_ms);
    match cancel {
        Some(token) => {
            let cancelled = std::pin::pin!(token.cancelled());
            match select(cancelled, std::pin::pin!(timer)).await {
                Either::Left(_) => Err(SleepError::Cancelled),
                Either::Right(_) => Ok(()),
            }
        }
        None => {
            timer.await;
            Ok(())
        }
    }
}

/// A future resolving after `duration_ms` via the host's `setTimeout`.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
async fn js_timeout(duration_ms: u64) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let global = js_sys::global();
        let set_timeout = js_sys::Reflect::get(&global, &"setTimeout".into())
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
        match set_timeout {
            Some(f) => {
                let _ = f.call2(&global, &resolve, &(duration_ms as f64).into());
            }
            // No timer primitive on this host; resolve immediately rather
            // than hanging the caller.
            None => {
                let _ = resolve.call0(&wasm_bindgen::JsValue::UNDEFINED);
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::JsCast;
