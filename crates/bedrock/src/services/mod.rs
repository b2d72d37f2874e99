//! The deterministic service triad: clock, random, identity.
//!
//! Each service is independently configurable with a real host-delegating
//! mode and two deterministic substitutes (constant and stepped). The
//! strategy is chosen once, at construction; stepped state lives in the
//! instance, so a reproducible sequence requires holding one instance for
//! its whole span.

mod clock;
mod ident;
mod random;

pub use clock::{ClockService, TimeMode, CONST_NOW_MS, STEP_SLEEP_OVERHEAD_MS};
pub use ident::{IdMode, IdService, CONST_ID, STEP_ID_PREFIX};
pub use random::{RandomMode, RandomService};
