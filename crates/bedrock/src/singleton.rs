//! Construct-at-most-once, share-forever memoization.
//!
//! [`Singleton`] memoizes one expensive value per cell: the first caller
//! whose factory runs to completion wins, and every caller (including ones
//! that arrived while the factory was still in flight) receives a clone of
//! the same value. No second factory execution ever begins once one has
//! started.
//!
//! The original design assumed a cooperative single-threaded host, where
//! "check, then mark under-construction" is atomic because nothing yields in
//! between. Rust is preemptive, so the same three-state transition (empty →
//! building → ready) is guarded by a mutex, with a condvar parking callers
//! that arrive mid-construction.
//!
//! [`Singleton::reset`] exists for test isolation only; production code never
//! tears a cell down.

use std::mem;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

enum State<T> {
    /// Nothing constructed yet; the next caller runs its factory.
    Empty,
    /// A factory is in flight; callers wait instead of constructing again.
    Building,
    /// Constructed; the value is immutable from here on.
    Ready(T),
}

/// A construct-at-most-once, share-forever cell.
pub struct Singleton<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Singleton<T> {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State::Empty),
            ready: Condvar::new(),
        }
    }
}

impl<T: Clone> Singleton<T> {
    /// Returns the memoized value, running `factory` if no construction has
    /// begun yet.
    ///
    /// Callers that arrive while another caller's factory is in flight block
    /// until that factory completes, then receive the same value. If the
    /// in-flight factory panics, the cell returns to empty and the next
    /// caller retries.
    pub fn get_or_init<F>(&self, factory: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut state = lock(&self.state);
        loop {
            match &*state {
                State::Ready(value) => return value.clone(),
                State::Building => {
                    state = self
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                State::Empty => {
                    *state = State::Building;
                    drop(state);

                    let guard = BuildGuard { cell: self };
                    let value = factory();
                    mem::forget(guard);

                    let mut state = lock(&self.state);
                    *state = State::Ready(value.clone());
                    self.ready.notify_all();
                    return value;
                }
            }
        }
    }

    /// Returns the value if construction has already completed.
    pub fn get(&self) -> Option<T> {
        match &*lock(&self.state) {
            State::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Forces the next [`get_or_init`](Self::get_or_init) to reconstruct.
    ///
    /// Test support only: the shared adapters this cell caches live for the
    /// process lifetime in production.
    pub fn reset(&self) {
        *lock(&self.state) = State::Empty;
        self.ready.notify_all();
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<State<T>>) -> MutexGuard<'_, State<T>> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the cell to empty if the factory unwinds, so a later caller can
/// retry instead of waiting forever on a construction that will never finish.
struct BuildGuard<'a, T> {
    cell: &'a Singleton<T>,
}

impl<T> Drop for BuildGuard<'_, T> {
    fn drop(&mut self) {
        *lock(&self.cell.state) = State::Empty;
        self.cell.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_returns_factory_value() {
        let cell = Singleton::new();
        assert_eq!(cell.get_or_init(|| 42), 42);
    }

    #[test]
    fn test_factory_runs_exactly_once_across_racing_callers() {
        const CALLERS: usize = 8;

        let cell = Arc::new(Singleton::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let runs = Arc::clone(&runs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cell.get_or_init(|| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        // Keep the factory in flight long enough for the
                        // other callers to pile up behind it.
                        thread::sleep(Duration::from_millis(50));
                        Arc::new(7_u32)
                    })
                })
            })
            .collect();

        let values: Vec<Arc<u32>> = handles
            .into_iter()
            .map(|h| h.join().expect("caller thread panicked"))
            .collect();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        let first = &values[0];
        for value in &values {
            assert!(Arc::ptr_eq(first, value));
        }
    }

    #[test]
    fn test_get_before_init_is_none() {
        let cell: Singleton<u32> = Singleton::new();
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn test_reset_forces_reconstruction() {
        let cell = Singleton::new();
        let runs = AtomicUsize::new(0);

        let build = || {
            runs.fetch_add(1, Ordering::SeqCst);
            runs.load(Ordering::SeqCst)
        };

        assert_eq!(cell.get_or_init(build), 1);
        assert_eq!(cell.get_or_init(build), 1);
        cell.reset();
        assert_eq!(cell.get_or_init(build), 2);
    }

    #[test]
    fn test_panicking_factory_releases_the_cell() {
        let cell: Arc<Singleton<u32>> = Arc::new(Singleton::new());

        let panicker = Arc::clone(&cell);
        let result = thread::spawn(move || {
            panicker.get_or_init(|| panic!("factory failed"));
        })
        .join();
        assert!(result.is_err());

        // The cell must not be stuck in the building state.
        assert_eq!(cell.get_or_init(|| 9), 9);
    }
}
