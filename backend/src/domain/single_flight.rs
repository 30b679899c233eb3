//! Process-local single-flight flag for long-running jobs.
//!
//! A job claims the flag through [`SingleFlight::try_begin`] and holds the
//! returned [`FlightGuard`] for the duration of the run. Dropping the guard
//! clears the flag, so every exit path (early return, `?`, panic unwinding)
//! releases it.
//!
//! The flag only covers the current process. Two replicas can still run the
//! same job concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "is a run in progress" flag.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    running: Arc<AtomicBool>,
}

impl SingleFlight {
    /// Create an idle flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Returns `None` when another run already holds it.
    ///
    /// # Examples
    /// ```
    /// use city_service::domain::SingleFlight;
    ///
    /// let flight = SingleFlight::new();
    /// let guard = flight.try_begin().expect("idle flag");
    /// assert!(flight.try_begin().is_none());
    /// drop(guard);
    /// assert!(flight.try_begin().is_some());
    /// ```
    #[must_use]
    pub fn try_begin(&self) -> Option<FlightGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                running: Arc::clone(&self.running),
            })
    }

    /// Whether a run currently holds the flag.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// RAII handle that clears the flag on drop.
#[derive(Debug)]
pub struct FlightGuard {
    running: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
