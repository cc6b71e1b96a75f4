//! Simulated flakiness for the ratings component.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::RatingsMode;

/// How the toggle task flips the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flapping {
    /// Unavailable for a minute, available for a minute.
    Unavailable,
    /// Unhealthy and unavailable for 15 minutes, then healthy for 15 minutes.
    Unhealthy,
}

impl Flapping {
    pub fn for_mode(mode: RatingsMode) -> Option<Self> {
        match mode {
            RatingsMode::SimulateUnavailable => Some(Flapping::Unavailable),
            RatingsMode::SimulateUnhealthy => Some(Flapping::Unhealthy),
            RatingsMode::Local | RatingsMode::Database => None,
        }
    }

    pub fn period(self) -> Duration {
        match self {
            Flapping::Unavailable => Duration::from_secs(60),
            Flapping::Unhealthy => Duration::from_secs(15 * 60),
        }
    }
}

/// Availability and health flags shared between the toggle task and every request.
#[derive(Debug, Clone)]
pub struct Availability {
    available: Arc<AtomicBool>,
    healthy: Arc<AtomicBool>,
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Performs one flip of the flags touched by `flapping`.
    pub fn toggle(&self, flapping: Flapping) {
        if flapping == Flapping::Unhealthy {
            self.healthy.fetch_xor(true, Ordering::AcqRel);
        }
        let was_available = self.available.fetch_xor(true, Ordering::AcqRel);
        tracing::info!(
            available = !was_available,
            healthy = self.is_healthy(),
            "Ratings availability toggled"
        );
    }

    /// Spawns the toggle task on `tasks`. The first flip happens immediately, then once per
    /// period, until `token` is cancelled.
    pub fn spawn_toggler(
        &self,
        flapping: Flapping,
        token: CancellationToken,
        tasks: &TaskTracker,
    ) -> JoinHandle<()> {
        let availability = self.clone();
        let period = flapping.period();
        tasks.spawn(async move {
            loop {
                availability.toggle(flapping);
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(period) => {}
                }
            }
            tracing::debug!("Ratings availability toggle stopped");
        })
    }
}
