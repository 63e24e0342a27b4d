//! Retry-until-timeout readiness gate.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{ReadinessTimeout, Result};

/// Polls a set of units until all of them pass a readiness predicate.
///
/// The predicate is re-run only for units that are not ready yet. A failing
/// predicate means "not ready yet"; only the wall-clock budget turns into an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPoller {
    interval: Duration,
    timeout: Duration,
}

impl ReadinessPoller {
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits until `check` reports every unit ready.
    ///
    /// The last round of probes runs at the deadline, so a timeout is
    /// reported at most one interval after the budget ran out.
    ///
    /// # Errors
    ///
    /// [`ReadinessTimeout`] listing the units that never became ready.
    pub async fn wait_all<U, F, Fut>(&self, units: &[U], mut check: F) -> Result<()>
    where
        U: Clone + Display,
        F: FnMut(U) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut pending: Vec<U> = units.to_vec();
        let mut round = 0u32;

        loop {
            round += 1;
            let mut not_ready = Vec::with_capacity(pending.len());
            for unit in pending {
                match check(unit.clone()).await {
                    Ok(true) => debug!(unit = %unit, round, "Unit ready"),
                    Ok(false) => not_ready.push(unit),
                    Err(e) => {
                        debug!(unit = %unit, round, error = %e, "Readiness probe failed");
                        not_ready.push(unit);
                    }
                }
            }
            pending = not_ready;

            if pending.is_empty() {
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ReadinessTimeout {
                    units: pending.iter().map(ToString::to_string).collect(),
                    waited: now - started,
                }
                .into());
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}
