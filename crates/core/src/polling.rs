//! Fixed-interval polling with a bounded attempt budget.
//!
//! Every stage that waits on a remote job (clip synthesis, music
//! generation, composition rendering) goes through [`poll_until`] so there
//! is exactly one definition of "how long we wait" and no unbounded loop.

use std::future::Future;
use std::time::Duration;

/// Interval and attempt budget for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before each status check.
    pub interval: Duration,
    /// Maximum number of status checks before giving up.
    pub max_attempts: u32,
}

impl PollConfig {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on the wall-clock time spent polling.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState<T> {
    /// The remote job is still running; the optional text is its status.
    Pending(Option<String>),
    /// The remote job finished with a value.
    Ready(T),
}

/// Why polling stopped without a value.
#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    /// The attempt budget ran out while the job was still pending.
    #[error("still pending after {attempts} attempts ({last_status})")]
    Exhausted { attempts: u32, last_status: String },

    /// A status check failed (including the remote reporting failure).
    #[error(transparent)]
    Failed(E),
}

/// Poll `check` every `config.interval` until it yields a value, fails, or
/// `config.max_attempts` checks have been made.
///
/// The first check happens after one interval, since the remote job was
/// typically submitted just before polling starts.
pub async fn poll_until<T, E, F, Fut>(
    config: &PollConfig,
    label: &str,
    mut check: F,
) -> Result<T, PollError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollState<T>, E>>,
{
    let mut last_status = String::from("no status reported");

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match check(attempt).await {
            Ok(PollState::Ready(value)) => {
                tracing::debug!(label, attempt, "Remote job ready");
                return Ok(value);
            }
            Ok(PollState::Pending(status)) => {
                if let Some(status) = status {
                    last_status = status;
                }
                tracing::debug!(
                    label,
                    attempt,
                    max_attempts = config.max_attempts,
                    status = %last_status,
                    "Remote job pending",
                );
            }
            Err(e) => return Err(PollError::Failed(e)),
        }
    }

    tracing::warn!(label, attempts = config.max_attempts, "Polling budget exhausted");
    Err(PollError::Exhausted {
        attempts: config.max_attempts,
        last_status,
    })
}
