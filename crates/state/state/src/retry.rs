//! Bounded polling used while establishing backend connections.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::StateError;

/// Polling policy for connection establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRetry {
    /// Overall budget after which initialization fails.
    pub deadline: Duration,
    /// Fixed delay between attempt starts.
    pub interval: Duration,
    /// Per-attempt time box.
    pub attempt_timeout: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(15),
            interval: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(3),
        }
    }
}

/// Run `attempt` every `policy.interval` until it succeeds or
/// `policy.deadline` elapses.
///
/// Each attempt is boxed to `policy.attempt_timeout`. Attempt errors are
/// logged; once the deadline passes the result is [`StateError::Timeout`].
pub async fn retry_until<T, E, F, Fut>(
    what: &str,
    policy: ConnectRetry,
    mut attempt: F,
) -> Result<T, StateError>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let polling = async {
        let mut ticker = tokio::time::interval(policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut n: u32 = 0;
        loop {
            ticker.tick().await;
            n += 1;
            match tokio::time::timeout(policy.attempt_timeout, attempt()).await {
                Ok(Ok(value)) => {
                    debug!(target_name = what, attempt = n, "connected");
                    return value;
                }
                Ok(Err(e)) => {
                    warn!(target_name = what, attempt = n, error = %e, "connection attempt failed");
                }
                Err(_) => {
                    warn!(
                        target_name = what,
                        attempt = n,
                        timeout = ?policy.attempt_timeout,
                        "connection attempt timed out"
                    );
                }
            }
        }
    };

    tokio::time::timeout(policy.deadline, polling)
        .await
        .map_err(|_| StateError::Timeout(policy.deadline))
}
