//! Generic optimistic toggle.
//!
//! ```text
//! read_current ──Err──→ Refused
//!      │ Ok(prior)
//!      ↓
//! apply_local(prior) ──→ remote_write(prior) ──Ok──────────→ Committed
//!                              │
//!                              └── Err / timeout ──→ revert_local(prior) ──→ Reverted
//! ```
//!
//! Nothing is retried. The helper never holds a lock itself; callers take
//! their own lock inside each closure.

use shared_types::BackendError;
use std::future::Future;
use std::time::{Duration, Instant};

/// How an optimistic toggle ended.
#[derive(Debug)]
pub enum Resolution<P, O, X, R> {
    /// `read_current` refused; nothing was applied or sent.
    Refused(X),
    /// The remote write succeeded and the local change stands.
    Committed {
        prior: P,
        output: O,
        elapsed: Duration,
    },
    /// The remote write failed or timed out and `revert_local` ran.
    Reverted {
        prior: P,
        failure: BackendError,
        reverted: R,
        elapsed: Duration,
    },
}

/// Applies a change locally, confirms it remotely, and undoes it on failure.
///
/// `remote_write` is bounded by `timeout`; expiry is reported as
/// `BackendError::Timeout`.
pub async fn optimistic_toggle<P, O, X, R, Read, Apply, Write, Fut, Revert>(
    read_current: Read,
    apply_local: Apply,
    remote_write: Write,
    revert_local: Revert,
    timeout: Duration,
) -> Resolution<P, O, X, R>
where
    Read: FnOnce() -> Result<P, X>,
    Apply: FnOnce(&P),
    Write: FnOnce(&P) -> Fut,
    Fut: Future<Output = Result<O, BackendError>>,
    Revert: FnOnce(&P) -> R,
{
    let prior = match read_current() {
        Ok(prior) => prior,
        Err(refusal) => return Resolution::Refused(refusal),
    };

    apply_local(&prior);

    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, remote_write(&prior)).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    };
    let elapsed = started.elapsed();

    match result {
        Ok(output) => Resolution::Committed {
            prior,
            output,
            elapsed,
        },
        Err(failure) => {
            let reverted = revert_local(&prior);
            Resolution::Reverted {
                prior,
                failure,
                reverted,
                elapsed,
            }
        }
    }
}
