//! Wall-clock bound for model fits
//!
//! A fit runs on its own worker thread and the caller waits on a channel
//! with a timeout. When the budget runs out the caller moves on and the
//! worker is left to finish in the background; its result is dropped. The
//! worker also receives a [`FitContext`] carrying the same deadline, so
//! well-behaved models stop early instead of burning CPU.

use crate::error::{FitError, FitResult};
use crate::models::FitContext;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

/// Run `job` with a time budget.
///
/// Returns [`FitError::Timeout`] if no result arrived in time and
/// [`FitError::WorkerPanicked`] if the job panicked.
pub fn run_with_deadline<T, F>(budget: Duration, job: F) -> FitResult<T>
where
    T: Send + 'static,
    F: FnOnce(FitContext) -> FitResult<T> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    let ctx = FitContext::with_budget(budget);

    let spawned = thread::Builder::new()
        .name("forecast-fit".to_string())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(ctx)));
            // The receiver is gone once the caller has timed out
            let _ = tx.send(outcome);
        });

    if let Err(e) = spawned {
        return Err(FitError::NonConvergence(format!(
            "could not start fit worker: {}",
            e
        )));
    }

    match rx.recv_timeout(budget) {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(FitError::WorkerPanicked),
        Err(RecvTimeoutError::Timeout) => Err(FitError::Timeout(budget)),
        Err(RecvTimeoutError::Disconnected) => Err(FitError::WorkerPanicked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_returns_result_in_time() {
        let result = run_with_deadline(Duration::from_secs(5), |_ctx| Ok(21 * 2));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_propagates_fit_error() {
        let result: FitResult<()> = run_with_deadline(Duration::from_secs(5), |_ctx| {
            Err(FitError::NonConvergence("singular".to_string()))
        });
        assert_eq!(result, Err(FitError::NonConvergence("singular".to_string())));
    }

    #[test]
    fn test_times_out_without_waiting_for_worker() {
        let started = Instant::now();
        let result: FitResult<()> = run_with_deadline(Duration::from_millis(50), |_ctx| {
            thread::sleep(Duration::from_secs(3));
            Ok(())
        });

        assert_eq!(result, Err(FitError::Timeout(Duration::from_millis(50))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_worker_panic_is_contained() {
        let result: FitResult<()> =
            run_with_deadline(Duration::from_secs(5), |_ctx| panic!("model blew up"));
        assert_eq!(result, Err(FitError::WorkerPanicked));
    }

    #[test]
    fn test_context_carries_deadline() {
        let result = run_with_deadline(Duration::from_millis(20), |ctx| {
            while !ctx.is_expired() {
                thread::sleep(Duration::from_millis(5));
            }
            ctx.check()
        });
        // Either the caller gave up first or the worker saw its own deadline
        assert!(result.unwrap_err().is_timeout());
    }
}
