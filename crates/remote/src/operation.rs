//! Bounded, cancellable polling of in-flight remote operations.
//!
//! Every mutating remote call hands back an [`OperationHandle`]; nothing is
//! considered settled until that handle reaches a terminal state. The poll
//! loop here is the only suspension point in a reconciliation, and the
//! caller's cancellation signal is observed on every iteration.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use regroup_core::OpKind;

use crate::api::{GroupApi, OperationHandle, OperationStatus};
use crate::error::{Error, Result};

/// Polling behavior for operation completion.
#[derive(Debug, Clone)]
pub struct PollOpts {
    /// Pause between status polls.
    pub poll_interval: Duration,
    /// Wall-clock bound for one operation to reach a terminal state.
    pub operation_timeout: Duration,
}

impl Default for PollOpts {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(240),
        }
    }
}

impl PollOpts {
    /// Short intervals for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            operation_timeout: Duration::from_millis(250),
        }
    }
}

/// Sender half of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Fire the cancellation signal. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Caller-owned cancellation signal, observed between poll iterations.
///
/// Cloning is cheap; all clones observe the same signal. A signal whose
/// [`CancelHandle`] was dropped without firing never cancels.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a linked handle/signal pair.
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Self { rx })
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is requested.
    ///
    /// Pends forever if the handle is dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without firing; cancellation can never come.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Drive an in-flight operation to its terminal state.
///
/// Polls `operation_status` every `poll_interval` until the operation is
/// done, the `operation_timeout` deadline passes, or `cancel` fires.
///
/// # Errors
///
/// - [`Error::OperationFailed`] when the remote reports a terminal failure
/// - [`Error::Timeout`] when the deadline elapses; the remote effect is
///   indeterminate and must be re-verified by a subsequent read
/// - [`Error::Cancelled`] when the caller's signal fires mid-poll
/// - any transport error from the status poll itself, surfaced verbatim
pub async fn await_completion(
    api: &dyn GroupApi,
    kind: OpKind,
    handle: &OperationHandle,
    opts: &PollOpts,
    cancel: &CancelSignal,
) -> Result<()> {
    let deadline = Instant::now() + opts.operation_timeout;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::cancelled(kind));
        }

        match api.operation_status(handle).await? {
            OperationStatus::Done(None) => {
                debug!(op = %kind, operation = %handle.name, "operation completed");
                return Ok(());
            }
            OperationStatus::Done(Some(cause)) => {
                return Err(Error::operation_failed(kind, cause));
            }
            OperationStatus::Pending | OperationStatus::Running => {}
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::timeout(kind, opts.operation_timeout));
        }

        let nap = opts.poll_interval.min(deadline - now);
        tokio::select! {
            () = tokio::time::sleep(nap) => {}
            () = cancel.cancelled() => return Err(Error::cancelled(kind)),
        }
    }
}
