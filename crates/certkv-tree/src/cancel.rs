//! Cancellation signals for lock waits.
//!
//! A [`Cancellation`] bundles an optional deadline with an optional explicit
//! cancel switch. Lock waits race against [`Cancellation::cancelled`] and give
//! up as soon as either one fires.

use std::fmt;
use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};

/// Why a lock wait was aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The owning [`CancelHandle`] was triggered.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// A deadline and/or explicit cancel switch for a blocking lock call.
///
/// Cloning is cheap; every clone observes the same switch.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    signal: Option<watch::Receiver<bool>>,
}

/// Trigger side of a manual [`Cancellation`].
///
/// Dropping the handle without calling [`cancel`](Self::cancel) leaves the
/// signal unfired for good.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    /// A signal that fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A signal that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            signal: None,
        }
    }

    /// A signal fired explicitly through the returned [`CancelHandle`].
    pub fn manual() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let cancellation = Self {
            deadline: None,
            signal: Some(rx),
        };
        (cancellation, CancelHandle { tx })
    }

    /// Tighten this signal with a deadline `timeout` from now.
    ///
    /// An existing earlier deadline is kept.
    pub fn and_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(candidate),
            None => candidate,
        });
        self
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Non-blocking check: the reason this signal has already fired, if any.
    ///
    /// An explicit cancel takes precedence over a passed deadline.
    pub fn check(&self) -> Option<CancelReason> {
        if self.signal.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(CancelReason::Cancelled);
        }
        if self.deadline.is_some_and(|at| Instant::now() >= at) {
            return Some(CancelReason::DeadlineExceeded);
        }
        None
    }

    /// Resolve once the signal fires. Never resolves for [`Cancellation::never`].
    pub async fn cancelled(&self) -> CancelReason {
        let explicit = async {
            let Some(mut rx) = self.signal.clone() else {
                return pending::<CancelReason>().await;
            };
            // An error means the handle was dropped unfired.
            let fired = rx.wait_for(|fired| *fired).await.is_ok();
            if fired {
                CancelReason::Cancelled
            } else {
                pending::<CancelReason>().await
            }
        };
        let expiry = async {
            match self.deadline {
                Some(at) => {
                    time::sleep_until(at).await;
                    CancelReason::DeadlineExceeded
                }
                None => pending::<CancelReason>().await,
            }
        };

        tokio::select! {
            biased;
            reason = explicit => reason,
            reason = expiry => reason,
        }
    }
}
