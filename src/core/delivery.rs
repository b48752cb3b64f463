//! Caller-visible result of [`Handler::handle`](super::Handler::handle)

use super::error::{LoggerError, Result};
use super::metrics::HandlerMetrics;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

/// Resolves once the record was written, rejected, or its deadline passed.
///
/// The emit work is already running when a `Delivery` is returned; dropping
/// it without awaiting does not stop the write. When the deadline passes
/// first, the delivery fails with [`LoggerError::Timeout`] and the still
/// running write is detached: whatever it returns later is discarded.
#[must_use = "a Delivery reports whether the record reached its sink"]
pub struct Delivery {
    inner: Pin<Box<dyn Future<Output = Result<()>> + Send>>,
}

impl Delivery {
    pub(crate) fn settled(result: Result<()>) -> Self {
        Self {
            inner: Box::pin(std::future::ready(result)),
        }
    }

    pub(crate) fn spawned(
        task: JoinHandle<Result<()>>,
        deadline: Option<(Instant, Duration)>,
        handler: String,
        metrics: Arc<HandlerMetrics>,
    ) -> Self {
        Self {
            inner: Box::pin(async move {
                let joined = match deadline {
                    Some((at, timeout)) => match tokio::time::timeout_at(at, task).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            metrics.record_timed_out();
                            return Err(LoggerError::timeout(handler, timeout));
                        }
                    },
                    None => task.await,
                };
                // The task itself counts delivered/failed, panics included
                joined.unwrap_or_else(|err| Err(from_join_error(handler, err)))
            }),
        }
    }
}

fn from_join_error(handler: String, err: JoinError) -> LoggerError {
    if err.is_panic() {
        let payload = err.into_panic();
        LoggerError::panicked(handler, payload.as_ref())
    } else {
        LoggerError::sink("delivering record", format!("{} emit task was cancelled", handler))
    }
}

impl Future for Delivery {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery").finish_non_exhaustive()
    }
}
