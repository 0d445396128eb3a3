//! Task group and start barrier.
//!
//! A [`TaskGroup`] runs futures on a shared `JoinSet`. The first task to fail
//! records its error and cancels the group token; [`TaskGroup::wait`] joins
//! every task and returns that first error.
//!
//! A member returning [`AppError::Cancelled`] only reports that it saw the
//! cancellation. It is returned by `wait` when no member failed for real.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

#[derive(Default)]
struct Outcome {
    first_error: Option<AppError>,
    cancelled: bool,
}

type ErrorSlot = Arc<Mutex<Outcome>>;

/// Error-collecting group of tasks sharing one cancellation token.
pub struct TaskGroup {
    token: CancellationToken,
    tasks: JoinSet<()>,
    outcome: ErrorSlot,
}

impl TaskGroup {
    /// Create a group whose token is a child of `parent`.
    ///
    /// Cancelling `parent` cancels the group; a failing member cancels the
    /// group but never the parent.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            tasks: JoinSet::new(),
            outcome: Arc::new(Mutex::new(Outcome::default())),
        }
    }

    /// The group-wide token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a member task.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let token = self.token.clone();
        let slot = self.outcome.clone();
        self.tasks.spawn(async move {
            if let Err(e) = task.await {
                fail(&slot, &token, e);
            }
        });
    }

    /// Wait for every member to finish and return the first error.
    pub async fn wait(mut self) -> Result<(), AppError> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                fail(&self.outcome, &self.token, AppError::TaskPanicked(e.to_string()));
            }
        }
        self.token.cancel();

        let mut outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome.first_error.take() {
            Some(e) => Err(e),
            None if outcome.cancelled => Err(AppError::Cancelled),
            None => Ok(()),
        }
    }
}

// Store before cancelling: members woken by the cancellation must not race
// ahead of the error that caused it.
fn fail(slot: &ErrorSlot, token: &CancellationToken, error: AppError) {
    {
        let mut outcome = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(error, AppError::Cancelled) {
            outcome.cancelled = true;
        } else if outcome.first_error.is_none() {
            outcome.first_error = Some(error);
        } else {
            tracing::debug!(error = %error, "Suppressed follow-up task error");
        }
    }
    token.cancel();
}

/// Counter that releases waiters once every participant has arrived.
#[derive(Clone)]
pub struct StartBarrier {
    inner: Arc<BarrierInner>,
}

struct BarrierInner {
    remaining: AtomicUsize,
    notify: Notify,
}

impl StartBarrier {
    pub fn new(participants: usize) -> Self {
        Self {
            inner: Arc::new(BarrierInner {
                remaining: AtomicUsize::new(participants),
                notify: Notify::new(),
            }),
        }
    }

    /// Record one arrival. Extra arrivals are ignored.
    pub fn arrive(&self) {
        let previous = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Wait until every participant has arrived.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_first_error_wins_and_cancels_group() {
        let parent = CancellationToken::new();
        let mut group = TaskGroup::new(&parent);
        let token = group.token();

        group.spawn(async { Err(AppError::Config("first".into())) });
        group.spawn(async move {
            token.cancelled().await;
            Err(AppError::Cancelled)
        });

        match group.wait().await {
            Err(AppError::Config(msg)) => assert_eq!(msg, "first"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!parent.is_cancelled(), "group failure must not cancel the parent");
    }

    #[tokio::test]
    async fn test_cancellation_does_not_mask_later_failure() {
        let parent = CancellationToken::new();
        let mut group = TaskGroup::new(&parent);

        let token = group.token();
        group.spawn(async move {
            token.cancelled().await;
            Err(AppError::Cancelled)
        });
        let token = group.token();
        group.spawn(async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(AppError::TaskPanicked("late".into()))
        });

        parent.cancel();
        assert!(matches!(group.wait().await, Err(AppError::TaskPanicked(_))));
    }

    #[tokio::test]
    async fn test_only_cancellation_reports_cancelled() {
        let parent = CancellationToken::new();
        let mut group = TaskGroup::new(&parent);
        let token = group.token();
        group.spawn(async move {
            token.cancelled().await;
            Err(AppError::Cancelled)
        });

        parent.cancel();
        assert!(matches!(group.wait().await, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_members() {
        let parent = CancellationToken::new();
        let mut group = TaskGroup::new(&parent);
        let token = group.token();
        group.spawn(async move {
            token.cancelled().await;
            Ok(())
        });

        parent.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), group.wait()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let parent = CancellationToken::new();
        let mut group = TaskGroup::new(&parent);
        group.spawn(async {
            if true {
                panic!("boom");
            }
            Ok(())
        });

        assert!(matches!(group.wait().await, Err(AppError::TaskPanicked(_))));
    }

    #[tokio::test]
    async fn test_barrier_releases_after_all_arrivals() {
        let barrier = StartBarrier::new(3);
        barrier.arrive();
        barrier.arrive();
        assert!(tokio::time::timeout(Duration::from_millis(20), barrier.wait()).await.is_err());

        barrier.arrive();
        barrier.arrive();
        assert_eq!(barrier.remaining(), 0);
        tokio::time::timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("barrier should be open");
    }

    #[tokio::test]
    async fn test_empty_barrier_is_open() {
        StartBarrier::new(0).wait().await;
    }
}
