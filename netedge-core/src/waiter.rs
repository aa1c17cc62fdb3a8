//! Waiter - Poll a remote resource until it settles
//!
//! A [`StateWaiter`] repeatedly asks a [`Refresh`] source for the current
//! status of one resource. The wait ends successfully on a target status,
//! fails at once on a status outside the pending and target sets or on a
//! refresh error, and fails with a timeout when a pending status outlives
//! the deadline. Transport errors are never retried here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::time::Instant;

use crate::provider::{ErrorKind, ProviderError, ProviderResult};

/// Source of the observable status of one remote resource
#[async_trait]
pub trait Refresh: Send + Sync {
    type Status: Send;

    /// Fetch the current status
    async fn refresh(&self) -> ProviderResult<Self::Status>;
}

/// Reasons a wait did not reach a target status
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("unexpected state '{status}' for {resource}, wanted one of [{}]", .expected.join(", "))]
    UnexpectedState {
        resource: String,
        status: String,
        expected: Vec<String>,
    },

    #[error("timeout while waiting for {resource} to become [{}] (last state: '{last_status}', waited {elapsed:?})", .expected.join(", "))]
    Timeout {
        resource: String,
        last_status: String,
        expected: Vec<String>,
        elapsed: Duration,
    },

    #[error("failed to refresh {resource}")]
    Refresh {
        resource: String,
        #[source]
        source: ProviderError,
    },
}

impl From<WaitError> for ProviderError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::UnexpectedState { .. } => ProviderError::new(err.to_string())
                .with_kind(ErrorKind::UnexpectedState),
            WaitError::Timeout { .. } => {
                ProviderError::new(err.to_string()).with_kind(ErrorKind::Timeout)
            }
            WaitError::Refresh { resource, source } => {
                source.context(format!("failed to refresh {}", resource))
            }
        }
    }
}

/// Bounded polling of one resource's status
#[derive(Debug, Clone)]
pub struct StateWaiter<S> {
    resource: String,
    pending: Vec<S>,
    target: Vec<S>,
    poll_interval: Duration,
    timeout: Duration,
}

impl<S> StateWaiter<S>
where
    S: PartialEq + fmt::Display + Send,
{
    /// `resource` is a label used in log lines and errors, usually the remote id
    pub fn new(resource: impl Into<String>, pending: Vec<S>, target: Vec<S>) -> Self {
        Self {
            resource: resource.into(),
            pending,
            target,
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    fn expected(&self) -> Vec<String> {
        self.target.iter().map(ToString::to_string).collect()
    }

    /// Poll until a target status is observed
    ///
    /// The first refresh happens immediately, so a resource that is already
    /// settled costs exactly one call and no sleep.
    pub async fn wait<R>(&self, source: &R) -> Result<S, WaitError>
    where
        R: Refresh<Status = S> + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let status = source
                .refresh()
                .await
                .map_err(|source| WaitError::Refresh {
                    resource: self.resource.clone(),
                    source,
                })?;

            debug!(
                "{}: attempt {} observed state '{}'",
                self.resource, attempt, status
            );

            if self.target.contains(&status) {
                return Ok(status);
            }
            if !self.pending.contains(&status) {
                return Err(WaitError::UnexpectedState {
                    resource: self.resource.clone(),
                    status: status.to_string(),
                    expected: self.expected(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    resource: self.resource.clone(),
                    last_status: status.to_string(),
                    expected: self.expected(),
                    elapsed: now - started,
                });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Phase {
        Pending,
        Busy,
        Done,
        Broken,
    }

    impl fmt::Display for Phase {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let s = match self {
                Phase::Pending => "PENDING",
                Phase::Busy => "BUSY",
                Phase::Done => "DONE",
                Phase::Broken => "BROKEN",
            };
            f.write_str(s)
        }
    }

    /// Replays a fixed sequence of results and records when each was served
    struct Scripted {
        results: Mutex<VecDeque<ProviderResult<Phase>>>,
        served: Mutex<Vec<(Instant, String)>>,
    }

    impl Scripted {
        fn new(results: Vec<ProviderResult<Phase>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                served: Mutex::new(Vec::new()),
            }
        }

        fn phases(phases: &[Phase]) -> Self {
            Self::new(phases.iter().cloned().map(Ok).collect())
        }

        fn calls(&self) -> usize {
            self.served.lock().unwrap().len()
        }

        fn observed(&self) -> Vec<String> {
            self.served
                .lock()
                .unwrap()
                .iter()
                .map(|(_, s)| s.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Refresh for Scripted {
        type Status = Phase;

        async fn refresh(&self) -> ProviderResult<Phase> {
            let next = self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Phase::Pending));
            let label = match &next {
                Ok(phase) => phase.to_string(),
                Err(_) => "error".to_string(),
            };
            self.served.lock().unwrap().push((Instant::now(), label));
            next
        }
    }

    fn waiter(interval_secs: u64, timeout_secs: u64) -> StateWaiter<Phase> {
        StateWaiter::new(
            "dev-1",
            vec![Phase::Pending, Phase::Busy],
            vec![Phase::Done],
        )
        .with_poll_interval(Duration::from_secs(interval_secs))
        .with_timeout(Duration::from_secs(timeout_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_pending_sequence() {
        let source = Scripted::phases(&[Phase::Pending, Phase::Busy, Phase::Pending, Phase::Done]);
        let started = Instant::now();

        let status = waiter(5, 60).wait(&source).await.unwrap();

        assert_eq!(status, Phase::Done);
        assert_eq!(source.observed(), vec!["PENDING", "BUSY", "PENDING", "DONE"]);
        assert!(Instant::now() - started >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn settled_resource_needs_one_refresh_and_no_sleep() {
        let source = Scripted::phases(&[Phase::Done]);
        let started = Instant::now();

        waiter(5, 60).wait(&source).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(Instant::now(), started);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_state_fails_immediately() {
        let source = Scripted::phases(&[Phase::Pending, Phase::Broken, Phase::Done]);

        let err = waiter(5, 60).wait(&source).await.unwrap_err();

        match err {
            WaitError::UnexpectedState {
                resource,
                status,
                expected,
            } => {
                assert_eq!(resource, "dev-1");
                assert_eq!(status, "BROKEN");
                assert_eq!(expected, vec!["DONE".to_string()]);
            }
            other => panic!("Expected UnexpectedState, got {:?}", other),
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_pending_outlives_deadline() {
        let source = Scripted::phases(&[Phase::Pending; 10]);

        let err = waiter(5, 12).wait(&source).await.unwrap_err();

        match err {
            WaitError::Timeout {
                last_status,
                elapsed,
                ..
            } => {
                assert_eq!(last_status, "PENDING");
                assert!(elapsed >= Duration::from_secs(12));
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        // refreshes at 0s, 5s, 10s and a final one at the 12s deadline
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_refreshes_once() {
        let source = Scripted::phases(&[Phase::Pending]);

        let err = waiter(5, 0).wait(&source).await.unwrap_err();

        assert!(matches!(err, WaitError::Timeout { .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_error_is_not_retried() {
        let source = Scripted::new(vec![
            Ok(Phase::Pending),
            Err(ProviderError::new("connection reset")),
            Ok(Phase::Done),
        ]);

        let err = waiter(5, 60).wait(&source).await.unwrap_err();

        assert!(matches!(err, WaitError::Refresh { .. }));
        assert_eq!(source.calls(), 2);

        let err = ProviderError::from(err);
        assert_eq!(err.kind, ErrorKind::Api);
        assert_eq!(err.to_string(), "failed to refresh dev-1: connection reset");
    }

    #[test]
    fn wait_errors_map_to_error_kinds() {
        let err = ProviderError::from(WaitError::Timeout {
            resource: "dev-1".into(),
            last_status: "PENDING".into(),
            expected: vec!["DONE".into()],
            elapsed: Duration::from_secs(3),
        });
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("dev-1"));

        let err = ProviderError::from(WaitError::UnexpectedState {
            resource: "dev-1".into(),
            status: "FAILED".into(),
            expected: vec!["DONE".into()],
        });
        assert_eq!(err.kind, ErrorKind::UnexpectedState);
    }
}
