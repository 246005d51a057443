//! Explicit request state for mutating operations.
//!
//! Each submitting operation owns one guard. Starting a submission moves
//! Idle -> InFlight and refuses to start again until the outcome is
//! recorded; both the success and failure paths must finish the guard, so
//! the operation is always re-enabled afterwards.

use std::future::Future;

use thiserror::Error;

/// Lifecycle of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("a submission is already in flight")]
pub struct AlreadyInFlight;

/// Duplicate-submission guard around one operation.
#[derive(Debug, Default)]
pub struct RequestGuard {
    state: RequestState,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Begin a submission. Fails while a previous one is still in flight;
    /// a finished guard (succeeded or failed) can start again.
    pub fn begin(&mut self) -> Result<(), AlreadyInFlight> {
        if self.state == RequestState::InFlight {
            return Err(AlreadyInFlight);
        }
        self.state = RequestState::InFlight;
        Ok(())
    }

    /// Record the outcome, re-enabling the operation.
    pub fn finish(&mut self, success: bool) {
        self.state = if success {
            RequestState::Succeeded
        } else {
            RequestState::Failed
        };
    }

    /// Drive one submission through the guard: refused while a previous
    /// one is in flight, outcome recorded on both paths.
    pub async fn run<T, E, F>(&mut self, submission: F) -> Result<Result<T, E>, AlreadyInFlight>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.begin()?;
        let result = submission.await;
        self.finish(result.is_ok());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_submission_refused() {
        let mut guard = RequestGuard::new();
        assert_eq!(guard.state(), RequestState::Idle);

        guard.begin().expect("first submission starts");
        assert_eq!(guard.state(), RequestState::InFlight);
        assert_eq!(guard.begin(), Err(AlreadyInFlight));
    }

    #[test]
    fn test_reenabled_after_either_outcome() {
        let mut guard = RequestGuard::new();

        guard.begin().expect("starts");
        guard.finish(false);
        assert_eq!(guard.state(), RequestState::Failed);
        guard.begin().expect("can retry after failure");

        guard.finish(true);
        assert_eq!(guard.state(), RequestState::Succeeded);
        guard.begin().expect("can submit again after success");
    }

    #[tokio::test]
    async fn test_run_records_outcome_on_both_paths() {
        let mut guard = RequestGuard::new();

        let ok: Result<u32, &str> = guard.run(async { Ok(7) }).await.expect("idle guard starts");
        assert_eq!(ok, Ok(7));
        assert_eq!(guard.state(), RequestState::Succeeded);

        let err: Result<u32, &str> = guard
            .run(async { Err("rejected") })
            .await
            .expect("finished guard starts again");
        assert_eq!(err, Err("rejected"));
        assert_eq!(guard.state(), RequestState::Failed);
    }
}
