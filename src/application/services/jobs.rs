//! Job completion
//!
//! Turns the job handle of an asynchronous operation into its final result by
//! polling the service until the job reaches a terminal status.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, ServiceResultExt};
use crate::domain::{JobId, JobOutput, JobStatus, StorageObject};
use crate::infrastructure::traits::StorageClient;

/// Default pause between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long and how often to poll a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Give up once this much time has passed since the first poll
    pub timeout: Option<Duration>,
    /// Give up after this many polls
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_polls: None,
        }
    }
}

impl PollPolicy {
    fn exhausted(&self, polls: u32, elapsed: Duration) -> bool {
        self.max_polls.is_some_and(|max| polls >= max)
            || self.timeout.is_some_and(|limit| elapsed >= limit)
    }

    /// Pause before the next poll, never sleeping past the deadline.
    fn pause(&self, elapsed: Duration) -> Duration {
        match self.timeout {
            Some(limit) => self.interval.min(limit.saturating_sub(elapsed)),
            None => self.interval,
        }
    }
}

/// Polls jobs to completion, one at a time.
pub struct JobWaiter {
    client: Arc<dyn StorageClient>,
    policy: PollPolicy,
}

impl JobWaiter {
    pub fn new(client: Arc<dyn StorageClient>, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Result of an operation that may have started a job.
    ///
    /// Without a job, `immediate` is the answer. With one, the object the job
    /// completes with replaces it.
    pub fn await_completion<T: JobOutput>(
        &self,
        label: &str,
        job: Option<JobId>,
        immediate: Option<T>,
    ) -> ApplicationResult<Option<T>> {
        let Some(job) = job else {
            return Ok(immediate);
        };

        match self.wait(label, &job)? {
            None => Ok(None),
            Some(object) => T::try_from(object).map(Some).map_err(|other: StorageObject| {
                ApplicationError::UnexpectedJobResult {
                    label: label.to_string(),
                    expected: T::KIND,
                    actual: other.kind(),
                }
            }),
        }
    }

    /// Poll `job` until it completes or fails.
    ///
    /// The handle is freed exactly once when a terminal status is seen. A
    /// timed-out job is left alone since it is still running.
    pub fn wait(&self, label: &str, job: &JobId) -> ApplicationResult<Option<StorageObject>> {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            let status = self
                .client
                .job_status(job)
                .context(&format!("{label}: status of job {job}"))?;
            polls += 1;

            match status {
                JobStatus::InProgress { percent } => {
                    debug!("{label}: job {job} {percent}% complete");
                    let elapsed = started.elapsed();
                    if self.policy.exhausted(polls, elapsed) {
                        warn!("{label}: giving up on job {job} after {polls} polls");
                        return Err(ApplicationError::JobTimeout {
                            label: label.to_string(),
                            polls,
                            elapsed,
                        });
                    }
                    thread::sleep(self.policy.pause(elapsed));
                }
                JobStatus::Complete(result) => {
                    debug!("{label}: job {job} complete after {polls} polls");
                    self.free(label, job);
                    return Ok(result);
                }
                JobStatus::Error { code, message } => {
                    self.free(label, job);
                    return Err(ApplicationError::Job {
                        label: label.to_string(),
                        code,
                        message,
                    });
                }
            }
        }
    }

    fn free(&self, label: &str, job: &JobId) {
        if let Err(e) = self.client.job_free(job) {
            warn!("{label}: failed to free job {job}: {e}");
        }
    }
}
