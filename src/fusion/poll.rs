use super::FusionApi;
use crate::models::{JobResult, JobStatus, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_DELAY};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

const GENERIC_FAILURE: &str = "Generation failed";

/// Queries job status until the job finishes, fails, or attempts run out.
#[derive(Clone)]
pub struct JobPoller {
    api: Arc<dyn FusionApi>,
    max_attempts: u32,
    delay: Duration,
}

impl JobPoller {
    pub fn new(api: Arc<dyn FusionApi>) -> Self {
        Self {
            api,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Polls with the configured attempt budget and delay.
    pub async fn poll(&self, job_id: &str) -> Result<JobResult> {
        self.poll_until_done(job_id, self.max_attempts, self.delay)
            .await
    }

    /// Transport failures end polling immediately; only "still running"
    /// answers consume further attempts. The delay suspends the calling task
    /// only and is not applied after the final attempt.
    pub async fn poll_until_done(
        &self,
        job_id: &str,
        max_attempts: u32,
        delay: Duration,
    ) -> Result<JobResult> {
        for attempt in 1..=max_attempts {
            let job = self.api.job_status(job_id).await?;

            match job.status {
                JobStatus::Done => {
                    tracing::info!(
                        "Job {} finished after {} status checks with {} file(s)",
                        job_id,
                        attempt,
                        job.result_files.len()
                    );
                    return Ok(JobResult {
                        files: job.result_files,
                    });
                }
                JobStatus::Failed => {
                    let reason = job
                        .error_description
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                    tracing::warn!("Job {} failed: {}", job_id, reason);
                    return Err(Error::GenerationFailed(reason));
                }
                JobStatus::Pending => {
                    tracing::debug!(
                        "Job {} still running (attempt {}/{})",
                        job_id,
                        attempt,
                        max_attempts
                    );
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!(
            "Job {} did not finish within {} status checks",
            job_id,
            max_attempts
        );
        Err(Error::PollingTimeout {
            attempts: max_attempts,
        })
    }
}
