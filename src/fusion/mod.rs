//! FusionBrain integration: pipeline discovery, job submission and polling
//!
//! [`FusionApi`] is the raw three-call surface of the remote service. The
//! locator, submitter and poller build the generation lifecycle on top of it.

pub mod client;
pub mod mock;
pub mod pipelines;
pub mod poll;
pub mod submit;
pub mod types;

pub use client::FusionClient;
pub use mock::MockFusionApi;
pub use pipelines::PipelineLocator;
pub use poll::JobPoller;
pub use submit::JobSubmitter;
pub use types::GenerationParams;

use crate::models::{GenerationJob, PipelineDescriptor};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FusionApi: Send + Sync {
    async fn list_pipelines(&self) -> Result<Vec<PipelineDescriptor>>;
    /// Starts a job and returns its id. Every call creates a new remote job.
    async fn run_pipeline(&self, pipeline_id: &str, params: &GenerationParams) -> Result<String>;
    async fn job_status(&self, job_id: &str) -> Result<GenerationJob>;
}
