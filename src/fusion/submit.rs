use super::{FusionApi, GenerationParams};
use crate::Result;
use std::sync::Arc;

/// Sends one generation request per call. Not idempotent: callers decide
/// whether a failed submission is worth repeating.
#[derive(Clone)]
pub struct JobSubmitter {
    api: Arc<dyn FusionApi>,
}

impl JobSubmitter {
    pub fn new(api: Arc<dyn FusionApi>) -> Self {
        Self { api }
    }

    pub async fn submit(&self, prompt: &str, pipeline_id: &str) -> Result<String> {
        let params = GenerationParams::for_prompt(prompt);
        let job_id = self.api.run_pipeline(pipeline_id, &params).await?;
        tracing::info!("Submitted job {} to pipeline {}", job_id, pipeline_id);
        Ok(job_id)
    }
}
