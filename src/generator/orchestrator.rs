use super::GenerationService;
use crate::codec::ImageCodec;
use crate::fusion::{FusionApi, FusionClient, JobPoller, JobSubmitter, PipelineLocator};
use crate::models::{FusionConfig, PipelineDescriptor};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Locates a pipeline, submits the prompt, waits for the job and decodes the
/// first result file. Failures from any stage are returned as they are; no
/// stage is retried.
pub struct Generator {
    locator: PipelineLocator,
    submitter: JobSubmitter,
    poller: JobPoller,
    codec: ImageCodec,
    model_name: String,
}

impl Generator {
    pub fn new(
        api: Arc<dyn FusionApi>,
        codec: ImageCodec,
        poller: JobPoller,
        model_name: String,
    ) -> Self {
        Self {
            locator: PipelineLocator::new(api.clone()),
            submitter: JobSubmitter::new(api),
            poller,
            codec,
            model_name,
        }
    }

    /// Builds a generator that talks to FusionBrain with one shared
    /// connection pool.
    pub fn from_config(config: &FusionConfig, http_client: reqwest::Client) -> Self {
        let api: Arc<dyn FusionApi> = Arc::new(FusionClient::new_with_client(
            config.api_key.clone(),
            config.secret.clone(),
            config.base_url.clone(),
            http_client.clone(),
        ));
        let poller = JobPoller::new(api.clone())
            .with_max_attempts(config.poll_attempts)
            .with_delay(config.poll_delay);

        Self::new(
            api,
            ImageCodec::new_with_client(http_client),
            poller,
            config.model_name.clone(),
        )
    }
}

#[async_trait]
impl GenerationService for Generator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        info!("Generating image for prompt ({} chars)", prompt.len());

        let pipeline_id = self.locator.resolve_pipeline_id(&self.model_name).await?;
        let job_id = self.submitter.submit(prompt, &pipeline_id).await?;
        let result = self.poller.poll(&job_id).await?;

        let first = result.files.first().ok_or_else(|| {
            tracing::warn!("Job {} finished without result files", job_id);
            Error::EmptyResult
        })?;

        let bytes = self.codec.decode(first).await?;
        info!("Job {} produced {} bytes", job_id, bytes.len());
        Ok(bytes)
    }

    async fn check_model_available(&self) -> Result<PipelineDescriptor> {
        self.locator.resolve(&self.model_name).await
    }
}
