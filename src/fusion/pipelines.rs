use super::FusionApi;
use crate::models::PipelineDescriptor;
use crate::{Error, Result};
use std::sync::Arc;

/// Picks the first pipeline whose name contains `preferred`
/// case-insensitively, falling back to the first pipeline of the list.
pub fn select_pipeline<'a>(
    pipelines: &'a [PipelineDescriptor],
    preferred: &str,
) -> Option<&'a PipelineDescriptor> {
    let needle = preferred.to_lowercase();
    pipelines
        .iter()
        .find(|p| p.display_name.to_lowercase().contains(&needle))
        .or_else(|| pipelines.first())
}

/// Discovers which remote pipeline a generation should target.
///
/// The list is fetched fresh on every call.
#[derive(Clone)]
pub struct PipelineLocator {
    api: Arc<dyn FusionApi>,
}

impl PipelineLocator {
    pub fn new(api: Arc<dyn FusionApi>) -> Self {
        Self { api }
    }

    pub async fn resolve(&self, preferred: &str) -> Result<PipelineDescriptor> {
        let pipelines = self.api.list_pipelines().await?;

        let pipeline = select_pipeline(&pipelines, preferred).ok_or_else(|| {
            tracing::error!("FusionBrain returned an empty pipeline list");
            Error::PipelineListUnavailable("service returned no pipelines".to_string())
        })?;

        if !pipeline
            .display_name
            .to_lowercase()
            .contains(&preferred.to_lowercase())
        {
            tracing::warn!(
                "No pipeline matches '{}', falling back to '{}'",
                preferred,
                pipeline.display_name
            );
        }
        tracing::debug!(
            "Selected pipeline {} ({})",
            pipeline.id,
            pipeline.display_name
        );

        Ok(pipeline.clone())
    }

    pub async fn resolve_pipeline_id(&self, preferred: &str) -> Result<String> {
        Ok(self.resolve(preferred).await?.id)
    }
}
