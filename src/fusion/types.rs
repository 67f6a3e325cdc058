//! FusionBrain request/response payloads.

use crate::models::{GenerationJob, JobStatus, PipelineDescriptor};
use serde::{Deserialize, Serialize};

/// Identifier as the service sends it: pipelines use numeric ids, jobs use
/// uuid strings.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Text(String),
    Number(i64),
}

impl RemoteId {
    fn into_non_empty(self) -> Option<String> {
        match self {
            RemoteId::Text(s) if s.trim().is_empty() => None,
            RemoteId::Text(s) => Some(s),
            RemoteId::Number(n) => Some(n.to_string()),
        }
    }
}

/// `uuid` wins over `id`; blank values count as absent.
fn preferred_id(uuid: Option<RemoteId>, id: Option<RemoteId>) -> Option<String> {
    uuid.and_then(RemoteId::into_non_empty)
        .or_else(|| id.and_then(RemoteId::into_non_empty))
}

/// One item of the `GET /pipelines` array.
#[derive(Debug, Deserialize)]
pub struct PipelineEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uuid: Option<RemoteId>,
    #[serde(default)]
    pub id: Option<RemoteId>,
}

impl PipelineEntry {
    /// Returns `None` when the entry carries no usable identifier.
    pub fn into_descriptor(self) -> Option<PipelineDescriptor> {
        let display_name = self.name.unwrap_or_default();
        preferred_id(self.uuid, self.id).map(|id| PipelineDescriptor { id, display_name })
    }
}

/// Response of `POST /pipeline/run`.
#[derive(Debug, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub uuid: Option<RemoteId>,
    #[serde(default)]
    pub id: Option<RemoteId>,
}

impl RunResponse {
    pub fn job_id(self) -> Option<String> {
        preferred_id(self.uuid, self.id)
    }
}

/// JSON carried in the `params` multipart field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(rename = "type")]
    pub job_type: String,
    pub num_images: u32,
    pub width: u32,
    pub height: u32,
    pub generate_params: GenerateParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateParams {
    pub query: String,
}

impl GenerationParams {
    pub const JOB_TYPE: &'static str = "GENERATE";
    pub const IMAGE_SIZE: u32 = 512;

    pub fn for_prompt(prompt: &str) -> Self {
        Self {
            job_type: Self::JOB_TYPE.to_string(),
            num_images: 1,
            width: Self::IMAGE_SIZE,
            height: Self::IMAGE_SIZE,
            generate_params: GenerateParams {
                query: prompt.to_string(),
            },
        }
    }
}

/// Response of `GET /pipeline/status/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<ResultPayload>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

impl StatusResponse {
    pub fn into_job(self, job_id: &str) -> GenerationJob {
        let status = JobStatus::from_remote(self.status.as_deref().unwrap_or_default());
        GenerationJob {
            id: job_id.to_string(),
            status,
            result_files: self.result.and_then(|r| r.files).unwrap_or_default(),
            error_description: self.error_description.filter(|d| !d.trim().is_empty()),
        }
    }
}
