use super::{FusionApi, GenerationParams};
use crate::models::{GenerationJob, PipelineDescriptor};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum StatusReply {
    Job(GenerationJob),
    TransportError(String),
}

/// Scripted in-memory FusionBrain API.
///
/// Status replies are served in order; once the script runs out the last
/// reply repeats.
#[derive(Clone)]
pub struct MockFusionApi {
    pipelines: Arc<Mutex<Option<Vec<PipelineDescriptor>>>>,
    job_id: Arc<Mutex<Option<String>>>,
    statuses: Arc<Mutex<Vec<StatusReply>>>,
    submitted: Arc<Mutex<Vec<(String, GenerationParams)>>>,
    list_count: Arc<Mutex<usize>>,
    status_count: Arc<Mutex<usize>>,
}

impl MockFusionApi {
    pub fn new() -> Self {
        Self {
            pipelines: Arc::new(Mutex::new(Some(Vec::new()))),
            job_id: Arc::new(Mutex::new(Some("mock-job".to_string()))),
            statuses: Arc::new(Mutex::new(Vec::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
            list_count: Arc::new(Mutex::new(0)),
            status_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_pipeline(self, id: &str, name: &str) -> Self {
        if let Some(list) = self.pipelines.lock().unwrap().as_mut() {
            list.push(PipelineDescriptor {
                id: id.to_string(),
                display_name: name.to_string(),
            });
        }
        self
    }

    /// Makes `list_pipelines` fail as if the service were unreachable.
    pub fn with_unavailable_pipelines(self) -> Self {
        *self.pipelines.lock().unwrap() = None;
        self
    }

    pub fn with_job_id(self, job_id: &str) -> Self {
        *self.job_id.lock().unwrap() = Some(job_id.to_string());
        self
    }

    /// Makes `run_pipeline` fail with a submission error.
    pub fn with_rejected_submission(self) -> Self {
        *self.job_id.lock().unwrap() = None;
        self
    }

    pub fn with_status(self, job: GenerationJob) -> Self {
        self.statuses.lock().unwrap().push(StatusReply::Job(job));
        self
    }

    pub fn with_status_error(self, message: &str) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push(StatusReply::TransportError(message.to_string()));
        self
    }

    pub fn get_list_count(&self) -> usize {
        *self.list_count.lock().unwrap()
    }

    pub fn get_status_count(&self) -> usize {
        *self.status_count.lock().unwrap()
    }

    pub fn get_submitted(&self) -> Vec<(String, GenerationParams)> {
        self.submitted.lock().unwrap().clone()
    }
}

impl Default for MockFusionApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FusionApi for MockFusionApi {
    async fn list_pipelines(&self) -> Result<Vec<PipelineDescriptor>> {
        *self.list_count.lock().unwrap() += 1;

        self.pipelines
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::PipelineListUnavailable("mock service offline".to_string()))
    }

    async fn run_pipeline(&self, pipeline_id: &str, params: &GenerationParams) -> Result<String> {
        self.submitted
            .lock()
            .unwrap()
            .push((pipeline_id.to_string(), params.clone()));

        self.job_id
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Submission("mock submission rejected".to_string()))
    }

    async fn job_status(&self, job_id: &str) -> Result<GenerationJob> {
        let mut count = self.status_count.lock().unwrap();
        *count += 1;

        let statuses = self.statuses.lock().unwrap();
        let reply = match statuses.len() {
            0 => StatusReply::Job(GenerationJob::pending(job_id)),
            len => statuses[(*count - 1).min(len - 1)].clone(),
        };

        match reply {
            StatusReply::Job(job) => Ok(job),
            StatusReply::TransportError(message) => Err(Error::Transport(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_script_repeats_last_reply() {
        let api = MockFusionApi::new()
            .with_status(GenerationJob::pending("J1"))
            .with_status(GenerationJob::done("J1", vec!["Zm9v".to_string()]));

        assert!(!api.job_status("J1").await.unwrap().status.is_terminal());
        assert!(api.job_status("J1").await.unwrap().status.is_terminal());
        assert!(api.job_status("J1").await.unwrap().status.is_terminal());
        assert_eq!(api.get_status_count(), 3);
    }

    #[tokio::test]
    async fn test_records_submissions() {
        let api = MockFusionApi::new().with_job_id("J9");

        let id = api
            .run_pipeline("4", &GenerationParams::for_prompt("a fox"))
            .await
            .unwrap();

        assert_eq!(id, "J9");
        let submitted = api.get_submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, "4");
        assert_eq!(submitted[0].1.generate_params.query, "a fox");
    }
}
