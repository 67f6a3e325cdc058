use super::GenerationService;
use crate::models::PipelineDescriptor;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type ErrorFactory = Arc<dyn Fn() -> Error + Send + Sync>;

#[derive(Clone)]
pub struct MockGenerator {
    image: Arc<Mutex<Vec<u8>>>,
    failure: Arc<Mutex<Option<ErrorFactory>>>,
    pipeline: Arc<Mutex<Option<PipelineDescriptor>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    status_checks: Arc<Mutex<usize>>,
    gate: Arc<Mutex<Option<(String, Arc<Notify>)>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            image: Arc::new(Mutex::new(vec![
                0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
            ])),
            failure: Arc::new(Mutex::new(None)),
            pipeline: Arc::new(Mutex::new(Some(PipelineDescriptor {
                id: "4".to_string(),
                display_name: "Kandinsky 3.1".to_string(),
            }))),
            prompts: Arc::new(Mutex::new(Vec::new())),
            status_checks: Arc::new(Mutex::new(0)),
            gate: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_image_response(self, image: Vec<u8>) -> Self {
        *self.image.lock().unwrap() = image;
        self
    }

    /// Every `generate` call fails with a fresh error from `make_error`.
    pub fn with_failure<F>(self, make_error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        *self.failure.lock().unwrap() = Some(Arc::new(make_error));
        self
    }

    /// `generate` for `prompt` waits until `release` is notified.
    pub fn with_blocking_prompt(self, prompt: &str, release: Arc<Notify>) -> Self {
        *self.gate.lock().unwrap() = Some((prompt.to_string(), release));
        self
    }

    pub fn with_pipeline_unavailable(self) -> Self {
        *self.pipeline.lock().unwrap() = None;
        self
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn get_status_check_count(&self) -> usize {
        *self.status_checks.lock().unwrap()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let gate = self.gate.lock().unwrap().clone();
        if let Some((blocked, release)) = gate {
            if blocked == prompt {
                release.notified().await;
            }
        }

        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(make_error) => Err(make_error()),
            None => Ok(self.image.lock().unwrap().clone()),
        }
    }

    async fn check_model_available(&self) -> Result<PipelineDescriptor> {
        *self.status_checks.lock().unwrap() += 1;

        self.pipeline
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::PipelineListUnavailable("mock pipelines offline".to_string()))
    }
}
