//! End-to-end image generation
//!
//! [`GenerationService`] is the only surface the messaging layer talks to.

pub mod mock;
pub mod orchestrator;

pub use mock::MockGenerator;
pub use orchestrator::Generator;

use crate::models::PipelineDescriptor;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Runs one generation attempt and returns the image bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;
    /// Reports the pipeline a generation would currently use.
    async fn check_model_available(&self) -> Result<PipelineDescriptor>;
}
