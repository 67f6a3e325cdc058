//! Error handling and custom error types
//!
//! Provides unified error handling across the bot using thiserror. The first
//! group of variants classifies generation failures; the messaging layer maps
//! each of them to a localized reply.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Pipeline list unavailable: {0}")]
    PipelineListUnavailable(String),

    #[error("Job submission failed: {0}")]
    Submission(String),

    #[error("Transport error while polling job: {0}")]
    Transport(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generation polling timed out after {attempts} attempts")]
    PollingTimeout { attempts: u32 },

    #[error("Generation returned no files")]
    EmptyResult,

    #[error("Failed to fetch result image: {0}")]
    Fetch(String),

    #[error("Failed to decode result image: {0}")]
    Decode(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the failures a single generation request can end with.
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            Error::PipelineListUnavailable(_)
                | Error::Submission(_)
                | Error::Transport(_)
                | Error::GenerationFailed(_)
                | Error::PollingTimeout { .. }
                | Error::EmptyResult
                | Error::Fetch(_)
                | Error::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
