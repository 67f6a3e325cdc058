//! Telegram bot that turns text prompts into images with FusionBrain
//!
//! A prompt received in chat is submitted to a FusionBrain pipeline as an
//! asynchronous job, polled to completion, and the resulting image is sent
//! back to the chat.

pub mod app;
pub mod bot;
pub mod codec;
pub mod error;
pub mod fusion;
pub mod generator;
pub mod models;

pub use error::{Error, Result};
