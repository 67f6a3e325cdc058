//! Result image decoding
//!
//! The service may hand back a result file as a data URI, as a link to an
//! externally hosted file, or as bare base64. [`ImageCodec`] turns any of them
//! into raw image bytes.

pub mod format;

pub use format::{detect_image_format, ImageKind};

use crate::models::FileReference;
use crate::{Error, Result};
use base64::Engine as _;
use reqwest::Client;
use std::time::Duration;

const DATA_URI_IMAGE_PREFIX: &str = "data:image/";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

impl FileReference {
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with(DATA_URI_IMAGE_PREFIX) {
            let (header, payload) = reference.split_once(',').unwrap_or((reference, ""));
            let mime_type = header
                .trim_start_matches("data:")
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string();
            FileReference::DataUri {
                mime_type,
                payload: payload.to_string(),
            }
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            FileReference::RemoteUrl(reference.to_string())
        } else {
            FileReference::RawBase64(reference.to_string())
        }
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))
}

pub struct ImageCodec {
    client: Client,
}

impl ImageCodec {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn decode(&self, file_ref: &str) -> Result<Vec<u8>> {
        match FileReference::parse(file_ref) {
            FileReference::DataUri { mime_type, payload } => {
                if !file_ref.contains(',') {
                    return Err(Error::Decode("data URI has no payload".to_string()));
                }
                tracing::debug!("Decoding inline {} result", mime_type);
                decode_base64(&payload)
            }
            FileReference::RemoteUrl(url) => self.fetch(&url).await,
            FileReference::RawBase64(payload) => decode_base64(&payload),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading result image from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to download result image: {}", e);
                Error::Fetch(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Result image download failed (status {})", status);
            return Err(Error::Fetch(format!("download failed (status {})", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read image body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new()
    }
}
