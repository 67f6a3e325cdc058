use super::types::{GenerationParams, PipelineEntry, RunResponse, StatusResponse};
use super::FusionApi;
use crate::models::{FusionConfig, GenerationJob, PipelineDescriptor};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const LIST_TIMEOUT: Duration = Duration::from_secs(20);
const RUN_TIMEOUT: Duration = Duration::from_secs(40);
const STATUS_TIMEOUT: Duration = Duration::from_secs(20);

/// REST client for the FusionBrain key API.
///
/// Failures are returned already classified by the operation that produced
/// them: listing fails with [`Error::PipelineListUnavailable`], submitting
/// with [`Error::Submission`] and status queries with [`Error::Transport`].
pub struct FusionClient {
    client: Client,
    api_key: String,
    secret: String,
    base_url: String,
}

impl FusionClient {
    pub fn new(config: &FusionConfig) -> Self {
        Self::new_with_client(
            config.api_key.clone(),
            config.secret.clone(),
            config.base_url.clone(),
            Client::new(),
        )
    }

    pub fn new_with_client(
        api_key: String,
        secret: String,
        base_url: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            secret,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/key/api/v1{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Key", format!("Key {}", self.api_key))
            .header("X-Secret", format!("Secret {}", self.secret))
            .header("Accept", "application/json")
    }

    /// Sends the request and returns the body of a successful response, or a
    /// description of what went wrong.
    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> std::result::Result<String, String> {
        let response = self.authorized(request).send().await.map_err(|e| {
            tracing::error!("Failed to send {} request to FusionBrain: {}", operation, e);
            format!("request failed: {}", e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "FusionBrain {} error (status {}): {}",
                operation,
                status,
                error_text
            );
            return Err(format!("API error (status {}): {}", status, error_text));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))
    }

    fn parse<T: DeserializeOwned>(
        body: &str,
        operation: &str,
    ) -> std::result::Result<T, String> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                "Failed to parse FusionBrain {} response: {}\nBody: {}",
                operation,
                e,
                body
            );
            format!("failed to parse response: {}", e)
        })
    }
}

#[async_trait]
impl FusionApi for FusionClient {
    async fn list_pipelines(&self) -> Result<Vec<PipelineDescriptor>> {
        tracing::debug!("Fetching pipeline list from FusionBrain");

        let request = self
            .client
            .get(self.url("/pipelines"))
            .timeout(LIST_TIMEOUT);
        let body = self
            .send(request, "pipelines")
            .await
            .map_err(Error::PipelineListUnavailable)?;
        let entries: Vec<PipelineEntry> =
            Self::parse(&body, "pipelines").map_err(Error::PipelineListUnavailable)?;

        let total = entries.len();
        let pipelines: Vec<PipelineDescriptor> = entries
            .into_iter()
            .filter_map(PipelineEntry::into_descriptor)
            .collect();
        if pipelines.len() < total {
            tracing::warn!(
                "Skipped {} pipeline entries without an identifier",
                total - pipelines.len()
            );
        }

        Ok(pipelines)
    }

    async fn run_pipeline(&self, pipeline_id: &str, params: &GenerationParams) -> Result<String> {
        let params_json = serde_json::to_string(params)?;
        let params_part = Part::text(params_json)
            .mime_str("application/json")
            .map_err(|e| Error::Submission(format!("invalid params part: {}", e)))?;
        let form = Form::new()
            .text("pipeline_id", pipeline_id.to_string())
            .part("params", params_part);

        tracing::debug!("Submitting generation job to pipeline {}", pipeline_id);

        let request = self
            .client
            .post(self.url("/pipeline/run"))
            .timeout(RUN_TIMEOUT)
            .multipart(form);
        let body = self
            .send(request, "run")
            .await
            .map_err(Error::Submission)?;
        let response: RunResponse = Self::parse(&body, "run").map_err(Error::Submission)?;

        response.job_id().ok_or_else(|| {
            tracing::error!("FusionBrain run response has no job id: {}", body);
            Error::Submission("response contains neither 'uuid' nor 'id'".to_string())
        })
    }

    async fn job_status(&self, job_id: &str) -> Result<GenerationJob> {
        let request = self
            .client
            .get(self.url(&format!("/pipeline/status/{}", job_id)))
            .timeout(STATUS_TIMEOUT);
        let body = self
            .send(request, "status")
            .await
            .map_err(Error::Transport)?;
        let response: StatusResponse = Self::parse(&body, "status").map_err(Error::Transport)?;

        tracing::debug!(
            "Job {} reported status {:?}",
            job_id,
            response.status.as_deref().unwrap_or("<none>")
        );

        Ok(response.into_job(job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> FusionClient {
        FusionClient::new_with_client(
            "test-key".to_string(),
            "test-secret".to_string(),
            server.uri(),
            Client::new(),
        )
    }

    #[tokio::test]
    async fn test_list_pipelines_sends_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/pipelines"))
            .and(header("X-Key", "Key test-key"))
            .and(header("X-Secret", "Secret test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 4, "name": "Kandinsky 3.1", "status": "ACTIVE" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let pipelines = make_client(&server).list_pipelines().await.unwrap();
        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].id, "4");
        assert_eq!(pipelines[0].display_name, "Kandinsky 3.1");
    }

    #[tokio::test]
    async fn test_list_pipelines_http_error_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/pipelines"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = make_client(&server).list_pipelines().await.unwrap_err();
        assert!(matches!(err, Error::PipelineListUnavailable(_)));
    }

    #[tokio::test]
    async fn test_list_pipelines_rejects_non_array_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/pipelines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "maintenance"
            })))
            .mount(&server)
            .await;

        let err = make_client(&server).list_pipelines().await.unwrap_err();
        assert!(matches!(err, Error::PipelineListUnavailable(_)));
    }

    #[tokio::test]
    async fn test_run_pipeline_sends_multipart_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/key/api/v1/pipeline/run"))
            .and(header("X-Key", "Key test-key"))
            .and(body_string_contains("name=\"pipeline_id\""))
            .and(body_string_contains("name=\"params\""))
            .and(body_string_contains("\"type\":\"GENERATE\""))
            .and(body_string_contains("\"query\":\"a cat\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "uuid": "J1",
                "status": "INITIAL"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let job_id = make_client(&server)
            .run_pipeline("4", &GenerationParams::for_prompt("a cat"))
            .await
            .unwrap();
        assert_eq!(job_id, "J1");
    }

    #[tokio::test]
    async fn test_run_pipeline_without_job_id_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/key/api/v1/pipeline/run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "INITIAL"
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .run_pipeline("4", &GenerationParams::for_prompt("a cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
    }

    #[tokio::test]
    async fn test_run_pipeline_http_error_is_submission_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/key/api/v1/pipeline/run"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .run_pipeline("4", &GenerationParams::for_prompt("a cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
    }

    #[tokio::test]
    async fn test_job_status_parses_result_files() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/pipeline/status/J1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "J1",
                "status": "DONE",
                "result": { "files": ["Zm9v"], "censored": false }
            })))
            .mount(&server)
            .await;

        let job = make_client(&server).job_status("J1").await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.result_files, vec!["Zm9v".to_string()]);
    }

    #[tokio::test]
    async fn test_job_status_http_error_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/pipeline/status/J1"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = make_client(&server).job_status("J1").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
