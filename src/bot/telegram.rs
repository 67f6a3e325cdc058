use super::types::{
    ApiResponse, ChatAction, GetUpdatesRequest, ReplyKeyboard, SendChatActionRequest,
    SendMessageRequest, Update,
};
use super::MessagingTransport;
use crate::models::ChatId;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
/// Extra time on top of the long-poll window before the request is abandoned.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot API client. The token is part of every URL, so URLs are never logged.
pub struct TelegramClient {
    client: Client,
    endpoint: String,
}

impl TelegramClient {
    pub fn new(token: &str, api_url: &str) -> Self {
        Self::new_with_client(token, api_url, Client::new())
    }

    pub fn new_with_client(token: &str, api_url: &str, client: Client) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn execute<Resp: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<Resp> {
        let response = request.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to call Telegram {}: {}", method, e);
            e
        })?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: ApiResponse<Resp> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                tracing::error!("Failed to parse Telegram {} response: {}", method, e);
                return Err(e.into());
            }
            Err(_) => {
                tracing::error!("Telegram {} error (status {}): {}", method, status, body);
                return Err(Error::Telegram(format!(
                    "{} failed (status {}): {}",
                    method, status, body
                )));
            }
        };

        if !status.is_success() || !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| "no description".to_string());
            tracing::error!(
                "Telegram {} error (status {}): {}",
                method,
                status,
                description
            );
            return Err(Error::Telegram(format!("{} failed: {}", method, description)));
        }

        parsed
            .result
            .ok_or_else(|| Error::Telegram(format!("{} returned no result", method)))
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp> {
        let builder = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(request);
        self.execute(method, builder).await
    }
}

#[async_trait]
impl MessagingTransport for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        let timeout = Duration::from_secs(u64::from(timeout_secs)) + LONG_POLL_GRACE;
        self.post_json("getUpdates", &request, timeout).await
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self
            .post_json("sendMessage", &request, SEND_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        caption: &str,
    ) -> Result<()> {
        let photo_part = Part::bytes(photo)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo_part);

        let builder = self
            .client
            .post(self.method_url("sendPhoto"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form);
        let _: serde_json::Value = self.execute("sendPhoto", builder).await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let request = SendChatActionRequest {
            chat_id,
            action: action.as_str(),
        };
        let _: bool = self
            .post_json("sendChatAction", &request, SEND_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123:abc";

    fn make_client(server: &MockServer) -> TelegramClient {
        TelegramClient::new(TOKEN, &server.uri())
    }

    #[tokio::test]
    async fn test_get_updates_parses_messages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_json(serde_json::json!({
                "offset": 11,
                "timeout": 0,
                "allowed_updates": ["message"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [{
                    "update_id": 11,
                    "message": {
                        "message_id": 5,
                        "chat": { "id": 42, "type": "private" },
                        "text": "a cat"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = make_client(&server).get_updates(Some(11), 0).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 11);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("a cat")
        );
    }

    #[tokio::test]
    async fn test_send_message_includes_keyboard() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_string_contains("\"resize_keyboard\":true"))
            .and(body_string_contains("\"chat_id\":42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 6, "chat": { "id": 42 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let keyboard = ReplyKeyboard::from_rows(&[&["Help"]]);
        make_client(&server)
            .send_message(42, "hi", Some(&keyboard))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_description_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .send_message(42, "hi", None)
            .await
            .unwrap_err();
        match err {
            Error::Telegram(message) => assert!(message.contains("blocked")),
            other => panic!("expected Telegram error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_photo_uploads_multipart() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendPhoto"))
            .and(body_string_contains("name=\"photo\"; filename=\"result.png\""))
            .and(body_string_contains("a cat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 7, "chat": { "id": 42 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        make_client(&server)
            .send_photo(42, vec![1, 2, 3], "result.png", "image/png", "🖼️ a cat")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_chat_action() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendChatAction"))
            .and(body_json(serde_json::json!({
                "chat_id": 42,
                "action": "upload_photo"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ok": true, "result": true })),
            )
            .expect(1)
            .mount(&server)
            .await;

        make_client(&server)
            .send_chat_action(42, ChatAction::UploadPhoto)
            .await
            .unwrap();
    }
}
