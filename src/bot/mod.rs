//! Telegram front-end
//!
//! Routes chat messages to commands or to image generation and renders the
//! replies in the chat's language. Generation itself is delegated to a
//! [`GenerationService`](crate::generator::GenerationService).

pub mod handler;
pub mod mock;
pub mod session;
pub mod telegram;
pub mod text;
pub mod types;

pub use handler::{Bot, Command};
pub use mock::{MockTransport, SentMessage};
pub use session::SessionStore;
pub use telegram::TelegramClient;
pub use types::{ChatAction, ReplyKeyboard, Update};

use crate::models::ChatId;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Long-polls for new updates starting at `offset`.
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<Update>>;
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()>;
    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        caption: &str,
    ) -> Result<()>;
    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
