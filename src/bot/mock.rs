use super::types::{ChatAction, Chat, Message, ReplyKeyboard, Update};
use super::MessagingTransport;
use crate::models::ChatId;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Text {
        chat_id: ChatId,
        text: String,
        keyboard: Option<ReplyKeyboard>,
    },
    Photo {
        chat_id: ChatId,
        photo: Vec<u8>,
        file_name: String,
        mime_type: String,
        caption: String,
    },
    Action {
        chat_id: ChatId,
        action: ChatAction,
    },
}

enum UpdateBatch {
    Updates(Vec<Update>),
    Failure(String),
}

/// In-memory transport that queues update batches and records every reply.
#[derive(Clone)]
pub struct MockTransport {
    batches: Arc<Mutex<VecDeque<UpdateBatch>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    offsets: Arc<Mutex<Vec<Option<i64>>>>,
    fail_photos: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            offsets: Arc::new(Mutex::new(Vec::new())),
            fail_photos: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_updates(self, updates: Vec<Update>) -> Self {
        self.batches
            .lock()
            .unwrap()
            .push_back(UpdateBatch::Updates(updates));
        self
    }

    pub fn with_update_failure(self, message: &str) -> Self {
        self.batches
            .lock()
            .unwrap()
            .push_back(UpdateBatch::Failure(message.to_string()));
        self
    }

    pub fn with_failing_photos(self) -> Self {
        *self.fail_photos.lock().unwrap() = true;
        self
    }

    /// Builds a text message update.
    pub fn text_update(update_id: i64, chat_id: ChatId, text: &str) -> Update {
        Update {
            update_id,
            message: Some(Message {
                message_id: update_id,
                chat: Chat { id: chat_id },
                text: Some(text.to_string()),
            }),
        }
    }

    pub fn get_sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Text replies only, in the order they were sent.
    pub fn get_texts(&self) -> Vec<String> {
        self.get_sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn get_requested_offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingTransport for MockTransport {
    async fn get_updates(&self, offset: Option<i64>, _timeout_secs: u32) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);

        match self.batches.lock().unwrap().pop_front() {
            Some(UpdateBatch::Updates(updates)) => Ok(updates),
            Some(UpdateBatch::Failure(message)) => Err(Error::Telegram(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage::Text {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
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
        if *self.fail_photos.lock().unwrap() {
            return Err(Error::Telegram("mock photo upload rejected".to_string()));
        }

        self.sent.lock().unwrap().push(SentMessage::Photo {
            chat_id,
            photo,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(SentMessage::Action { chat_id, action });
        Ok(())
    }
}
