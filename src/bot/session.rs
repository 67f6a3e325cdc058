use crate::models::{ChatId, Language};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-chat language preferences, shared by all update handlers.
///
/// Lives only in memory; a restart resets every chat to the default.
#[derive(Clone)]
pub struct SessionStore {
    languages: Arc<RwLock<HashMap<ChatId, Language>>>,
    default_language: Language,
}

impl SessionStore {
    pub fn new(default_language: Language) -> Self {
        Self {
            languages: Arc::new(RwLock::new(HashMap::new())),
            default_language,
        }
    }

    pub async fn language(&self, chat_id: ChatId) -> Language {
        self.languages
            .read()
            .await
            .get(&chat_id)
            .copied()
            .unwrap_or(self.default_language)
    }

    /// Registers the chat with the default language unless it already has one.
    pub async fn ensure(&self, chat_id: ChatId) -> Language {
        *self
            .languages
            .write()
            .await
            .entry(chat_id)
            .or_insert(self.default_language)
    }

    pub async fn set(&self, chat_id: ChatId, language: Language) {
        self.languages.write().await.insert(chat_id, language);
    }

    pub async fn toggle(&self, chat_id: ChatId) -> Language {
        let mut languages = self.languages.write().await;
        let entry = languages.entry(chat_id).or_insert(self.default_language);
        *entry = entry.toggled();
        *entry
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
