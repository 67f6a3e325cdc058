use super::session::SessionStore;
use super::text::{self, Button};
use super::types::{ChatAction, ReplyKeyboard, Update};
use super::MessagingTransport;
use crate::codec::detect_image_format;
use crate::generator::GenerationService;
use crate::models::{ChatId, Language};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What an incoming text message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Lang,
    Status,
    About,
    GenerateHint,
    Unknown(String),
    EmptyPrompt,
    Prompt(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Command::EmptyPrompt;
        }

        if let Some(button) = Button::from_label(text) {
            return match button {
                Button::Generate => Command::GenerateHint,
                Button::Help => Command::Help,
                Button::Lang => Command::Lang,
                Button::Status => Command::Status,
                Button::About => Command::About,
            };
        }

        if text.starts_with('/') {
            let token = text.split_whitespace().next().unwrap_or(text);
            // Group chats address commands as `/help@SomeBot`.
            let name = token.split('@').next().unwrap_or(token);
            return match name.to_lowercase().as_str() {
                "/start" => Command::Start,
                "/help" => Command::Help,
                "/lang" => Command::Lang,
                "/status" => Command::Status,
                "/about" => Command::About,
                "/generate" => Command::GenerateHint,
                _ => Command::Unknown(token.to_string()),
            };
        }

        Command::Prompt(text.to_string())
    }
}

/// Dispatches updates for all chats. Cheap to clone; every clone shares the
/// transport, the generator and the session store.
#[derive(Clone)]
pub struct Bot {
    transport: Arc<dyn MessagingTransport>,
    generator: Arc<dyn GenerationService>,
    sessions: SessionStore,
}

impl Bot {
    pub fn new(
        transport: Arc<dyn MessagingTransport>,
        generator: Arc<dyn GenerationService>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            transport,
            generator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text else {
            tracing::debug!("Ignoring non-text message in chat {}", message.chat.id);
            return;
        };
        self.handle_text(message.chat.id, &text).await;
    }

    pub async fn handle_text(&self, chat_id: ChatId, text: &str) {
        let command = Command::parse(text);
        tracing::debug!("Chat {} -> {:?}", chat_id, command);

        match command {
            Command::Start => {
                let lang = self.sessions.ensure(chat_id).await;
                self.reply(chat_id, lang, text::greeting(lang)).await;
            }
            Command::Help => {
                let lang = self.sessions.language(chat_id).await;
                self.reply(chat_id, lang, text::help(lang)).await;
            }
            Command::Lang => {
                let lang = self.sessions.toggle(chat_id).await;
                info!("Chat {} switched language to {}", chat_id, lang);
                self.reply(chat_id, lang, text::language_switched(lang))
                    .await;
            }
            Command::Status => {
                let lang = self.sessions.language(chat_id).await;
                let reply = match self.generator.check_model_available().await {
                    Ok(pipeline) => text::model_status(lang, &pipeline),
                    Err(e) => {
                        warn!("Status check for chat {} failed: {}", chat_id, e);
                        text::error_message(lang, &e)
                    }
                };
                self.reply(chat_id, lang, &reply).await;
            }
            Command::About => {
                let lang = self.sessions.language(chat_id).await;
                self.reply(chat_id, lang, text::about(lang)).await;
            }
            Command::GenerateHint => {
                let lang = self.sessions.language(chat_id).await;
                self.reply(chat_id, lang, text::prompt_hint(lang)).await;
            }
            Command::Unknown(name) => {
                let lang = self.sessions.language(chat_id).await;
                self.reply(chat_id, lang, &text::unknown_command(lang, &name))
                    .await;
            }
            Command::EmptyPrompt => {
                let lang = self.sessions.language(chat_id).await;
                self.reply(chat_id, lang, text::empty_prompt(lang)).await;
            }
            Command::Prompt(prompt) => {
                let lang = self.sessions.language(chat_id).await;
                self.generate_for(chat_id, lang, &prompt).await;
            }
        }
    }

    async fn generate_for(&self, chat_id: ChatId, lang: Language, prompt: &str) {
        info!("Chat {} requested generation", chat_id);
        self.send(chat_id, text::generating(lang), None).await;

        let image = match self.generator.generate(prompt).await {
            Ok(image) => image,
            Err(e) => {
                error!("Generation for chat {} failed: {}", chat_id, e);
                self.reply(chat_id, lang, &text::error_message(lang, &e))
                    .await;
                return;
            }
        };

        if let Err(e) = self
            .transport
            .send_chat_action(chat_id, ChatAction::UploadPhoto)
            .await
        {
            warn!("Failed to send chat action to {}: {}", chat_id, e);
        }

        let kind = detect_image_format(&image);
        let file_name = format!("result.{}", kind.extension);
        match self
            .transport
            .send_photo(
                chat_id,
                image,
                &file_name,
                kind.mime_type,
                &text::caption(prompt),
            )
            .await
        {
            Ok(()) => info!("Delivered image to chat {}", chat_id),
            Err(e) => {
                error!("Failed to deliver image to chat {}: {}", chat_id, e);
                self.reply(chat_id, lang, &text::error_message(lang, &e))
                    .await;
            }
        }
    }

    /// Sends `message` with the main keyboard attached.
    async fn reply(&self, chat_id: ChatId, lang: Language, message: &str) {
        let keyboard = text::main_keyboard(lang);
        self.send(chat_id, message, Some(&keyboard)).await;
    }

    async fn send(&self, chat_id: ChatId, message: &str, keyboard: Option<&ReplyKeyboard>) {
        if let Err(e) = self.transport.send_message(chat_id, message, keyboard).await {
            warn!("Failed to send message to chat {}: {}", chat_id, e);
        }
    }
}
