//! Localized replies and the reply keyboard.

use super::types::ReplyKeyboard;
use crate::models::{Language, PipelineDescriptor};
use crate::Error;

/// Telegram rejects photo captions longer than this many characters.
pub const MAX_CAPTION_CHARS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Generate,
    Help,
    Lang,
    Status,
    About,
}

impl Button {
    const ALL: [Button; 5] = [
        Button::Generate,
        Button::Help,
        Button::Lang,
        Button::Status,
        Button::About,
    ];

    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Button::Generate, Language::Ru) => "🖼️ Сгенерировать",
            (Button::Generate, Language::En) => "🖼️ Generate",
            (Button::Help, Language::Ru) => "🔧 Помощь",
            (Button::Help, Language::En) => "🔧 Help",
            (Button::Lang, Language::Ru) => "🌐 Язык",
            (Button::Lang, Language::En) => "🌐 Lang",
            (Button::Status, Language::Ru) => "📊 Статус",
            (Button::Status, Language::En) => "📊 Status",
            (Button::About, Language::Ru) => "ℹ️ О боте",
            (Button::About, Language::En) => "ℹ️ About",
        }
    }

    /// Matches a label in either language, so a keyboard rendered before a
    /// language switch keeps working.
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|button| {
            button.label(Language::Ru) == text || button.label(Language::En) == text
        })
    }
}

pub fn main_keyboard(lang: Language) -> ReplyKeyboard {
    ReplyKeyboard::from_rows(&[
        &[Button::Generate.label(lang), Button::Help.label(lang)],
        &[Button::Lang.label(lang), Button::Status.label(lang)],
        &[Button::About.label(lang)],
    ])
}

pub fn greeting(lang: Language) -> &'static str {
    match lang {
        Language::Ru => "👋 Привет! Отправьте текстовый промпт для генерации изображения.",
        Language::En => "👋 Hi! Send a text prompt to generate an image.",
    }
}

pub fn help(lang: Language) -> &'static str {
    match lang {
        Language::Ru => {
            "🔧 Команды:\n\
             /start — старт\n\
             /help — помощь\n\
             /lang — смена языка\n\
             /status — проверить модель\n\
             /about — о боте\n\n\
             Отправьте текст — получите изображение."
        }
        Language::En => {
            "🔧 Commands:\n\
             /start — start\n\
             /help — help\n\
             /lang — change language\n\
             /status — check model\n\
             /about — about the bot\n\n\
             Send text — get image."
        }
    }
}

pub fn about(lang: Language) -> &'static str {
    match lang {
        Language::Ru => {
            "ℹ️ Бот генерирует изображения 512×512 по текстовому описанию \
             с помощью FusionBrain (Kandinsky). Генерация обычно занимает до минуты."
        }
        Language::En => {
            "ℹ️ This bot turns a text description into a 512×512 image \
             using FusionBrain (Kandinsky). Generation usually takes up to a minute."
        }
    }
}

pub fn prompt_hint(lang: Language) -> &'static str {
    match lang {
        Language::Ru => "✍️ Опишите, что нужно нарисовать.",
        Language::En => "✍️ Describe what you want to see.",
    }
}

pub fn generating(lang: Language) -> &'static str {
    match lang {
        Language::Ru => "⏳ Генерация...",
        Language::En => "⏳ Generating...",
    }
}

pub fn empty_prompt(lang: Language) -> &'static str {
    match lang {
        Language::Ru => "⚠️ Пустой промпт.",
        Language::En => "⚠️ Empty prompt.",
    }
}

pub fn unknown_command(lang: Language, command: &str) -> String {
    match lang {
        Language::Ru => format!("❓ Неизвестная команда: {}", command),
        Language::En => format!("❓ Unknown command: {}", command),
    }
}

pub fn language_switched(lang: Language) -> &'static str {
    match lang {
        Language::Ru => "🌐 Язык переключён на русский.",
        Language::En => "🌐 Language switched to English.",
    }
}

pub fn model_status(lang: Language, pipeline: &PipelineDescriptor) -> String {
    match lang {
        Language::Ru => format!(
            "📊 Модель доступна: {} (id {})",
            pipeline.display_name, pipeline.id
        ),
        Language::En => format!(
            "📊 Model available: {} (id {})",
            pipeline.display_name, pipeline.id
        ),
    }
}

pub fn error_message(lang: Language, error: &Error) -> String {
    match (lang, error) {
        (Language::Ru, Error::PipelineListUnavailable(_)) => {
            "❌ Сервис генерации недоступен. Попробуйте позже.".to_string()
        }
        (Language::En, Error::PipelineListUnavailable(_)) => {
            "❌ The generation service is unavailable. Please try again later.".to_string()
        }
        (Language::Ru, Error::Submission(_)) => {
            "❌ Не удалось отправить запрос на генерацию. Отправьте промпт ещё раз.".to_string()
        }
        (Language::En, Error::Submission(_)) => {
            "❌ Could not submit the generation request. Please send the prompt again."
                .to_string()
        }
        (Language::Ru, Error::Transport(_)) => {
            "❌ Связь с сервисом прервалась во время генерации. Отправьте промпт ещё раз."
                .to_string()
        }
        (Language::En, Error::Transport(_)) => {
            "❌ Lost connection to the service while generating. Please send the prompt again."
                .to_string()
        }
        (Language::Ru, Error::GenerationFailed(reason)) => {
            format!("❌ Генерация не удалась: {}", reason)
        }
        (Language::En, Error::GenerationFailed(reason)) => {
            format!("❌ Generation failed: {}", reason)
        }
        (Language::Ru, Error::PollingTimeout { .. }) => {
            "⌛ Генерация заняла слишком много времени. Попробуйте ещё раз.".to_string()
        }
        (Language::En, Error::PollingTimeout { .. }) => {
            "⌛ Generation took too long. Please try again.".to_string()
        }
        (Language::Ru, Error::EmptyResult) => "⚠️ Пустой результат.".to_string(),
        (Language::En, Error::EmptyResult) => "⚠️ Empty result.".to_string(),
        (Language::Ru, Error::Fetch(_)) => {
            "❌ Не удалось скачать изображение. Попробуйте ещё раз.".to_string()
        }
        (Language::En, Error::Fetch(_)) => {
            "❌ Could not download the generated image. Please try again.".to_string()
        }
        (Language::Ru, Error::Decode(_)) => {
            "❌ Сервис вернул повреждённое изображение. Попробуйте ещё раз.".to_string()
        }
        (Language::En, Error::Decode(_)) => {
            "❌ The service returned an unreadable image. Please try again.".to_string()
        }
        (Language::Ru, other) => format!("❌ Ошибка: {}", other),
        (Language::En, other) => format!("❌ Error: {}", other),
    }
}

pub fn caption(prompt: &str) -> String {
    let caption = format!("🖼️ {}", prompt);
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return caption;
    }
    let mut truncated: String = caption.chars().take(MAX_CAPTION_CHARS - 1).collect();
    truncated.push('…');
    truncated
}
