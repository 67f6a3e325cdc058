//! Data models and structures
//!
//! Defines the generation data model (pipelines, jobs, file references), the
//! per-chat language preference, and the environment configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Telegram chat identifier.
pub type ChatId = i64;

/// A remote image-generation pipeline (model) offered by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescriptor {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

impl JobStatus {
    /// Maps the service's status string. Anything other than `DONE` or `FAIL`
    /// (compared case-insensitively) is still in progress.
    pub fn from_remote(status: &str) -> Self {
        let status = status.trim();
        if status.eq_ignore_ascii_case("DONE") {
            JobStatus::Done
        } else if status.eq_ignore_ascii_case("FAIL") {
            JobStatus::Failed
        } else {
            JobStatus::Pending
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Snapshot of a remote job as observed by one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    pub result_files: Vec<String>,
    pub error_description: Option<String>,
}

impl GenerationJob {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            result_files: Vec::new(),
            error_description: None,
        }
    }

    pub fn done(id: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Done,
            result_files: files,
            error_description: None,
        }
    }

    pub fn failed(id: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Failed,
            result_files: Vec::new(),
            error_description: reason,
        }
    }
}

/// Result payload of a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobResult {
    pub files: Vec<String>,
}

/// The ways the service encodes a result image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    DataUri { mime_type: String, payload: String },
    RemoteUrl(String),
    RawBase64(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Ru => Language::En,
            Language::En => Language::Ru,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            other => Err(crate::Error::Config(format!(
                "Unsupported language '{}', expected 'ru' or 'en'",
                other
            ))),
        }
    }
}

// Configuration
const DEFAULT_FUSION_BASE_URL: &str = "https://api-key.fusionbrain.ai";
const DEFAULT_MODEL_NAME: &str = "Kandinsky";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_ATTEMPTS: u32 = 30;
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(2);

/// Settings for the FusionBrain generation API.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    pub api_key: String,
    pub secret: String,
    pub base_url: String,
    pub model_name: String,
    pub poll_attempts: u32,
    pub poll_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub telegram_api_url: String,
    pub default_language: Language,
    pub fusion: FusionConfig,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| crate::Error::Config(format!("{} not set", key)))
        };

        let poll_attempts = match lookup("POLL_ATTEMPTS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                crate::Error::Config(format!("POLL_ATTEMPTS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_POLL_ATTEMPTS,
        };

        let poll_delay = match lookup("POLL_DELAY_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| {
                    crate::Error::Config(format!(
                        "POLL_DELAY_SECS must be a non-negative number, got '{}'",
                        raw
                    ))
                })?,
            None => DEFAULT_POLL_DELAY,
        };

        let default_language = match lookup("DEFAULT_LANGUAGE") {
            Some(raw) => raw.parse::<Language>()?,
            None => Language::default(),
        };

        Ok(Self {
            telegram_token: lookup("TELEGRAM_TOKEN").filter(|v| !v.trim().is_empty()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            default_language,
            fusion: FusionConfig {
                api_key: required("FUSION_API_KEY")?,
                secret: required("FUSION_SECRET")?,
                base_url: lookup("FUSION_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_FUSION_BASE_URL.to_string()),
                model_name: lookup("FUSION_MODEL_NAME")
                    .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
                poll_attempts,
                poll_delay,
            },
        })
    }

    /// The bot token is only needed when running the Telegram front-end.
    pub fn telegram_token(&self) -> crate::Result<&str> {
        self.telegram_token
            .as_deref()
            .ok_or_else(|| crate::Error::Config("TELEGRAM_TOKEN not set".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_status_mapping_is_case_insensitive() {
        assert_eq!(JobStatus::from_remote("DONE"), JobStatus::Done);
        assert_eq!(JobStatus::from_remote("done"), JobStatus::Done);
        assert_eq!(JobStatus::from_remote("Fail"), JobStatus::Failed);
        assert_eq!(JobStatus::from_remote("INITIAL"), JobStatus::Pending);
        assert_eq!(JobStatus::from_remote("PROCESSING"), JobStatus::Pending);
        assert_eq!(JobStatus::from_remote(""), JobStatus::Pending);
        assert!(!JobStatus::Pending.is_terminal());
        assert!(JobStatus::Done.is_terminal());
    }

    #[test]
    fn test_language_parsing_and_toggle() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" ru ".parse::<Language>().unwrap(), Language::Ru);
        assert!("de".parse::<Language>().is_err());
        assert_eq!(Language::Ru.toggled(), Language::En);
        assert_eq!(Language::default(), Language::Ru);
    }

    #[test]
    fn test_config_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("FUSION_API_KEY", "k"), ("FUSION_SECRET", "s")]))
                .unwrap();

        assert_eq!(config.fusion.base_url, "https://api-key.fusionbrain.ai");
        assert_eq!(config.fusion.model_name, "Kandinsky");
        assert_eq!(config.fusion.poll_attempts, 30);
        assert_eq!(config.fusion.poll_delay, Duration::from_secs(2));
        assert_eq!(config.default_language, Language::Ru);
        assert!(config.telegram_token().is_err());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("FUSION_API_KEY", "k"),
            ("FUSION_SECRET", "s"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("POLL_ATTEMPTS", "5"),
            ("POLL_DELAY_SECS", "0.5"),
            ("DEFAULT_LANGUAGE", "en"),
            ("FUSION_MODEL_NAME", "Kandinsky 3.1"),
        ]))
        .unwrap();

        assert_eq!(config.telegram_token().unwrap(), "123:abc");
        assert_eq!(config.fusion.poll_attempts, 5);
        assert_eq!(config.fusion.poll_delay, Duration::from_millis(500));
        assert_eq!(config.default_language, Language::En);
        assert_eq!(config.fusion.model_name, "Kandinsky 3.1");
    }

    #[test]
    fn test_config_requires_fusion_credentials() {
        let err = Config::from_lookup(lookup_from(&[("FUSION_API_KEY", "k")])).unwrap_err();
        assert!(err.to_string().contains("FUSION_SECRET"));
    }

    #[test]
    fn test_config_rejects_bad_poll_attempts() {
        let err = Config::from_lookup(lookup_from(&[
            ("FUSION_API_KEY", "k"),
            ("FUSION_SECRET", "s"),
            ("POLL_ATTEMPTS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_rejects_out_of_range_poll_delay() {
        for raw in ["1e20", "-1", "NaN", "inf", "soon"] {
            let err = Config::from_lookup(lookup_from(&[
                ("FUSION_API_KEY", "k"),
                ("FUSION_SECRET", "s"),
                ("POLL_DELAY_SECS", raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, crate::Error::Config(_)), "accepted '{}'", raw);
        }
    }
}
