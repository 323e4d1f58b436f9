use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, JellysubError};

fn default_queue_capacity() -> usize {
    256
}

fn default_batch_size() -> usize {
    40
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_upload() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub scan: ScanConfig,
    pub translate: TranslateConfig,
    pub subtitle: SubtitleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Jellyfin base URL, e.g. http://localhost:8096
    pub base_url: String,
    /// API token sent as X-MediaBrowser-Token
    pub api_token: String,
    /// Operator account whose library view is scanned
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Language tag the media server uses for the produced track (e.g. "chi")
    pub target_language: String,
    /// Seconds to sleep between scan cycles
    pub interval_secs: u64,
    /// Number of concurrent translation workers
    pub max_workers: usize,
    /// Items that may wait for a free worker before submit applies backpressure
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upload translated tracks back to the media server
    #[serde(default = "default_upload")]
    pub upload: bool,
    /// Also keep a copy of each translated document here
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Which translation backend to use
    pub backend: TranslationBackend,
    /// Backend endpoint URL, defaults per backend when unset
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Model name passed to the backend, defaults per backend when unset
    #[serde(default)]
    pub model: Option<String>,
    /// API key, required by hosted backends
    #[serde(default)]
    pub api_key: Option<String>,
    /// Language the backend translates into (e.g. "zh")
    pub target_language: String,
    /// Maximum number of subtitle lines sent in one request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    /// Local ollama server
    Ollama,
    /// Google Gemini generateContent API
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// Font written into every style of translated ASS documents
    #[serde(default)]
    pub font_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://localhost:8096".to_string(),
                api_token: String::new(),
                user_name: String::new(),
            },
            scan: ScanConfig {
                target_language: "chi".to_string(),
                interval_secs: 3600,
                max_workers: 8,
                queue_capacity: default_queue_capacity(),
                upload: true,
                output_dir: None,
            },
            translate: TranslateConfig {
                backend: TranslationBackend::Ollama,
                endpoint: None,
                model: None,
                api_key: None,
                target_language: "zh".to_string(),
                batch_size: default_batch_size(),
                timeout_secs: default_timeout_secs(),
            },
            subtitle: SubtitleConfig {
                font_name: Some("FZZhengHei-M-GBK".to_string()),
            },
        }
    }
}

impl TranslationBackend {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama => "llama3.2:3b",
            Self::Gemini => "gemini-2.0-flash-lite",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            _ => Err(JellysubError::Config(format!(
                "Invalid translation backend '{}'. Valid backends: ollama, gemini",
                value
            ))),
        }
    }
}

impl TranslateConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.backend.default_endpoint())
            .trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| self.backend.default_model())
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JellysubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| JellysubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| JellysubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| JellysubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides using the deployment's environment variable names.
    ///
    /// Empty values are ignored so that a blank line in a `.env` file does not
    /// wipe out a value from the config file.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BASE_URI") {
            self.server.base_url = v;
        }
        if let Some(v) = get("API_TOKEN") {
            self.server.api_token = v;
        }
        if let Some(v) = get("USER_NAME") {
            self.server.user_name = v;
        }
        if let Some(v) = get("JELLYFIN_TARGET_LANG") {
            self.scan.target_language = v;
        }
        if let Some(v) = get("SCAN_INTERVAL") {
            self.scan.interval_secs = parse_number("SCAN_INTERVAL", &v)?;
        }
        if let Some(v) = get("MAX_WORKERS") {
            self.scan.max_workers = parse_number("MAX_WORKERS", &v)?;
        }
        if let Some(v) = get("OUTPUT_DIR") {
            self.scan.output_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("TRANSLATE_BACKEND") {
            self.translate.backend = TranslationBackend::parse(&v)?;
        }
        if let Some(v) = get("TRANSLATE_ENDPOINT") {
            self.translate.endpoint = Some(v);
        }
        if let Some(v) = get("TRANSLATE_MODEL") {
            self.translate.model = Some(v);
        }
        if let Some(v) = get("TRANSLATE_TARGET_LANG") {
            self.translate.target_language = v;
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.translate.api_key = Some(v);
        }

        Ok(())
    }

    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("server.base_url (BASE_URI)", &self.server.base_url),
            ("server.api_token (API_TOKEN)", &self.server.api_token),
            ("server.user_name (USER_NAME)", &self.server.user_name),
            ("scan.target_language (JELLYFIN_TARGET_LANG)", &self.scan.target_language),
            ("translate.target_language (TRANSLATE_TARGET_LANG)", &self.translate.target_language),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(JellysubError::Config(format!("Missing required value: {}", name)));
            }
        }

        if self.scan.interval_secs == 0 {
            return Err(JellysubError::Config("scan.interval_secs must be greater than zero".to_string()));
        }
        if self.scan.max_workers == 0 {
            return Err(JellysubError::Config("scan.max_workers must be greater than zero".to_string()));
        }
        if self.scan.queue_capacity == 0 {
            return Err(JellysubError::Config("scan.queue_capacity must be greater than zero".to_string()));
        }
        if !self.scan.upload && self.scan.output_dir.is_none() {
            return Err(JellysubError::Config(
                "Nothing to do with translated subtitles: enable scan.upload or set scan.output_dir".to_string(),
            ));
        }

        self.validate_translate()
    }

    /// Checks needed by anything that talks to the translation backend.
    pub fn validate_translate(&self) -> Result<()> {
        if self.translate.batch_size == 0 {
            return Err(JellysubError::Config("translate.batch_size must be greater than zero".to_string()));
        }
        if self.translate.backend == TranslationBackend::Gemini
            && self.translate.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(JellysubError::Config(
                "GEMINI_API_KEY is required for the gemini backend".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| JellysubError::Config(format!("{} must be a positive integer, got '{}'", key, value)))
}
