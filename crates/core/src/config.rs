use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, path::Path};
use url::Url;

pub const DEFAULT_APP_NAME: &str = "Language Translator";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ENV_OPENAI_KEY: &str = "OPENAI_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_CONFIG_PATH: &str = "LANGUAGE_ASSISTANT_CONFIG";
pub const ENV_HOST: &str = "LANGUAGE_ASSISTANT_HOST";
pub const ENV_PORT: &str = "LANGUAGE_ASSISTANT_PORT";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKey {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelName(pub String);

impl ModelName {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(DEFAULT_MODEL.to_owned())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub app_name: String,
    pub server: ServerConfig,
    pub completion: CompletionConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(format!("{}:{}", self.host, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionConfig {
    pub base_url: Url,
    pub model: ModelName,
    pub api_key: Option<ApiKey>,
}

/// Shape of the optional TOML config file. Every field may be omitted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub app_name: Option<String>,
    pub server: FileServerConfig,
    pub completion: FileCompletionConfig,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileCompletionConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_owned(),
            reason: e.to_string(),
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("model name must not be empty")]
    EmptyModel,
    #[error("invalid completion base url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// A blank value counts as not set, so a placeholder like `OPENAI_KEY=""`
/// falls through to the next source instead of failing start-up.
pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    cli_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env.var(env_key).filter(|v| !v.trim().is_empty()))
        .map(ApiKey::new)
        .transpose()
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(url)
}

/// Values taken from command-line flags. `None` means "not given".
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Builds the effective config. Each value comes from the flag, then the
/// environment, then the file, then the built-in default. The credential is
/// resolved here once and never re-read.
pub fn resolve_app_config(
    overrides: ConfigOverrides,
    file: FileConfig,
    env: &impl Env,
) -> Result<AppConfig, ConfigError> {
    let api_key = match resolve_api_key(overrides.api_key, ENV_OPENAI_KEY, env)? {
        Some(key) => Some(key),
        None => file
            .completion
            .api_key
            .filter(|v| !v.trim().is_empty())
            .map(ApiKey::new)
            .transpose()?,
    };

    let base_url = resolve_string_with_default(
        overrides.base_url,
        ENV_OPENAI_BASE_URL,
        env,
        file.completion.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_BASE_URL),
    );

    let model = resolve_string_with_default(
        overrides.model,
        ENV_OPENAI_MODEL,
        env,
        file.completion.model.as_deref().unwrap_or(DEFAULT_MODEL),
    );

    let host = resolve_string_with_default(
        overrides.host,
        ENV_HOST,
        env,
        file.server.host.as_deref().unwrap_or(DEFAULT_HOST),
    );

    let port = match overrides.port {
        Some(p) => p,
        None => match env.var(ENV_PORT) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddress(format!("{host}:{raw}")))?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        },
    };

    Ok(AppConfig {
        app_name: file.app_name.unwrap_or_else(|| DEFAULT_APP_NAME.to_owned()),
        server: ServerConfig { host, port },
        completion: CompletionConfig {
            base_url: parse_base_url(&base_url)?,
            model: ModelName::new(model)?,
            api_key,
        },
    })
}
