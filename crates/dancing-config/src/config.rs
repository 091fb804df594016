use serde::{Deserialize, Serialize};

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub signaling: SignalingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            api: ApiConfig::default(),
            signaling: SignalingConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 按点号路径读取配置项，如 `api.base_url`
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["api", "base_url"] => Some(self.api.base_url.clone()),
            ["api", "timeout_seconds"] => Some(self.api.timeout_seconds.to_string()),
            ["api", "accept_invalid_certs"] => Some(self.api.accept_invalid_certs.to_string()),
            ["signaling", "endpoint"] => Some(self.signaling.endpoint.clone()),
            ["signaling", "connect_timeout_seconds"] => {
                Some(self.signaling.connect_timeout_seconds.to_string())
            }
            ["signaling", "heartbeat_ms"] => Some(self.signaling.heartbeat_ms.to_string()),
            ["signaling", "accept_invalid_certs"] => {
                Some(self.signaling.accept_invalid_certs.to_string())
            }
            ["storage", "token_path"] => Some(self.storage.token_path.clone()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["api", "base_url"] => {
                self.api.base_url = value.trim_end_matches('/').to_string();
            }
            ["api", "timeout_seconds"] => {
                self.api.timeout_seconds = parse_number(value)?;
            }
            ["api", "accept_invalid_certs"] => {
                self.api.accept_invalid_certs = parse_bool(value)?;
            }
            ["signaling", "endpoint"] => {
                self.signaling.endpoint = value.to_string();
            }
            ["signaling", "connect_timeout_seconds"] => {
                self.signaling.connect_timeout_seconds = parse_number(value)?;
            }
            ["signaling", "heartbeat_ms"] => {
                self.signaling.heartbeat_ms = parse_number(value)?;
            }
            ["signaling", "accept_invalid_certs"] => {
                self.signaling.accept_invalid_certs = parse_bool(value)?;
            }
            ["storage", "token_path"] => {
                self.storage.token_path = value.to_string();
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "json"] => {
                self.logging.json = parse_bool(value)?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> ConfigResult<u64> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

/// REST API 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// 后端 API 根地址，所有接口路径都挂在它下面
    pub base_url: String,
    pub timeout_seconds: u64,
    /// 开发环境后端使用自签名证书时打开
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8080/api".to_string(),
            timeout_seconds: 10,
            accept_invalid_certs: false,
        }
    }
}

/// 视频通话信令配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalingConfig {
    /// STOMP over WebSocket 端点 (SockJS 的原生 websocket 通道)
    pub endpoint: String,
    pub connect_timeout_seconds: u64,
    /// 客户端心跳间隔（毫秒），0 表示关闭
    pub heartbeat_ms: u64,
    /// wss 端点使用自签名证书时打开，同 `api.accept_invalid_certs`
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://localhost:8080/ws/video-call/websocket".to_string(),
            connect_timeout_seconds: 10,
            heartbeat_ms: 10_000,
            accept_invalid_certs: false,
        }
    }
}

/// Token 持久化配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub token_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: "~/.dancing/token.json".to_string(),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
