//! 日志配置
//!
//! 支持从 dancing-config 的 logging 段转换。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）或完整的 EnvFilter 表达式
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 日志文件路径，未设置时输出到 stderr
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// 是否包含目标（target）
    #[serde(default = "default_true")]
    pub include_target: bool,

    /// 是否包含行号
    #[serde(default)]
    pub include_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
            module_levels: HashMap::new(),
            ansi_colors: true,
            include_target: true,
            include_line_number: false,
        }
    }
}

impl LoggingConfig {
    /// 设置日志级别
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// 设置日志文件路径
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(
        mut self,
        module: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        self.module_levels.insert(module.into(), level.into());
        self
    }
}

impl From<&dancing_config::LoggingConfig> for LoggingConfig {
    fn from(config: &dancing_config::LoggingConfig) -> Self {
        let base = Self::default()
            .with_level(config.level.to_string())
            .with_json_format(config.json);

        match config.file.as_deref().and_then(dancing_config::expand_tilde) {
            Some(path) => base.with_file(path),
            None => base,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dancing_config() {
        let source = dancing_config::LoggingConfig {
            level: dancing_config::LogLevel::Debug,
            json: true,
            file: Some("/tmp/dancing.log".to_string()),
        };

        let config = LoggingConfig::from(&source);
        assert_eq!(config.level, "debug");
        assert!(config.json_format);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/dancing.log")));
    }
}
