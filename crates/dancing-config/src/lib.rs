pub mod config;
pub mod manager;

pub use config::{
    ApiConfig, Config, ConfigError, ConfigResult, LogLevel, LoggingConfig, SignalingConfig,
    StorageConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Dancing 配置目录路径
pub fn dancing_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".dancing"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dancing_dir().map(|dir| dir.join("config.json"))
}

/// 获取默认 token 文件路径
pub fn default_token_path() -> Option<PathBuf> {
    dancing_dir().map(|dir| dir.join("token.json"))
}

/// 初始化 Dancing 目录结构
pub async fn init_dancing_dirs() -> ConfigResult<()> {
    if let Some(dancing) = dancing_dir() {
        tokio::fs::create_dir_all(&dancing).await?;
        tokio::fs::create_dir_all(dancing.join("logs")).await?;
    }
    Ok(())
}

/// `~/...` 解析到 home 目录下
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dancing_dir() {
        let dir = dancing_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".dancing"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.dancing/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with('~'));

        let absolute = expand_tilde("/tmp/token.json").unwrap();
        assert_eq!(absolute, PathBuf::from("/tmp/token.json"));
    }
}
