//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。

use std::sync::Arc;

use parking_lot::RwLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter,
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

/// 日志管理器
#[derive(Debug)]
pub struct LogManager {
    /// 配置
    config: LoggingConfig,

    /// 过滤器重新加载句柄
    reload_handle: Option<Arc<RwLock<ReloadHandle>>>,

    /// 文件输出的后台写线程，drop 时刷新
    _file_guard: Option<WorkerGuard>,
}

impl LogManager {
    /// 创建并安装全局日志订阅者
    pub fn new(config: &LoggingConfig) -> Result<Self> {
        let mut manager = Self {
            config: config.clone(),
            reload_handle: None,
            _file_guard: None,
        };

        manager.init()?;

        Ok(manager)
    }

    fn init(&mut self) -> Result<()> {
        let filter = build_filter(&self.config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);
        self.reload_handle = Some(Arc::new(RwLock::new(reload_handle)));

        let (writer, ansi) = match &self.config.file_path {
            Some(path) => {
                let directory = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(|dir| dir.to_path_buf())
                    .unwrap_or_else(|| std::path::PathBuf::from("."));
                let file_name = path
                    .file_name()
                    .ok_or_else(|| ObservabilityError::config("Log file path has no file name"))?;
                std::fs::create_dir_all(&directory)?;

                let appender = tracing_appender::rolling::never(&directory, file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                self._file_guard = Some(guard);
                (BoxMakeWriter::new(non_blocking), false)
            }
            None => (BoxMakeWriter::new(std::io::stderr), self.config.ansi_colors),
        };

        let registry = tracing_subscriber::registry().with(filter);

        let (json_layer, text_layer) = if self.config.json_format {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(self.config.include_target)
                .with_line_number(self.config.include_line_number)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), None)
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(self.config.include_target)
                .with_line_number(self.config.include_line_number)
                .with_ansi(ansi)
                .with_writer(writer);
            (None, Some(layer))
        };

        registry
            .with(json_layer)
            .with(text_layer)
            .try_init()
            .map_err(|e| ObservabilityError::logging(format!("Subscriber already set: {}", e)))?;

        tracing::debug!(
            target: "dancing_observability",
            "Log manager initialized with level: {}",
            self.config.level
        );

        Ok(())
    }

    /// 动态更新日志级别
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = EnvFilter::try_new(level)
            .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

        let handle = self
            .reload_handle
            .as_ref()
            .ok_or_else(|| ObservabilityError::logging("Log manager not initialized"))?;

        handle
            .write()
            .modify(|filter| {
                *filter = new_filter;
            })
            .map_err(|e| {
                ObservabilityError::logging(format!("Failed to update log level: {}", e))
            })?;

        self.config.level = level.to_string();
        tracing::info!(target: "dancing_observability", "Log level updated to: {}", level);
        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器；`RUST_LOG` 优先于配置
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// 创建带有 REST 请求上下文的 span
pub fn create_request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %method,
        path = %path,
    )
}

/// 创建带有通话房间上下文的 span
pub fn create_room_span(room_id: &str) -> tracing::Span {
    tracing::info_span!(
        "room",
        room_id = %room_id,
    )
}
