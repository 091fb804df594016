//! Dancing Observability
//!
//! 基于 tracing 的统一日志初始化，供 SDK 的可执行程序使用。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::LoggingConfig;
pub use error::{ObservabilityError, Result};
pub use logging::{create_request_span, create_room_span, LogManager};

