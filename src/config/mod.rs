// ==========================================
// 产线计数遥测采集核心 - 配置层
// ==========================================
// 职责: 配置加载、缺省合并、启动校验
// 红线: 配置错误在启动时即失败，绝不留到轮询周期内
// ==========================================

pub mod app_config;
pub mod error;

pub use app_config::{AppConfig, DowntimeConfig, SinkConfig};
pub use error::{ConfigError, ConfigResult};
