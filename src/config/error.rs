// ==========================================
// 产线计数遥测采集核心 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配置层错误类型
///
/// 配置错误属于致命错误: 校验失败必须阻止轮询调度器启动
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 文件与格式错误 =====
    #[error("配置文件读取失败: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    // ===== 校验错误 =====
    #[error("设备清单为空")]
    EmptyDeviceList,

    #[error("设备ID重复: {device_id}")]
    DuplicateDeviceId { device_id: String },

    #[error("设备无可用通道: device_id={device_id}")]
    NoEnabledChannels { device_id: String },

    #[error("通道号重复: device_id={device_id}, channel={channel}")]
    DuplicateChannel { device_id: String, channel: u16 },

    #[error("字段值错误 (device_id={device_id}, field={field}): {message}")]
    FieldValueError {
        device_id: String,
        field: String,
        message: String,
    },

    #[error("汇出配置错误 (field={field}): {message}")]
    SinkConfigError { field: String, message: String },
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
