// ==========================================
// 产线计数遥测采集核心 - 运行配置
// ==========================================
// 职责: JSON 配置文件加载与启动校验
// 说明: 设备清单/通道映射/汇出参数均来自外部配置，
//       加载后在核心生命周期内只读
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::DeviceDescriptor;

// ==========================================
// SinkConfig - 遥测汇出配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub batch_size: usize,         // 批量阈值 (条)
    pub flush_interval_ms: u64,    // 定时冲刷间隔 (毫秒)
    pub max_retries: u32,          // 冲刷失败最大重试次数
    #[serde(default = "default_sink_retry_delay_ms")]
    pub retry_delay_ms: u64,       // 重试退避基准 (毫秒，指数退避)
}

fn default_sink_retry_delay_ms() -> u64 {
    1000
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl SinkConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ==========================================
// DowntimeConfig - 停机检测配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeConfig {
    pub min_duration_minutes: i64, // 最小停机时长阈值 (分钟)
}

impl Default for DowntimeConfig {
    fn default() -> Self {
        Self {
            min_duration_minutes: 5,
        }
    }
}

// ==========================================
// AppConfig - 全局运行配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub devices: Vec<DeviceDescriptor>, // 设备清单
    #[serde(default)]
    pub sink: SinkConfig,               // 汇出配置
    #[serde(default)]
    pub downtime: DowntimeConfig,       // 停机检测配置
    #[serde(default = "default_max_concurrent_devices")]
    pub max_concurrent_devices: usize,  // 同时活跃设备任务上限
}

fn default_max_concurrent_devices() -> usize {
    32
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    ///
    /// # 返回
    /// - Ok(AppConfig): 已通过校验的配置
    /// - Err(ConfigError): 读取/解析/校验失败 (致命，阻止启动)
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path_str = path.as_ref().display().to_string();
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
            path: path_str,
            source: e,
        })?;

        let config: AppConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 启动校验
    ///
    /// 校验失败为致命错误，轮询调度器拒绝启动
    pub fn validate(&self) -> ConfigResult<()> {
        if self.devices.is_empty() {
            return Err(ConfigError::EmptyDeviceList);
        }

        if self.max_concurrent_devices == 0 {
            return Err(ConfigError::SinkConfigError {
                field: "max_concurrent_devices".to_string(),
                message: "必须大于 0".to_string(),
            });
        }

        let mut seen_devices: HashSet<&str> = HashSet::new();
        for device in &self.devices {
            if !seen_devices.insert(device.device_id.as_str()) {
                return Err(ConfigError::DuplicateDeviceId {
                    device_id: device.device_id.clone(),
                });
            }
            Self::validate_device(device)?;
        }

        if self.sink.batch_size == 0 {
            return Err(ConfigError::SinkConfigError {
                field: "batch_size".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        if self.sink.flush_interval_ms == 0 {
            return Err(ConfigError::SinkConfigError {
                field: "flush_interval_ms".to_string(),
                message: "必须大于 0".to_string(),
            });
        }

        if self.downtime.min_duration_minutes < 0 {
            return Err(ConfigError::SinkConfigError {
                field: "downtime.min_duration_minutes".to_string(),
                message: "不能为负".to_string(),
            });
        }

        Ok(())
    }

    /// 单台设备校验
    fn validate_device(device: &DeviceDescriptor) -> ConfigResult<()> {
        let field_err = |field: &str, message: &str| ConfigError::FieldValueError {
            device_id: device.device_id.clone(),
            field: field.to_string(),
            message: message.to_string(),
        };

        if device.device_id.trim().is_empty() {
            return Err(field_err("device_id", "不能为空"));
        }
        if device.host.trim().is_empty() {
            return Err(field_err("host", "不能为空"));
        }
        if device.timeout_ms == 0 {
            return Err(field_err("timeout_ms", "必须大于 0"));
        }
        if device.poll_interval_ms == 0 {
            return Err(field_err("poll_interval_ms", "必须大于 0"));
        }

        if device.enabled_channels().next().is_none() {
            return Err(ConfigError::NoEnabledChannels {
                device_id: device.device_id.clone(),
            });
        }

        let mut seen_channels: HashSet<u16> = HashSet::new();
        for channel in &device.channels {
            if !seen_channels.insert(channel.channel) {
                return Err(ConfigError::DuplicateChannel {
                    device_id: device.device_id.clone(),
                    channel: channel.channel,
                });
            }
            if channel.scale_factor <= 0.0 {
                return Err(field_err(
                    &format!("channels[{}].scale_factor", channel.channel),
                    "必须大于 0",
                ));
            }
            if !(1..=2).contains(&channel.register_count) {
                return Err(field_err(
                    &format!("channels[{}].register_count", channel.channel),
                    "只支持 1 或 2 个寄存器",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChannelConfig;

    fn sample_channel(channel: u16) -> ChannelConfig {
        ChannelConfig {
            channel,
            start_register: channel * 2,
            register_count: 2,
            scale_factor: 1.0,
            enabled: true,
        }
    }

    fn sample_device(device_id: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            device_id: device_id.to_string(),
            host: "127.0.0.1".to_string(),
            port: 502,
            unit_id: 1,
            channels: vec![sample_channel(0), sample_channel(1)],
            timeout_ms: 3000,
            max_retries: 3,
            poll_interval_ms: 5000,
            retry_delay_ms: 1000,
        }
    }

    fn sample_config() -> AppConfig {
        AppConfig {
            devices: vec![sample_device("adam-01")],
            sink: SinkConfig::default(),
            downtime: DowntimeConfig::default(),
            max_concurrent_devices: 32,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_empty_device_list_rejected() {
        let mut config = sample_config();
        config.devices.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyDeviceList)
        ));
    }

    #[test]
    fn test_duplicate_device_id_rejected() {
        let mut config = sample_config();
        config.devices.push(sample_device("adam-01"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateDeviceId { .. })
        ));
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let mut config = sample_config();
        config.devices[0].channels.push(sample_channel(1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateChannel { channel: 1, .. })
        ));
    }

    #[test]
    fn test_zero_scale_factor_rejected() {
        let mut config = sample_config();
        config.devices[0].channels[0].scale_factor = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FieldValueError { .. })
        ));
    }

    #[test]
    fn test_bad_register_count_rejected() {
        let mut config = sample_config();
        config.devices[0].channels[0].register_count = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FieldValueError { .. })
        ));
    }

    #[test]
    fn test_all_channels_disabled_rejected() {
        let mut config = sample_config();
        for ch in &mut config.devices[0].channels {
            ch.enabled = false;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoEnabledChannels { .. })
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = sample_config();
        config.sink.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SinkConfigError { .. })
        ));
    }
}
