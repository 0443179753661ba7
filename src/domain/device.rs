// ==========================================
// 产线计数遥测采集核心 - 设备描述领域模型
// ==========================================
// 红线: 启动加载后只读，核心生命周期内不可变
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==========================================
// ChannelConfig - 采集通道
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel: u16,              // 通道号 (设备内唯一)
    pub start_register: u16,       // 起始寄存器地址
    pub register_count: u16,       // 寄存器个数 (1=16位计数器, 2=32位计数器)
    pub scale_factor: f64,         // 比例系数 (>0)
    #[serde(default = "default_enabled")]
    pub enabled: bool,             // 启用标志
}

fn default_enabled() -> bool {
    true
}

impl ChannelConfig {
    /// 通道计数器的最大原始值 (按寄存器位宽)
    pub fn max_raw_value(&self) -> u64 {
        match self.register_count {
            1 => u64::from(u16::MAX),
            _ => u64::from(u32::MAX),
        }
    }
}

// ==========================================
// DeviceDescriptor - 设备描述
// ==========================================
// 每台物理设备一条描述，一台设备内的寄存器读取严格串行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_id: String,         // 设备ID
    pub host: String,              // 网络地址
    pub port: u16,                 // 端口
    pub unit_id: u8,               // 从站号
    pub channels: Vec<ChannelConfig>, // 通道清单
    pub timeout_ms: u64,           // 单次调用超时 (毫秒)
    pub max_retries: u32,          // 单周期最大重试次数
    pub poll_interval_ms: u64,     // 轮询间隔 (毫秒)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,       // 重试退避基准 (毫秒，指数退避)
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl DeviceDescriptor {
    /// 单次调用超时
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 重试退避基准
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 已启用的通道 (按通道号顺序读取)
    pub fn enabled_channels(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.iter().filter(|c| c.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_raw_value_by_width() {
        let single = ChannelConfig {
            channel: 0,
            start_register: 0,
            register_count: 1,
            scale_factor: 1.0,
            enabled: true,
        };
        let double = ChannelConfig {
            register_count: 2,
            ..single.clone()
        };
        assert_eq!(single.max_raw_value(), 65_535);
        assert_eq!(double.max_raw_value(), 4_294_967_295);
    }
}
