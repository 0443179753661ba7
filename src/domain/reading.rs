// ==========================================
// 产线计数遥测采集核心 - 采样与读数领域模型
// ==========================================
// 红线: 读数为不可变值对象，按 (设备,通道) 流时间戳非降序产出
//       时间戳倒退标记 Bad，绝不静默重排
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::QualityFlag;

// ==========================================
// RawSample - 原始采样
// ==========================================
// 每个轮询周期每通道一条，交给计数器状态跟踪器后即丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub device_id: String,         // 设备ID
    pub channel: u16,              // 通道号
    pub timestamp: DateTime<Utc>,  // 墙钟时间戳
    pub raw_value: u64,            // 寄存器原始无符号值
}

// ==========================================
// CounterReading - 校正后读数
// ==========================================
// 每次成功轮询每通道恰好产出一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterReading {
    pub device_id: String,         // 设备ID
    pub channel: u16,              // 通道号
    pub timestamp: DateTime<Utc>,  // 墙钟时间戳
    pub delta: f64,                // 回绕校正后的累计增量 (原始计数)
    pub rate: f64,                 // 瞬时速率 (增量 × 比例系数 / 秒)
    pub quality: QualityFlag,      // 质量标志
}

impl CounterReading {
    /// 判断是否正在生产 (速率大于零)
    pub fn is_producing(&self) -> bool {
        self.rate > 0.0
    }
}

// ==========================================
// RatePoint - 速率序列点
// ==========================================
// 停机检测器的输入: 按时间戳升序排列的速率序列
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub timestamp: DateTime<Utc>,  // 采样时间戳
    pub rate: f64,                 // 瞬时速率
}

impl RatePoint {
    pub fn new(timestamp: DateTime<Utc>, rate: f64) -> Self {
        Self { timestamp, rate }
    }

    /// 判断是否正在生产
    pub fn is_producing(&self) -> bool {
        self.rate > 0.0
    }
}
