// ==========================================
// 产线计数遥测采集核心 - 计数器状态跟踪器
// ==========================================
// 职责: 原始采样 → 校正读数
// - 按 (设备,通道) 维护上次原始值与时间戳
// - 检测硬件计数器回绕并校正增量
// - 换算瞬时速率并赋质量标志
// 红线: 通道状态归属本设备任务独占，绝不跨任务共享
// ==========================================

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::domain::types::QualityFlag;
use crate::domain::{ChannelConfig, CounterReading, RawSample};

/// 抖动容差缺省值 (原始计数)
///
/// 10 个计数足以吸收单寄存器毛刺，
/// 而真实回绕时 prev 接近计数器上限，回退幅度远大于此值
pub const DEFAULT_JITTER_TOLERANCE: u64 = 10;

/// 陈旧判定倍数: 距上次采样超过 3 倍轮询间隔即为 Stale
const STALE_INTERVAL_FACTOR: u32 = 3;

// ==========================================
// ChannelState - 通道内部状态
// ==========================================
#[derive(Debug, Clone)]
struct ChannelState {
    last_raw: u64,
    last_timestamp: chrono::DateTime<chrono::Utc>,
    jitter_streak: u32,
}

// ==========================================
// CounterTracker - 计数器状态跟踪器
// ==========================================
pub struct CounterTracker {
    states: HashMap<(String, u16), ChannelState>,
    jitter_tolerance: u64,
}

impl Default for CounterTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterTracker {
    /// 创建新的跟踪器 (缺省抖动容差)
    pub fn new() -> Self {
        Self::with_jitter_tolerance(DEFAULT_JITTER_TOLERANCE)
    }

    /// 创建指定抖动容差的跟踪器
    pub fn with_jitter_tolerance(jitter_tolerance: u64) -> Self {
        Self {
            states: HashMap::new(),
            jitter_tolerance,
        }
    }

    /// 处理一条原始采样，产出恰好一条校正读数
    ///
    /// # 算法
    /// 设 max 为通道寄存器位宽上限 (2^16−1 或 2^32−1)，prev/cur 为上次与本次原始值:
    /// - cur ≥ prev: delta = cur − prev (正常递增)
    /// - cur < prev 且回退幅度超过容差: 回绕, delta = (max − prev + 1) + cur
    /// - cur < prev 且在容差内: 传感器抖动, delta = 0，连续复现标记 Bad
    ///
    /// rate = delta × scale_factor / 经过秒数
    ///
    /// # 质量标志优先级
    /// OutOfRange > Bad > Stale > Overflow > Good
    pub fn process(
        &mut self,
        channel: &ChannelConfig,
        poll_interval: Duration,
        sample: &RawSample,
    ) -> CounterReading {
        let max = channel.max_raw_value();

        // 超出寄存器位宽: 不纳入状态，直接标记 OutOfRange
        if sample.raw_value > max {
            warn!(
                "原始值超出位宽: device_id={}, channel={}, raw={}, max={}",
                sample.device_id, sample.channel, sample.raw_value, max
            );
            return Self::reading(sample, 0.0, 0.0, QualityFlag::OutOfRange);
        }

        let key = (sample.device_id.clone(), sample.channel);
        let Some(state) = self.states.get_mut(&key) else {
            // 首样基线: delta=0, rate=0, Good
            self.states.insert(
                key,
                ChannelState {
                    last_raw: sample.raw_value,
                    last_timestamp: sample.timestamp,
                    jitter_streak: 0,
                },
            );
            return Self::reading(sample, 0.0, 0.0, QualityFlag::Good);
        };

        // 时间戳倒退意味着时钟或设备故障: 标记 Bad，状态不回滚，绝不重排
        if sample.timestamp < state.last_timestamp {
            warn!(
                "时间戳倒退: device_id={}, channel={}, last={}, current={}",
                sample.device_id, sample.channel, state.last_timestamp, sample.timestamp
            );
            return Self::reading(sample, 0.0, 0.0, QualityFlag::Bad);
        }

        let elapsed_seconds =
            (sample.timestamp - state.last_timestamp).num_milliseconds() as f64 / 1000.0;

        let prev = state.last_raw;
        let cur = sample.raw_value;

        let mut wrapped = false;
        let mut jitter = false;
        let raw_delta: u64 = if cur >= prev {
            cur - prev
        } else if prev - cur > self.jitter_tolerance {
            // 回绕校正: 从 prev 递增到 max 的剩余量 + 归零后的 cur
            wrapped = true;
            (max - prev + 1) + cur
        } else {
            // 容差内回退视为传感器抖动，增量记零
            jitter = true;
            0
        };

        let delta = raw_delta as f64;
        let rate = if elapsed_seconds > 0.0 {
            delta * channel.scale_factor / elapsed_seconds
        } else {
            0.0
        };

        let stale_threshold =
            poll_interval.as_secs_f64() * f64::from(STALE_INTERVAL_FACTOR);
        let stale = elapsed_seconds > stale_threshold;

        // 更新通道状态
        // 抖动时保留 last_raw: 以回退后的值为基准会在恢复时虚增产量
        if jitter {
            state.jitter_streak += 1;
        } else {
            state.last_raw = cur;
            state.jitter_streak = 0;
        }
        let jitter_recurs = state.jitter_streak >= 2;
        state.last_timestamp = sample.timestamp;

        let quality = if jitter_recurs {
            QualityFlag::Bad
        } else if stale {
            QualityFlag::Stale
        } else if wrapped {
            QualityFlag::Overflow
        } else {
            QualityFlag::Good
        };

        Self::reading(sample, delta, rate, quality)
    }

    /// 已跟踪的 (设备,通道) 数量
    pub fn tracked_channels(&self) -> usize {
        self.states.len()
    }

    fn reading(sample: &RawSample, delta: f64, rate: f64, quality: QualityFlag) -> CounterReading {
        CounterReading {
            device_id: sample.device_id.clone(),
            channel: sample.channel,
            timestamp: sample.timestamp,
            delta,
            rate,
            quality,
        }
    }
}
