// ==========================================
// 产线计数遥测采集核心 - 领域类型
// ==========================================
// 职责: 类型安全的枚举定义
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// QualityFlag - 读数质量标志
// ==========================================

/// 读数质量标志
///
/// 数据质量问题永不抛错，一律以质量标志随读数下发
/// 判定优先级: OutOfRange > Bad > Stale > Overflow > Good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityFlag {
    /// 正常读数
    Good,
    /// 本周期发生计数器回绕，增量已按寄存器位宽校正
    Overflow,
    /// 距上次采样超过 3 倍轮询间隔，数据陈旧
    Stale,
    /// 原始值超出通道寄存器位宽上限
    OutOfRange,
    /// 传感器抖动复现或时间戳倒退，读数不可信
    Bad,
}

impl QualityFlag {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            QualityFlag::Good => "Good",
            QualityFlag::Overflow => "Overflow",
            QualityFlag::Stale => "Stale",
            QualityFlag::OutOfRange => "OutOfRange",
            QualityFlag::Bad => "Bad",
        }
    }
}

// ==========================================
// DeviceHealth - 设备健康状态
// ==========================================

/// 设备健康状态
///
/// 状态机: Connected → (瞬时I/O错误) → Degraded
///        → (重试耗尽) → Disconnected → (下次成功) → Connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceHealth {
    /// 连接正常
    Connected,
    /// 出现瞬时故障，仍在重试
    Degraded,
    /// 本周期重试耗尽，等待下个轮询周期再试
    Disconnected,
}

impl DeviceHealth {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            DeviceHealth::Connected => "Connected",
            DeviceHealth::Degraded => "Degraded",
            DeviceHealth::Disconnected => "Disconnected",
        }
    }
}

// ==========================================
// JobStatus - 作业状态
// ==========================================

/// 作业状态
///
/// 终态: Completed / Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// 已计划
    Planned,
    /// 进行中 (每条产线同一时刻至多一个)
    Active,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl JobStatus {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Planned => "Planned",
            JobStatus::Active => "Active",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}
