// ==========================================
// 产线计数遥测采集核心 - 健康事件发布
// ==========================================
// 职责: 定义设备健康事件发布 trait，实现依赖倒置
// 说明: 引擎层定义 trait，外部监控/通知层实现适配器
// 优势: 轮询层不依赖任何具体监控实现
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

use crate::domain::types::DeviceHealth;

// ==========================================
// 健康事件类型
// ==========================================

/// 设备健康状态变更事件
///
/// 每次状态机发生迁移时恰好发布一条 (而非每次失败尝试一条)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEvent {
    /// 设备ID
    pub device_id: String,
    /// 迁移前状态
    pub previous: DeviceHealth,
    /// 迁移后状态
    pub current: DeviceHealth,
    /// 发生时间
    pub occurred_at: DateTime<Utc>,
    /// 触发原因描述
    pub detail: Option<String>,
}

impl HealthEvent {
    /// 创建状态迁移事件
    pub fn transition(
        device_id: String,
        previous: DeviceHealth,
        current: DeviceHealth,
        detail: Option<String>,
    ) -> Self {
        Self {
            device_id,
            previous,
            current,
            occurred_at: Utc::now(),
            detail,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 健康事件发布者 Trait
///
/// 引擎层定义，监控/通知层实现
/// 通过 trait 实现依赖倒置，解除轮询层对监控层的直接依赖
pub trait HealthEventPublisher: Send + Sync {
    /// 发布健康事件
    ///
    /// # 参数
    /// - `event`: 健康状态变更事件
    ///
    /// # 返回
    /// - `Err`: 发布失败 (轮询层只记录日志，不中断采集)
    fn publish(&self, event: HealthEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl HealthEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: HealthEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - device_id={}, {} → {}",
            event.device_id,
            event.previous.as_str(),
            event.current.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn HealthEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn HealthEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn HealthEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: HealthEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event) {
                tracing::warn!("健康事件发布失败: {}", e);
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
