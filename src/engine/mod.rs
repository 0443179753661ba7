// ==========================================
// 产线计数遥测采集核心 - 引擎层
// ==========================================
// 职责: 业务规则实现
// - CounterTracker: 计数器状态跟踪与回绕校正
// - DowntimeDetector: 停机区间检测
// - JobSequencingGuard: 作业互斥校验
// - 健康事件发布 (依赖倒置: 引擎定义 trait，监控层实现)
// ==========================================

pub mod downtime;
pub mod events;
pub mod guard;
pub mod tracker;

pub use downtime::DowntimeDetector;
pub use events::{HealthEvent, HealthEventPublisher, NoOpEventPublisher, OptionalEventPublisher};
pub use guard::{GuardDecision, JobSequencingGuard};
pub use tracker::CounterTracker;
