// ==========================================
// 产线计数遥测采集核心 - 领域层
// ==========================================
// 职责: 领域实体与类型定义
// 红线: 纯值对象，无隐藏可变状态，无对象图导航
//       (实体间一律使用显式 id 引用)
// ==========================================

pub mod device;
pub mod downtime;
pub mod job;
pub mod reading;
pub mod types;

pub use device::{ChannelConfig, DeviceDescriptor};
pub use downtime::DowntimePeriod;
pub use job::{EquipmentLine, Job};
pub use reading::{CounterReading, RatePoint, RawSample};
