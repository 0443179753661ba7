// ==========================================
// 产线计数遥测采集核心 - 轮询层
// ==========================================
// 职责: 设备轮询调度与连接池
// - 每台设备一个独立轮询任务，设备间并行、设备内串行
// - 超时/重试/指数退避 + 健康状态机
// - 全局并发上限 (Semaphore) 约束同时活跃的设备任务数
// ==========================================

pub mod device;
pub mod scheduler;

pub use device::DeviceHandle;
pub use scheduler::{PollScheduler, PollerHandle};
