// ==========================================
// 产线计数遥测采集核心 - 核心库
// ==========================================
// 职责: 工业计数器遥测采集、速率换算、停机检测、作业互斥
// 技术栈: Tokio + Modbus TCP
// 系统定位: 遥测采集核心 (持久化/界面/鉴权均为外部协作方)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 设备清单与运行参数
pub mod config;

// 协议层 - Modbus TCP 寄存器读取
pub mod protocol;

// 引擎层 - 业务规则 (计数器状态/停机检测/作业互斥)
pub mod engine;

// 轮询层 - 设备轮询调度与连接池
pub mod poller;

// 汇出层 - 遥测数据缓冲与批量写出
pub mod sink;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeviceHealth, JobStatus, QualityFlag};

// 领域实体
pub use domain::{
    ChannelConfig, CounterReading, DeviceDescriptor, DowntimePeriod, EquipmentLine, Job,
    RatePoint, RawSample,
};

// 配置
pub use config::{AppConfig, ConfigError, DowntimeConfig, SinkConfig};

// 引擎
pub use engine::{
    CounterTracker, DowntimeDetector, GuardDecision, HealthEvent, HealthEventPublisher,
    JobSequencingGuard, NoOpEventPublisher, OptionalEventPublisher,
};

// 轮询与汇出
pub use poller::{DeviceHandle, PollScheduler};
pub use sink::{SinkError, TelemetrySink, TimeseriesWriter};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "产线计数遥测采集核心";
