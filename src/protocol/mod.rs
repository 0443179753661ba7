// ==========================================
// 产线计数遥测采集核心 - 协议层
// ==========================================
// 职责: Modbus TCP 寄存器读取 (遥测所需的读操作子集)
// 红线: 协议异常响应与 I/O 超时同属可重试故障类
// ==========================================

pub mod client;
pub mod decoder;
pub mod error;
pub mod frame;

pub use client::ModbusClient;
pub use decoder::decode_counter;
pub use error::{ProtocolError, ProtocolResult};
pub use frame::{FunctionCode, ReadRequest};
