// ==========================================
// 产线计数遥测采集核心 - 汇出层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 汇出层错误类型
///
/// 写出失败属于瞬时故障: 有界重试后显式丢弃，绝不终止轮询
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("时序库写入失败: {0}")]
    WriteFailed(String),

    #[error("时序库不可用: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type SinkResult<T> = Result<T, SinkError>;
