// ==========================================
// 产线计数遥测采集核心 - 协议层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 连接类错误与协议类错误对轮询层而言是同一可重试故障类
// ==========================================

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    // ===== 连接错误 =====
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("调用超时 ({0:?})")]
    Timeout(std::time::Duration),

    #[error("连接已关闭")]
    ConnectionClosed,

    // ===== 协议错误 =====
    #[error("Modbus 异常响应: function={function}, exception_code={code}")]
    Exception { function: u8, code: u8 },

    #[error("报文格式错误: {0}")]
    Malformed(String),

    #[error("事务ID不匹配: expected={expected}, actual={actual}")]
    TransactionMismatch { expected: u16, actual: u16 },

    // ===== 解码错误 =====
    #[error("寄存器字数错误: expected={expected}, actual={actual}")]
    WordCountMismatch { expected: usize, actual: usize },
}

impl ProtocolError {
    /// 判断是否为连接级故障 (需要重建连接后再重试)
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(_)
                | ProtocolError::Timeout(_)
                | ProtocolError::ConnectionClosed
        )
    }
}

/// Result 类型别名
pub type ProtocolResult<T> = Result<T, ProtocolError>;
