// ==========================================
// 产线计数遥测采集核心 - Modbus TCP 报文编解码
// ==========================================
// 职责: MBAP 报文头 + 读寄存器 PDU 的构造与解析
// 范围: 仅实现遥测所需的 FC03/FC04 读操作
// ==========================================

use crate::protocol::error::{ProtocolError, ProtocolResult};

/// MBAP 报文头长度 (事务ID 2 + 协议ID 2 + 长度 2 + 从站号 1)
pub const MBAP_HEADER_LEN: usize = 7;

/// Modbus 协议ID (TCP 固定为 0)
const MODBUS_PROTOCOL_ID: u16 = 0;

/// 异常响应标志位
const EXCEPTION_FLAG: u8 = 0x80;

/// 单次读取的最大寄存器字数 (Modbus 规范上限)
pub const MAX_READ_WORDS: u16 = 125;

// ==========================================
// FunctionCode - 功能码
// ==========================================

/// 读寄存器功能码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// FC03 读保持寄存器
    ReadHoldingRegisters,
    /// FC04 读输入寄存器
    ReadInputRegisters,
}

impl FunctionCode {
    pub fn as_u8(&self) -> u8 {
        match self {
            FunctionCode::ReadHoldingRegisters => 0x03,
            FunctionCode::ReadInputRegisters => 0x04,
        }
    }
}

// ==========================================
// ReadRequest - 读寄存器请求
// ==========================================

/// 读寄存器请求 (host, port 之外的全部寻址要素)
#[derive(Debug, Clone, Copy)]
pub struct ReadRequest {
    pub transaction_id: u16,   // 事务ID (响应必须回显)
    pub unit_id: u8,           // 从站号
    pub function: FunctionCode, // 功能码
    pub start_register: u16,   // 起始寄存器
    pub count: u16,            // 寄存器字数
}

impl ReadRequest {
    /// 编码为完整的 Modbus TCP 请求帧 (MBAP + PDU)
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(MBAP_HEADER_LEN + 5);
        // MBAP 报文头
        frame.extend_from_slice(&self.transaction_id.to_be_bytes());
        frame.extend_from_slice(&MODBUS_PROTOCOL_ID.to_be_bytes());
        // 长度 = 从站号 1 字节 + PDU 5 字节
        frame.extend_from_slice(&6u16.to_be_bytes());
        frame.push(self.unit_id);
        // PDU
        frame.push(self.function.as_u8());
        frame.extend_from_slice(&self.start_register.to_be_bytes());
        frame.extend_from_slice(&self.count.to_be_bytes());
        frame
    }
}

// ==========================================
// 响应解析
// ==========================================

/// 解析 MBAP 报文头
///
/// # 返回
/// - (事务ID, 后续字节数): 后续字节数含从站号与 PDU
pub fn parse_mbap(header: &[u8]) -> ProtocolResult<(u16, usize)> {
    if header.len() != MBAP_HEADER_LEN {
        return Err(ProtocolError::Malformed(format!(
            "MBAP 报文头长度错误: {}",
            header.len()
        )));
    }

    let transaction_id = u16::from_be_bytes([header[0], header[1]]);
    let protocol_id = u16::from_be_bytes([header[2], header[3]]);
    if protocol_id != MODBUS_PROTOCOL_ID {
        return Err(ProtocolError::Malformed(format!(
            "协议ID错误: {}",
            protocol_id
        )));
    }

    let length = u16::from_be_bytes([header[4], header[5]]) as usize;
    if length < 2 {
        return Err(ProtocolError::Malformed(format!("报文长度错误: {}", length)));
    }

    // 长度字段含从站号，报文头第 7 字节即从站号，剩余 length-1 字节为 PDU
    Ok((transaction_id, length - 1))
}

/// 解析读寄存器响应 PDU
///
/// # 参数
/// - pdu: 功能码开始的响应体
/// - request: 对应的请求 (用于校验功能码与字数)
///
/// # 返回
/// - Ok(Vec<u16>): count 个 16 位寄存器字
/// - Err: 异常响应或格式错误 (与超时同属可重试故障类)
pub fn parse_read_response(pdu: &[u8], request: &ReadRequest) -> ProtocolResult<Vec<u16>> {
    if pdu.is_empty() {
        return Err(ProtocolError::Malformed("空 PDU".to_string()));
    }

    let function = pdu[0];

    // 异常响应: 功能码最高位置位，第二字节为异常码
    if function == request.function.as_u8() | EXCEPTION_FLAG {
        let code = pdu.get(1).copied().unwrap_or(0);
        return Err(ProtocolError::Exception { function, code });
    }

    if function != request.function.as_u8() {
        return Err(ProtocolError::Malformed(format!(
            "功能码不匹配: expected={}, actual={}",
            request.function.as_u8(),
            function
        )));
    }

    if pdu.len() < 2 {
        return Err(ProtocolError::Malformed("响应缺少字节数字段".to_string()));
    }

    let byte_count = pdu[1] as usize;
    let expected_bytes = request.count as usize * 2;
    if byte_count != expected_bytes || pdu.len() != 2 + byte_count {
        return Err(ProtocolError::Malformed(format!(
            "响应字节数错误: expected={}, byte_count={}, pdu_len={}",
            expected_bytes,
            byte_count,
            pdu.len()
        )));
    }

    let words = pdu[2..]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(words)
}
