// ==========================================
// 产线计数遥测采集核心 - Modbus TCP 客户端
// ==========================================
// 职责: 单设备连接管理与寄存器读取
// 红线: 每次网络调用均受单次超时约束，可随时被取消
// ==========================================

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::frame::{
    parse_mbap, parse_read_response, FunctionCode, ReadRequest, MAX_READ_WORDS, MBAP_HEADER_LEN,
};

// ==========================================
// ModbusClient - 单设备 TCP 客户端
// ==========================================

/// Modbus TCP 客户端
///
/// 每台物理设备持有一个连接；设备内的寄存器读取严格串行，
/// 因此客户端不做任何请求并发处理
pub struct ModbusClient {
    stream: TcpStream,
    peer: String,
    transaction_id: u16,
}

impl ModbusClient {
    /// 建立连接
    ///
    /// # 参数
    /// - host/port: 设备网络地址
    /// - connect_timeout: 连接超时
    pub async fn connect(host: &str, port: u16, connect_timeout: Duration) -> ProtocolResult<Self> {
        let peer = format!("{}:{}", host, port);
        let stream = timeout(connect_timeout, TcpStream::connect(&peer))
            .await
            .map_err(|_| ProtocolError::Timeout(connect_timeout))??;

        stream.set_nodelay(true)?;
        debug!("已连接设备: {}", peer);

        Ok(Self {
            stream,
            peer,
            transaction_id: 0,
        })
    }

    /// 对端地址
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// 读取寄存器
    ///
    /// # 参数
    /// - unit_id: 从站号
    /// - function: 功能码 (FC03/FC04)
    /// - start_register: 起始寄存器
    /// - count: 寄存器字数
    /// - call_timeout: 单次调用超时 (覆盖请求写出与响应读取全程)
    ///
    /// # 返回
    /// - Ok(Vec<u16>): count 个寄存器字
    /// - Err: 超时/连接/协议错误，对轮询层同属一个可重试故障类
    pub async fn read_registers(
        &mut self,
        unit_id: u8,
        function: FunctionCode,
        start_register: u16,
        count: u16,
        call_timeout: Duration,
    ) -> ProtocolResult<Vec<u16>> {
        if count == 0 || count > MAX_READ_WORDS {
            return Err(ProtocolError::Malformed(format!(
                "寄存器字数非法: {}",
                count
            )));
        }

        self.transaction_id = self.transaction_id.wrapping_add(1);
        let request = ReadRequest {
            transaction_id: self.transaction_id,
            unit_id,
            function,
            start_register,
            count,
        };

        timeout(call_timeout, self.exchange(&request))
            .await
            .map_err(|_| ProtocolError::Timeout(call_timeout))?
    }

    /// 执行一次请求/响应交换
    async fn exchange(&mut self, request: &ReadRequest) -> ProtocolResult<Vec<u16>> {
        let frame = request.encode();
        self.stream.write_all(&frame).await?;

        let mut header = [0u8; MBAP_HEADER_LEN];
        self.read_exact(&mut header).await?;
        let (transaction_id, pdu_len) = parse_mbap(&header)?;

        if transaction_id != request.transaction_id {
            return Err(ProtocolError::TransactionMismatch {
                expected: request.transaction_id,
                actual: transaction_id,
            });
        }

        let mut pdu = vec![0u8; pdu_len];
        self.read_exact(&mut pdu).await?;

        parse_read_response(&pdu, request)
    }

    /// 读满缓冲区，连接被对端关闭时返回 ConnectionClosed
    async fn read_exact(&mut self, buf: &mut [u8]) -> ProtocolResult<()> {
        let mut read = 0;
        while read < buf.len() {
            let n = self.stream.read(&mut buf[read..]).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            read += n;
        }
        Ok(())
    }

    /// 关闭连接 (尽力而为)
    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
        debug!("连接已关闭: {}", self.peer);
    }
}
