// ==========================================
// 测试辅助 - 进程内模拟计数设备
// ==========================================
// 职责: 在回环地址上模拟一台 Modbus TCP 计数设备
// 支持: FC03 读保持寄存器、异常响应注入、超时注入 (不回包)
// ==========================================

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// 设备行为注入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// 正常响应
    Normal,
    /// 收到请求后不回包 (模拟调用超时)
    Timeout,
    /// 回异常响应 (携带异常码)
    Exception(u8),
}

/// 进程内模拟设备
pub struct FakeDevice {
    addr: SocketAddr,
    registers: Arc<Mutex<Vec<u16>>>,
    behavior: Arc<Mutex<Behavior>>,
}

impl FakeDevice {
    /// 启动模拟设备，监听回环随机端口
    pub async fn spawn(registers: Vec<u16>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registers = Arc::new(Mutex::new(registers));
        let behavior = Arc::new(Mutex::new(Behavior::Normal));

        let reg_clone = registers.clone();
        let behavior_clone = behavior.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(serve_connection(
                    stream,
                    reg_clone.clone(),
                    behavior_clone.clone(),
                ));
            }
        });

        Self {
            addr,
            registers,
            behavior,
        }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// 设置 32 位计数器值 (低字在前，写入 channel × 2 起始的两个寄存器)
    pub fn set_counter(&self, channel: u16, value: u32) {
        let mut regs = self.registers.lock().unwrap();
        let base = channel as usize * 2;
        regs[base] = (value & 0xFFFF) as u16;
        regs[base + 1] = (value >> 16) as u16;
    }

    /// 注入行为
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

/// 处理一条连接上的请求流
async fn serve_connection(
    mut stream: TcpStream,
    registers: Arc<Mutex<Vec<u16>>>,
    behavior: Arc<Mutex<Behavior>>,
) {
    // 读寄存器请求定长 12 字节: MBAP 7 + PDU 5
    let mut request = [0u8; 12];
    loop {
        if stream.read_exact(&mut request).await.is_err() {
            return;
        }

        let transaction_id = [request[0], request[1]];
        let unit_id = request[6];
        let function = request[7];
        let start = u16::from_be_bytes([request[8], request[9]]) as usize;
        let count = u16::from_be_bytes([request[10], request[11]]) as usize;

        let current = *behavior.lock().unwrap();
        let response = match current {
            // 不回包，让客户端超时
            Behavior::Timeout => continue,
            Behavior::Exception(code) => {
                let mut frame = Vec::with_capacity(9);
                frame.extend_from_slice(&transaction_id);
                frame.extend_from_slice(&[0, 0, 0, 3]);
                frame.push(unit_id);
                frame.push(function | 0x80);
                frame.push(code);
                frame
            }
            Behavior::Normal => {
                let regs = registers.lock().unwrap();
                let words: Vec<u16> = regs
                    .iter()
                    .skip(start)
                    .take(count)
                    .copied()
                    .collect();
                drop(regs);

                let byte_count = (words.len() * 2) as u8;
                let length = (3 + words.len() * 2) as u16;
                let mut frame = Vec::with_capacity(9 + words.len() * 2);
                frame.extend_from_slice(&transaction_id);
                frame.extend_from_slice(&[0, 0]);
                frame.extend_from_slice(&length.to_be_bytes());
                frame.push(unit_id);
                frame.push(function);
                frame.push(byte_count);
                for word in words {
                    frame.extend_from_slice(&word.to_be_bytes());
                }
                frame
            }
        };

        if stream.write_all(&response).await.is_err() {
            return;
        }
    }
}
