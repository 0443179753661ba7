// ==========================================
// 产线计数遥测采集核心 - 设备轮询任务
// ==========================================
// 职责: 单台设备的轮询循环
// - 每周期: 复用/重建连接 → 顺序读取各启用通道 → 解码 → 跟踪器校正 → 发往汇出
// - 健康状态机: Connected → Degraded → Disconnected → Connected
//   每次状态迁移恰好发布一条事件 (而非每次失败尝试一条)
// - 重试耗尽不终止循环: 设备标记 Disconnected，按轮询间隔继续尝试
// 红线: 通道状态 (上次原始值/时间戳) 归本任务独占；
//       设备内寄存器读取严格串行 (物理设备不支持并发读)
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch, Notify, Semaphore};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::types::DeviceHealth;
use crate::domain::{CounterReading, DeviceDescriptor, RawSample};
use crate::engine::events::{HealthEvent, OptionalEventPublisher};
use crate::engine::tracker::CounterTracker;
use crate::protocol::client::ModbusClient;
use crate::protocol::decoder::decode_counter;
use crate::protocol::error::{ProtocolError, ProtocolResult};
use crate::protocol::frame::FunctionCode;

// ==========================================
// DeviceHandle - 设备操作句柄
// ==========================================

/// 设备操作句柄
///
/// `restart()` 在轮询循环运行期间随时可安全调用:
/// 取消进行中的调用 (计为本周期失败)，下个周期强制重连
#[derive(Clone)]
pub struct DeviceHandle {
    device_id: String,
    restart: Arc<Notify>,
}

impl DeviceHandle {
    pub(crate) fn new(device_id: String, restart: Arc<Notify>) -> Self {
        Self { device_id, restart }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// 手动重启设备连接
    pub fn restart(&self) {
        info!("收到手动重启请求: device_id={}", self.device_id);
        self.restart.notify_one();
    }
}

// ==========================================
// HealthMachine - 设备健康状态机
// ==========================================
struct HealthMachine {
    device_id: String,
    current: DeviceHealth,
    publisher: OptionalEventPublisher,
}

impl HealthMachine {
    fn new(device_id: String, publisher: OptionalEventPublisher) -> Self {
        Self {
            device_id,
            // 初始视为健康，首次故障立即降级
            current: DeviceHealth::Connected,
            publisher,
        }
    }

    /// 瞬时故障: 仅从 Connected 降级到 Degraded
    /// (Disconnected 期间的持续失败不再产生迁移)
    fn on_transient_failure(&mut self, detail: String) {
        if self.current == DeviceHealth::Connected {
            self.transition(DeviceHealth::Degraded, Some(detail));
        }
    }

    /// 本周期重试耗尽: 标记 Disconnected
    fn on_cycle_failed(&mut self, detail: String) {
        if self.current != DeviceHealth::Disconnected {
            self.transition(DeviceHealth::Disconnected, Some(detail));
        }
    }

    /// 周期成功: 恢复 Connected
    fn on_cycle_succeeded(&mut self) {
        if self.current != DeviceHealth::Connected {
            self.transition(DeviceHealth::Connected, None);
        }
    }

    fn transition(&mut self, next: DeviceHealth, detail: Option<String>) {
        info!(
            "设备健康状态迁移: device_id={}, {} → {}",
            self.device_id,
            self.current.as_str(),
            next.as_str()
        );
        self.publisher.publish(HealthEvent::transition(
            self.device_id.clone(),
            self.current,
            next,
            detail,
        ));
        self.current = next;
    }
}

// ==========================================
// 设备轮询循环
// ==========================================

/// 运行单台设备的轮询循环，直到收到停机信号
pub(crate) async fn run_device_loop(
    descriptor: DeviceDescriptor,
    tx: mpsc::Sender<CounterReading>,
    publisher: OptionalEventPublisher,
    restart: Arc<Notify>,
    semaphore: Arc<Semaphore>,
    mut shutdown: watch::Receiver<bool>,
) {
    let device_id = descriptor.device_id.clone();
    let mut tracker = CounterTracker::new();
    let mut health = HealthMachine::new(device_id.clone(), publisher);
    let mut client: Option<ModbusClient> = None;

    let mut interval = tokio::time::interval(descriptor.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "设备轮询任务已启动: device_id={}, interval={:?}",
        device_id,
        descriptor.poll_interval()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }

        // 全局并发上限: 未取到许可前本设备不开始本周期
        let permit = tokio::select! {
            permit = semaphore.acquire() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
            _ = shutdown.changed() => break,
        };

        let cycle_start = Instant::now();
        tokio::select! {
            result = poll_cycle(&descriptor, &mut client, &mut tracker, &mut health, &tx) => {
                match result {
                    Ok(()) => health.on_cycle_succeeded(),
                    Err(e) => {
                        // 重试耗尽不终止循环，下个周期继续尝试
                        health.on_cycle_failed(e.to_string());
                        if let Some(c) = client.take() {
                            c.close().await;
                        }
                    }
                }
            }
            _ = restart.notified() => {
                // 手动重启: 取消进行中的调用，计为本周期失败，强制重连
                warn!("手动重启: 取消进行中的轮询周期: device_id={}", device_id);
                health.on_cycle_failed("手动重启".to_string());
                if let Some(c) = client.take() {
                    c.close().await;
                }
            }
            _ = shutdown.changed() => {
                // 停机取消: 计为本周期失败后干净退出
                debug!("停机信号中断轮询周期: device_id={}", device_id);
                break;
            }
        }
        drop(permit);

        let elapsed = cycle_start.elapsed();
        if elapsed > descriptor.poll_interval() {
            warn!(
                "轮询周期超过间隔: device_id={}, elapsed={:?}, interval={:?}",
                device_id,
                elapsed,
                descriptor.poll_interval()
            );
        }
    }

    if let Some(c) = client.take() {
        c.close().await;
    }
    info!("设备轮询任务已退出: device_id={}", device_id);
}

/// 执行一个轮询周期: 顺序读取全部启用通道
///
/// 任一通道重试耗尽即视为周期失败，跳过剩余通道
async fn poll_cycle(
    descriptor: &DeviceDescriptor,
    client: &mut Option<ModbusClient>,
    tracker: &mut CounterTracker,
    health: &mut HealthMachine,
    tx: &mpsc::Sender<CounterReading>,
) -> ProtocolResult<()> {
    for channel in descriptor.enabled_channels() {
        let raw_value = read_channel_with_retry(descriptor, channel, client, health).await?;

        let sample = RawSample {
            device_id: descriptor.device_id.clone(),
            channel: channel.channel,
            timestamp: Utc::now(),
            raw_value,
        };
        let reading = tracker.process(channel, descriptor.poll_interval(), &sample);

        debug!(
            "读数产出: device_id={}, channel={}, raw={}, delta={}, rate={:.3}, quality={}",
            descriptor.device_id,
            channel.channel,
            raw_value,
            reading.delta,
            reading.rate,
            reading.quality.as_str()
        );

        // 汇出端关闭只降低遥测可靠性，不中断采集
        if tx.send(reading).await.is_err() {
            warn!(
                "汇出通道已关闭，读数丢弃: device_id={}",
                descriptor.device_id
            );
        }
    }
    Ok(())
}

/// 读取单通道寄存器，带周期内有界重试与指数退避
///
/// 超时、连接错误与协议异常响应同属一个可重试故障类
async fn read_channel_with_retry(
    descriptor: &DeviceDescriptor,
    channel: &crate::domain::ChannelConfig,
    client: &mut Option<ModbusClient>,
    health: &mut HealthMachine,
) -> ProtocolResult<u64> {
    let mut last_error = ProtocolError::ConnectionClosed;

    for attempt in 0..=descriptor.max_retries {
        match read_channel_once(descriptor, channel, client).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    "通道读取失败 (attempt {}/{}): device_id={}, channel={}, error={}",
                    attempt + 1,
                    descriptor.max_retries + 1,
                    descriptor.device_id,
                    channel.channel,
                    e
                );
                health.on_transient_failure(e.to_string());
                // 连接级故障重建连接后再试；协议异常保留连接
                if e.is_connection_fault() {
                    if let Some(c) = client.take() {
                        c.close().await;
                    }
                }
                last_error = e;
            }
        }

        if attempt < descriptor.max_retries {
            let backoff = descriptor.retry_delay() * 2u32.saturating_pow(attempt);
            tokio::time::sleep(backoff).await;
        }
    }

    Err(last_error)
}

/// 单次通道读取 (必要时先建连)
async fn read_channel_once(
    descriptor: &DeviceDescriptor,
    channel: &crate::domain::ChannelConfig,
    client: &mut Option<ModbusClient>,
) -> ProtocolResult<u64> {
    if client.is_none() {
        *client = Some(
            ModbusClient::connect(&descriptor.host, descriptor.port, descriptor.call_timeout())
                .await?,
        );
    }
    let connection = client.as_mut().ok_or(ProtocolError::ConnectionClosed)?;

    let words = connection
        .read_registers(
            descriptor.unit_id,
            FunctionCode::ReadHoldingRegisters,
            channel.start_register,
            channel.register_count,
            descriptor.call_timeout(),
        )
        .await?;

    decode_counter(&words, channel.register_count)
}
