// ==========================================
// 产线计数遥测采集核心 - 遥测汇出层
// ==========================================
// 职责: 缓冲校正读数，按批量阈值或定时间隔冲刷到外部时序库
// 红线: 汇出缓冲是全部设备任务唯一共享的状态 (mpsc 安全队列)
//       批内绝不重排；冲刷重试耗尽后显式记录丢弃并清空缓冲，
//       内存有界，数据丢失可观测、绝不无限排队
// ==========================================

pub mod error;

pub use error::{SinkError, SinkResult};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SinkConfig;
use crate::domain::CounterReading;

// ==========================================
// TimeseriesWriter - 外部时序库写入接口
// ==========================================

/// 时序库写入者 Trait
///
/// 汇出层定义，存储适配层实现 (依赖倒置)
#[async_trait]
pub trait TimeseriesWriter: Send + Sync {
    /// 写入一批读数 (批内顺序即产出顺序)
    async fn write_batch(&self, readings: &[CounterReading]) -> SinkResult<()>;
}

// ==========================================
// TelemetrySink - 遥测汇出
// ==========================================
pub struct TelemetrySink {
    config: SinkConfig,
    writer: Arc<dyn TimeseriesWriter>,
}

impl TelemetrySink {
    pub fn new(config: SinkConfig, writer: Arc<dyn TimeseriesWriter>) -> Self {
        Self { config, writer }
    }

    /// 运行汇出循环
    ///
    /// 触发冲刷的条件 (先到先触发):
    /// - 缓冲达到 batch_size
    /// - 距上次冲刷经过 flush_interval
    ///
    /// 循环退出条件: 全部生产端关闭，或收到停机信号；
    /// 退出前对残余缓冲做最后一次尽力冲刷
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<CounterReading>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut buffer: Vec<CounterReading> = Vec::with_capacity(self.config.batch_size);
        let mut ticker = tokio::time::interval(self.config.flush_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval 的首个 tick 立即到期，此时缓冲为空，自然跳过

        info!(
            "遥测汇出已启动: batch_size={}, flush_interval={:?}",
            self.config.batch_size,
            self.config.flush_interval()
        );

        loop {
            tokio::select! {
                maybe_reading = rx.recv() => {
                    match maybe_reading {
                        Some(reading) => {
                            buffer.push(reading);
                            if buffer.len() >= self.config.batch_size {
                                self.flush(&mut buffer, &mut shutdown).await;
                                // 定时器从本次冲刷重新起算
                                ticker.reset();
                            }
                        }
                        // 全部生产端已关闭
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !buffer.is_empty() {
                        self.flush(&mut buffer, &mut shutdown).await;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        // 停机前最后一次尽力冲刷
        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut shutdown).await;
        }
        info!("遥测汇出已停止");
    }

    /// 冲刷当前缓冲
    ///
    /// 失败按指数退避重试至多 max_retries 次；
    /// 仍失败则记录丢弃 (批次ID + 条数) 并清空缓冲
    async fn flush(
        &self,
        buffer: &mut Vec<CounterReading>,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        let batch_id = Uuid::new_v4();
        let count = buffer.len();

        for attempt in 0..=self.config.max_retries {
            match self.writer.write_batch(buffer).await {
                Ok(()) => {
                    debug!("批量写出成功: batch_id={}, count={}", batch_id, count);
                    buffer.clear();
                    return;
                }
                Err(e) => {
                    warn!(
                        "批量写出失败 (attempt {}/{}): batch_id={}, error={}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        batch_id,
                        e
                    );
                }
            }

            if attempt < self.config.max_retries {
                let backoff = self.config.retry_delay() * 2u32.saturating_pow(attempt);
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    // 停机信号中断重试，立即进入丢弃路径
                    _ = shutdown.changed() => break,
                }
            }
        }

        // 数据丢失显式可观测: 丢弃后清空缓冲以保证内存有界
        error!(
            "批量写出重试耗尽，丢弃批次: batch_id={}, lost_count={}",
            batch_id, count
        );
        buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::domain::types::QualityFlag;

    fn reading(n: u16) -> CounterReading {
        CounterReading {
            device_id: "adam-01".to_string(),
            channel: n,
            timestamp: Utc::now(),
            delta: 1.0,
            rate: 1.0,
            quality: QualityFlag::Good,
        }
    }

    /// 记录每批大小的写入者，可注入前 N 次失败
    struct RecordingWriter {
        batches: Mutex<Vec<Vec<u16>>>,
        fail_first: AtomicU32,
    }

    impl RecordingWriter {
        fn new(fail_first: u32) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_first: AtomicU32::new(fail_first),
            }
        }
    }

    #[async_trait]
    impl TimeseriesWriter for RecordingWriter {
        async fn write_batch(&self, readings: &[CounterReading]) -> SinkResult<()> {
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(SinkError::WriteFailed("注入失败".to_string()));
            }
            self.batches
                .lock()
                .unwrap()
                .push(readings.iter().map(|r| r.channel).collect());
            Ok(())
        }
    }

    fn test_config(batch_size: usize, flush_interval_ms: u64) -> SinkConfig {
        SinkConfig {
            batch_size,
            flush_interval_ms,
            max_retries: 2,
            retry_delay_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_size_triggered_flush_preserves_order() {
        let writer = Arc::new(RecordingWriter::new(0));
        let sink = TelemetrySink::new(test_config(3, 60_000), writer.clone());
        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(sink.run(rx, shutdown_rx));
        for n in 0..3u16 {
            tx.send(reading(n)).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();
        let _ = shutdown_tx;

        let batches = writer.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        // 批内顺序即产出顺序
        assert_eq!(batches[0], vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_timer_triggered_partial_flush() {
        let writer = Arc::new(RecordingWriter::new(0));
        let sink = TelemetrySink::new(test_config(100, 50), writer.clone());
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(sink.run(rx, shutdown_rx));
        tx.send(reading(0)).await.unwrap();
        tx.send(reading(1)).await.unwrap();

        // 等待定时冲刷
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        drop(tx);
        handle.await.unwrap();

        let batches = writer.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        // 前 1 次失败，重试后成功，数据不丢
        let writer = Arc::new(RecordingWriter::new(1));
        let sink = TelemetrySink::new(test_config(2, 60_000), writer.clone());
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(sink.run(rx, shutdown_rx));
        tx.send(reading(0)).await.unwrap();
        tx.send(reading(1)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let batches = writer.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_drop_batch_and_continue() {
        // 前 3 次全失败 (1 次原始 + 2 次重试) → 首批丢弃，后续批仍可写出
        let writer = Arc::new(RecordingWriter::new(3));
        let sink = TelemetrySink::new(test_config(2, 60_000), writer.clone());
        let (tx, rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(sink.run(rx, shutdown_rx));
        for n in 0..4u16 {
            tx.send(reading(n)).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        let batches = writer.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![2, 3]);
    }
}
