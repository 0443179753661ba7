// ==========================================
// 产线计数遥测采集核心 - 主入口
// ==========================================
// 职责: 加载配置 → 启动轮询调度器与遥测汇出 → 等待停机信号
// 说明: 真实部署中时序库适配器与监控层由外部装配；
//       本入口以 NDJSON 标准输出写出读数、以日志发布健康事件
// ==========================================

use std::error::Error;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use oee_telemetry::engine::events::{HealthEvent, HealthEventPublisher};
use oee_telemetry::sink::{SinkError, SinkResult, TelemetrySink, TimeseriesWriter};
use oee_telemetry::{
    AppConfig, CounterReading, OptionalEventPublisher, PollScheduler, logging,
};

/// 读数通道容量 (全部设备任务共享)
const READING_CHANNEL_CAPACITY: usize = 1024;

// ==========================================
// 缺省适配器
// ==========================================

/// NDJSON 标准输出写入者 (外部时序库适配器的缺省替身)
struct StdoutJsonWriter;

#[async_trait]
impl TimeseriesWriter for StdoutJsonWriter {
    async fn write_batch(&self, readings: &[CounterReading]) -> SinkResult<()> {
        for reading in readings {
            let line = serde_json::to_string(reading)
                .map_err(|e| SinkError::WriteFailed(e.to_string()))?;
            println!("{}", line);
        }
        Ok(())
    }
}

/// 以日志输出健康事件的发布者
struct LoggingEventPublisher;

impl HealthEventPublisher for LoggingEventPublisher {
    fn publish(&self, event: HealthEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::warn!(
            "设备健康事件: device_id={}, {} → {}, detail={:?}",
            event.device_id,
            event.previous.as_str(),
            event.current.as_str(),
            event.detail
        );
        Ok(())
    }
}

// ==========================================
// 主入口
// ==========================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", oee_telemetry::APP_NAME);
    tracing::info!("系统版本: {}", oee_telemetry::VERSION);
    tracing::info!("==================================================");

    // 配置路径: 第一个命令行参数，缺省回退环境变量与当前目录
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OEE_TELEMETRY_CONFIG").ok())
        .unwrap_or_else(|| "oee_telemetry.json".to_string());

    tracing::info!("加载配置: {}", config_path);
    let config = AppConfig::from_file(&config_path)
        .with_context(|| format!("配置加载失败: {}", config_path))?;
    tracing::info!(
        "配置校验通过: devices={}, sink.batch_size={}",
        config.devices.len(),
        config.sink.batch_size
    );

    // 停机信号
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 遥测汇出
    let (reading_tx, reading_rx) = mpsc::channel(READING_CHANNEL_CAPACITY);
    let sink = TelemetrySink::new(config.sink.clone(), Arc::new(StdoutJsonWriter));
    let sink_task = tokio::spawn(sink.run(reading_rx, shutdown_rx.clone()));

    // 轮询调度器 (配置无效时拒绝启动)
    let publisher = OptionalEventPublisher::with_publisher(Arc::new(LoggingEventPublisher));
    let scheduler = PollScheduler::new(config, publisher).context("轮询调度器启动失败")?;
    let poller = scheduler.start(reading_tx, shutdown_rx);

    // 等待 Ctrl-C
    tokio::signal::ctrl_c()
        .await
        .context("停机信号监听失败")?;
    tracing::info!("收到停机信号，正在退出...");

    shutdown_tx.send(true).ok();
    poller.join().await;
    sink_task.await.ok();

    tracing::info!("已干净退出");
    Ok(())
}
