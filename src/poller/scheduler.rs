// ==========================================
// 产线计数遥测采集核心 - 轮询调度器
// ==========================================
// 职责: 按设备清单派生轮询任务
// 红线: 配置校验失败必须阻止调度器启动 (致命错误)，
//       绝不带病进入轮询周期
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, watch, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{AppConfig, ConfigResult};
use crate::domain::CounterReading;
use crate::engine::events::OptionalEventPublisher;
use crate::poller::device::{run_device_loop, DeviceHandle};

// ==========================================
// PollScheduler - 轮询调度器
// ==========================================
pub struct PollScheduler {
    config: AppConfig,
    publisher: OptionalEventPublisher,
}

impl PollScheduler {
    /// 创建调度器
    ///
    /// # 返回
    /// - Err(ConfigError): 配置校验失败，调度器拒绝启动
    pub fn new(config: AppConfig, publisher: OptionalEventPublisher) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config, publisher })
    }

    /// 启动全部设备轮询任务
    ///
    /// # 并发模型
    /// - 设备间完全并行 (每设备一个任务)，设备内严格串行
    /// - Semaphore 约束同时活跃的设备任务数 (max_concurrent_devices)
    ///
    /// # 参数
    /// - tx: 读数汇出通道 (全部任务共享的唯一队列)
    /// - shutdown: 停机信号
    pub fn start(
        &self,
        tx: mpsc::Sender<CounterReading>,
        shutdown: watch::Receiver<bool>,
    ) -> PollerHandle {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_devices));
        let mut handles = HashMap::new();
        let mut tasks = Vec::with_capacity(self.config.devices.len());

        for descriptor in self.config.devices.clone() {
            let restart = Arc::new(Notify::new());
            handles.insert(
                descriptor.device_id.clone(),
                DeviceHandle::new(descriptor.device_id.clone(), restart.clone()),
            );

            tasks.push(tokio::spawn(run_device_loop(
                descriptor,
                tx.clone(),
                self.publisher.clone(),
                restart,
                semaphore.clone(),
                shutdown.clone(),
            )));
        }

        info!(
            "轮询调度器已启动: devices={}, max_concurrent={}",
            tasks.len(),
            self.config.max_concurrent_devices
        );

        PollerHandle { handles, tasks }
    }
}

// ==========================================
// PollerHandle - 调度器运行句柄
// ==========================================
pub struct PollerHandle {
    handles: HashMap<String, DeviceHandle>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    /// 取设备操作句柄 (手动重启等)
    pub fn device(&self, device_id: &str) -> Option<&DeviceHandle> {
        self.handles.get(device_id)
    }

    /// 设备数量
    pub fn device_count(&self) -> usize {
        self.handles.len()
    }

    /// 等待全部设备任务退出
    pub async fn join(self) {
        join_all(self.tasks).await;
    }
}
