// ==========================================
// 产线计数遥测采集核心 - 作业互斥校验器
// ==========================================
// 职责: 强制"每条产线同一时刻至多一个激活作业"不变量
// 红线: 快照由外部存储层提供，校验器自身无持久状态、无副作用
//       调用方必须把 快照读取-校验-提交 放进同一产线级串行临界区
//       (产线级互斥锁或存储唯一约束)，否则两个并发 Start 可能同时通过
// ==========================================

use tracing::info;

use crate::domain::Job;

// ==========================================
// GuardDecision - 校验结论
// ==========================================

/// 校验结论: 接受或携带原因的拒绝
///
/// 拒绝是确定性的同步返回值，不是错误，不触发重试，不改任何状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// 接受
    Accept,
    /// 拒绝，携带原因
    Reject { reason: String },
}

impl GuardDecision {
    fn reject(reason: impl Into<String>) -> Self {
        GuardDecision::Reject {
            reason: reason.into(),
        }
    }

    /// 判断是否接受
    pub fn is_accept(&self) -> bool {
        matches!(self, GuardDecision::Accept)
    }

    /// 拒绝原因 (接受时为 None)
    pub fn reason(&self) -> Option<&str> {
        match self {
            GuardDecision::Accept => None,
            GuardDecision::Reject { reason } => Some(reason),
        }
    }
}

// ==========================================
// JobSequencingGuard - 作业互斥校验器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct JobSequencingGuard;

impl JobSequencingGuard {
    pub fn new() -> Self {
        Self
    }

    /// 校验作业启动
    ///
    /// # 参数
    /// - line_id: 目标产线
    /// - active_job_snapshot: 外部存储层提供的该产线当前作业快照
    ///
    /// # 返回
    /// - Reject: 快照中存在绑定该产线的 Active 作业
    pub fn validate_start(&self, line_id: &str, active_job_snapshot: Option<&Job>) -> GuardDecision {
        if let Some(job) = active_job_snapshot {
            if job.line_id == line_id && job.is_active() {
                info!(
                    "作业启动被拒绝: line_id={}, 冲突作业={}",
                    line_id, job.job_id
                );
                return GuardDecision::reject("line already has an active job");
            }
        }
        GuardDecision::Accept
    }

    /// 校验作业完成
    ///
    /// # 参数
    /// - job: 待完成的作业
    /// - produced_qty / target_qty: 实产量与目标量
    /// - justification: 欠产说明 (实产量不足目标量时必填)
    pub fn validate_completion(
        &self,
        job: &Job,
        produced_qty: f64,
        target_qty: f64,
        justification: Option<&str>,
    ) -> GuardDecision {
        if !job.is_active() {
            return GuardDecision::reject(format!(
                "job is not active: job_id={}, status={}",
                job.job_id,
                job.status.as_str()
            ));
        }

        let justified = justification.map(str::trim).is_some_and(|j| !j.is_empty());
        if produced_qty < target_qty && !justified {
            info!(
                "作业完成被拒绝 (欠产未说明): job_id={}, produced={}, target={}",
                job.job_id, produced_qty, target_qty
            );
            return GuardDecision::reject(
                "under-completion requires justification: produced quantity below target",
            );
        }

        GuardDecision::Accept
    }
}
