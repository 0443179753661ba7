// ==========================================
// 产线计数遥测采集核心 - 产线与作业领域模型
// ==========================================
// 红线: 状态归外部持久化层所有，本核心只做快照校验
//       产线↔作业之间使用显式 id 引用，不做对象图导航
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::JobStatus;

// ==========================================
// EquipmentLine - 设备产线
// ==========================================
// 核心不变量: 同一产线同一时刻至多一个非终态作业
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub line_id: String,               // 产线ID
    pub active_job_id: Option<String>, // 当前激活作业ID (显式引用)
}

// ==========================================
// Job - 生产作业
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,                  // 作业ID
    pub line_id: String,                 // 所属产线ID
    pub status: JobStatus,               // 作业状态
    pub started_at: Option<DateTime<Utc>>, // 开始时间
    pub ended_at: Option<DateTime<Utc>>,   // 结束时间
}

impl Job {
    /// 判断是否处于激活状态
    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }
}
