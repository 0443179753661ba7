// ==========================================
// 产线计数遥测采集核心 - 停机区间领域模型
// ==========================================
// 红线: 派生数据，按查询窗口即时重算，本核心不持久化
// ==========================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DowntimePeriod - 停机区间
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimePeriod {
    pub start: DateTime<Utc>,          // 起始时间
    pub end: Option<DateTime<Utc>>,    // 结束时间 (None = 仍在持续)
    pub duration_seconds: i64,         // 时长 (秒，持续中的区间量至窗口末端)
    pub is_ongoing: bool,              // 是否仍在持续
}

impl DowntimePeriod {
    /// 创建已闭合的停机区间
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
            duration_seconds: (end - start).num_seconds(),
            is_ongoing: false,
        }
    }

    /// 创建仍在持续的停机区间 (时长量至窗口末端)
    pub fn ongoing(start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            duration_seconds: (window_end - start).num_seconds(),
            is_ongoing: true,
        }
    }

    /// 区间时长
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds)
    }
}
