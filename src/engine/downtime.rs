// ==========================================
// 产线计数遥测采集核心 - 停机区间检测器
// ==========================================
// 职责: 有序速率序列 → 离散停机区间
// 红线: 输入必须已按时间戳升序排列，检测器不做排序
// 边界决策: 窗口首样即为停机时，区间起点取首样时间戳
//           (首样之前无观测数据，按窗口起点计会虚增停机时长)
// ==========================================

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{DowntimePeriod, RatePoint};

// ==========================================
// DowntimeDetector - 停机区间检测器
// ==========================================
pub struct DowntimeDetector {
    min_duration: Duration,
}

impl DowntimeDetector {
    /// 创建检测器
    ///
    /// # 参数
    /// - min_duration_minutes: 最小停机时长阈值，短于此的已闭合区间按噪声丢弃
    pub fn new(min_duration_minutes: i64) -> Self {
        Self {
            min_duration: Duration::minutes(min_duration_minutes),
        }
    }

    /// 检测停机区间
    ///
    /// # 算法
    /// 单遍扫描: 速率 >0 视为生产中
    /// - 生产→停机 迁移: 以该样时间戳开启候选区间
    /// - 停机→生产 迁移: 闭合候选区间
    /// - 扫描结束仍未闭合: 产出 end=None 的持续区间，时长量至 window_end
    /// - 短于阈值的已闭合区间丢弃；持续区间保留 (仍可能增长)
    ///
    /// # 参数
    /// - samples: 按时间戳升序的速率序列 (窗口外的样本被忽略)
    ///
    /// # 返回
    /// - 按起始时间升序的停机区间列表
    pub fn detect(
        &self,
        samples: &[RatePoint],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Vec<DowntimePeriod> {
        let mut periods = Vec::new();
        let mut open_start: Option<DateTime<Utc>> = None;

        for point in samples {
            if point.timestamp < window_start || point.timestamp > window_end {
                continue;
            }

            match (point.is_producing(), open_start) {
                // 生产→停机: 开启候选区间
                (false, None) => open_start = Some(point.timestamp),
                // 停机→生产: 闭合候选区间
                (true, Some(start)) => {
                    let period = DowntimePeriod::closed(start, point.timestamp);
                    if period.duration() >= self.min_duration {
                        periods.push(period);
                    } else {
                        debug!(
                            "丢弃短停机区间 (噪声): start={}, duration={}s",
                            start, period.duration_seconds
                        );
                    }
                    open_start = None;
                }
                _ => {}
            }
        }

        // 窗口末端仍未闭合的区间按持续中产出
        if let Some(start) = open_start {
            periods.push(DowntimePeriod::ongoing(start, window_end));
        }

        periods
    }
}
