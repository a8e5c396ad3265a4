// ==========================================
// 零件质检与装箱系统 - 单调时钟
// ==========================================
// 约束: 只在引擎写锁内使用; 相邻两次取值严格递增 (最小步长 1µs),
//       精度截断到微秒, 与存储格式一致
// ==========================================

use chrono::{DateTime, Duration, SubsecRound, Utc};

#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取下一个时间戳
    pub fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let next = match self.last {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last = Some(next);
        next
    }
}
