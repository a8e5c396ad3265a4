// ==========================================
// 零件质检与装箱系统 - 装箱分配策略
// ==========================================
// 职责: 为下一个合格零件选择箱子, 没有可用箱子时新建
// 红线: 新零件装箱与删箱重分配共用这一条路径, 放置语义完全一致
// 规则: 最早开箱的 Open 箱子优先 (FIFO), box_id 小者优先
// ==========================================

use crate::engine::box_pool::BoxPool;
use crate::engine::clock::MonotonicClock;
use crate::engine::error::EngineResult;
use tracing::debug;

pub struct AllocationPolicy;

impl AllocationPolicy {
    /// 分配一个箱位并返回目标箱子编号
    ///
    /// 目标箱子计数在返回前已经 +1 (满箱时同步封箱)
    pub fn allocate(
        pool: &mut BoxPool,
        excluding: &[i64],
        clock: &mut MonotonicClock,
    ) -> EngineResult<i64> {
        let now = clock.tick();
        let target = match pool.find_open_box_with_room(excluding) {
            Some(found) => found.box_id,
            None => {
                let created = pool.create_box(now);
                debug!(box_id = created.box_id, "无可用箱子, 新建箱子");
                created.box_id
            }
        };

        pool.increment_and_maybe_close(target, now)?;
        Ok(target)
    }
}
