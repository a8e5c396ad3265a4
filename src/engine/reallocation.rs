// ==========================================
// 零件质检与装箱系统 - 删箱重分配协调器
// ==========================================
// 职责: 删除箱子 B 时, 将 B 内合格零件逐个重新分配到其余箱子
// 流程:
// 1) 读取 B 内全部合格零件 (created_at 升序, piece_id 升序)
// 2) 逐个调用 AllocationPolicy::allocate(excluding = {B})
// 3) 记录改派 (piece_id, B → T), B 计数 -1
// 4) 校验 B 计数归零后从池中删除 B
// 5) 返回清单 (改派列表 + 本次新建箱子数)
// ==========================================
// 红线: 只在工作副本上计算, 由调用方一次性提交; 任何一步失败都不留痕
// ==========================================

use crate::domain::piece::Piece;
use crate::domain::reallocation::{ReallocationEntry, ReallocationManifest};
use crate::engine::allocation::AllocationPolicy;
use crate::engine::box_pool::BoxPool;
use crate::engine::clock::MonotonicClock;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::store::PieceStore;

/// 重分配计划: 清单 + 需要落库的零件改派
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReallocationPlan {
    pub manifest: ReallocationManifest,
    pub piece_box_updates: Vec<(String, i64)>,
}

pub struct ReallocationCoordinator;

impl ReallocationCoordinator {
    /// 规划删除箱子 box_id
    ///
    /// pool 必须包含 box_id 以及全部 Open 箱子
    pub fn plan_removal<S>(
        store: &S,
        pool: &mut BoxPool,
        box_id: i64,
        clock: &mut MonotonicClock,
    ) -> EngineResult<ReallocationPlan>
    where
        S: PieceStore + ?Sized,
    {
        let expected = pool
            .get(box_id)
            .ok_or_else(|| EngineError::box_not_found(box_id))?
            .piece_count;

        let mut pieces: Vec<Piece> = store.find_pieces_by_box(box_id)?;
        pieces.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.piece_id.cmp(&b.piece_id))
        });

        if pieces.len() as u32 != expected {
            return Err(EngineError::ConsistencyFault(format!(
                "箱子 {} 计数为 {}, 实际引用零件 {} 个",
                box_id,
                expected,
                pieces.len()
            )));
        }

        let created_before = pool.created_box_ids().len();
        let mut manifest = ReallocationManifest::empty(box_id);
        let mut piece_box_updates = Vec::with_capacity(pieces.len());

        for piece in &pieces {
            let target = AllocationPolicy::allocate(pool, &[box_id], clock)?;
            pool.decrement(box_id)?;

            manifest.reallocated_pieces.push(ReallocationEntry {
                piece_id: piece.piece_id.clone(),
                from_box_id: box_id,
                to_box_id: target,
            });
            piece_box_updates.push((piece.piece_id.clone(), target));
        }

        let remaining = pool
            .get(box_id)
            .map(|b| b.piece_count)
            .ok_or_else(|| EngineError::box_not_found(box_id))?;
        if remaining != 0 {
            return Err(EngineError::ConsistencyFault(format!(
                "箱子 {} 重分配后仍有 {} 个零件",
                box_id, remaining
            )));
        }
        pool.remove(box_id)?;

        manifest.boxes_created = (pool.created_box_ids().len() - created_before) as u32;

        Ok(ReallocationPlan {
            manifest,
            piece_box_updates,
        })
    }
}
