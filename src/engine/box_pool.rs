// ==========================================
// 零件质检与装箱系统 - 箱子池
// ==========================================
// 职责: 在写锁内持有箱子的工作副本, 执行 建箱 / 计数增减 / 封箱 / 删除
// 红线: piece_count 任何时刻不超过 BOX_CAPACITY
// 红线: 封箱单向 (open → closed), 计数回落也不重开
// ==========================================
// 工作方式: 由 BoxSnapshot 构造, 全部变更只发生在内存中,
//           操作成功后通过 drain_into 转为 ChangeSet 一次性提交;
//           中途失败时直接丢弃, 存储不受影响
// 乐观锁: 快照中箱子的原始计数与编号序列随 ChangeSet 一并提交,
//         供存储层确认快照未被其他进程改写
// ==========================================

use crate::domain::packing_box::{BoxSnapshot, PackingBox, BOX_CAPACITY};
use crate::domain::types::BoxStatus;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::store::ChangeSet;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
pub struct BoxPool {
    boxes: BTreeMap<i64, PackingBox>,
    next_box_id: i64,
    initial_next_box_id: i64,
    original_counts: BTreeMap<i64, u32>,
    touched: BTreeSet<i64>,
    created: Vec<i64>,
    removed: Vec<i64>,
}

impl BoxPool {
    pub fn from_snapshot(snapshot: BoxSnapshot) -> Self {
        // 序列至少要越过已知的最大编号
        let max_known = snapshot.boxes.iter().map(|b| b.box_id).max().unwrap_or(0);
        let next_box_id = snapshot.next_box_id.max(max_known + 1).max(1);

        let original_counts = snapshot
            .boxes
            .iter()
            .map(|b| (b.box_id, b.piece_count))
            .collect();

        Self {
            boxes: snapshot.boxes.into_iter().map(|b| (b.box_id, b)).collect(),
            next_box_id,
            initial_next_box_id: snapshot.next_box_id,
            original_counts,
            touched: BTreeSet::new(),
            created: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn get(&self, box_id: i64) -> Option<&PackingBox> {
        self.boxes.get(&box_id)
    }

    /// 本工作副本内新建的箱子编号 (按创建顺序)
    pub fn created_box_ids(&self) -> &[i64] {
        &self.created
    }

    /// 查找可装箱的 Open 箱子
    ///
    /// 规则: opened_at 最早者优先, 相同则 box_id 最小者优先; 跳过 excluding 中的箱子
    pub fn find_open_box_with_room(&self, excluding: &[i64]) -> Option<&PackingBox> {
        self.boxes
            .values()
            .filter(|b| b.has_room() && !excluding.contains(&b.box_id))
            .min_by(|a, b| {
                a.opened_at
                    .cmp(&b.opened_at)
                    .then_with(|| a.box_id.cmp(&b.box_id))
            })
    }

    /// 新建箱子 (编号取序列下一个值, 永不复用)
    pub fn create_box(&mut self, now: DateTime<Utc>) -> PackingBox {
        let box_id = self.next_box_id;
        self.next_box_id += 1;

        let created = PackingBox::open(box_id, now);
        self.boxes.insert(box_id, created.clone());
        self.touched.insert(box_id);
        self.created.push(box_id);
        created
    }

    /// 计数 +1, 达到容量时同一步内封箱
    pub fn increment_and_maybe_close(
        &mut self,
        box_id: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<PackingBox> {
        let target = self
            .boxes
            .get_mut(&box_id)
            .ok_or_else(|| EngineError::box_not_found(box_id))?;

        if target.piece_count >= BOX_CAPACITY || !target.is_open() {
            return Err(EngineError::CapacityExceeded {
                box_id,
                capacity: BOX_CAPACITY,
            });
        }

        target.piece_count += 1;
        if target.piece_count == BOX_CAPACITY {
            target.status = BoxStatus::Closed;
            target.closed_at = Some(now);
        }
        let updated = target.clone();
        self.touched.insert(box_id);
        Ok(updated)
    }

    /// 计数 -1; 已封箱子保持封箱
    pub fn decrement(&mut self, box_id: i64) -> EngineResult<PackingBox> {
        let target = self
            .boxes
            .get_mut(&box_id)
            .ok_or_else(|| EngineError::box_not_found(box_id))?;

        if target.piece_count == 0 {
            return Err(EngineError::ConsistencyFault(format!(
                "箱子 {} 计数为 0, 无法再减少",
                box_id
            )));
        }

        target.piece_count -= 1;
        let updated = target.clone();
        self.touched.insert(box_id);
        Ok(updated)
    }

    /// 删除箱子; 仅允许删除计数为 0 的箱子
    pub fn remove(&mut self, box_id: i64) -> EngineResult<PackingBox> {
        match self.boxes.get(&box_id) {
            None => return Err(EngineError::box_not_found(box_id)),
            Some(b) if b.piece_count != 0 => {
                return Err(EngineError::ConsistencyFault(format!(
                    "箱子 {} 仍有 {} 个零件, 不能删除",
                    box_id, b.piece_count
                )));
            }
            Some(_) => {}
        }

        let removed = self
            .boxes
            .remove(&box_id)
            .ok_or_else(|| EngineError::box_not_found(box_id))?;
        self.touched.remove(&box_id);
        if let Some(pos) = self.created.iter().position(|id| *id == box_id) {
            // 本次新建又删除: 对存储而言从未存在
            self.created.remove(pos);
        } else {
            self.removed.push(box_id);
        }
        Ok(removed)
    }

    /// 将工作副本的变更写入 ChangeSet
    pub fn drain_into(self, changes: &mut ChangeSet) {
        for box_id in &self.touched {
            if let Some(b) = self.boxes.get(box_id) {
                changes.boxes_to_upsert.push(b.clone());
            }
        }
        changes.boxes_to_delete.extend(self.removed.iter().copied());

        for box_id in self.touched.iter().chain(self.removed.iter()) {
            if let Some(count) = self.original_counts.get(box_id) {
                changes.box_count_guards.push((*box_id, *count));
            }
        }

        if self.next_box_id != self.initial_next_box_id {
            changes.next_box_id = Some(self.next_box_id);
            changes.expected_next_box_id = Some(self.initial_next_box_id);
        }
    }
}
