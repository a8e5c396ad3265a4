// ==========================================
// 零件质检与装箱系统 - 箱子领域模型
// ==========================================
// 红线: 0 <= piece_count <= BOX_CAPACITY
// 红线: piece_count 达到容量的同一步骤内封箱, 封箱后不再开启
// ==========================================

use crate::domain::types::BoxStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单箱容量 (全系统固定)
pub const BOX_CAPACITY: u32 = 10;

// ==========================================
// PackingBox - 箱子
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingBox {
    // ===== 主键 =====
    pub box_id: i64, // 单调分配, 永不复用

    // ===== 状态机 =====
    pub status: BoxStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>, // 仅在封箱时设置一次

    // ===== 装载 =====
    pub piece_count: u32,
}

impl PackingBox {
    /// 新开箱 (空箱, Open)
    pub fn open(box_id: i64, opened_at: DateTime<Utc>) -> Self {
        Self {
            box_id,
            status: BoxStatus::Open,
            opened_at,
            closed_at: None,
            piece_count: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == BoxStatus::Open
    }

    /// 是否还能接收零件 (Open 且未满)
    pub fn has_room(&self) -> bool {
        self.is_open() && self.piece_count < BOX_CAPACITY
    }

    /// 剩余位置数
    pub fn remaining_slots(&self) -> u32 {
        BOX_CAPACITY.saturating_sub(self.piece_count)
    }
}

// ==========================================
// BoxSnapshot - 箱子池快照
// ==========================================
// 用途: 仓储层 → 引擎层, 构造 BoxPool 工作副本
#[derive(Debug, Clone, Default)]
pub struct BoxSnapshot {
    pub boxes: Vec<PackingBox>,
    pub next_box_id: i64,
}
