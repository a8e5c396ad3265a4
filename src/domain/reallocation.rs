// ==========================================
// 零件质检与装箱系统 - 重分配清单
// ==========================================
// 用途: 删箱时 ReallocationCoordinator 的输出, 原样返回给调用方
// 字段命名: camelCase (对外契约)
// ==========================================

use serde::{Deserialize, Serialize};

/// 单个零件的迁移记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReallocationEntry {
    pub piece_id: String,
    pub from_box_id: i64,
    pub to_box_id: i64,
}

/// 重分配清单
///
/// - entries: 按零件 created_at 升序 (即处理顺序)
/// - boxes_created: 本次删箱过程中新开的箱子数
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReallocationManifest {
    pub deleted_box_id: i64,
    pub reallocated_pieces: Vec<ReallocationEntry>,
    pub boxes_created: u32,
}

impl ReallocationManifest {
    /// 空清单 (被删箱子内没有合格零件)
    pub fn empty(deleted_box_id: i64) -> Self {
        Self {
            deleted_box_id,
            reallocated_pieces: Vec::new(),
            boxes_created: 0,
        }
    }

    pub fn moved_count(&self) -> usize {
        self.reallocated_pieces.len()
    }
}
