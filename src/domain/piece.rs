// ==========================================
// 零件质检与装箱系统 - 零件领域模型
// ==========================================
// 红线: status 创建时确定, 永不重新判定
// 红线: box_id 存在 当且仅当 status = approved
// ==========================================

use crate::domain::types::{Color, PieceStatus, RejectionReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Piece - 零件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    // ===== 主键 =====
    pub piece_id: String, // 外部给定, 存续期间唯一

    // ===== 测量值 =====
    pub weight_g: f64,  // 重量 (克)
    pub length_cm: f64, // 长度 (厘米)
    pub color: Color,   // 颜色

    // ===== 质检结论 =====
    pub status: PieceStatus,
    pub rejection_reasons: Vec<RejectionReason>, // 为空 当且仅当 approved

    // ===== 装箱 =====
    pub box_id: Option<i64>, // 仅合格零件持有

    // ===== 时间 =====
    pub created_at: DateTime<Utc>, // 重分配排序依据
}

impl Piece {
    pub fn is_approved(&self) -> bool {
        self.status == PieceStatus::Approved
    }
}

// ==========================================
// PieceSubmission - 已通过输入校验的零件提交
// ==========================================
// 由 API 层校验器 / 导入字段映射器构造
// 进入引擎前保证: id 非空, 数值为正且有限
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceSubmission {
    pub piece_id: String,
    pub weight_g: f64,
    pub length_cm: f64,
    pub color: Color,
}
