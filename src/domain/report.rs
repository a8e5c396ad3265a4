// ==========================================
// 零件质检与装箱系统 - 终检报表
// ==========================================
// 只读聚合: 扫描当前零件 / 箱子状态生成, 不引入新的不变量
// ==========================================

use crate::domain::types::RejectionReason;
use serde::{Deserialize, Serialize};

/// 单个不合格原因的计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReasonCount {
    pub reason: RejectionReason,
    pub count: u64,
}

/// 终检报表
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub total_approved: u64,
    pub total_rejected: u64,
    pub rejection_reasons: Vec<RejectionReasonCount>, // 规范顺序, 不含 0 计数
    pub total_closed_boxes: u64,
    pub total_open_boxes: u64,
}
