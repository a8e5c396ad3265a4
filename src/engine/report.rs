// ==========================================
// 零件质检与装箱系统 - 最终报表
// ==========================================
// 只读汇总: 合格/不合格数量, 不合格原因分布, 封箱/开箱数量
// ==========================================

use crate::domain::packing_box::PackingBox;
use crate::domain::piece::Piece;
use crate::domain::report::{FinalReport, RejectionReasonCount};
use crate::domain::types::{BoxStatus, PieceStatus, RejectionReason};
use std::collections::HashMap;

pub struct ReportBuilder;

impl ReportBuilder {
    /// 原因分布按 RejectionReason::ALL 顺序输出, 省略计数为 0 的原因
    pub fn build(pieces: &[Piece], boxes: &[PackingBox]) -> FinalReport {
        let mut reason_counts: HashMap<RejectionReason, u64> = HashMap::new();
        let mut total_approved = 0;
        let mut total_rejected = 0;

        for piece in pieces {
            match piece.status {
                PieceStatus::Approved => total_approved += 1,
                PieceStatus::Rejected => {
                    total_rejected += 1;
                    for reason in &piece.rejection_reasons {
                        *reason_counts.entry(*reason).or_insert(0) += 1;
                    }
                }
            }
        }

        let rejection_reasons = RejectionReason::ALL
            .iter()
            .filter_map(|reason| {
                reason_counts.get(reason).map(|count| RejectionReasonCount {
                    reason: *reason,
                    count: *count,
                })
            })
            .collect();

        let total_closed_boxes = boxes.iter().filter(|b| b.status == BoxStatus::Closed).count() as u64;

        FinalReport {
            total_approved,
            total_rejected,
            rejection_reasons,
            total_closed_boxes,
            total_open_boxes: boxes.len() as u64 - total_closed_boxes,
        }
    }
}
