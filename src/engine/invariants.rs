// ==========================================
// 零件质检与装箱系统 - 一致性校验
// ==========================================
// 职责: 基于零件表重新推导箱子计数, 校验装箱不变量
// 输出: ConsistencyReport (违规列表为空即一致)
// ==========================================

use crate::domain::packing_box::{PackingBox, BOX_CAPACITY};
use crate::domain::piece::Piece;
use crate::domain::types::{BoxStatus, PieceStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 不变量编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantRule {
    CapacityNotExceeded,   // 计数不超过容量
    ApprovedPieceHasBox,   // 合格零件指向存在的箱子
    CountMatchesPieces,    // 计数等于引用零件数
    FullBoxIsClosed,       // 满箱必封, 封箱时间与状态一致
    RejectedPieceUnboxed,  // 不合格零件不占箱位
    VerdictMatchesReasons, // 合格 当且仅当 原因为空
    SequenceAhead,         // 编号序列领先于已有箱子
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvariantViolation {
    pub rule: InvariantRule,
    pub subject: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub checked_pieces: u64,
    pub checked_boxes: u64,
    pub violations: Vec<InvariantViolation>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }

    fn push(&mut self, rule: InvariantRule, subject: String, detail: String) {
        self.violations.push(InvariantViolation {
            rule,
            subject,
            detail,
        });
    }
}

pub struct InvariantChecker;

impl InvariantChecker {
    pub fn check(boxes: &[PackingBox], pieces: &[Piece], next_box_id: i64) -> ConsistencyReport {
        let mut report = ConsistencyReport {
            checked_pieces: pieces.len() as u64,
            checked_boxes: boxes.len() as u64,
            violations: Vec::new(),
        };

        let by_id: HashMap<i64, &PackingBox> = boxes.iter().map(|b| (b.box_id, b)).collect();
        let mut referenced: HashMap<i64, u32> = HashMap::new();

        for piece in pieces {
            let subject = format!("piece:{}", piece.piece_id);

            if (piece.status == PieceStatus::Approved) != piece.rejection_reasons.is_empty() {
                report.push(
                    InvariantRule::VerdictMatchesReasons,
                    subject.clone(),
                    format!(
                        "status={}, reasons={}",
                        piece.status.as_str(),
                        piece.rejection_reasons.len()
                    ),
                );
            }

            match (piece.status, piece.box_id) {
                (PieceStatus::Approved, Some(box_id)) => {
                    if by_id.contains_key(&box_id) {
                        *referenced.entry(box_id).or_insert(0) += 1;
                    } else {
                        report.push(
                            InvariantRule::ApprovedPieceHasBox,
                            subject,
                            format!("box_id={} 不存在", box_id),
                        );
                    }
                }
                (PieceStatus::Approved, None) => {
                    report.push(
                        InvariantRule::ApprovedPieceHasBox,
                        subject,
                        "合格零件未分配箱子".to_string(),
                    );
                }
                (PieceStatus::Rejected, Some(box_id)) => {
                    report.push(
                        InvariantRule::RejectedPieceUnboxed,
                        subject,
                        format!("不合格零件指向 box_id={}", box_id),
                    );
                }
                (PieceStatus::Rejected, None) => {}
            }
        }

        let mut max_box_id = 0;
        for b in boxes {
            let subject = format!("box:{}", b.box_id);
            max_box_id = max_box_id.max(b.box_id);

            if b.piece_count > BOX_CAPACITY {
                report.push(
                    InvariantRule::CapacityNotExceeded,
                    subject.clone(),
                    format!("piece_count={} > {}", b.piece_count, BOX_CAPACITY),
                );
            }

            let actual = referenced.get(&b.box_id).copied().unwrap_or(0);
            if actual != b.piece_count {
                report.push(
                    InvariantRule::CountMatchesPieces,
                    subject.clone(),
                    format!("piece_count={}, 实际引用={}", b.piece_count, actual),
                );
            }

            let state_ok = match b.status {
                BoxStatus::Open => b.piece_count < BOX_CAPACITY && b.closed_at.is_none(),
                BoxStatus::Closed => b.closed_at.is_some(),
            };
            if !state_ok {
                report.push(
                    InvariantRule::FullBoxIsClosed,
                    subject,
                    format!(
                        "status={}, piece_count={}, closed_at={}",
                        b.status.as_str(),
                        b.piece_count,
                        b.closed_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
                    ),
                );
            }
        }

        if next_box_id <= max_box_id {
            report.push(
                InvariantRule::SequenceAhead,
                "box_sequence".to_string(),
                format!("next_box_id={} <= max(box_id)={}", next_box_id, max_box_id),
            );
        }

        report
    }
}
