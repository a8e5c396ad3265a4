// ==========================================
// 零件质检与装箱系统 - 质检判定引擎
// ==========================================
// 职责: 零件属性 → 合格/不合格 + 有序不合格原因
// 红线: 纯函数, 无副作用; 三项检查全部执行, 不短路
// 原因顺序: 重量 → 颜色 → 长度 (对外契约)
// ==========================================

use crate::domain::types::{Color, RejectionReason};
use std::ops::RangeInclusive;

/// 合格重量区间 (克, 闭区间)
pub const WEIGHT_RANGE_G: RangeInclusive<f64> = 95.0..=105.0;

/// 合格长度区间 (厘米, 闭区间)
pub const LENGTH_RANGE_CM: RangeInclusive<f64> = 10.0..=20.0;

/// 质检结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityVerdict {
    pub approved: bool,
    pub reasons: Vec<RejectionReason>,
}

// ==========================================
// QualityEvaluator - 质检判定引擎
// ==========================================
pub struct QualityEvaluator;

impl QualityEvaluator {
    /// 判定单个零件
    ///
    /// # 返回
    /// approved 为真 当且仅当 reasons 为空
    pub fn evaluate(weight_g: f64, length_cm: f64, color: &Color) -> QualityVerdict {
        let mut reasons = Vec::with_capacity(3);

        if !WEIGHT_RANGE_G.contains(&weight_g) {
            reasons.push(RejectionReason::WeightOutOfRange);
        }
        if !color.is_allowed() {
            reasons.push(RejectionReason::InvalidColor);
        }
        if !LENGTH_RANGE_CM.contains(&length_cm) {
            reasons.push(RejectionReason::LengthOutOfRange);
        }

        QualityVerdict {
            approved: reasons.is_empty(),
            reasons,
        }
    }
}
