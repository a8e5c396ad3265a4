// ==========================================
// 零件质检与装箱系统 - 报表 API
// ==========================================
// 职责: 终检报表 + 一致性校验 (只读)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::report::FinalReport;
use crate::engine::boxing_engine::BoxingEngine;
use crate::engine::invariants::ConsistencyReport;
use crate::repository::store::QcStore;
use std::sync::Arc;
use tracing::error;

pub struct ReportApi<S>
where
    S: QcStore,
{
    engine: Arc<BoxingEngine<S>>,
}

impl<S> ReportApi<S>
where
    S: QcStore,
{
    pub fn new(engine: Arc<BoxingEngine<S>>) -> Self {
        Self { engine }
    }

    /// 终检报表: 合格数 / 不合格数 / 原因分布 / 箱子数
    pub fn final_report(&self) -> ApiResult<FinalReport> {
        Ok(self.engine.final_report()?)
    }

    /// 一致性校验; 报告本身总是返回, 违规由调用方决定如何处理
    pub fn check_consistency(&self) -> ApiResult<ConsistencyReport> {
        Ok(self.engine.verify_invariants()?)
    }

    /// 一致性校验, 存在违规时返回 InternalConsistencyFault
    pub fn ensure_consistent(&self) -> ApiResult<ConsistencyReport> {
        let report = self.check_consistency()?;
        if !report.is_consistent() {
            error!(violations = ?report.violations, "数据不一致");
            return Err(ApiError::InternalConsistencyFault(format!(
                "{} 项不变量违规",
                report.violations.len()
            )));
        }
        Ok(report)
    }
}
