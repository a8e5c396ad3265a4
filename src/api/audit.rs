// ==========================================
// 零件质检与装箱系统 - 审计留痕
// ==========================================
// 时机: 引擎提交成功之后
// 策略: 尽力而为, 写入失败只记 warn, 不影响已提交的业务结果
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::action_log_repo::ActionLogRepository;
use std::sync::Arc;
use tracing::{debug, warn};

/// 审计日志写入器; 未配置仓储时 (如纯内存运行) 直接跳过
#[derive(Clone, Default)]
pub struct AuditTrail {
    repo: Option<Arc<ActionLogRepository>>,
}

impl AuditTrail {
    pub fn new(repo: Arc<ActionLogRepository>) -> Self {
        Self { repo: Some(repo) }
    }

    pub fn disabled() -> Self {
        Self { repo: None }
    }

    pub fn record(&self, log: ActionLog) {
        let Some(repo) = &self.repo else {
            return;
        };
        match repo.insert(&log) {
            Ok(action_id) => debug!(action_id = %action_id, action_type = %log.action_type, "审计日志已写入"),
            Err(e) => warn!(error = %e, action_type = %log.action_type, "审计日志写入失败"),
        }
    }
}
