// ==========================================
// 零件质检与装箱系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 审计写入失败不得影响已提交的业务数据
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
