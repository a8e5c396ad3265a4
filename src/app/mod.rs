// ==========================================
// 零件质检与装箱系统 - 应用层
// ==========================================
// 职责: 组装存储 / 引擎 / API, 供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
