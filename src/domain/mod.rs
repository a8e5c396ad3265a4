// ==========================================
// 零件质检与装箱系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod packing_box;
pub mod piece;
pub mod reallocation;
pub mod report;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use packing_box::{BoxSnapshot, PackingBox, BOX_CAPACITY};
pub use piece::{Piece, PieceSubmission};
pub use reallocation::{ReallocationEntry, ReallocationManifest};
pub use report::{FinalReport, RejectionReasonCount};
pub use types::{BoxStatus, Color, PieceStatus, RejectionReason};
