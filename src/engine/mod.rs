// ==========================================
// 零件质检与装箱系统 - 引擎层
// ==========================================
// 职责: 质检判定, 装箱分配, 删箱重分配, 一致性校验, 报表汇总
// 红线: Engine 不拼 SQL, 所有写入经由 ChangeSet 原子提交
// ==========================================

pub mod allocation;
pub mod box_pool;
pub mod boxing_engine;
pub mod clock;
pub mod error;
pub mod invariants;
pub mod quality;
pub mod reallocation;
pub mod report;

// 重导出核心引擎
pub use allocation::AllocationPolicy;
pub use box_pool::BoxPool;
pub use boxing_engine::{BoxingEngine, PiecePage};
pub use clock::MonotonicClock;
pub use error::{EngineError, EngineResult};
pub use invariants::{ConsistencyReport, InvariantChecker, InvariantRule, InvariantViolation};
pub use quality::{QualityEvaluator, QualityVerdict, LENGTH_RANGE_CM, WEIGHT_RANGE_G};
pub use reallocation::{ReallocationCoordinator, ReallocationPlan};
pub use report::ReportBuilder;
