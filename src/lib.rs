// ==========================================
// 零件质检与装箱系统 - 核心库
// ==========================================
// 职责: 零件质检判定 / 合格零件装箱 / 删箱重分配
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 质检与装箱规则
pub mod engine;

// 导入层 - 测量文件
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// 命令行
pub mod cli;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BoxStatus, Color, PieceStatus, RejectionReason};

// 领域实体
pub use domain::{
    ActionLog, ActionType, BoxSnapshot, FinalReport, PackingBox, Piece, PieceSubmission,
    ReallocationEntry, ReallocationManifest, BOX_CAPACITY,
};

// 引擎
pub use engine::{
    AllocationPolicy, BoxPool, BoxingEngine, ConsistencyReport, EngineError, QualityEvaluator,
    ReallocationCoordinator,
};

// 存储
pub use repository::{MemoryStore, QcStore, SqliteStore};

// API
pub use api::{ApiError, BoxApi, ErrorKind, PieceApi, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "零件质检与装箱系统";
