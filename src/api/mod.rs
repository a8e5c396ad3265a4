// ==========================================
// 零件质检与装箱系统 - API 层
// ==========================================
// 职责: 对外业务接口, 供命令行与导入器调用
// 约定: 所有接口返回 ApiResult, 错误种类见 ErrorKind
// ==========================================

pub mod audit;
pub mod box_api;
pub mod dto;
pub mod error;
pub mod piece_api;
pub mod report_api;
pub mod validator;

// 重导出核心类型
pub use audit::AuditTrail;
pub use box_api::BoxApi;
pub use dto::{
    BoxDetailResponse, BoxListResponse, BoxResponse, CreatePieceRequest, DeleteBoxResponse,
    DeletePieceResponse, ListPiecesRequest, NumericInput, PieceListResponse, PieceResponse,
};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorKind};
pub use piece_api::PieceApi;
pub use report_api::ReportApi;
