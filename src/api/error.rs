// ==========================================
// 零件质检与装箱系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 将引擎/仓储/导入错误转换为对外错误
// 对外错误种类: ValidationError / Conflict / NotFound /
//              InternalConsistencyFault / StorageError
// 红线: 对外消息不泄露内部状态; 存储与故障细节只写日志
// ==========================================

use crate::engine::error::EngineError;
use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源冲突: {0}")]
    Conflict(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 一致性故障 (程序缺陷)
    // ==========================================
    #[error("内部一致性故障: {0}")]
    InternalConsistencyFault(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 对外错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    Conflict,
    NotFound,
    InternalConsistencyFault,
    StorageError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InternalConsistencyFault => "InternalConsistencyFault",
            ErrorKind::StorageError => "StorageError",
        }
    }
}

/// 对外错误响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::ValidationError(_) => ErrorKind::ValidationError,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::InternalConsistencyFault(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => ErrorKind::InternalConsistencyFault,
            ApiError::DatabaseError(_) => ErrorKind::StorageError,
        }
    }

    /// 转换为对外响应体
    ///
    /// 输入类错误返回具体原因; 故障与存储错误只返回通用提示
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            ApiError::ValidationError(msg) | ApiError::Conflict(msg) | ApiError::NotFound(msg) => {
                msg.clone()
            }
            ApiError::DatabaseError(_) => t("error.storage"),
            ApiError::InternalConsistencyFault(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
                t("error.internal")
            }
        };
        ErrorBody {
            kind: self.kind(),
            message,
        }
    }

    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(t_with_args("error.not_found", &[("entity", entity), ("id", id)]))
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::DuplicatePiece { piece_id } => ApiError::Conflict(t_with_args(
                "error.conflict_piece",
                &[("piece_id", &piece_id)],
            )),
            EngineError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            fault @ (EngineError::CapacityExceeded { .. } | EngineError::ConsistencyFault(_)) => {
                error!(error = %fault, "检测到内部一致性故障, 操作已中止");
                ApiError::InternalConsistencyFault(fault.to_string())
            }
            EngineError::LockError(msg) => {
                error!(error = %msg, "引擎写锁异常");
                ApiError::InternalError(msg)
            }
            EngineError::Repository(err) => ApiError::from(err),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::OptimisticLockFailure { resource, .. } => {
                warn!(%resource, "并发写入冲突");
                ApiError::Conflict(t("error.concurrent_update"))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                error!(error = %msg, "外键约束违反");
                ApiError::InternalConsistencyFault(msg)
            }
            RepositoryError::LockError(msg) => {
                error!(error = %msg, "数据库锁获取失败");
                ApiError::InternalError(msg)
            }
            RepositoryError::Other(err) => {
                error!(error = %err, "存储层未知错误");
                ApiError::Other(err)
            }
            other => {
                error!(error = %other, "存储层错误");
                ApiError::DatabaseError(other.to_string())
            }
        }
    }
}

// ==========================================
// 从 ImportError 转换 (文件级错误)
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => {
                ApiError::NotFound(t_with_args("import.file_not_found", &[("path", &path)]))
            }
            ImportError::UnsupportedFormat(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_)
            | ImportError::MissingColumn { .. } => ApiError::ValidationError(err.to_string()),
            ImportError::FileReadError(msg) => {
                error!(error = %msg, "测量文件读取失败");
                ApiError::DatabaseError(msg)
            }
            ImportError::TaskJoinError(msg) | ImportError::InternalError(msg) => {
                error!(error = %msg, "导入任务异常");
                ApiError::InternalError(msg)
            }
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
