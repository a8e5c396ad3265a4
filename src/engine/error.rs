// ==========================================
// 零件质检与装箱系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: ConsistencyFault / CapacityExceeded 只会因程序缺陷出现,
//       出现时本次操作整体中止, 不落任何变更
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 输入错误 =====
    #[error("输入校验失败: {0}")]
    Validation(String),

    #[error("零件编号已存在: {piece_id}")]
    DuplicatePiece { piece_id: String },

    #[error("{entity}(id={id})不存在")]
    NotFound { entity: String, id: String },

    // ===== 一致性故障 =====
    #[error("箱子容量超限: box_id={box_id}, capacity={capacity}")]
    CapacityExceeded { box_id: i64, capacity: u32 },

    #[error("内部一致性故障: {0}")]
    ConsistencyFault(String),

    #[error("引擎写锁获取失败: {0}")]
    LockError(String),

    // ===== 存储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn piece_not_found(piece_id: &str) -> Self {
        EngineError::NotFound {
            entity: "Piece".to_string(),
            id: piece_id.to_string(),
        }
    }

    pub fn box_not_found(box_id: i64) -> Self {
        EngineError::NotFound {
            entity: "Box".to_string(),
            id: box_id.to_string(),
        }
    }

    /// 是否属于内部一致性故障 (程序缺陷, 非用户输入问题)
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            EngineError::CapacityExceeded { .. } | EngineError::ConsistencyFault(_)
        )
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
