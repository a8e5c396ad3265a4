// ==========================================
// 零件质检与装箱系统 - 操作日志领域模型
// ==========================================
// 红线: 所有成功写入必须留痕
// 用途: 审计追踪 (谁在何时创建/删除了什么, 删箱迁移了哪些零件)
// 对齐: action_log 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,       // uuid v4
    pub action_type: ActionType, // 操作类型
    pub action_ts: DateTime<Utc>,
    pub actor: String,

    pub payload_json: Option<JsonValue>, // 操作参数 / 结果摘要
    pub detail: Option<String>,
}

impl ActionLog {
    pub fn new(action_type: ActionType, actor: &str, payload_json: Option<JsonValue>) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type,
            action_ts: Utc::now(),
            actor: actor.to_string(),
            payload_json,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    CreatePiece, // 零件登记 (含质检 + 装箱)
    DeletePiece, // 删除零件 (释放箱位)
    DeleteBox,   // 删除箱子 (触发重分配)
    ImportBatch, // 测量文件批量导入
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreatePiece => "CREATE_PIECE",
            ActionType::DeletePiece => "DELETE_PIECE",
            ActionType::DeleteBox => "DELETE_BOX",
            ActionType::ImportBatch => "IMPORT_BATCH",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "CREATE_PIECE" => Some(ActionType::CreatePiece),
            "DELETE_PIECE" => Some(ActionType::DeletePiece),
            "DELETE_BOX" => Some(ActionType::DeleteBox),
            "IMPORT_BATCH" => Some(ActionType::ImportBatch),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
