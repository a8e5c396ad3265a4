// ==========================================
// 零件质检与装箱系统 - API 数据传输对象
// ==========================================
// 字段命名: camelCase (对外契约)
// 时间格式: RFC 3339 UTC
// ==========================================

use crate::domain::packing_box::{PackingBox, BOX_CAPACITY};
use crate::domain::piece::Piece;
use crate::domain::reallocation::{ReallocationEntry, ReallocationManifest};
use crate::domain::types::{BoxStatus, Color, PieceStatus, RejectionReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 请求
// ==========================================

/// 数值输入: 允许 JSON 数字, 也允许字符串 (如导入文件中的 "100,5")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl Default for NumericInput {
    fn default() -> Self {
        NumericInput::Text(String::new())
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Number(v) => write!(f, "{}", v),
            NumericInput::Text(s) => write!(f, "{}", s),
        }
    }
}

/// 零件登记请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePieceRequest {
    #[serde(alias = "pieceId")]
    pub id: String,
    pub weight: NumericInput,
    pub color: String,
    pub length: NumericInput,
}

/// 零件列表请求
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPiecesRequest {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==========================================
// 响应
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceResponse {
    pub id: String,
    pub weight: f64,
    pub length: f64,
    pub color: Color,
    pub status: PieceStatus,
    pub rejection_reasons: Vec<RejectionReason>,
    pub box_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Piece> for PieceResponse {
    fn from(piece: Piece) -> Self {
        Self {
            id: piece.piece_id,
            weight: piece.weight_g,
            length: piece.length_cm,
            color: piece.color,
            status: piece.status,
            rejection_reasons: piece.rejection_reasons,
            box_id: piece.box_id,
            created_at: piece.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceListResponse {
    pub items: Vec<PieceResponse>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxResponse {
    pub id: i64,
    pub status: BoxStatus,
    pub piece_count: u32,
    pub capacity: u32,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<PackingBox> for BoxResponse {
    fn from(b: PackingBox) -> Self {
        Self {
            id: b.box_id,
            status: b.status,
            piece_count: b.piece_count,
            capacity: BOX_CAPACITY,
            opened_at: b.opened_at,
            closed_at: b.closed_at,
        }
    }
}

/// 箱子详情: 箱子字段 + 箱内合格零件 (created_at 升序)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxDetailResponse {
    #[serde(flatten)]
    pub summary: BoxResponse,
    pub pieces: Vec<PieceResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxListResponse {
    pub items: Vec<BoxResponse>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePieceResponse {
    pub message: String,
    pub piece: PieceResponse,
}

/// 删箱响应: 重分配清单原样返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBoxResponse {
    pub message: String,
    pub reallocated_pieces: Vec<ReallocationEntry>,
    pub boxes_created: u32,
}

impl DeleteBoxResponse {
    pub fn from_manifest(message: String, manifest: ReallocationManifest) -> Self {
        Self {
            message,
            reallocated_pieces: manifest.reallocated_pieces,
            boxes_created: manifest.boxes_created,
        }
    }
}
