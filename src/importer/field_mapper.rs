// ==========================================
// 零件质检与装箱系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段 (列名不区分大小写, 支持别名)
// 标准字段: id / weight / color / length
// ==========================================

use crate::api::dto::{CreatePieceRequest, NumericInput};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRecord;
use crate::importer::piece_importer_trait::FieldMapper as FieldMapperTrait;

// 列名别名（小写）
const ID_ALIASES: &[&str] = &["id", "piece_id", "pieceid", "piece id"];
const WEIGHT_ALIASES: &[&str] = &["weight", "peso", "weight_g"];
const COLOR_ALIASES: &[&str] = &["color", "cor", "colour"];
const LENGTH_ALIASES: &[&str] = &["length", "comprimento", "length_cm"];

/// 标准字段 → 文件中的实际列名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub id: String,
    pub weight: String,
    pub color: String,
    pub length: String,
}

pub struct PieceFieldMapper;

impl PieceFieldMapper {
    fn find_column(headers: &[String], field: &str, aliases: &[&str]) -> ImportResult<String> {
        headers
            .iter()
            .find(|h| aliases.contains(&h.trim().to_lowercase().as_str()))
            .cloned()
            .ok_or_else(|| ImportError::MissingColumn {
                column: field.to_string(),
                accepted: aliases.join("/"),
            })
    }

    fn get_string(record: &RawRecord, column: &str) -> String {
        record
            .fields
            .get(column)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}

impl FieldMapperTrait for PieceFieldMapper {
    fn resolve_columns(&self, headers: &[String]) -> ImportResult<ColumnMap> {
        Ok(ColumnMap {
            id: Self::find_column(headers, "id", ID_ALIASES)?,
            weight: Self::find_column(headers, "weight", WEIGHT_ALIASES)?,
            color: Self::find_column(headers, "color", COLOR_ALIASES)?,
            length: Self::find_column(headers, "length", LENGTH_ALIASES)?,
        })
    }

    fn map_row(&self, columns: &ColumnMap, record: &RawRecord) -> CreatePieceRequest {
        CreatePieceRequest {
            id: Self::get_string(record, &columns.id),
            weight: NumericInput::Text(Self::get_string(record, &columns.weight)),
            color: Self::get_string(record, &columns.color),
            length: NumericInput::Text(Self::get_string(record, &columns.length)),
        }
    }
}
