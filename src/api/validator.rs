// ==========================================
// 零件质检与装箱系统 - 请求校验器
// ==========================================
// 职责: 外部输入 → 已校验的领域请求
// 红线: 校验失败不进入质检, 不落任何数据
// ==========================================
// 数值规则: 接受 JSON 数字或字符串; 字符串允许小数逗号 ("100,5")
//           最多一个分隔符 (',' 或 '.'), 不支持千分位: "1,000" 即 1.0
//           必须有限且大于 0
// ==========================================

use crate::api::dto::{CreatePieceRequest, ListPiecesRequest, NumericInput};
use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ListLimits;
use crate::domain::piece::PieceSubmission;
use crate::domain::types::{BoxStatus, Color, PieceStatus};
use crate::i18n::t_with_args;
use crate::repository::store::PieceQuery;

// ==========================================
// 字段级校验
// ==========================================

/// 解析正数字段
pub fn parse_positive(field: &str, input: &NumericInput) -> ApiResult<f64> {
    let value = match input {
        NumericInput::Number(v) => *v,
        NumericInput::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(required(field));
            }
            let not_a_number = || {
                ApiError::ValidationError(t_with_args(
                    "validation.not_a_number",
                    &[("field", field), ("value", trimmed)],
                ))
            };
            // 多个分隔符 ("1,000,5" / "1.000,5") 无法区分千分位, 直接拒绝
            let separators = trimmed.chars().filter(|c| *c == ',' || *c == '.').count();
            if separators > 1 {
                return Err(not_a_number());
            }
            trimmed.replace(',', ".").parse::<f64>().map_err(|_| not_a_number())?
        }
    };

    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::ValidationError(t_with_args(
            "validation.not_positive",
            &[("field", field), ("value", &value.to_string())],
        )));
    }
    Ok(value)
}

/// 解析颜色 (空值为校验错误; 未知颜色交给质检判定)
pub fn parse_color(raw: &str) -> ApiResult<Color> {
    Color::parse(raw).ok_or_else(|| required("color"))
}

pub fn parse_piece_status(raw: Option<&str>) -> ApiResult<Option<PieceStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => PieceStatus::parse(s).map(Some).ok_or_else(|| invalid_status(s)),
    }
}

pub fn parse_box_status(raw: Option<&str>) -> ApiResult<Option<BoxStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => BoxStatus::parse(s).map(Some).ok_or_else(|| invalid_status(s)),
    }
}

/// 解析箱子编号 (正整数)
pub fn parse_box_id(raw: &str) -> ApiResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::ValidationError(t_with_args(
            "validation.invalid_box_id",
            &[("value", raw.trim())],
        ))),
    }
}

fn required(field: &str) -> ApiError {
    ApiError::ValidationError(t_with_args("validation.required", &[("field", field)]))
}

fn invalid_status(value: &str) -> ApiError {
    ApiError::ValidationError(t_with_args("validation.invalid_status", &[("value", value)]))
}

// ==========================================
// 请求级校验
// ==========================================

/// 校验登记请求
///
/// 检查顺序: id → weight → color → length, 遇到第一个错误即返回
pub fn validate_create(request: &CreatePieceRequest) -> ApiResult<PieceSubmission> {
    let piece_id = request.id.trim();
    if piece_id.is_empty() {
        return Err(required("id"));
    }

    let weight_g = parse_positive("weight", &request.weight)?;
    let color = parse_color(&request.color)?;
    let length_cm = parse_positive("length", &request.length)?;

    Ok(PieceSubmission {
        piece_id: piece_id.to_string(),
        weight_g,
        length_cm,
        color,
    })
}

/// 校验列表请求, 补齐默认分页
pub fn validate_list(request: &ListPiecesRequest, limits: ListLimits) -> ApiResult<PieceQuery> {
    let status = parse_piece_status(request.status.as_deref())?;

    let limit = match request.limit {
        None => limits.default_limit,
        Some(v) if v >= 1 && (v as u64) <= limits.max_limit as u64 => v as usize,
        Some(v) => {
            return Err(ApiError::ValidationError(t_with_args(
                "validation.invalid_limit",
                &[("max", &limits.max_limit.to_string()), ("value", &v.to_string())],
            )))
        }
    };

    let offset = match request.offset {
        None => 0,
        Some(v) if v >= 0 => v as usize,
        Some(v) => {
            return Err(ApiError::ValidationError(t_with_args(
                "validation.invalid_offset",
                &[("value", &v.to_string())],
            )))
        }
    };

    Ok(PieceQuery {
        status,
        ..PieceQuery::default()
    }
    .page(limit, offset))
}
