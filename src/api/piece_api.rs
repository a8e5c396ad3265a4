// ==========================================
// 零件质检与装箱系统 - 零件 API
// ==========================================
// 职责: 零件登记 / 查询 / 删除
// 流程: 请求校验 → 引擎 (原子提交) → 审计留痕 → 响应
// ==========================================

use crate::api::audit::AuditTrail;
use crate::api::dto::{
    CreatePieceRequest, DeletePieceResponse, ListPiecesRequest, PieceListResponse, PieceResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::config_manager::ListLimits;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::engine::boxing_engine::BoxingEngine;
use crate::i18n::t_with_args;
use crate::repository::store::QcStore;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// PieceApi - 零件 API
// ==========================================
pub struct PieceApi<S>
where
    S: QcStore,
{
    engine: Arc<BoxingEngine<S>>,
    audit: AuditTrail,
    limits: ListLimits,
}

impl<S> PieceApi<S>
where
    S: QcStore,
{
    /// 创建新的PieceApi实例
    ///
    /// # 参数
    /// - engine: 装箱引擎 (与 BoxApi 共享同一实例, 共享写锁)
    /// - audit: 审计日志写入器
    /// - limits: 列表分页参数
    pub fn new(engine: Arc<BoxingEngine<S>>, audit: AuditTrail, limits: ListLimits) -> Self {
        Self {
            engine,
            audit,
            limits,
        }
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 登记零件
    ///
    /// # 返回
    /// - Ok(PieceResponse): 已落库的零件 (含质检结论与箱号)
    /// - Err(ValidationError): 输入非法, 未落库
    /// - Err(Conflict): 编号已存在
    pub fn create_piece(&self, request: &CreatePieceRequest, operator: &str) -> ApiResult<PieceResponse> {
        let submission = validator::validate_create(request)?;
        let piece = self.engine.submit_piece(submission)?;

        self.audit.record(ActionLog::new(
            ActionType::CreatePiece,
            operator,
            Some(json!({
                "piece_id": piece.piece_id,
                "status": piece.status,
                "rejection_reasons": piece.rejection_reasons,
                "box_id": piece.box_id,
            })),
        ));

        Ok(PieceResponse::from(piece))
    }

    /// 删除零件; 合格零件释放箱位 (已封箱子不重开)
    pub fn delete_piece(&self, piece_id: &str, operator: &str) -> ApiResult<DeletePieceResponse> {
        let piece_id = require_piece_id(piece_id)?;
        let piece = self.engine.delete_piece(piece_id)?;

        self.audit.record(ActionLog::new(
            ActionType::DeletePiece,
            operator,
            Some(json!({ "piece_id": piece.piece_id, "box_id": piece.box_id })),
        ));

        let message = match piece.box_id {
            Some(box_id) => t_with_args(
                "piece.deleted_with_slot",
                &[("piece_id", &piece.piece_id), ("box_id", &box_id.to_string())],
            ),
            None => t_with_args("piece.deleted", &[("piece_id", &piece.piece_id)]),
        };

        Ok(DeletePieceResponse {
            message,
            piece: PieceResponse::from(piece),
        })
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_piece(&self, piece_id: &str) -> ApiResult<PieceResponse> {
        let piece_id = require_piece_id(piece_id)?;
        Ok(PieceResponse::from(self.engine.get_piece(piece_id)?))
    }

    /// 查询零件列表 (最新在前)
    ///
    /// total 为满足过滤条件的全部记录数, 不受分页影响
    pub fn list_pieces(&self, request: &ListPiecesRequest) -> ApiResult<PieceListResponse> {
        let query = validator::validate_list(request, self.limits)?;
        let page = self.engine.list_pieces(&query)?;
        debug!(returned = page.items.len(), total = page.total, "零件列表查询完成");

        Ok(PieceListResponse {
            items: page.items.into_iter().map(PieceResponse::from).collect(),
            total: page.total,
            limit: query.limit.unwrap_or(self.limits.default_limit),
            offset: query.offset,
        })
    }
}

fn require_piece_id(piece_id: &str) -> ApiResult<&str> {
    let trimmed = piece_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError(t_with_args(
            "validation.required",
            &[("field", "id")],
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::NumericInput;
    use crate::api::error::ErrorKind;
    use crate::domain::types::{PieceStatus, RejectionReason};
    use crate::repository::memory_store::MemoryStore;

    fn setup_api() -> PieceApi<MemoryStore> {
        let engine = Arc::new(BoxingEngine::new(Arc::new(MemoryStore::new())));
        PieceApi::new(engine, AuditTrail::disabled(), ListLimits::default())
    }

    fn request(id: &str, weight: f64, color: &str, length: f64) -> CreatePieceRequest {
        CreatePieceRequest {
            id: id.to_string(),
            weight: NumericInput::Number(weight),
            color: color.to_string(),
            length: NumericInput::Number(length),
        }
    }

    #[test]
    fn test_create_and_get_piece() {
        let api = setup_api();
        let created = api.create_piece(&request("P1", 100.0, "blue", 15.0), "tester").unwrap();
        assert_eq!(created.status, PieceStatus::Approved);
        assert_eq!(created.box_id, Some(1));
        assert_eq!(api.get_piece("P1").unwrap(), created);
    }

    #[test]
    fn test_rejection_reasons_in_fixed_order() {
        let api = setup_api();
        let cases = vec![
            (request("A", 90.0, "blue", 15.0), vec![RejectionReason::WeightOutOfRange]),
            (request("B", 100.0, "blue", 25.0), vec![RejectionReason::LengthOutOfRange]),
            (request("C", 100.0, "red", 15.0), vec![RejectionReason::InvalidColor]),
            (
                request("D", 200.0, "red", 50.0),
                vec![
                    RejectionReason::WeightOutOfRange,
                    RejectionReason::InvalidColor,
                    RejectionReason::LengthOutOfRange,
                ],
            ),
        ];
        for (req, reasons) in cases {
            let created = api.create_piece(&req, "tester").unwrap();
            assert_eq!(created.status, PieceStatus::Rejected);
            assert_eq!(created.rejection_reasons, reasons);
            assert_eq!(created.box_id, None);
        }
    }

    #[test]
    fn test_error_kinds() {
        let api = setup_api();
        api.create_piece(&request("P1", 100.0, "blue", 15.0), "tester").unwrap();

        let dup = api.create_piece(&request("P1", 100.0, "blue", 15.0), "tester").unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::Conflict);

        let invalid = api
            .create_piece(
                &CreatePieceRequest {
                    weight: NumericInput::Text("heavy".into()),
                    ..request("P2", 0.0, "blue", 15.0)
                },
                "tester",
            )
            .unwrap_err();
        assert_eq!(invalid.kind(), ErrorKind::ValidationError);
        assert_eq!(api.get_piece("P2").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(api.delete_piece("nope", "tester").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(api.get_piece("  ").unwrap_err().kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_list_pieces_paging() {
        let api = setup_api();
        for i in 0..5 {
            api.create_piece(&request(&format!("P{}", i), 100.0, "green", 12.0), "tester")
                .unwrap();
        }

        let page = api
            .list_pieces(&ListPiecesRequest {
                status: Some("approved".into()),
                limit: Some(2),
                offset: Some(1),
            })
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 1);
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P3", "P2"]);
    }

    #[test]
    fn test_delete_piece_message_names_piece() {
        let api = setup_api();
        api.create_piece(&request("P1", 100.0, "blue", 15.0), "tester").unwrap();
        let response = api.delete_piece("P1", "tester").unwrap();
        assert!(response.message.contains("P1"));
        assert_eq!(response.piece.box_id, Some(1));
    }
}
