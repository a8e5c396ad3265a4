// ==========================================
// 零件质检与装箱系统 - 箱子 API
// ==========================================
// 职责: 箱子查询 / 删箱 (触发重分配)
// 红线: 删箱整体原子; 失败时不留任何部分迁移
// ==========================================

use crate::api::audit::AuditTrail;
use crate::api::dto::{BoxDetailResponse, BoxListResponse, BoxResponse, DeleteBoxResponse, PieceResponse};
use crate::api::error::ApiResult;
use crate::api::validator;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::engine::boxing_engine::BoxingEngine;
use crate::i18n::t_with_args;
use crate::repository::store::QcStore;
use std::sync::Arc;

pub struct BoxApi<S>
where
    S: QcStore,
{
    engine: Arc<BoxingEngine<S>>,
    audit: AuditTrail,
}

impl<S> BoxApi<S>
where
    S: QcStore,
{
    pub fn new(engine: Arc<BoxingEngine<S>>, audit: AuditTrail) -> Self {
        Self { engine, audit }
    }

    /// 查询箱子列表 (opened_at 降序)
    ///
    /// # 参数
    /// - status: 可选状态过滤 ("open" / "closed")
    pub fn list_boxes(&self, status: Option<&str>) -> ApiResult<BoxListResponse> {
        let status = validator::parse_box_status(status)?;
        let items: Vec<BoxResponse> = self
            .engine
            .list_boxes(status)?
            .into_iter()
            .map(BoxResponse::from)
            .collect();

        Ok(BoxListResponse {
            total: items.len() as u64,
            items,
        })
    }

    /// 查询箱子详情 (含箱内合格零件)
    pub fn get_box(&self, box_id: i64) -> ApiResult<BoxDetailResponse> {
        let (found, pieces) = self.engine.get_box(box_id)?;
        Ok(BoxDetailResponse {
            summary: BoxResponse::from(found),
            pieces: pieces.into_iter().map(PieceResponse::from).collect(),
        })
    }

    /// 删除箱子并重分配其中的合格零件
    ///
    /// # 返回
    /// - Ok(DeleteBoxResponse): {message, reallocatedPieces, boxesCreated}
    /// - Err(NotFound): 箱子不存在
    pub fn delete_box(&self, box_id: i64, operator: &str) -> ApiResult<DeleteBoxResponse> {
        let manifest = self.engine.delete_box(box_id)?;

        self.audit.record(ActionLog::new(
            ActionType::DeleteBox,
            operator,
            serde_json::to_value(&manifest).ok(),
        ));

        let box_id = box_id.to_string();
        let message = if manifest.reallocated_pieces.is_empty() && manifest.boxes_created == 0 {
            t_with_args("box.deleted", &[("box_id", &box_id)])
        } else {
            t_with_args(
                "box.deleted_with_moves",
                &[
                    ("box_id", &box_id),
                    ("moved", &manifest.moved_count().to_string()),
                    ("created", &manifest.boxes_created.to_string()),
                ],
            )
        };

        Ok(DeleteBoxResponse::from_manifest(message, manifest))
    }
}
