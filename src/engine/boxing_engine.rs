// ==========================================
// 零件质检与装箱系统 - 装箱引擎 (写入编排)
// ==========================================
// 职责: 零件登记 / 零件删除 / 箱子删除 / 一致性校验 / 只读查询
// 红线: Engine 不拼 SQL, 只通过存储接口读取与原子提交
// ==========================================
// 并发模型: 单一全局写锁 (WriteSection)
// - 所有写操作在锁内完成: 读取快照 → 工作副本计算 → ChangeSet 原子提交
// - 锁内同时持有单调时钟, 保证 created_at / opened_at 严格递增
// - 多表只读查询也在锁内执行, 保证看到同一时刻的一致视图
// - 进程间: ChangeSet 携带快照前置条件, 存储层发现过期时整次重算
// ==========================================

use crate::domain::packing_box::PackingBox;
use crate::domain::piece::{Piece, PieceSubmission};
use crate::domain::reallocation::ReallocationManifest;
use crate::domain::report::FinalReport;
use crate::domain::types::{BoxStatus, PieceStatus};
use crate::engine::allocation::AllocationPolicy;
use crate::engine::box_pool::BoxPool;
use crate::engine::clock::MonotonicClock;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::invariants::{ConsistencyReport, InvariantChecker};
use crate::engine::quality::QualityEvaluator;
use crate::engine::reallocation::ReallocationCoordinator;
use crate::engine::report::ReportBuilder;
use crate::repository::error::RepositoryError;
use crate::repository::store::{ChangeSet, PieceQuery, QcStore};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, instrument, warn};


/// 乐观锁冲突时的最大尝试次数
const MAX_WRITE_ATTEMPTS: u32 = 10;

/// 写锁保护的状态
#[derive(Debug, Default)]
struct WriteSection {
    clock: MonotonicClock,
}

/// 零件列表查询结果
#[derive(Debug, Clone, PartialEq)]
pub struct PiecePage {
    pub items: Vec<Piece>,
    pub total: u64,
}

// ==========================================
// BoxingEngine - 装箱引擎
// ==========================================
pub struct BoxingEngine<S>
where
    S: QcStore,
{
    store: Arc<S>,
    section: Mutex<WriteSection>,
}

impl<S> BoxingEngine<S>
where
    S: QcStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            section: Mutex::new(WriteSection::default()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn enter(&self) -> EngineResult<MutexGuard<'_, WriteSection>> {
        self.section
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 登记零件: 校验 → 质检 → (合格) 装箱 → 原子落库
    #[instrument(skip(self, submission), fields(piece_id = %submission.piece_id))]
    pub fn submit_piece(&self, submission: PieceSubmission) -> EngineResult<Piece> {
        let submission = validate_submission(submission)?;
        let verdict =
            QualityEvaluator::evaluate(submission.weight_g, submission.length_cm, &submission.color);

        let piece = self.write_with_retry(|section| {
            if self.store.get_piece(&submission.piece_id)?.is_some() {
                return Err(EngineError::DuplicatePiece {
                    piece_id: submission.piece_id.clone(),
                });
            }

            let created_at = section.clock.tick();
            let mut changes = ChangeSet::default();

            let box_id = if verdict.approved {
                let mut pool = BoxPool::from_snapshot(self.store.box_snapshot(&[])?);
                let target = AllocationPolicy::allocate(&mut pool, &[], &mut section.clock)?;
                pool.drain_into(&mut changes);
                Some(target)
            } else {
                None
            };

            let piece = Piece {
                piece_id: submission.piece_id.clone(),
                weight_g: submission.weight_g,
                length_cm: submission.length_cm,
                color: submission.color.clone(),
                status: if verdict.approved {
                    PieceStatus::Approved
                } else {
                    PieceStatus::Rejected
                },
                rejection_reasons: verdict.reasons.clone(),
                box_id,
                created_at,
            };
            changes.pieces_to_insert.push(piece.clone());

            self.commit(&changes).map_err(|e| match e {
                EngineError::Repository(RepositoryError::UniqueConstraintViolation(_)) => {
                    EngineError::DuplicatePiece {
                        piece_id: piece.piece_id.clone(),
                    }
                }
                other => other,
            })?;
            Ok(piece)
        })?;

        info!(
            status = piece.status.as_str(),
            box_id = ?piece.box_id,
            reasons = piece.rejection_reasons.len(),
            "零件登记完成"
        );
        Ok(piece)
    }

    /// 删除零件; 合格零件释放箱位 (只减计数, 不触发重分配)
    #[instrument(skip(self))]
    pub fn delete_piece(&self, piece_id: &str) -> EngineResult<Piece> {
        let piece = self.write_with_retry(|_section| {
            let piece = self
                .store
                .get_piece(piece_id)?
                .ok_or_else(|| EngineError::piece_not_found(piece_id))?;

            let mut changes = ChangeSet::default();
            if let (PieceStatus::Approved, Some(box_id)) = (piece.status, piece.box_id) {
                let mut pool = BoxPool::from_snapshot(self.store.box_snapshot(&[box_id])?);
                if pool.get(box_id).is_none() {
                    return Err(EngineError::ConsistencyFault(format!(
                        "零件 {} 指向不存在的箱子 {}",
                        piece_id, box_id
                    )));
                }
                pool.decrement(box_id)?;
                pool.drain_into(&mut changes);
            }
            changes.pieces_to_delete.push(piece.piece_id.clone());

            self.commit(&changes)?;
            Ok(piece)
        })?;

        info!(box_id = ?piece.box_id, "零件已删除");
        Ok(piece)
    }

    /// 删除箱子并重分配其中的合格零件
    #[instrument(skip(self))]
    pub fn delete_box(&self, box_id: i64) -> EngineResult<ReallocationManifest> {
        let manifest = self.write_with_retry(|section| {
            let mut pool = BoxPool::from_snapshot(self.store.box_snapshot(&[box_id])?);
            if pool.get(box_id).is_none() {
                return Err(EngineError::box_not_found(box_id));
            }

            let plan = ReallocationCoordinator::plan_removal(
                self.store.as_ref(),
                &mut pool,
                box_id,
                &mut section.clock,
            )?;

            let mut changes = ChangeSet::default();
            pool.drain_into(&mut changes);
            changes.piece_box_updates = plan.piece_box_updates;

            self.commit(&changes)?;
            Ok(plan.manifest)
        })?;

        info!(
            moved = manifest.moved_count(),
            boxes_created = manifest.boxes_created,
            "箱子已删除"
        );
        Ok(manifest)
    }

    /// 在写锁内执行一次写操作; 快照被其他进程改写时重新读取并重算
    ///
    /// 每次尝试都从存储重新读取, 上一次尝试的工作副本全部丢弃
    fn write_with_retry<T>(
        &self,
        mut attempt: impl FnMut(&mut WriteSection) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut section = self.enter()?;
        let mut tries = 1;
        loop {
            match attempt(&mut section) {
                Err(EngineError::Repository(RepositoryError::OptimisticLockFailure {
                    resource,
                    ..
                })) if tries < MAX_WRITE_ATTEMPTS => {
                    warn!(%resource, attempt = tries, "快照已过期, 重新读取后重试");
                    tries += 1;
                }
                Err(EngineError::Repository(e @ RepositoryError::OptimisticLockFailure { .. })) => {
                    error!(error = %e, attempts = tries, "并发写入冲突, 重试次数已用尽");
                    return Err(EngineError::Repository(e));
                }
                other => return other,
            }
        }
    }

    fn commit(&self, changes: &ChangeSet) -> EngineResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.store.commit(changes).map_err(|e| {
            match &e {
                RepositoryError::OptimisticLockFailure { .. } => {}
                _ => error!(error = %e, "变更提交失败, 本次操作未生效"),
            }
            EngineError::Repository(e)
        })
    }

    // ==========================================
    // 只读查询
    // ==========================================

    pub fn get_piece(&self, piece_id: &str) -> EngineResult<Piece> {
        self.store
            .get_piece(piece_id)?
            .ok_or_else(|| EngineError::piece_not_found(piece_id))
    }

    pub fn list_pieces(&self, query: &PieceQuery) -> EngineResult<PiecePage> {
        let _section = self.enter()?;
        let items = self.store.list_pieces(query)?;
        let total = self.store.count_pieces(query.status)?;
        Ok(PiecePage { items, total })
    }

    /// 查询箱子及箱内合格零件 (created_at 升序)
    pub fn get_box(&self, box_id: i64) -> EngineResult<(PackingBox, Vec<Piece>)> {
        let _section = self.enter()?;
        let found = self
            .store
            .get_box(box_id)?
            .ok_or_else(|| EngineError::box_not_found(box_id))?;
        let pieces = self.store.find_pieces_by_box(box_id)?;
        Ok((found, pieces))
    }

    pub fn list_boxes(&self, status: Option<BoxStatus>) -> EngineResult<Vec<PackingBox>> {
        Ok(self.store.list_boxes(status)?)
    }

    /// 最终报表
    pub fn final_report(&self) -> EngineResult<FinalReport> {
        let _section = self.enter()?;
        let pieces = self.store.list_pieces(&PieceQuery::all())?;
        let boxes = self.store.list_boxes(None)?;
        Ok(ReportBuilder::build(&pieces, &boxes))
    }

    /// 一致性校验 (持写锁, 校验期间无写入)
    #[instrument(skip(self))]
    pub fn verify_invariants(&self) -> EngineResult<ConsistencyReport> {
        let _section = self.enter()?;
        let pieces = self.store.list_pieces(&PieceQuery::all())?;
        let boxes = self.store.list_boxes(None)?;
        let next_box_id = self.store.box_snapshot(&[])?.next_box_id;

        let report = InvariantChecker::check(&boxes, &pieces, next_box_id);
        if report.is_consistent() {
            debug!(pieces = report.checked_pieces, boxes = report.checked_boxes, "一致性校验通过");
        } else {
            error!(violations = report.violations.len(), "一致性校验发现违规");
        }
        Ok(report)
    }
}

/// 登记前校验: 编号非空, 数值有限且为正, 颜色非空
fn validate_submission(mut submission: PieceSubmission) -> EngineResult<PieceSubmission> {
    submission.piece_id = submission.piece_id.trim().to_string();
    if submission.piece_id.is_empty() {
        return Err(EngineError::Validation("零件编号不能为空".to_string()));
    }
    if !submission.weight_g.is_finite() || submission.weight_g <= 0.0 {
        return Err(EngineError::Validation(format!(
            "重量必须为正数: {}",
            submission.weight_g
        )));
    }
    if !submission.length_cm.is_finite() || submission.length_cm <= 0.0 {
        return Err(EngineError::Validation(format!(
            "长度必须为正数: {}",
            submission.length_cm
        )));
    }
    if submission.color.as_str().trim().is_empty() {
        return Err(EngineError::Validation("颜色不能为空".to_string()));
    }
    Ok(submission)
}
