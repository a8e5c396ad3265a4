use super::core::SqliteStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{ChangeSet, UnitOfWork};
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, warn};

/// 校验乐观锁前置条件
///
/// 在 IMMEDIATE 事务内执行, 校验与随后的写入之间不会插入其他连接的写入
fn check_guards(tx: &Transaction<'_>, changes: &ChangeSet) -> RepositoryResult<()> {
    for (box_id, expected) in &changes.box_count_guards {
        let actual: Option<i64> = tx
            .query_row(
                "SELECT piece_count FROM packing_box WHERE box_id = ?1",
                params![box_id],
                |row| row.get(0),
            )
            .optional()?;
        if actual != Some(i64::from(*expected)) {
            warn!(box_id, expected, actual = ?actual, "箱子计数已被其他写入方修改");
            return Err(RepositoryError::OptimisticLockFailure {
                resource: format!("packing_box:{}", box_id),
                expected: i64::from(*expected),
                actual,
            });
        }
    }

    if let Some(expected) = changes.expected_next_box_id {
        let actual: Option<i64> = tx
            .query_row("SELECT next_box_id FROM box_sequence WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        if actual != Some(expected) {
            warn!(expected, actual = ?actual, "箱子编号序列已被其他写入方推进");
            return Err(RepositoryError::OptimisticLockFailure {
                resource: "box_sequence".to_string(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}

impl UnitOfWork for SqliteStore {
    /// 在单个 IMMEDIATE 事务内校验前置条件并应用 ChangeSet
    ///
    /// IMMEDIATE 在开始时即取得写锁 (其他连接按 busy_timeout 等待);
    /// 任一语句失败时事务随 tx 析构自动回滚
    fn commit(&self, changes: &ChangeSet) -> RepositoryResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 0) 乐观锁前置条件
        check_guards(&tx, changes)?;

        // 1) 箱子写入 / 更新
        for b in &changes.boxes_to_upsert {
            tx.execute(
                r#"
                INSERT INTO packing_box (box_id, status, piece_count, opened_at, closed_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(box_id) DO UPDATE SET
                    status = excluded.status,
                    piece_count = excluded.piece_count,
                    closed_at = excluded.closed_at
                "#,
                params![
                    b.box_id,
                    b.status.as_str(),
                    b.piece_count,
                    Self::ts(&b.opened_at),
                    b.closed_at.as_ref().map(Self::ts),
                ],
            )?;
        }

        // 2) 新零件
        for p in &changes.pieces_to_insert {
            tx.execute(
                r#"
                INSERT INTO piece (
                    piece_id, weight_g, length_cm, color, status,
                    rejection_reasons_json, box_id, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    p.piece_id,
                    p.weight_g,
                    p.length_cm,
                    p.color.as_str(),
                    p.status.as_str(),
                    Self::reasons_to_json(&p.rejection_reasons)?,
                    p.box_id,
                    Self::ts(&p.created_at),
                ],
            )?;
        }

        // 3) 零件改派
        for (piece_id, box_id) in &changes.piece_box_updates {
            let affected = tx.execute(
                "UPDATE piece SET box_id = ?1 WHERE piece_id = ?2 AND status = 'approved'",
                params![box_id, piece_id],
            )?;
            if affected != 1 {
                return Err(RepositoryError::NotFound {
                    entity: "Piece".to_string(),
                    id: piece_id.clone(),
                });
            }
        }

        // 4) 删除零件
        for piece_id in &changes.pieces_to_delete {
            let affected = tx.execute("DELETE FROM piece WHERE piece_id = ?1", params![piece_id])?;
            if affected != 1 {
                return Err(RepositoryError::NotFound {
                    entity: "Piece".to_string(),
                    id: piece_id.clone(),
                });
            }
        }

        // 5) 删除箱子
        for box_id in &changes.boxes_to_delete {
            let affected = tx.execute("DELETE FROM packing_box WHERE box_id = ?1", params![box_id])?;
            if affected != 1 {
                return Err(RepositoryError::NotFound {
                    entity: "Box".to_string(),
                    id: box_id.to_string(),
                });
            }
        }

        // 6) 编号序列只进不退
        if let Some(next_box_id) = changes.next_box_id {
            tx.execute(
                "UPDATE box_sequence SET next_box_id = MAX(next_box_id, ?1) WHERE id = 1",
                params![next_box_id],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            boxes_upserted = changes.boxes_to_upsert.len(),
            pieces_inserted = changes.pieces_to_insert.len(),
            pieces_moved = changes.piece_box_updates.len(),
            pieces_deleted = changes.pieces_to_delete.len(),
            boxes_deleted = changes.boxes_to_delete.len(),
            "ChangeSet 已提交"
        );
        Ok(())
    }
}
