// ==========================================
// 零件质检与装箱系统 - 内存存储实现
// ==========================================
// 用途: 引擎单元测试 / 属性测试 / 无需持久化的嵌入场景
// 语义: 与 SqliteStore 一致 (排序、原子提交、编号序列只进不退)
// ==========================================

use crate::domain::packing_box::{BoxSnapshot, PackingBox};
use crate::domain::piece::Piece;
use crate::domain::types::{BoxStatus, PieceStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::{BoxStore, ChangeSet, PieceQuery, PieceStore, UnitOfWork};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryTables {
    pieces: HashMap<String, Piece>,
    boxes: BTreeMap<i64, PackingBox>,
    next_box_id: i64,
}

/// 内存存储
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(MemoryTables {
                next_box_id: 1,
                ..MemoryTables::default()
            }),
        }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, MemoryTables>> {
        self.tables
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 提交前校验: 所有可能失败的条件都在这里检查,
    /// 校验通过后的应用阶段不会失败, 从而保证原子性
    fn validate(tables: &MemoryTables, changes: &ChangeSet) -> RepositoryResult<()> {
        for (box_id, expected) in &changes.box_count_guards {
            let actual = tables.boxes.get(box_id).map(|b| i64::from(b.piece_count));
            if actual != Some(i64::from(*expected)) {
                return Err(RepositoryError::OptimisticLockFailure {
                    resource: format!("packing_box:{}", box_id),
                    expected: i64::from(*expected),
                    actual,
                });
            }
        }
        if let Some(expected) = changes.expected_next_box_id {
            if tables.next_box_id != expected {
                return Err(RepositoryError::OptimisticLockFailure {
                    resource: "box_sequence".to_string(),
                    expected,
                    actual: Some(tables.next_box_id),
                });
            }
        }

        let mut inserting: Vec<&str> = Vec::new();
        for p in &changes.pieces_to_insert {
            if tables.pieces.contains_key(&p.piece_id) || inserting.contains(&p.piece_id.as_str()) {
                return Err(RepositoryError::UniqueConstraintViolation(format!(
                    "piece.piece_id={}",
                    p.piece_id
                )));
            }
            inserting.push(&p.piece_id);
        }

        let box_exists = |box_id: i64| {
            tables.boxes.contains_key(&box_id)
                || changes.boxes_to_upsert.iter().any(|b| b.box_id == box_id)
        };

        for p in &changes.pieces_to_insert {
            if let Some(box_id) = p.box_id {
                if !box_exists(box_id) {
                    return Err(RepositoryError::ForeignKeyViolation(format!(
                        "piece.box_id={}",
                        box_id
                    )));
                }
            }
        }

        for (piece_id, box_id) in &changes.piece_box_updates {
            let known = tables
                .pieces
                .get(piece_id)
                .map(|p| p.status == PieceStatus::Approved)
                .unwrap_or(false)
                || inserting.contains(&piece_id.as_str());
            if !known {
                return Err(RepositoryError::NotFound {
                    entity: "Piece".to_string(),
                    id: piece_id.clone(),
                });
            }
            if !box_exists(*box_id) {
                return Err(RepositoryError::ForeignKeyViolation(format!(
                    "piece.box_id={}",
                    box_id
                )));
            }
        }

        for piece_id in &changes.pieces_to_delete {
            if !tables.pieces.contains_key(piece_id) && !inserting.contains(&piece_id.as_str()) {
                return Err(RepositoryError::NotFound {
                    entity: "Piece".to_string(),
                    id: piece_id.clone(),
                });
            }
        }

        for box_id in &changes.boxes_to_delete {
            if !box_exists(*box_id) {
                return Err(RepositoryError::NotFound {
                    entity: "Box".to_string(),
                    id: box_id.to_string(),
                });
            }
            // 删除完成后仍被引用 → 外键违反
            let still_referenced = tables
                .pieces
                .values()
                .chain(changes.pieces_to_insert.iter())
                .filter(|p| !changes.pieces_to_delete.contains(&p.piece_id))
                .any(|p| {
                    let effective_box = changes
                        .piece_box_updates
                        .iter()
                        .rev()
                        .find(|(id, _)| *id == p.piece_id)
                        .map(|(_, b)| Some(*b))
                        .unwrap_or(p.box_id);
                    effective_box == Some(*box_id)
                });
            if still_referenced {
                return Err(RepositoryError::ForeignKeyViolation(format!(
                    "packing_box.box_id={} 仍被零件引用",
                    box_id
                )));
            }
        }

        Ok(())
    }
}

fn sort_newest_first(pieces: &mut [Piece]) {
    pieces.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.piece_id.cmp(&a.piece_id))
    });
}

impl PieceStore for MemoryStore {
    fn get_piece(&self, piece_id: &str) -> RepositoryResult<Option<Piece>> {
        Ok(self.lock()?.pieces.get(piece_id).cloned())
    }

    fn list_pieces(&self, query: &PieceQuery) -> RepositoryResult<Vec<Piece>> {
        let tables = self.lock()?;
        let mut pieces: Vec<Piece> = tables
            .pieces
            .values()
            .filter(|p| query.status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        sort_newest_first(&mut pieces);

        let page = pieces
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(page)
    }

    fn count_pieces(&self, status: Option<PieceStatus>) -> RepositoryResult<u64> {
        let tables = self.lock()?;
        let count = tables
            .pieces
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .count();
        Ok(count as u64)
    }

    fn find_pieces_by_box(&self, box_id: i64) -> RepositoryResult<Vec<Piece>> {
        let tables = self.lock()?;
        let mut pieces: Vec<Piece> = tables
            .pieces
            .values()
            .filter(|p| p.status == PieceStatus::Approved && p.box_id == Some(box_id))
            .cloned()
            .collect();
        pieces.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.piece_id.cmp(&b.piece_id))
        });
        Ok(pieces)
    }
}

impl BoxStore for MemoryStore {
    fn get_box(&self, box_id: i64) -> RepositoryResult<Option<PackingBox>> {
        Ok(self.lock()?.boxes.get(&box_id).cloned())
    }

    fn list_boxes(&self, status: Option<BoxStatus>) -> RepositoryResult<Vec<PackingBox>> {
        let tables = self.lock()?;
        let mut boxes: Vec<PackingBox> = tables
            .boxes
            .values()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        boxes.sort_by(|a, b| {
            b.opened_at
                .cmp(&a.opened_at)
                .then_with(|| b.box_id.cmp(&a.box_id))
        });
        Ok(boxes)
    }

    fn box_snapshot(&self, include: &[i64]) -> RepositoryResult<BoxSnapshot> {
        let tables = self.lock()?;
        let mut boxes: Vec<PackingBox> = tables.boxes.values().filter(|b| b.is_open()).cloned().collect();
        boxes.sort_by(|a, b| {
            a.opened_at
                .cmp(&b.opened_at)
                .then_with(|| a.box_id.cmp(&b.box_id))
        });

        for box_id in include {
            if boxes.iter().any(|b| b.box_id == *box_id) {
                continue;
            }
            if let Some(found) = tables.boxes.get(box_id) {
                boxes.push(found.clone());
            }
        }

        Ok(BoxSnapshot {
            boxes,
            next_box_id: tables.next_box_id,
        })
    }
}

impl UnitOfWork for MemoryStore {
    fn commit(&self, changes: &ChangeSet) -> RepositoryResult<()> {
        let mut tables = self.lock()?;
        Self::validate(&tables, changes)?;

        for b in &changes.boxes_to_upsert {
            tables.boxes.insert(b.box_id, b.clone());
        }
        for p in &changes.pieces_to_insert {
            tables.pieces.insert(p.piece_id.clone(), p.clone());
        }
        for (piece_id, box_id) in &changes.piece_box_updates {
            if let Some(p) = tables.pieces.get_mut(piece_id) {
                p.box_id = Some(*box_id);
            }
        }
        for piece_id in &changes.pieces_to_delete {
            tables.pieces.remove(piece_id);
        }
        for box_id in &changes.boxes_to_delete {
            tables.boxes.remove(box_id);
        }
        if let Some(next_box_id) = changes.next_box_id {
            tables.next_box_id = tables.next_box_id.max(next_box_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Color;
    use chrono::Utc;

    fn approved(piece_id: &str, box_id: i64) -> Piece {
        Piece {
            piece_id: piece_id.to_string(),
            weight_g: 100.0,
            length_cm: 15.0,
            color: Color::Green,
            status: PieceStatus::Approved,
            rejection_reasons: vec![],
            box_id: Some(box_id),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_insert_is_rejected_atomically() {
        let store = MemoryStore::new();
        let mut b = PackingBox::open(1, Utc::now());
        b.piece_count = 1;
        store
            .commit(&ChangeSet {
                boxes_to_upsert: vec![b.clone()],
                pieces_to_insert: vec![approved("P1", 1)],
                next_box_id: Some(2),
                ..ChangeSet::default()
            })
            .unwrap();

        b.piece_count = 2;
        let result = store.commit(&ChangeSet {
            boxes_to_upsert: vec![b],
            pieces_to_insert: vec![approved("P1", 1)],
            ..ChangeSet::default()
        });
        assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));
        assert_eq!(store.get_box(1).unwrap().unwrap().piece_count, 1);
    }

    #[test]
    fn test_box_delete_after_repoint_succeeds() {
        let store = MemoryStore::new();
        let mut b1 = PackingBox::open(1, Utc::now());
        b1.piece_count = 1;
        store
            .commit(&ChangeSet {
                boxes_to_upsert: vec![b1],
                pieces_to_insert: vec![approved("P1", 1)],
                next_box_id: Some(2),
                ..ChangeSet::default()
            })
            .unwrap();

        // 未改派直接删箱 → 外键违反
        let result = store.commit(&ChangeSet {
            boxes_to_delete: vec![1],
            ..ChangeSet::default()
        });
        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));

        let mut b2 = PackingBox::open(2, Utc::now());
        b2.piece_count = 1;
        store
            .commit(&ChangeSet {
                boxes_to_upsert: vec![b2],
                piece_box_updates: vec![("P1".to_string(), 2)],
                boxes_to_delete: vec![1],
                next_box_id: Some(3),
                ..ChangeSet::default()
            })
            .unwrap();

        assert!(store.get_box(1).unwrap().is_none());
        assert_eq!(store.get_piece("P1").unwrap().unwrap().box_id, Some(2));
        assert_eq!(store.box_snapshot(&[]).unwrap().next_box_id, 3);
    }

    #[test]
    fn test_stale_guard_is_rejected() {
        let store = MemoryStore::new();
        let mut b = PackingBox::open(1, Utc::now());
        b.piece_count = 1;
        store
            .commit(&ChangeSet {
                boxes_to_upsert: vec![b.clone()],
                pieces_to_insert: vec![approved("P1", 1)],
                next_box_id: Some(2),
                expected_next_box_id: Some(1),
                ..ChangeSet::default()
            })
            .unwrap();

        b.piece_count = 2;
        let result = store.commit(&ChangeSet {
            boxes_to_upsert: vec![b],
            pieces_to_insert: vec![approved("P2", 1)],
            box_count_guards: vec![(1, 0)],
            ..ChangeSet::default()
        });
        assert!(matches!(
            result,
            Err(RepositoryError::OptimisticLockFailure { expected: 0, actual: Some(1), .. })
        ));
        assert!(store.get_piece("P2").unwrap().is_none());
    }
}
