use super::SqliteStore;
use crate::db::open_in_memory;
use crate::domain::packing_box::PackingBox;
use crate::domain::piece::Piece;
use crate::domain::types::{BoxStatus, Color, PieceStatus, RejectionReason};
use crate::repository::error::RepositoryError;
use crate::repository::store::{BoxStore, ChangeSet, PieceQuery, PieceStore, UnitOfWork};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};

fn setup_store() -> SqliteStore {
    let conn = open_in_memory().unwrap();
    SqliteStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
}

fn base_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

fn approved(piece_id: &str, box_id: i64, offset_s: i64) -> Piece {
    Piece {
        piece_id: piece_id.to_string(),
        weight_g: 100.0,
        length_cm: 15.0,
        color: Color::Blue,
        status: PieceStatus::Approved,
        rejection_reasons: vec![],
        box_id: Some(box_id),
        created_at: base_ts() + Duration::seconds(offset_s),
    }
}

fn rejected(piece_id: &str, offset_s: i64) -> Piece {
    Piece {
        piece_id: piece_id.to_string(),
        weight_g: 200.0,
        length_cm: 50.0,
        color: Color::Other("red".to_string()),
        status: PieceStatus::Rejected,
        rejection_reasons: vec![
            RejectionReason::WeightOutOfRange,
            RejectionReason::InvalidColor,
            RejectionReason::LengthOutOfRange,
        ],
        box_id: None,
        created_at: base_ts() + Duration::seconds(offset_s),
    }
}

fn box_with(box_id: i64, count: u32) -> PackingBox {
    let mut b = PackingBox::open(box_id, base_ts() + Duration::seconds(box_id));
    b.piece_count = count;
    b
}

#[test]
fn test_commit_and_read_back() {
    let store = setup_store();

    let changes = ChangeSet {
        boxes_to_upsert: vec![box_with(1, 2)],
        pieces_to_insert: vec![approved("P1", 1, 0), approved("P2", 1, 1), rejected("R1", 2)],
        next_box_id: Some(2),
        ..ChangeSet::default()
    };
    store.commit(&changes).unwrap();

    let p1 = store.get_piece("P1").unwrap().unwrap();
    assert_eq!(p1, approved("P1", 1, 0));

    let r1 = store.get_piece("R1").unwrap().unwrap();
    assert_eq!(r1.rejection_reasons.len(), 3);
    assert_eq!(r1.color, Color::Other("red".to_string()));
    assert_eq!(r1.box_id, None);

    let b1 = store.get_box(1).unwrap().unwrap();
    assert_eq!(b1.piece_count, 2);
    assert_eq!(b1.status, BoxStatus::Open);

    assert_eq!(store.count_pieces(None).unwrap(), 3);
    assert_eq!(store.count_pieces(Some(PieceStatus::Rejected)).unwrap(), 1);
}

#[test]
fn test_list_pieces_newest_first_with_paging() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![box_with(1, 3)],
            pieces_to_insert: vec![
                approved("A", 1, 0),
                approved("B", 1, 1),
                approved("C", 1, 2),
                rejected("D", 3),
            ],
            next_box_id: Some(2),
            ..ChangeSet::default()
        })
        .unwrap();

    let all: Vec<String> = store
        .list_pieces(&PieceQuery::all())
        .unwrap()
        .into_iter()
        .map(|p| p.piece_id)
        .collect();
    assert_eq!(all, vec!["D", "C", "B", "A"]);

    let page: Vec<String> = store
        .list_pieces(&PieceQuery::with_status(PieceStatus::Approved).page(2, 1))
        .unwrap()
        .into_iter()
        .map(|p| p.piece_id)
        .collect();
    assert_eq!(page, vec!["B", "A"]);
}

#[test]
fn test_find_pieces_by_box_oldest_first() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![box_with(1, 3)],
            pieces_to_insert: vec![approved("Z", 1, 0), approved("Y", 1, 5), approved("X", 1, 5)],
            next_box_id: Some(2),
            ..ChangeSet::default()
        })
        .unwrap();

    let ids: Vec<String> = store
        .find_pieces_by_box(1)
        .unwrap()
        .into_iter()
        .map(|p| p.piece_id)
        .collect();
    // created_at 相同时按 piece_id 升序
    assert_eq!(ids, vec!["Z", "X", "Y"]);
}

#[test]
fn test_failed_commit_leaves_no_trace() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![box_with(1, 1)],
            pieces_to_insert: vec![approved("P1", 1, 0)],
            next_box_id: Some(2),
            ..ChangeSet::default()
        })
        .unwrap();

    // 第二个零件编号重复 → 整个事务回滚
    let result = store.commit(&ChangeSet {
        boxes_to_upsert: vec![box_with(1, 3)],
        pieces_to_insert: vec![approved("P2", 1, 1), approved("P1", 1, 2)],
        ..ChangeSet::default()
    });
    assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));

    assert!(store.get_piece("P2").unwrap().is_none());
    assert_eq!(store.get_box(1).unwrap().unwrap().piece_count, 1);
}

#[test]
fn test_box_still_referenced_cannot_be_deleted() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![box_with(1, 1)],
            pieces_to_insert: vec![approved("P1", 1, 0)],
            next_box_id: Some(2),
            ..ChangeSet::default()
        })
        .unwrap();

    let result = store.commit(&ChangeSet {
        boxes_to_delete: vec![1],
        ..ChangeSet::default()
    });
    assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    assert!(store.get_box(1).unwrap().is_some());
}

#[test]
fn test_box_snapshot_includes_open_and_requested() {
    let store = setup_store();
    let mut closed = box_with(1, 10);
    closed.status = BoxStatus::Closed;
    closed.closed_at = Some(base_ts());

    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![closed, box_with(2, 0), box_with(3, 0)],
            next_box_id: Some(4),
            ..ChangeSet::default()
        })
        .unwrap();

    let snapshot = store.box_snapshot(&[]).unwrap();
    let ids: Vec<i64> = snapshot.boxes.iter().map(|b| b.box_id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(snapshot.next_box_id, 4);

    let snapshot = store.box_snapshot(&[1, 99]).unwrap();
    let ids: Vec<i64> = snapshot.boxes.iter().map(|b| b.box_id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn test_box_sequence_never_moves_backwards() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            next_box_id: Some(7),
            ..ChangeSet::default()
        })
        .unwrap();
    store
        .commit(&ChangeSet {
            next_box_id: Some(3),
            ..ChangeSet::default()
        })
        .unwrap();

    assert_eq!(store.box_snapshot(&[]).unwrap().next_box_id, 7);
}

#[test]
fn test_stale_box_count_guard_rolls_back() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![box_with(1, 2)],
            pieces_to_insert: vec![approved("P1", 1, 0), approved("P2", 1, 1)],
            next_box_id: Some(2),
            ..ChangeSet::default()
        })
        .unwrap();

    // 基于计数 1 的过期快照提交
    let result = store.commit(&ChangeSet {
        boxes_to_upsert: vec![box_with(1, 2)],
        pieces_to_insert: vec![approved("P3", 1, 2)],
        box_count_guards: vec![(1, 1)],
        ..ChangeSet::default()
    });
    assert!(matches!(
        result,
        Err(RepositoryError::OptimisticLockFailure { expected: 1, actual: Some(2), .. })
    ));
    assert!(store.get_piece("P3").unwrap().is_none());
    assert_eq!(store.get_box(1).unwrap().unwrap().piece_count, 2);
}

#[test]
fn test_stale_sequence_guard_rolls_back() {
    let store = setup_store();
    store
        .commit(&ChangeSet {
            boxes_to_upsert: vec![box_with(1, 0)],
            next_box_id: Some(2),
            expected_next_box_id: Some(1),
            ..ChangeSet::default()
        })
        .unwrap();

    // 另一写入方也以序列值 1 新建箱子 1
    let result = store.commit(&ChangeSet {
        boxes_to_upsert: vec![box_with(1, 1)],
        pieces_to_insert: vec![approved("P1", 1, 0)],
        next_box_id: Some(2),
        expected_next_box_id: Some(1),
        ..ChangeSet::default()
    });
    assert!(matches!(
        result,
        Err(RepositoryError::OptimisticLockFailure { expected: 1, actual: Some(2), .. })
    ));
    assert_eq!(store.get_box(1).unwrap().unwrap().piece_count, 0);
    assert!(store.get_piece("P1").unwrap().is_none());
}

#[test]
fn test_newer_schema_version_is_refused() {
    let conn = open_in_memory().unwrap();
    conn.execute("INSERT INTO schema_version (version) VALUES (99)", [])
        .unwrap();

    let result = SqliteStore::from_connection(Arc::new(Mutex::new(conn)));
    assert!(matches!(
        result,
        Err(RepositoryError::SchemaVersionMismatch { actual: 99, .. })
    ));
}
