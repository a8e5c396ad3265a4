// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证并发登记 / 删箱下容量与计数不变量始终成立
// ==========================================


#[cfg(test)]
mod concurrent_control_test {
    use crate::test_helpers::{create_test_db, create_test_state, good_piece, piece_request};
    use fabrica_qa::api::ErrorKind;
    use fabrica_qa::app::AppState;
    use fabrica_qa::domain::types::{BoxStatus, Color, PieceStatus};
    use fabrica_qa::domain::{BoxSnapshot, PackingBox, Piece, PieceSubmission, BOX_CAPACITY};
    use fabrica_qa::engine::BoxingEngine;
    use fabrica_qa::logging;
    use fabrica_qa::repository::{
        BoxStore, ChangeSet, PieceQuery, PieceStore, RepositoryResult, SqliteStore, UnitOfWork,
    };
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn assert_consistent(state: &AppState) {
        let report = state.report_api.check_consistency().unwrap();
        assert!(report.is_consistent(), "{:?}", report.violations);
    }

    // ==========================================
    // 测试1: 多线程并发登记
    // ==========================================

    #[test]
    fn test_concurrent_submissions_never_overfill() {
        logging::init_test();
        let (_temp_file, state) = create_test_state();
        let state = Arc::new(state);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..25 {
                        state
                            .piece_api
                            .create_piece(&good_piece(&format!("T{}-{:02}", t, i)), "tester")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let boxes = state.box_api.list_boxes(None).unwrap();
        assert_eq!(boxes.total, 20);
        assert!(boxes
            .items
            .iter()
            .all(|b| b.piece_count == BOX_CAPACITY && b.status == BoxStatus::Closed));
        assert_consistent(&state);
    }

    // ==========================================
    // 测试2: 同一编号并发登记, 只有一个成功
    // ==========================================

    #[test]
    fn test_concurrent_duplicate_ids_single_winner() {
        let (_temp_file, state) = create_test_state();
        let state = Arc::new(state);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || state.piece_api.create_piece(&good_piece("SAME"), "tester"))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::Conflict));
        assert_eq!(state.box_api.get_box(1).unwrap().summary.piece_count, 1);
    }

    // ==========================================
    // 测试3: 登记与删箱交错
    // ==========================================

    #[test]
    fn test_submissions_racing_box_deletions() {
        let (_temp_file, state) = create_test_state();
        let state = Arc::new(state);

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..30 {
                        // 每 5 个里有 1 个不合格
                        let request = if i % 5 == 0 {
                            piece_request(&format!("W{}-{:02}", t, i), 150.0, "blue", 15.0)
                        } else {
                            good_piece(&format!("W{}-{:02}", t, i))
                        };
                        state.piece_api.create_piece(&request, "writer").unwrap();
                    }
                })
            })
            .collect();

        let deleter = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                let mut deleted = 0;
                for box_id in 1..=12 {
                    match state.box_api.delete_box(box_id, "deleter") {
                        Ok(_) => deleted += 1,
                        Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
                    }
                    thread::yield_now();
                }
                deleted
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        deleter.join().unwrap();

        let report = state.report_api.final_report().unwrap();
        assert_eq!(report.total_approved, 96);
        assert_eq!(report.total_rejected, 24);

        // 所有合格零件仍在某个箱子里, 计数总和一致
        let boxes = state.box_api.list_boxes(None).unwrap();
        let counted: u32 = boxes.items.iter().map(|b| b.piece_count).sum();
        assert_eq!(counted as u64, report.total_approved);
        assert!(boxes.items.iter().all(|b| b.piece_count <= BOX_CAPACITY));
        assert_consistent(&state);
    }

    // ==========================================
    // 测试4: tokio 任务并发
    // ==========================================

    #[tokio::test]
    async fn test_async_callers_share_engine() {
        let (_temp_file, state) = create_test_state();
        let state = Arc::new(state);

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let state = Arc::clone(&state);
                tokio::task::spawn_blocking(move || {
                    state.piece_api.create_piece(&good_piece(&format!("ASYNC-{:02}", i)), "tester")
                })
            })
            .collect();

        for task in tasks {
            let piece = task.await.unwrap().unwrap();
            assert_eq!(piece.status, PieceStatus::Approved);
        }

        let b1 = state.box_api.get_box(1).unwrap();
        assert_eq!(b1.summary.piece_count, BOX_CAPACITY);
        assert_eq!(b1.summary.status, BoxStatus::Closed);
        assert_eq!(state.box_api.list_boxes(None).unwrap().total, 1);
    }

    // ==========================================
    // 测试5: 两个进程共用同一数据库文件
    // ==========================================
    // 每个 AppState 持有独立连接与独立引擎写锁, 等同两个 CLI 进程

    #[test]
    fn test_two_states_on_one_file_keep_counts() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let states: Vec<Arc<AppState>> = (0..2)
            .map(|_| Arc::new(AppState::new(db_path.clone()).unwrap()))
            .collect();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let state = Arc::clone(&states[t % 2]);
                thread::spawn(move || {
                    for i in 0..20 {
                        state
                            .piece_api
                            .create_piece(&good_piece(&format!("S{}-{:02}", t, i)), "tester")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for state in &states {
            let boxes = state.box_api.list_boxes(None).unwrap();
            assert_eq!(boxes.total, 8);
            assert!(boxes.items.iter().all(|b| b.piece_count == BOX_CAPACITY));
            assert_consistent(state);
        }
    }

    // ==========================================
    // 测试6: 快照读取后被另一进程写入, 提交时发现并重算
    // ==========================================

    type Hook = Box<dyn FnOnce() + Send>;

    /// 在 box_snapshot 返回前执行一次插入写入
    struct InterleavedStore {
        inner: SqliteStore,
        after_snapshot: Mutex<Option<Hook>>,
    }

    impl PieceStore for InterleavedStore {
        fn get_piece(&self, piece_id: &str) -> RepositoryResult<Option<Piece>> {
            self.inner.get_piece(piece_id)
        }
        fn list_pieces(&self, query: &PieceQuery) -> RepositoryResult<Vec<Piece>> {
            self.inner.list_pieces(query)
        }
        fn count_pieces(&self, status: Option<PieceStatus>) -> RepositoryResult<u64> {
            self.inner.count_pieces(status)
        }
        fn find_pieces_by_box(&self, box_id: i64) -> RepositoryResult<Vec<Piece>> {
            self.inner.find_pieces_by_box(box_id)
        }
    }

    impl BoxStore for InterleavedStore {
        fn get_box(&self, box_id: i64) -> RepositoryResult<Option<PackingBox>> {
            self.inner.get_box(box_id)
        }
        fn list_boxes(&self, status: Option<BoxStatus>) -> RepositoryResult<Vec<PackingBox>> {
            self.inner.list_boxes(status)
        }
        fn box_snapshot(&self, include: &[i64]) -> RepositoryResult<BoxSnapshot> {
            let snapshot = self.inner.box_snapshot(include)?;
            if let Some(hook) = self.after_snapshot.lock().unwrap().take() {
                hook();
            }
            Ok(snapshot)
        }
    }

    impl UnitOfWork for InterleavedStore {
        fn commit(&self, changes: &ChangeSet) -> RepositoryResult<()> {
            self.inner.commit(changes)
        }
    }

    fn submission(piece_id: &str) -> PieceSubmission {
        PieceSubmission {
            piece_id: piece_id.to_string(),
            weight_g: 100.0,
            length_cm: 15.0,
            color: Color::Green,
        }
    }

    #[test]
    fn test_stale_snapshot_across_connections_is_recomputed() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let other = Arc::new(BoxingEngine::new(Arc::new(SqliteStore::new(&db_path).unwrap())));
        other.submit_piece(submission("SEED")).unwrap();

        let writer = Arc::clone(&other);
        let store = InterleavedStore {
            inner: SqliteStore::new(&db_path).unwrap(),
            after_snapshot: Mutex::new(Some(Box::new(move || {
                writer.submit_piece(submission("OTHER")).unwrap();
            }))),
        };
        let engine = BoxingEngine::new(Arc::new(store));

        let mine = engine.submit_piece(submission("MINE")).unwrap();
        assert_eq!(mine.box_id, Some(1));

        let (b1, pieces) = other.get_box(1).unwrap();
        assert_eq!(b1.piece_count, 3);
        assert_eq!(pieces.len(), 3);
        let report = other.verify_invariants().unwrap();
        assert!(report.is_consistent(), "{:?}", report.violations);
    }
}
