// ==========================================
// 零件生命周期集成测试
// ==========================================
// 范围: 登记 → 质检 → 装箱 → 查询 → 删除 (SQLite 存储)
// ==========================================


#[cfg(test)]
mod piece_lifecycle_test {
    use crate::test_helpers::{create_test_state, good_piece, piece_request};
    use fabrica_qa::api::dto::{ListPiecesRequest, NumericInput};
    use fabrica_qa::api::ErrorKind;
    use fabrica_qa::domain::types::{BoxStatus, PieceStatus, RejectionReason};
    use fabrica_qa::repository::ActionLogRepository;

    // ==========================================
    // 测试1: 质检判定
    // ==========================================

    #[test]
    fn test_quality_verdicts_through_api() {
        let (_temp_file, state) = create_test_state();
        let api = &state.piece_api;

        let approved = api.create_piece(&piece_request("OK-1", 95.0, "green", 20.0), "tester").unwrap();
        assert_eq!(approved.status, PieceStatus::Approved);
        assert!(approved.rejection_reasons.is_empty());
        assert_eq!(approved.box_id, Some(1));

        let heavy = api.create_piece(&piece_request("W", 90.0, "blue", 15.0), "tester").unwrap();
        assert_eq!(heavy.rejection_reasons, vec![RejectionReason::WeightOutOfRange]);

        let long = api.create_piece(&piece_request("L", 100.0, "blue", 25.0), "tester").unwrap();
        assert_eq!(long.rejection_reasons, vec![RejectionReason::LengthOutOfRange]);

        let red = api.create_piece(&piece_request("C", 100.0, "red", 15.0), "tester").unwrap();
        assert_eq!(red.rejection_reasons, vec![RejectionReason::InvalidColor]);
        assert_eq!(red.box_id, None);

        let all = api.create_piece(&piece_request("ALL", 200.0, "red", 50.0), "tester").unwrap();
        assert_eq!(
            all.rejection_reasons,
            vec![
                RejectionReason::WeightOutOfRange,
                RejectionReason::InvalidColor,
                RejectionReason::LengthOutOfRange,
            ]
        );

        // 不合格零件不占箱位
        assert_eq!(state.box_api.get_box(1).unwrap().summary.piece_count, 1);
    }

    // ==========================================
    // 测试2: 满 10 封箱
    // ==========================================

    #[test]
    fn test_eleven_pieces_fill_one_box_and_open_another() {
        let (_temp_file, state) = create_test_state();
        for i in 0..11 {
            state.piece_api.create_piece(&good_piece(&format!("P{:02}", i)), "tester").unwrap();
        }

        let boxes = state.box_api.list_boxes(None).unwrap();
        assert_eq!(boxes.total, 2);

        let first = state.box_api.get_box(1).unwrap();
        assert_eq!(first.summary.piece_count, 10);
        assert_eq!(first.summary.status, BoxStatus::Closed);
        assert!(first.summary.closed_at.is_some());

        let second = state.box_api.get_box(2).unwrap();
        assert_eq!(second.summary.piece_count, 1);
        assert_eq!(second.summary.status, BoxStatus::Open);
        assert_eq!(second.pieces[0].id, "P10");
    }

    // ==========================================
    // 测试3: 输入错误与冲突
    // ==========================================

    #[test]
    fn test_invalid_and_duplicate_input_leave_state_unchanged() {
        let (_temp_file, state) = create_test_state();
        let original = state.piece_api.create_piece(&good_piece("P1"), "tester").unwrap();

        let duplicate = state
            .piece_api
            .create_piece(&piece_request("P1", 300.0, "red", 1.0), "tester")
            .unwrap_err();
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);

        let mut bad = good_piece("P2");
        bad.weight = NumericInput::Text("-5".to_string());
        assert_eq!(
            state.piece_api.create_piece(&bad, "tester").unwrap_err().kind(),
            ErrorKind::ValidationError
        );

        assert_eq!(state.piece_api.get_piece("P1").unwrap(), original);
        assert_eq!(state.piece_api.get_piece("P2").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(state.box_api.get_box(1).unwrap().summary.piece_count, 1);
    }

    // ==========================================
    // 测试4: 删除零件不重开封箱
    // ==========================================

    #[test]
    fn test_delete_piece_keeps_closed_box_closed() {
        let (_temp_file, state) = create_test_state();
        for i in 0..10 {
            state.piece_api.create_piece(&good_piece(&format!("P{:02}", i)), "tester").unwrap();
        }

        let response = state.piece_api.delete_piece("P05", "tester").unwrap();
        assert_eq!(response.piece.box_id, Some(1));

        let b1 = state.box_api.get_box(1).unwrap();
        assert_eq!(b1.summary.piece_count, 9);
        assert_eq!(b1.summary.status, BoxStatus::Closed);

        let next = state.piece_api.create_piece(&good_piece("N1"), "tester").unwrap();
        assert_eq!(next.box_id, Some(2));

        // 删除后编号可再次使用
        let again = state.piece_api.create_piece(&good_piece("P05"), "tester").unwrap();
        assert_eq!(again.box_id, Some(2));

        assert!(state.report_api.check_consistency().unwrap().is_consistent());
    }

    // ==========================================
    // 测试5: 列表与分页
    // ==========================================

    #[test]
    fn test_list_pieces_filter_and_paging() {
        let (_temp_file, state) = create_test_state();
        for i in 0..4 {
            state.piece_api.create_piece(&good_piece(&format!("A{}", i)), "tester").unwrap();
        }
        state.piece_api.create_piece(&piece_request("R1", 10.0, "blue", 15.0), "tester").unwrap();

        let all = state.piece_api.list_pieces(&ListPiecesRequest::default()).unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.items[0].id, "R1");

        let page = state
            .piece_api
            .list_pieces(&ListPiecesRequest {
                status: Some("approved".to_string()),
                limit: Some(2),
                offset: Some(2),
            })
            .unwrap();
        assert_eq!(page.total, 4);
        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A0"]);

        let err = state
            .piece_api
            .list_pieces(&ListPiecesRequest {
                limit: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    // ==========================================
    // 测试6: 审计日志
    // ==========================================

    #[test]
    fn test_successful_writes_are_audited() {
        let (_temp_file, state) = create_test_state();
        state.piece_api.create_piece(&good_piece("P1"), "alice").unwrap();
        state.piece_api.delete_piece("P1", "alice").unwrap();
        let _ = state.piece_api.create_piece(&piece_request("", 1.0, "blue", 1.0), "alice");

        let repo = ActionLogRepository::new(state.engine.store().connection());
        let logs = repo.list_recent(10).unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.actor == "alice"));
    }
}
