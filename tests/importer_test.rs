// ==========================================
// 测量文件导入集成测试
// ==========================================
// 范围: CSV 文件 → 逐行登记 → 汇总 / 审计 (SQLite 存储)
// ==========================================


#[cfg(test)]
mod importer_test {
    use crate::test_helpers::create_test_state;
    use fabrica_qa::api::ErrorKind;
    use fabrica_qa::domain::types::{BoxStatus, PieceStatus};
    use fabrica_qa::domain::ActionType;
    use fabrica_qa::importer::{ImportError, PieceImporter};
    use fabrica_qa::repository::ActionLogRepository;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    fn good_rows(prefix: &str, count: usize) -> Vec<String> {
        let mut lines = vec!["id,weight,color,length".to_string()];
        for i in 0..count {
            lines.push(format!("{}{:02},100,blue,15", prefix, i));
        }
        lines
    }

    // ==========================================
    // 测试1: 逐行结果汇总
    // ==========================================

    #[tokio::test]
    async fn test_import_file_mixed_rows() {
        let (_db, state) = create_test_state();
        let file = csv_file(&[
            "id,weight,color,length",
            "P1,100,blue,15",
            "P2,\"99,5\",verde,12",
            "P3,120,red,15",
            ",100,blue,15",
            "P1,100,blue,15",
            "P4,abc,blue,15",
        ]);

        let summary = state.importer.import_file(file.path()).await.unwrap();

        assert_eq!(summary.total_rows, 6);
        assert_eq!(summary.approved, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.failed, 3);

        let rows: Vec<(usize, ErrorKind)> = summary
            .failures
            .iter()
            .map(|f| (f.row_number, f.kind))
            .collect();
        assert_eq!(
            rows,
            vec![
                (5, ErrorKind::ValidationError),
                (6, ErrorKind::Conflict),
                (7, ErrorKind::ValidationError),
            ]
        );
        assert_eq!(summary.failures[0].piece_id, None);
        assert_eq!(summary.failures[1].piece_id.as_deref(), Some("P1"));

        let p2 = state.piece_api.get_piece("P2").unwrap();
        assert_eq!(p2.status, PieceStatus::Approved);
        assert_eq!(p2.weight, 99.5);
        assert_eq!(state.piece_api.get_piece("P3").unwrap().status, PieceStatus::Rejected);
        assert!(state.report_api.ensure_consistent().is_ok());
    }

    // ==========================================
    // 测试2: 文件级错误
    // ==========================================

    #[tokio::test]
    async fn test_import_file_level_errors() {
        let (_db, state) = create_test_state();

        let missing_column = csv_file(&["id,weight,color", "P1,100,blue"]);
        let err = state.importer.import_file(missing_column.path()).await.unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn { ref column, .. } if column == "length"));

        let err = state
            .importer
            .import_file("/nonexistent/measurements.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));

        // 文件级失败不登记任何零件
        assert!(state.box_api.list_boxes(None).unwrap().items.is_empty());
    }

    // ==========================================
    // 测试3: 审计记录
    // ==========================================

    #[tokio::test]
    async fn test_import_writes_audit_entries() {
        let (_db, state) = create_test_state();
        let lines = good_rows("A", 3);
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = csv_file(&lines);

        let summary = state.importer.import_file(file.path()).await.unwrap();
        assert_eq!(summary.approved, 3);

        let repo = ActionLogRepository::new(state.engine.store().connection());
        let batches = repo.find_by_action_type(ActionType::ImportBatch).unwrap();
        assert_eq!(batches.len(), 1);

        let creates = repo.find_by_action_type(ActionType::CreatePiece).unwrap();
        assert_eq!(creates.len(), 3);
        let expected_actor = format!("import:{}", summary.batch_id);
        assert!(creates.iter().all(|log| log.actor == expected_actor));
    }

    // ==========================================
    // 测试4: 批量导入
    // ==========================================

    #[tokio::test]
    async fn test_batch_import_keeps_input_order() {
        let (_db, state) = create_test_state();
        let first_lines = good_rows("A", 6);
        let second_lines = good_rows("B", 6);
        let first = csv_file(&first_lines.iter().map(String::as_str).collect::<Vec<_>>());
        let second = csv_file(&second_lines.iter().map(String::as_str).collect::<Vec<_>>());

        let results = state
            .importer
            .batch_import(vec![
                first.path().to_path_buf(),
                std::path::PathBuf::from("/nonexistent/missing.csv"),
                second.path().to_path_buf(),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().approved, 6);
        assert!(matches!(results[1], Err(ImportError::FileNotFound(_))));
        assert_eq!(results[2].as_ref().unwrap().approved, 6);

        // 12 个合格零件: 1 个满箱 + 1 个 2 件的开放箱
        let boxes = state.box_api.list_boxes(None).unwrap();
        assert_eq!(boxes.total, 2);
        let closed = boxes.items.iter().filter(|b| b.status == BoxStatus::Closed).count();
        assert_eq!(closed, 1);
        assert!(state.report_api.ensure_consistent().is_ok());
    }
}
