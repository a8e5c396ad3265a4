// ==========================================
// 零件质检与装箱系统 - 测量文件导入器实现
// ==========================================
// 职责: 测量文件 → 逐行登记零件
// 流程: 解析 → 表头映射 → 逐行提交 (PieceApi) → 汇总 → 审计
// ==========================================
// 红线: 每行是独立的原子操作, 失败行记入 failures, 不中断整个文件
// 红线: 行按文件顺序提交, 保证装箱顺序与文件顺序一致
// ==========================================

use crate::api::audit::AuditTrail;
use crate::api::error::ErrorKind;
use crate::api::piece_api::PieceApi;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::types::PieceStatus;
use crate::i18n::t_with_args;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::PieceFieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::piece_importer_trait::{FieldMapper, FileParser, PieceImporter};
use crate::repository::store::QcStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub file: String,
    pub batch_id: String,
    pub total_rows: usize,
    pub approved: usize,
    pub rejected: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
    pub elapsed_ms: u64,
}

/// 失败行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    pub row_number: usize,
    pub piece_id: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl ImportSummary {
    fn new(file: String, batch_id: String) -> Self {
        Self {
            file,
            batch_id,
            total_rows: 0,
            approved: 0,
            rejected: 0,
            failed: 0,
            failures: Vec::new(),
            elapsed_ms: 0,
        }
    }
}

// ==========================================
// PieceImporterImpl - 导入器实现
// ==========================================
pub struct PieceImporterImpl<S>
where
    S: QcStore + 'static,
{
    piece_api: Arc<PieceApi<S>>,
    audit: AuditTrail,

    // 导入组件 (需要跨线程移入 spawn_blocking)
    file_parser: Arc<dyn FileParser>,
    field_mapper: Arc<dyn FieldMapper>,
}

impl<S> PieceImporterImpl<S>
where
    S: QcStore + 'static,
{
    /// 创建导入器 (默认组件: 按扩展名选择解析器 + 标准列名映射)
    pub fn new(piece_api: Arc<PieceApi<S>>, audit: AuditTrail) -> Self {
        Self::with_components(
            piece_api,
            audit,
            Arc::new(UniversalFileParser),
            Arc::new(PieceFieldMapper),
        )
    }

    /// 创建导入器 (自定义组件)
    pub fn with_components(
        piece_api: Arc<PieceApi<S>>,
        audit: AuditTrail,
        file_parser: Arc<dyn FileParser>,
        field_mapper: Arc<dyn FieldMapper>,
    ) -> Self {
        Self {
            piece_api,
            audit,
            file_parser,
            field_mapper,
        }
    }
}

/// 同步导入主体 (在阻塞线程池中执行)
fn import_rows<S: QcStore>(
    piece_api: &PieceApi<S>,
    file_parser: &dyn FileParser,
    field_mapper: &dyn FieldMapper,
    path: &Path,
    batch_id: &str,
) -> ImportResult<ImportSummary> {
    let sheet = file_parser.parse(path)?;
    let columns = field_mapper.resolve_columns(&sheet.headers)?;
    info!(total_rows = sheet.records.len(), "文件解析完成");

    let actor = format!("import:{}", batch_id);
    let mut summary = ImportSummary::new(path.display().to_string(), batch_id.to_string());
    summary.total_rows = sheet.records.len();

    for record in &sheet.records {
        let request = field_mapper.map_row(&columns, record);
        match piece_api.create_piece(&request, &actor) {
            Ok(piece) => match piece.status {
                PieceStatus::Approved => summary.approved += 1,
                PieceStatus::Rejected => summary.rejected += 1,
            },
            Err(e) => {
                let body = e.to_body();
                warn!(row = record.row_number, kind = body.kind.as_str(), error = %e, "行导入失败");
                summary.failures.push(RowFailure {
                    row_number: record.row_number,
                    piece_id: Some(request.id.trim().to_string()).filter(|id| !id.is_empty()),
                    kind: body.kind,
                    message: body.message,
                });
            }
        }
    }

    summary.failed = summary.failures.len();
    Ok(summary)
}

#[async_trait::async_trait]
impl<S> PieceImporter for PieceImporterImpl<S>
where
    S: QcStore + 'static,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let path = file_path.as_ref().to_path_buf();
        info!(file = %path.display(), "开始导入测量文件");

        let piece_api = Arc::clone(&self.piece_api);
        let file_parser = Arc::clone(&self.file_parser);
        let field_mapper = Arc::clone(&self.field_mapper);
        let task_batch_id = batch_id.clone();
        let mut summary = tokio::task::spawn_blocking(move || {
            import_rows(
                piece_api.as_ref(),
                file_parser.as_ref(),
                field_mapper.as_ref(),
                &path,
                &task_batch_id,
            )
        })
        .await??;

        summary.elapsed_ms = start_time.elapsed().as_millis() as u64;

        self.audit.record(
            ActionLog::new(
                ActionType::ImportBatch,
                "importer",
                Some(serde_json::json!({
                    "batch_id": summary.batch_id,
                    "file": summary.file,
                    "total_rows": summary.total_rows,
                    "approved": summary.approved,
                    "rejected": summary.rejected,
                    "failed": summary.failed,
                })),
            )
            .with_detail(summary.file.clone()),
        );

        info!(
            elapsed_ms = summary.elapsed_ms,
            "{}",
            t_with_args(
                "import.finished",
                &[
                    ("total", &summary.total_rows.to_string()),
                    ("approved", &summary.approved.to_string()),
                    ("rejected", &summary.rejected.to_string()),
                    ("failed", &summary.failed.to_string()),
                ],
            )
        );

        Ok(summary)
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportSummary>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                let result = self.import_file(path).await;
                if let Err(e) = &result {
                    error!(file = %path_str, error = %e, "文件导入失败");
                }
                result
            }
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}
