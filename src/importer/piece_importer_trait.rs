// ==========================================
// 零件质检与装箱系统 - 测量文件导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::api::dto::CreatePieceRequest;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnMap;
use crate::importer::file_parser::{ParsedSheet, RawRecord};
use crate::importer::piece_importer::ImportSummary;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// PieceImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: PieceImporterImpl
#[async_trait]
pub trait PieceImporter: Send + Sync {
    /// 导入单个测量文件 (.csv / .xlsx / .xls)
    ///
    /// # 返回
    /// - Ok(ImportSummary): 逐行结果汇总 (失败行不影响其他行)
    /// - Err: 文件级错误 (文件缺失、格式不支持、缺少必需列)
    ///
    /// # 流程
    /// 1. 文件读取与解析
    /// 2. 表头解析 (列名别名)
    /// 3. 逐行提交登记 (每行独立原子操作, 按文件顺序)
    /// 4. 汇总 + 审计日志
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportSummary>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，某个文件失败不影响其他文件
    /// - 返回顺序与输入顺序一致
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportSummary>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 原始行记录
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 源列 → 登记请求映射
// 实现者: PieceFieldMapper
pub trait FieldMapper: Send + Sync {
    /// 根据表头解析各字段所在列
    fn resolve_columns(&self, headers: &[String]) -> ImportResult<ColumnMap>;

    /// 映射单行记录为登记请求 (数值保留原文, 由 API 层统一校验)
    fn map_row(&self, columns: &ColumnMap, record: &RawRecord) -> CreatePieceRequest;
}
