// ==========================================
// 零件质检与装箱系统 - 导入层
// ==========================================
// 职责: 测量文件 (Excel / CSV) → 零件登记
// 流程: 解析 → 表头映射 → 逐行登记 → 汇总
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod piece_importer;
pub mod piece_importer_trait;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMap, PieceFieldMapper};
pub use file_parser::{CsvParser, ExcelParser, ParsedSheet, RawRecord, UniversalFileParser};
pub use piece_importer::{ImportSummary, PieceImporterImpl, RowFailure};

// 重导出 Trait 接口
pub use piece_importer_trait::{FieldMapper, FileParser, PieceImporter};
