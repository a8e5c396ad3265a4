use crate::db::{
    configure_sqlite_connection, format_ts, init_schema, open_sqlite_connection, parse_ts,
    read_schema_version, CURRENT_SCHEMA_VERSION,
};
use crate::domain::packing_box::PackingBox;
use crate::domain::piece::Piece;
use crate::domain::types::{BoxStatus, Color, PieceStatus, RejectionReason};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteStore - 零件 / 箱子仓储
// ==========================================
// 职责: 管理 piece / packing_box / box_sequence 表
// 并发: 所有仓储共享同一个 Arc<Mutex<Connection>>,
//       commit 在一个事务内完成, 读方只会看到已提交状态
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

pub(super) const PIECE_COLUMNS: &str =
    "piece_id, weight_g, length_cm, color, status, rejection_reasons_json, box_id, created_at";

pub(super) const BOX_COLUMNS: &str = "box_id, status, piece_count, opened_at, closed_at";

impl SqliteStore {
    /// 打开数据库文件并建表
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Self::ensure_schema_version(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
            Self::ensure_schema_version(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 拒绝由更新版本程序写过的数据库文件
    fn ensure_schema_version(conn: &Connection) -> RepositoryResult<()> {
        let actual = read_schema_version(conn)?.unwrap_or(0);
        if actual > CURRENT_SCHEMA_VERSION {
            return Err(RepositoryError::SchemaVersionMismatch {
                expected: CURRENT_SCHEMA_VERSION,
                actual,
            });
        }
        Ok(())
    }

    /// 共享连接（供 ActionLogRepository / ConfigManager 复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 行映射
    // ==========================================

    /// 列顺序与 PIECE_COLUMNS 一致
    pub(super) fn map_piece_row(row: &Row<'_>) -> rusqlite::Result<Piece> {
        let color_raw: String = row.get(3)?;
        let status_raw: String = row.get(4)?;
        let reasons_raw: String = row.get(5)?;
        let created_raw: String = row.get(7)?;

        let status = PieceStatus::parse(&status_raw).ok_or_else(|| {
            conversion_error(4, format!("未知零件状态: {}", status_raw))
        })?;
        let reason_codes: Vec<String> = serde_json::from_str(&reasons_raw)
            .map_err(|e| conversion_error(5, e.to_string()))?;
        let rejection_reasons = reason_codes
            .iter()
            .map(|code| {
                RejectionReason::parse(code)
                    .ok_or_else(|| conversion_error(5, format!("未知不合格原因: {}", code)))
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Piece {
            piece_id: row.get(0)?,
            weight_g: row.get(1)?,
            length_cm: row.get(2)?,
            color: Color::from(color_raw),
            status,
            rejection_reasons,
            box_id: row.get(6)?,
            created_at: parse_ts(7, &created_raw)?,
        })
    }

    /// 列顺序与 BOX_COLUMNS 一致
    pub(super) fn map_box_row(row: &Row<'_>) -> rusqlite::Result<PackingBox> {
        let status_raw: String = row.get(1)?;
        let opened_raw: String = row.get(3)?;
        let closed_raw: Option<String> = row.get(4)?;

        let status = BoxStatus::parse(&status_raw).ok_or_else(|| {
            conversion_error(1, format!("未知箱子状态: {}", status_raw))
        })?;
        let closed_at = match closed_raw {
            Some(raw) => Some(parse_ts(4, &raw)?),
            None => None,
        };

        Ok(PackingBox {
            box_id: row.get(0)?,
            status,
            piece_count: row.get(2)?,
            opened_at: parse_ts(3, &opened_raw)?,
            closed_at,
        })
    }

    pub(super) fn reasons_to_json(reasons: &[RejectionReason]) -> RepositoryResult<String> {
        let codes: Vec<&str> = reasons.iter().map(|r| r.as_str()).collect();
        Ok(serde_json::to_string(&codes)?)
    }

    pub(super) fn ts(value: &chrono::DateTime<chrono::Utc>) -> String {
        format_ts(value)
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(RepositoryError::FieldValueError {
            field: format!("column#{}", column),
            message,
        }),
    )
}
