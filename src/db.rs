// ==========================================
// 零件质检与装箱系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键 / busy_timeout)
// - 统一建表入口, 保证幂等
// - 统一时间戳存储格式 (RFC 3339 UTC, 微秒精度, 字典序 = 时间序)
// ==========================================

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存数据库并建表（测试 / 嵌入场景）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 约束落在表结构上作为最后一道防线：
/// - packing_box.piece_count 在 [0, 10]
/// - 合格零件必须有箱子，不合格零件不得有箱子
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS packing_box (
            box_id INTEGER PRIMARY KEY,
            status TEXT NOT NULL CHECK (status IN ('open', 'closed')),
            piece_count INTEGER NOT NULL CHECK (piece_count >= 0 AND piece_count <= 10),
            opened_at TEXT NOT NULL,
            closed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS box_sequence (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            next_box_id INTEGER NOT NULL
        );
        INSERT OR IGNORE INTO box_sequence (id, next_box_id) VALUES (1, 1);

        CREATE TABLE IF NOT EXISTS piece (
            piece_id TEXT PRIMARY KEY,
            weight_g REAL NOT NULL,
            length_cm REAL NOT NULL,
            color TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('approved', 'rejected')),
            rejection_reasons_json TEXT NOT NULL DEFAULT '[]',
            box_id INTEGER REFERENCES packing_box(box_id),
            created_at TEXT NOT NULL,
            CHECK (
                (status = 'approved' AND box_id IS NOT NULL)
                OR (status = 'rejected' AND box_id IS NULL)
            )
        );
        CREATE INDEX IF NOT EXISTS idx_piece_box ON piece (box_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_piece_status ON piece (status, created_at);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_action_log_ts ON action_log (action_ts);

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 时间戳 → 存储格式
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 存储格式 → 时间戳
///
/// 在 row mapper 内使用，失败时转换为 FromSqlConversionFailure 以保留列信息
pub fn parse_ts(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}
