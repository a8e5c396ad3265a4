// ==========================================
// 零件质检与装箱系统 - 配置管理器
// ==========================================
// 职责: 运行期可调参数的加载、查询、覆写
// 存储: config_kv 表 (key-value)
// 说明: 箱子容量与质检阈值属于编译期常量, 不在此处配置
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// 零件列表默认每页条数
pub const DEFAULT_PIECE_LIST_LIMIT: usize = 100;

/// 零件列表每页条数上限
pub const DEFAULT_PIECE_LIST_MAX_LIMIT: usize = 1000;

// ==========================================
// ListLimits - 列表分页参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PIECE_LIST_LIMIT,
            max_limit: DEFAULT_PIECE_LIST_MAX_LIMIT,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值 (存在则覆盖)
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照
    pub fn get_all(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut snapshot = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取正整数配置, 缺失或非法时使用默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> RepositoryResult<usize> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(v) if v > 0 => Ok(v),
                _ => {
                    warn!(key, value = %raw, default, "配置值非法, 使用默认值");
                    Ok(default)
                }
            },
        }
    }

    // ===== 列表分页 =====

    /// 读取零件列表分页参数
    ///
    /// default_limit 不会超过 max_limit
    pub fn get_list_limits(&self) -> RepositoryResult<ListLimits> {
        let max_limit =
            self.get_usize_or_default(config_keys::PIECE_LIST_MAX_LIMIT, DEFAULT_PIECE_LIST_MAX_LIMIT)?;
        let default_limit =
            self.get_usize_or_default(config_keys::PIECE_LIST_DEFAULT_LIMIT, DEFAULT_PIECE_LIST_LIMIT)?;

        Ok(ListLimits {
            default_limit: default_limit.min(max_limit),
            max_limit,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 零件列表分页
    pub const PIECE_LIST_DEFAULT_LIMIT: &str = "piece_list.default_limit";
    pub const PIECE_LIST_MAX_LIMIT: &str = "piece_list.max_limit";
}
