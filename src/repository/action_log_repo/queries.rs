use super::core::ActionLogRepository;
use crate::db::parse_ts;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult, Row};

const ACTION_LOG_COLUMNS: &str = "action_id, action_type, action_ts, actor, payload_json, detail";

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM action_log WHERE action_id = ?1", ACTION_LOG_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![action_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询最近的操作日志 (action_ts 降序)
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM action_log ORDER BY action_ts DESC, action_id DESC LIMIT ?1",
            ACTION_LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 按操作类型查询 (action_ts 降序)
    pub fn find_by_action_type(&self, action_type: ActionType) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM action_log WHERE action_type = ?1 ORDER BY action_ts DESC, action_id DESC",
            ACTION_LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![action_type.as_str()], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计日志条数
    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM action_log", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

// ==========================================
// 行映射
// ==========================================
fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let raw_type: String = row.get(1)?;
    let action_type = ActionType::parse(&raw_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("未知操作类型: {}", raw_type).into(),
        )
    })?;

    let raw_ts: String = row.get(2)?;
    let payload_json: Option<String> = row.get(4)?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type,
        action_ts: parse_ts(2, &raw_ts)?,
        actor: row.get(3)?,
        payload_json: payload_json.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(5)?,
    })
}
