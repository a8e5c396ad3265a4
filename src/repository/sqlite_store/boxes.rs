use super::core::{SqliteStore, BOX_COLUMNS};
use crate::domain::packing_box::{BoxSnapshot, PackingBox};
use crate::domain::types::BoxStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::store::BoxStore;
use rusqlite::{params, OptionalExtension, Result as SqliteResult};

impl BoxStore for SqliteStore {
    fn get_box(&self, box_id: i64) -> RepositoryResult<Option<PackingBox>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM packing_box WHERE box_id = ?1", BOX_COLUMNS);

        let found = conn
            .query_row(&sql, params![box_id], Self::map_box_row)
            .optional()?;
        Ok(found)
    }

    fn list_boxes(&self, status: Option<BoxStatus>) -> RepositoryResult<Vec<PackingBox>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM packing_box
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY opened_at DESC, box_id DESC
            "#,
            BOX_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let boxes = stmt
            .query_map(params![status.map(|s| s.as_str())], Self::map_box_row)?
            .collect::<SqliteResult<Vec<PackingBox>>>()?;
        Ok(boxes)
    }

    fn box_snapshot(&self, include: &[i64]) -> RepositoryResult<BoxSnapshot> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM packing_box WHERE status = 'open' ORDER BY opened_at ASC, box_id ASC",
            BOX_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut boxes = stmt
            .query_map([], Self::map_box_row)?
            .collect::<SqliteResult<Vec<PackingBox>>>()?;

        // 追加指定的箱子（可能已封箱）
        let by_id_sql = format!("SELECT {} FROM packing_box WHERE box_id = ?1", BOX_COLUMNS);
        for box_id in include {
            if boxes.iter().any(|b| b.box_id == *box_id) {
                continue;
            }
            if let Some(found) = conn
                .query_row(&by_id_sql, params![box_id], Self::map_box_row)
                .optional()?
            {
                boxes.push(found);
            }
        }

        let next_box_id: i64 = conn.query_row(
            "SELECT next_box_id FROM box_sequence WHERE id = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(BoxSnapshot { boxes, next_box_id })
    }
}
