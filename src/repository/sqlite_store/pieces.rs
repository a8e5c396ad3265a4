use super::core::{SqliteStore, PIECE_COLUMNS};
use crate::domain::piece::Piece;
use crate::domain::types::PieceStatus;
use crate::repository::error::RepositoryResult;
use crate::repository::store::{PieceQuery, PieceStore};
use rusqlite::{params, OptionalExtension, Result as SqliteResult};

impl PieceStore for SqliteStore {
    fn get_piece(&self, piece_id: &str) -> RepositoryResult<Option<Piece>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM piece WHERE piece_id = ?1", PIECE_COLUMNS);

        let piece = conn
            .query_row(&sql, params![piece_id], Self::map_piece_row)
            .optional()?;
        Ok(piece)
    }

    fn list_pieces(&self, query: &PieceQuery) -> RepositoryResult<Vec<Piece>> {
        let conn = self.get_conn()?;

        // LIMIT -1 = 不限
        let limit: i64 = query.limit.map(|l| l as i64).unwrap_or(-1);
        let offset = query.offset as i64;
        let status = query.status.map(|s| s.as_str());

        let sql = format!(
            r#"
            SELECT {}
            FROM piece
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, piece_id DESC
            LIMIT ?2 OFFSET ?3
            "#,
            PIECE_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let pieces = stmt
            .query_map(params![status, limit, offset], Self::map_piece_row)?
            .collect::<SqliteResult<Vec<Piece>>>()?;
        Ok(pieces)
    }

    fn count_pieces(&self, status: Option<PieceStatus>) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM piece WHERE (?1 IS NULL OR status = ?1)",
            params![status.map(|s| s.as_str())],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_pieces_by_box(&self, box_id: i64) -> RepositoryResult<Vec<Piece>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM piece
            WHERE box_id = ?1 AND status = 'approved'
            ORDER BY created_at ASC, piece_id ASC
            "#,
            PIECE_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let pieces = stmt
            .query_map(params![box_id], Self::map_piece_row)?
            .collect::<SqliteResult<Vec<Piece>>>()?;
        Ok(pieces)
    }
}
