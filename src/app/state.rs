// ==========================================
// 零件质检与装箱系统 - 应用状态
// ==========================================
// 职责: 组装共享连接、存储、引擎与各 API 实例
// 约束: 整个进程只有一个 BoxingEngine (唯一写锁)
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiResult, AuditTrail, BoxApi, PieceApi, ReportApi};
use crate::config::ConfigManager;
use crate::engine::BoxingEngine;
use crate::importer::PieceImporterImpl;
use crate::repository::{ActionLogRepository, SqliteStore};
use tracing::info;

// ==========================================
// AppState - 应用状态
// ==========================================
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 装箱引擎 (各 API 共享)
    pub engine: Arc<BoxingEngine<SqliteStore>>,

    pub piece_api: Arc<PieceApi<SqliteStore>>,
    pub box_api: Arc<BoxApi<SqliteStore>>,
    pub report_api: Arc<ReportApi<SqliteStore>>,
    pub importer: Arc<PieceImporterImpl<SqliteStore>>,

    /// 运行期配置
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (不存在时自动创建并建表)
    pub fn new(db_path: String) -> ApiResult<Self> {
        info!(db_path = %db_path, "初始化应用状态");

        // 所有仓储共享同一连接
        let store = Arc::new(SqliteStore::new(&db_path)?);
        let conn = store.connection();

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let limits = config_manager.get_list_limits()?;

        let audit = AuditTrail::new(Arc::new(ActionLogRepository::new(conn)));
        let engine = Arc::new(BoxingEngine::new(store));

        let piece_api = Arc::new(PieceApi::new(engine.clone(), audit.clone(), limits));
        let box_api = Arc::new(BoxApi::new(engine.clone(), audit.clone()));
        let report_api = Arc::new(ReportApi::new(engine.clone()));
        let importer = Arc::new(PieceImporterImpl::new(piece_api.clone(), audit));

        info!(
            default_limit = limits.default_limit,
            max_limit = limits.max_limit,
            "应用状态初始化完成"
        );

        Ok(Self {
            db_path,
            engine,
            piece_api,
            box_api,
            report_api,
            importer,
            config_manager,
        })
    }
}

/// 默认数据库路径: 用户数据目录下的 fabrica-qa/fabrica_qa.db
///
/// 拿不到数据目录时退回当前目录
pub fn get_default_db_path() -> PathBuf {
    let mut path = PathBuf::from("./fabrica_qa.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("fabrica-qa");
        // best-effort: 创建失败时由打开数据库时报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("fabrica_qa.db");
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{CreatePieceRequest, NumericInput};
    use crate::config::config_keys;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with("fabrica_qa.db"));
    }

    #[test]
    fn test_app_state_wires_shared_engine() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        let created = state
            .piece_api
            .create_piece(
                &CreatePieceRequest {
                    id: "P1".to_string(),
                    weight: NumericInput::Number(100.0),
                    color: "blue".to_string(),
                    length: NumericInput::Number(15.0),
                },
                "tester",
            )
            .unwrap();
        assert_eq!(created.box_id, Some(1));
        assert_eq!(state.box_api.get_box(1).unwrap().pieces.len(), 1);
        drop(state);

        // 重新打开后数据仍在
        let reopened = AppState::new(db_path).unwrap();
        assert_eq!(reopened.piece_api.get_piece("P1").unwrap(), created);
    }

    #[test]
    fn test_list_limits_loaded_from_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_string_lossy().to_string();
        {
            let manager = ConfigManager::new(&db_path).unwrap();
            manager
                .set_config_value(config_keys::PIECE_LIST_DEFAULT_LIMIT, "3")
                .unwrap();
        }

        let state = AppState::new(db_path).unwrap();
        let page = state.piece_api.list_pieces(&Default::default()).unwrap();
        assert_eq!(page.limit, 3);
    }
}
