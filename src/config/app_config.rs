// ==========================================
// 零件质检与装箱系统 - 启动配置
// ==========================================
// 来源: 环境变量
// - FABRICA_QA_DB_PATH     数据库文件路径 (默认: 用户数据目录)
// - FABRICA_QA_LOCALE      提示信息语言 (en / zh-CN, 默认 en)
// - FABRICA_QA_LOG_FORMAT  日志格式 (text / json, 默认 text)
// ==========================================

use crate::logging::LogFormat;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

pub const ENV_DB_PATH: &str = "FABRICA_QA_DB_PATH";
pub const ENV_LOCALE: &str = "FABRICA_QA_LOCALE";
pub const ENV_LOG_FORMAT: &str = "FABRICA_QA_LOG_FORMAT";

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub locale: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// 从给定变量表读取 (便于测试)
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = non_empty(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(crate::app::get_default_db_path);

        let locale = non_empty(ENV_LOCALE).unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        let log_format = match non_empty(ENV_LOG_FORMAT) {
            None => LogFormat::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(error = %e, "日志格式配置非法, 使用 text");
                LogFormat::Text
            }),
        };

        Self {
            db_path,
            locale,
            log_format,
        }
    }
}
