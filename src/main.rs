// ==========================================
// 零件质检与装箱系统 - 命令行主入口
// ==========================================
// 环境变量: FABRICA_QA_DB_PATH / FABRICA_QA_LOCALE / FABRICA_QA_LOG_FORMAT / RUST_LOG
// 日志输出到标准错误, 结果 JSON 输出到标准输出
// ==========================================

use fabrica_qa::api::ApiError;
use fabrica_qa::app::AppState;
use clap::Parser;
use fabrica_qa::cli::{self, Cli};
use fabrica_qa::config::AppConfig;
use fabrica_qa::{i18n, logging};
use serde_json::Value;
use std::process::ExitCode;

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

fn report_error(err: &ApiError) -> ExitCode {
    let body = err.to_body();
    match serde_json::to_string_pretty(&body) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("{}: {}", body.kind.as_str(), body.message),
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut config = AppConfig::from_env();
    logging::init(config.log_format);
    i18n::set_locale(&config.locale);

    // 参数错误与 --help / --version 由 clap 打印并退出
    let args = Cli::try_parse().unwrap_or_else(|e| e.exit());

    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }

    tracing::info!(
        version = fabrica_qa::VERSION,
        db_path = %config.db_path.display(),
        "{}",
        fabrica_qa::APP_NAME
    );

    let state = match AppState::new(config.db_path.to_string_lossy().to_string()) {
        Ok(state) => state,
        Err(e) => return report_error(&e),
    };

    match cli::execute(&state, args.command).await {
        Ok(value) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}
