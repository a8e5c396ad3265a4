// ==========================================
// 零件质检与装箱系统 - 命令行
// ==========================================
// 用法: fabrica-qa [--db PATH] <command> [args]
// 输出: 成功时标准输出打印 JSON; 失败时标准错误打印 {kind, message}
// ==========================================

use crate::api::dto::{CreatePieceRequest, ListPiecesRequest, NumericInput};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::app::AppState;
use crate::importer::PieceImporter;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// 审计日志中的操作人
const CLI_ACTOR: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "fabrica-qa")]
#[command(version, about = "零件质检与装箱系统")]
pub struct Cli {
    /// SQLite 数据库路径 (默认读取 FABRICA_QA_DB_PATH)
    #[arg(long = "db", global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// 登记一个零件并质检装箱
    Create {
        id: String,
        /// 重量, 接受小数逗号 ("100,5")
        #[arg(allow_hyphen_values = true)]
        weight: String,
        color: String,
        #[arg(allow_hyphen_values = true)]
        length: String,
    },
    /// 查询零件
    GetPiece { id: String },
    /// 分页列出零件
    ListPieces {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// 删除零件
    DeletePiece { id: String },
    /// 列出箱子
    ListBoxes {
        #[arg(long)]
        status: Option<String>,
    },
    /// 查询箱子及其零件
    GetBox { id: String },
    /// 删除箱子并重分配其零件
    DeleteBox { id: String },
    /// 导入 CSV / Excel 测量文件
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 最终统计报表
    Report,
    /// 一致性检查
    Check,
}

fn to_json<T: serde::Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(e.to_string()))
}

/// 执行命令, 返回要打印的 JSON
pub async fn execute(state: &AppState, command: Command) -> ApiResult<Value> {
    match command {
        Command::Create {
            id,
            weight,
            color,
            length,
        } => {
            let request = CreatePieceRequest {
                id,
                weight: NumericInput::Text(weight),
                color,
                length: NumericInput::Text(length),
            };
            to_json(&state.piece_api.create_piece(&request, CLI_ACTOR)?)
        }
        Command::GetPiece { id } => to_json(&state.piece_api.get_piece(&id)?),
        Command::ListPieces { status, limit, offset } => {
            let request = ListPiecesRequest { status, limit, offset };
            to_json(&state.piece_api.list_pieces(&request)?)
        }
        Command::DeletePiece { id } => to_json(&state.piece_api.delete_piece(&id, CLI_ACTOR)?),
        Command::ListBoxes { status } => to_json(&state.box_api.list_boxes(status.as_deref())?),
        Command::GetBox { id } => to_json(&state.box_api.get_box(validator::parse_box_id(&id)?)?),
        Command::DeleteBox { id } => {
            to_json(&state.box_api.delete_box(validator::parse_box_id(&id)?, CLI_ACTOR)?)
        }
        Command::Import { files } => {
            let results = state.importer.batch_import(files).await;
            let any_ok = results.iter().any(|r| r.is_ok());

            let mut output = Vec::with_capacity(results.len());
            let mut first_error = None;
            for result in results {
                match result {
                    Ok(summary) => output.push(to_json(&summary)?),
                    Err(e) => {
                        let err = ApiError::from(e);
                        output.push(to_json(&err.to_body())?);
                        first_error.get_or_insert(err);
                    }
                }
            }

            // 全部文件失败时按失败处理
            match first_error {
                Some(err) if !any_ok => Err(err),
                _ => Ok(Value::Array(output)),
            }
        }
        Command::Report => to_json(&state.report_api.final_report()?),
        Command::Check => to_json(&state.report_api.ensure_consistent()?),
    }
}
