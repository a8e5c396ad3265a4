// ==========================================
// 零件质检与装箱系统 - 存储抽象
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 定义零件表 / 箱子表的读取接口与原子提交接口
// 实现: SqliteStore (生产), MemoryStore (测试 / 嵌入)
// ==========================================
// 写入约定: 引擎在写锁内基于工作副本计算出 ChangeSet,
//           通过 UnitOfWork::commit 一次性原子落库;
//           commit 失败时不得留下任何部分写入
// ==========================================

use crate::domain::packing_box::{BoxSnapshot, PackingBox};
use crate::domain::piece::Piece;
use crate::domain::types::{BoxStatus, PieceStatus};
use crate::repository::error::RepositoryResult;

// ==========================================
// PieceQuery - 零件列表查询条件
// ==========================================
// 排序: created_at 降序, piece_id 降序 (最新在前)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceQuery {
    pub status: Option<PieceStatus>,
    pub limit: Option<usize>, // None = 不分页
    pub offset: usize,
}

impl PieceQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: PieceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }
}

// ==========================================
// ChangeSet - 一次写操作的全部变更
// ==========================================
// 乐观锁前置条件 (先于任何写入校验, 不满足时返回 OptimisticLockFailure):
// - box_count_guards: 工作副本读取时各已有箱子的 piece_count
// - expected_next_box_id: 工作副本读取时的编号序列值
// 多个进程共用同一数据库文件时, 由这两项发现快照已过期
//
// 应用顺序 (各实现必须一致):
// 1) 写入 / 更新箱子 (保证零件外键目标存在)
// 2) 插入新零件
// 3) 零件改派箱子
// 4) 删除零件
// 5) 删除箱子 (此时已无零件引用)
// 6) 推进箱子编号序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub boxes_to_upsert: Vec<PackingBox>,
    pub pieces_to_insert: Vec<Piece>,
    pub piece_box_updates: Vec<(String, i64)>,
    pub pieces_to_delete: Vec<String>,
    pub boxes_to_delete: Vec<i64>,
    pub next_box_id: Option<i64>,

    pub box_count_guards: Vec<(i64, u32)>,
    pub expected_next_box_id: Option<i64>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.boxes_to_upsert.is_empty()
            && self.pieces_to_insert.is_empty()
            && self.piece_box_updates.is_empty()
            && self.pieces_to_delete.is_empty()
            && self.boxes_to_delete.is_empty()
            && self.next_box_id.is_none()
    }
}

// ==========================================
// PieceStore - 零件存储
// ==========================================
pub trait PieceStore: Send + Sync {
    /// 按编号查询零件
    fn get_piece(&self, piece_id: &str) -> RepositoryResult<Option<Piece>>;

    /// 按条件分页查询零件
    fn list_pieces(&self, query: &PieceQuery) -> RepositoryResult<Vec<Piece>>;

    /// 统计零件数量 (None = 全部)
    fn count_pieces(&self, status: Option<PieceStatus>) -> RepositoryResult<u64>;

    /// 查询箱内合格零件
    ///
    /// 排序: created_at 升序, piece_id 升序 (重分配的确定性顺序)
    fn find_pieces_by_box(&self, box_id: i64) -> RepositoryResult<Vec<Piece>>;
}

// ==========================================
// BoxStore - 箱子存储
// ==========================================
pub trait BoxStore: Send + Sync {
    /// 按编号查询箱子
    fn get_box(&self, box_id: i64) -> RepositoryResult<Option<PackingBox>>;

    /// 查询箱子列表 (opened_at 降序, box_id 降序)
    fn list_boxes(&self, status: Option<BoxStatus>) -> RepositoryResult<Vec<PackingBox>>;

    /// 构造箱子池快照: 全部 Open 箱子 + include 中指定的箱子, 以及下一个可用编号
    fn box_snapshot(&self, include: &[i64]) -> RepositoryResult<BoxSnapshot>;
}

// ==========================================
// UnitOfWork - 原子提交
// ==========================================
pub trait UnitOfWork: Send + Sync {
    /// 原子应用 ChangeSet: 要么全部生效, 要么全部不生效
    ///
    /// 前置条件校验与写入处于同一个写事务内
    fn commit(&self, changes: &ChangeSet) -> RepositoryResult<()>;
}

/// 引擎所需的完整存储能力
pub trait QcStore: PieceStore + BoxStore + UnitOfWork {}

impl<T: PieceStore + BoxStore + UnitOfWork> QcStore for T {}
