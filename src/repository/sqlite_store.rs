// ==========================================
// 零件质检与装箱系统 - SQLite 存储实现
// ==========================================
// 红线: Repository 不含业务逻辑, 只做数据映射
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

mod boxes;
mod commit;
mod core;
mod pieces;

#[cfg(test)]
mod tests;

pub use core::SqliteStore;
