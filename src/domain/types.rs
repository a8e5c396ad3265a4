// ==========================================
// 零件质检与装箱系统 - 领域类型定义
// ==========================================
// 依据: 质检标准 - 重量 / 颜色 / 长度三项判定
// 序列化格式: 小写字符串 (与数据库、外部接口一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 颜色 (Color)
// ==========================================
// 红线: 未知颜色不是输入错误, 而是质检不合格 ("invalid color")
// 因此 Other 保留原始值, 交给 QualityEvaluator 判定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Color {
    Blue,
    Green,
    Other(String),
}

impl Color {
    /// 解析颜色输入
    ///
    /// 规则:
    /// - 去除首尾空白, 不区分大小写
    /// - 兼容葡语别名: azul → blue, verde → green
    /// - 其他非空值保留为 Other(小写)
    ///
    /// # 返回
    /// - None: 输入为空 (属于校验错误, 由调用方处理)
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "" => None,
            "blue" | "azul" => Some(Color::Blue),
            "green" | "verde" => Some(Color::Green),
            _ => Some(Color::Other(normalized)),
        }
    }

    /// 是否属于允许的颜色集合 {blue, green}
    pub fn is_allowed(&self) -> bool {
        matches!(self, Color::Blue | Color::Green)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Color::parse(&value).unwrap_or(Color::Other(value))
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 零件状态 (Piece Status)
// ==========================================
// 红线: 创建时一次性判定, 之后不再改变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceStatus {
    Approved, // 合格
    Rejected, // 不合格
}

impl PieceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceStatus::Approved => "approved",
            PieceStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "approved" => Some(PieceStatus::Approved),
            "rejected" => Some(PieceStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 箱子状态 (Box Status)
// ==========================================
// 单向状态机: Open → Closed, 不可回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxStatus {
    Open,   // 可继续装箱
    Closed, // 已封箱
}

impl BoxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxStatus::Open => "open",
            BoxStatus::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "open" => Some(BoxStatus::Open),
            "closed" => Some(BoxStatus::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for BoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 不合格原因 (Rejection Reason)
// ==========================================
// 顺序: 重量 → 颜色 → 长度 (判定顺序即输出顺序, 属于对外契约)
// 原因码不做国际化: 它是数据, 不是提示文案
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    #[serde(rename = "weight out of range")]
    WeightOutOfRange,
    #[serde(rename = "invalid color")]
    InvalidColor,
    #[serde(rename = "length out of range")]
    LengthOutOfRange,
}

impl RejectionReason {
    /// 全部原因 (规范顺序)
    pub const ALL: [RejectionReason; 3] = [
        RejectionReason::WeightOutOfRange,
        RejectionReason::InvalidColor,
        RejectionReason::LengthOutOfRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::WeightOutOfRange => "weight out of range",
            RejectionReason::InvalidColor => "invalid color",
            RejectionReason::LengthOutOfRange => "length out of range",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == raw)
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
