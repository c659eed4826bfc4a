// ==========================================
// NPI 主流程排程系统 - 领域类型定义
// ==========================================
// 职责: 批次类型 / 光罩状态等枚举
// 红线: 批次类型字符串与分类源保持一致,不可随意改名
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 批次种类 (Lot Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotKind {
    Scout1,      // 首探批
    Scout2,      // 二探批
    LeadLot,     // 领头批
    FollowOn,    // 跟随批
    CrossQual,   // 交叉验证批
    SilentLot,   // 静默批
    ChildLot,    // 子批
    Bull,        // Bull 批
}

impl LotKind {
    /// 是否允许携带 EF/SC 前缀
    pub fn accepts_modifier(&self) -> bool {
        matches!(self, LotKind::Scout1 | LotKind::Scout2 | LotKind::ChildLot)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LotKind::Scout1 => "Scout 1",
            LotKind::Scout2 => "Scout 2",
            LotKind::LeadLot => "Lead Lot",
            LotKind::FollowOn => "Follow On Lot",
            LotKind::CrossQual => "Cross Qual",
            LotKind::SilentLot => "Silent Lot",
            LotKind::ChildLot => "Child Lot",
            LotKind::Bull => "Bull",
        }
    }
}

impl fmt::Display for LotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 跳站前缀 (Scout Modifier)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoutModifier {
    Ef, // EF
    Sc, // SC
}

impl fmt::Display for ScoutModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoutModifier::Ef => write!(f, "EF"),
            ScoutModifier::Sc => write!(f, "SC"),
        }
    }
}

// ==========================================
// 批次类型 (Lot Type)
// ==========================================
// 展示格式: "[EF |SC ]<种类>", 例如 "EF Scout 1" / "Lead Lot"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotType {
    pub kind: LotKind,
    pub modifier: Option<ScoutModifier>,
}

impl LotType {
    pub fn new(kind: LotKind, modifier: Option<ScoutModifier>) -> Self {
        // 只有探批/子批才保留前缀
        let modifier = if kind.accepts_modifier() { modifier } else { None };
        Self { kind, modifier }
    }

    pub fn plain(kind: LotKind) -> Self {
        Self { kind, modifier: None }
    }
}

impl fmt::Display for LotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Some(m) => write!(f, "{} {}", m, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

// ==========================================
// 光罩状态 (Reticle Status)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReticleStatus {
    Shipped,
    Rejected,
    HoldWithWaiver,
    /// 其他在途状态（原文保留）
    InFlight(String),
}

impl ReticleStatus {
    /// 从源状态文本解析（大小写与首尾空白不敏感）
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let upper = trimmed.to_uppercase();
        match upper.as_str() {
            "SHIPPED" => ReticleStatus::Shipped,
            "REJECTED" => ReticleStatus::Rejected,
            "PROCESSING - HOLD WITH WAIVER" => ReticleStatus::HoldWithWaiver,
            _ => ReticleStatus::InFlight(trimmed.to_string()),
        }
    }

    /// 是否需要在归并前剔除
    pub fn is_excluded(&self) -> bool {
        matches!(self, ReticleStatus::Rejected | ReticleStatus::HoldWithWaiver)
    }

    pub fn is_shipped(&self) -> bool {
        matches!(self, ReticleStatus::Shipped)
    }
}

impl fmt::Display for ReticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReticleStatus::Shipped => write!(f, "Shipped"),
            ReticleStatus::Rejected => write!(f, "Rejected"),
            ReticleStatus::HoldWithWaiver => write!(f, "Processing - Hold With Waiver"),
            ReticleStatus::InFlight(s) => write!(f, "{}", s),
        }
    }
}
