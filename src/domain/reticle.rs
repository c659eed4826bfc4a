// ==========================================
// NPI 主流程排程系统 - 光罩可用性模型
// ==========================================
// 用途: 光罩侧数据集,按层别与主流程共享层别口径
// ==========================================

use crate::domain::types::ReticleStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// RawReticleRecord - 光罩原始记录
// ==========================================
// 日期列保持源文本,由 ReticleAvailabilityReducer 统一清洗
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReticleRecord {
    pub product: String,
    pub layer: String,
    pub reticle_id: String,          // 前缀为版本代码
    pub status: String,
    pub commit_date: Option<String>, // 承诺日期
    pub trend_date: Option<String>,  // 趋势预估日期
    pub order_date: Option<String>,  // 下单日期
    pub ship_date: Option<String>,   // 出货日期
}

// ==========================================
// ReticleAvailability - 每层光罩可用性
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReticleAvailability {
    pub product: String,
    pub layer: String,
    pub reticle_id: String,              // 最早承诺记录的光罩号
    pub status: ReticleStatus,           // 最早承诺记录的状态
    pub commit_date: Option<NaiveDate>,  // MIN(commit)
    pub trend_date: Option<NaiveDate>,   // MIN(trend)
    pub order_date: Option<NaiveDate>,   // MIN(order)
    pub ship_date: Option<NaiveDate>,    // MIN(ship)
}

// ==========================================
// VersionOverrides - 版本覆写表
// ==========================================
// (product, layer) → 光罩号前缀
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOverrides {
    entries: HashMap<(String, String), String>,
}

impl VersionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product: impl Into<String>, layer: impl Into<String>, version: impl Into<String>) {
        self.entries.insert((product.into(), layer.into()), version.into());
    }

    pub fn get(&self, product: &str, layer: &str) -> Option<&str> {
        self.entries
            .get(&(product.to_string(), layer.to_string()))
            .map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// ReticleAvailabilityTable - 归并结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReticleAvailabilityTable {
    rows: Vec<ReticleAvailability>,
}

impl ReticleAvailabilityTable {
    pub fn new(rows: Vec<ReticleAvailability>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ReticleAvailability] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按产品与层别查询（层别口径与主流程 layer 一致）
    pub fn for_layer(&self, product: &str, layer: &str) -> Option<&ReticleAvailability> {
        self.rows
            .iter()
            .find(|r| r.product == product && r.layer == layer)
    }
}
