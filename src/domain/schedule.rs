// ==========================================
// NPI 主流程排程系统 - 批次排程模型
// ==========================================
// 红线: 行按 order_index 升序; 投影完成后不可修改
// 用途: ScheduleProjector 输出, LotRegistry 汇总
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// LotDescriptor - 批次提交描述
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotDescriptor {
    pub lot_id: String,
    pub lot_type: String,                   // 批次类型标签（如 "Scout 1"）
    pub commit_date: Option<NaiveDateTime>, // 承诺出货日期
}

impl LotDescriptor {
    pub fn new(lot_id: impl Into<String>, lot_type: impl Into<String>, commit_date: Option<NaiveDateTime>) -> Self {
        Self {
            lot_id: lot_id.into(),
            lot_type: lot_type.into(),
            commit_date,
        }
    }
}

// ==========================================
// ScheduleRow - 单站排程行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub order_index: usize,
    pub operation_code: i64,
    pub operation_short_desc: String,
    pub operation_long_desc: String,
    pub layer: String,
    pub out_date: Option<NaiveDateTime>, // 实际出站时间
    pub planned_date: NaiveDateTime,     // 线性插值计划时间
}

// ==========================================
// LotSchedule - 单批次排程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSchedule {
    pub lot_id: String,
    pub lot_type: String,
    pub npi_id: String,
    pub commit_date: NaiveDateTime,
    pub release_date: NaiveDateTime,
    pub days_per_layer: f64, // DPML
    pub rows: Vec<ScheduleRow>,
}

impl LotSchedule {
    /// 展平为汇总表记录
    pub fn to_records(&self) -> Vec<ScheduleRecord> {
        self.rows
            .iter()
            .map(|row| ScheduleRecord {
                npi_id: self.npi_id.clone(),
                lot_type: self.lot_type.clone(),
                lot_id: self.lot_id.clone(),
                commit_date: self.commit_date,
                order_index: row.order_index,
                operation_code: row.operation_code,
                operation_short_desc: row.operation_short_desc.clone(),
                operation_long_desc: row.operation_long_desc.clone(),
                layer: row.layer.clone(),
                out_date: row.out_date,
                planned_date: row.planned_date,
            })
            .collect()
    }

    /// 指定层别的最早计划时间
    pub fn planned_date_for_layer(&self, layer: &str) -> Option<NaiveDateTime> {
        self.rows
            .iter()
            .filter(|r| r.layer == layer)
            .map(|r| r.planned_date)
            .min()
    }
}

// ==========================================
// ScheduleRecord - 汇总表行（扁平）
// ==========================================
// 列顺序与 CSV 导出一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub npi_id: String,
    pub lot_type: String,
    pub lot_id: String,
    pub commit_date: NaiveDateTime,
    pub order_index: usize,
    pub operation_code: i64,
    pub operation_short_desc: String,
    pub operation_long_desc: String,
    pub layer: String,
    pub out_date: Option<NaiveDateTime>,
    pub planned_date: NaiveDateTime,
}

// ==========================================
// CombinedScheduleTable - 多批次汇总表
// ==========================================
// 只追加; 同一批次的行连续且 order_index 升序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedScheduleTable {
    rows: Vec<ScheduleRecord>,
}

impl CombinedScheduleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, schedule: &LotSchedule) {
        self.rows.extend(schedule.to_records());
    }

    pub fn rows(&self) -> &[ScheduleRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_for_lot<'a>(&'a self, lot_id: &'a str) -> impl Iterator<Item = &'a ScheduleRecord> + 'a {
        self.rows.iter().filter(move |r| r.lot_id == lot_id)
    }

    /// 各批次行数（按批次号排序）
    pub fn row_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.lot_id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

// ==========================================
// LotOutcome / BatchReport - 批量提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotOutcome {
    /// 本次成功登记
    Registered { row_count: usize },
    /// 已在登记簿中,未重新拉取
    AlreadyRegistered,
    /// 同批次内重复提交,以首个为准
    DuplicateInBatch,
    /// 处理失败（不影响同批其他批次）
    Failed { reason: String },
}

impl LotOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, LotOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub elapsed_ms: u128,
    /// 按提交顺序记录每个描述的结果
    pub outcomes: Vec<(String, LotOutcome)>,
}

impl BatchReport {
    pub fn registered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, LotOutcome::Registered { .. }))
            .count()
    }

    pub fn failed_lots(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(lot, _)| lot.as_str())
            .collect()
    }

    pub fn outcome(&self, lot_id: &str) -> Option<&LotOutcome> {
        self.outcomes
            .iter()
            .find(|(lot, _)| lot == lot_id)
            .map(|(_, o)| o)
    }
}
