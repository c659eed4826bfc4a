// ==========================================
// NPI 主流程排程系统 - 批次分类源
// ==========================================
// 职责: NPI 场景行 → 批次类型 → 按分组提供待排程批次
// 输入: npi_scenario_query 结果行 / ScenarioRecord
// 输出: LotDescriptor 列表（提交给 LotRegistry）
// ==========================================
// 分类规则（命中即返回,标题关键词大小写敏感）:
// 前缀: 标题含 EF → EF; 否则含 SC 且不含 SCOUT → SC
// 1) 场景名含 CHILD              → Child Lot（带前缀）
// 2) SCOUT1 / S1 / SCOUT 1       → Scout 1（带前缀）
// 3) SCOUT2 / S2 / SCOUT 2       → Scout 2（带前缀）
// 4) SILENT LOT / SILENTLOT / SL → Silent Lot
// 5) LEAD / LL                   → Lead Lot
// 6) FO / FOLLOW                 → Follow On Lot
// 7) CQ / CROSS                  → Cross Qual
// 8) BULL                        → Bull
// 未命中 → 不参与排程
// ==========================================

use crate::connector::{QueryRow, RowMapper};
use crate::domain::{LotDescriptor, LotKind, LotType, ScenarioRecord, ScoutModifier};
use crate::engine::error::{query_labels, EngineError, EngineResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

const SCOUT1_KEYWORDS: &[&str] = &["SCOUT1", "S1", "SCOUT 1"];
const SCOUT2_KEYWORDS: &[&str] = &["SCOUT2", "S2", "SCOUT 2"];
const SILENT_KEYWORDS: &[&str] = &["SILENT LOT", "SILENTLOT", " SL"];
const LEAD_KEYWORDS: &[&str] = &["LEAD", " LL"];
const FOLLOW_ON_KEYWORDS: &[&str] = &["FO", "FOLLOW"];
const CROSS_QUAL_KEYWORDS: &[&str] = &["CQ", "CROSS"];
const BULL_KEYWORDS: &[&str] = &["BULL"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// 按标题与场景名判定批次类型
pub fn determine_lot_type(lot_title: &str, scenario_name: &str) -> Option<LotType> {
    let modifier = if lot_title.contains("EF") {
        Some(ScoutModifier::Ef)
    } else if lot_title.contains("SC") && !lot_title.contains("SCOUT") {
        Some(ScoutModifier::Sc)
    } else {
        None
    };

    let kind = if scenario_name.contains("CHILD") {
        LotKind::ChildLot
    } else if contains_any(lot_title, SCOUT1_KEYWORDS) {
        LotKind::Scout1
    } else if contains_any(lot_title, SCOUT2_KEYWORDS) {
        LotKind::Scout2
    } else if contains_any(lot_title, SILENT_KEYWORDS) {
        LotKind::SilentLot
    } else if contains_any(lot_title, LEAD_KEYWORDS) {
        LotKind::LeadLot
    } else if contains_any(lot_title, FOLLOW_ON_KEYWORDS) {
        LotKind::FollowOn
    } else if contains_any(lot_title, CROSS_QUAL_KEYWORDS) {
        LotKind::CrossQual
    } else if contains_any(lot_title, BULL_KEYWORDS) {
        LotKind::Bull
    } else {
        return None;
    };

    Some(LotType::new(kind, modifier))
}

// ==========================================
// ClassifiedLot - 已分类批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLot {
    pub group_name: String,
    pub dot_process: String,
    pub lot_title: String,
    pub lot_id: String,
    pub lot_type: LotType,
    pub commit_date: Option<NaiveDateTime>,
}

// ==========================================
// LotClassificationFeed
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct LotClassificationFeed {
    groups: Vec<String>, // 出现过的全部分组（含无可分类批次的分组）
    lots: Vec<ClassifiedLot>,
}

impl LotClassificationFeed {
    /// 从场景查询结果行构建
    pub fn from_rows(rows: &[QueryRow]) -> EngineResult<Self> {
        let records = RowMapper
            .to_scenario_records(rows)
            .map_err(|e| EngineError::connector(query_labels::NPI_SCENARIO, "*", e))?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<ScenarioRecord>) -> Self {
        let mut groups: Vec<String> = Vec::new();
        let mut lots = Vec::new();
        let mut skipped = 0usize;

        for record in records {
            if !groups.contains(&record.group_name) {
                groups.push(record.group_name.clone());
            }

            match determine_lot_type(&record.lot_title, &record.scenario_name) {
                Some(lot_type) => lots.push(ClassifiedLot {
                    group_name: record.group_name,
                    dot_process: record.dot_process,
                    lot_title: record.lot_title,
                    lot_id: record.lot_id,
                    lot_type,
                    commit_date: record.commit_out,
                }),
                None => {
                    skipped += 1;
                    debug!(lot_id = %record.lot_id, lot_title = %record.lot_title, "批次标题未命中分类规则");
                }
            }
        }

        info!(groups = groups.len(), classified = lots.len(), skipped, "批次分类源加载完成");
        Self { groups, lots }
    }

    /// 全部分组（首次出现顺序）
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn lots(&self) -> &[ClassifiedLot] {
        &self.lots
    }

    /// 指定分组的待排程批次
    ///
    /// 按 (批次, 类型, 承诺日期) 去重,保持首次出现顺序
    pub fn get_lots(&self, group_name: &str) -> EngineResult<Vec<LotDescriptor>> {
        if !self.groups.iter().any(|g| g == group_name) {
            return Err(EngineError::UnknownGroup(group_name.to_string()));
        }

        let mut seen = HashSet::new();
        let descriptors = self
            .lots
            .iter()
            .filter(|lot| lot.group_name == group_name)
            .map(|lot| LotDescriptor::new(lot.lot_id.clone(), lot.lot_type.to_string(), lot.commit_date))
            .filter(|d| seen.insert(d.clone()))
            .collect();

        Ok(descriptors)
    }
}
