// ==========================================
// NPI 主流程排程系统 - NPI 场景记录
// ==========================================
// 用途: 批次分类源的输入行（标题 + 场景名 → 批次类型）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub group_name: String,                 // NPI 分组
    pub dot_process: String,                // 工艺代号
    pub scenario_name: String,              // 场景名
    pub lot_title: String,                  // 批次标题
    pub lot_id: String,                     // 批次号
    pub commit_out: Option<NaiveDateTime>,  // 承诺出货
}
