// ==========================================
// NPI 主流程排程系统 - 站点过站记录
// ==========================================
// 用途: 数据源查询结果的强类型形态,取回后只读
// 粒度: 一行 = (批次, 站点) 的聚合事实
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// OperationVisit - 批次站点过站记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationVisit {
    pub lot_id: String,                        // 批次号（8 位）
    pub operation_code: i64,                   // 站点代码
    pub operation_short_desc: String,          // 站点短描述
    pub operation_long_desc: String,           // 站点长描述
    pub area: String,                          // 区域
    pub module: String,                        // 模块
    pub first_seen_sequence: i64,              // MIN(EXEC_SEQ)
    pub last_out_date: Option<NaiveDateTime>,  // MAX(OUT_DATE)，未出站则为空
}
