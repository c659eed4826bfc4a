// ==========================================
// NPI 主流程排程系统 - 查询行映射器
// ==========================================
// 职责: QueryRow（列名 → 文本）→ 强类型记录 + 类型转换
// 约束: 列名匹配大小写不敏感; 空串视为 NULL
// ==========================================

use crate::connector::date_parse::parse_timestamp;
use crate::connector::error::{ConnectorError, ConnectorResult};
use crate::connector::query_connector::QueryRow;
use crate::domain::{OperationVisit, RawReticleRecord, ScenarioRecord};
use chrono::NaiveDateTime;

pub struct RowMapper;

impl RowMapper {
    // ==========================================
    // 记录映射
    // ==========================================

    /// 批次流程历史行 → OperationVisit
    ///
    /// 必填: LOT, OPERATION, OPER_SHORT, SEQ
    pub fn to_operation_visit(&self, row: &QueryRow, row_number: usize) -> ConnectorResult<OperationVisit> {
        Ok(OperationVisit {
            lot_id: self.require_string(row, "LOT", row_number)?,
            operation_code: self.require_i64(row, "OPERATION", row_number)?,
            operation_short_desc: self.require_string(row, "OPER_SHORT", row_number)?,
            operation_long_desc: self.get_string(row, "OPER_LONG").unwrap_or_default(),
            area: self.get_string(row, "AREA").unwrap_or_default(),
            module: self.get_string(row, "MODULE").unwrap_or_default(),
            first_seen_sequence: self.require_i64(row, "SEQ", row_number)?,
            last_out_date: self.parse_datetime(row, "OUT_DATE", row_number)?,
        })
    }

    pub fn to_operation_visits(&self, rows: &[QueryRow]) -> ConnectorResult<Vec<OperationVisit>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.to_operation_visit(row, idx + 1))
            .collect()
    }

    /// 领头批发现结果 → 去重后的 7 位批次号（保持首次出现顺序）
    pub fn to_short_lot_ids(&self, rows: &[QueryRow]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for row in rows {
            if let Some(id) = self.get_string(row, "LOT7") {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// NPI 场景行 → ScenarioRecord
    pub fn to_scenario_record(&self, row: &QueryRow, row_number: usize) -> ConnectorResult<ScenarioRecord> {
        Ok(ScenarioRecord {
            group_name: self.require_string(row, "GROUP_NAME", row_number)?,
            dot_process: self.get_string(row, "DOTPROCESS").unwrap_or_default(),
            scenario_name: self.get_string(row, "SCENARIO_NAME").unwrap_or_default(),
            lot_title: self.get_string(row, "LOT_TITLE").unwrap_or_default(),
            lot_id: self.require_string(row, "LOT", row_number)?,
            commit_out: self.parse_datetime(row, "COMMIT_OUT", row_number)?,
        })
    }

    pub fn to_scenario_records(&self, rows: &[QueryRow]) -> ConnectorResult<Vec<ScenarioRecord>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.to_scenario_record(row, idx + 1))
            .collect()
    }

    /// 光罩行 → RawReticleRecord（日期列保持原文）
    pub fn to_reticle_record(&self, row: &QueryRow, row_number: usize) -> ConnectorResult<RawReticleRecord> {
        Ok(RawReticleRecord {
            product: self.require_string(row, "PRODUCT", row_number)?,
            layer: self.require_string(row, "LAYER", row_number)?,
            reticle_id: self.get_string(row, "RETICLE_ID").unwrap_or_default(),
            status: self.get_string(row, "STATUS").unwrap_or_default(),
            commit_date: self.get_string(row, "COMMIT_DATE"),
            trend_date: self.get_string(row, "TREND_DATE"),
            order_date: self.get_string(row, "ORDER_DATE"),
            ship_date: self.get_string(row, "SHIP_DATE"),
        })
    }

    pub fn to_reticle_records(&self, rows: &[QueryRow]) -> ConnectorResult<Vec<RawReticleRecord>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.to_reticle_record(row, idx + 1))
            .collect()
    }

    // ==========================================
    // 字段提取
    // ==========================================

    /// 提取字符串字段（先精确匹配,再忽略大小写匹配）
    fn get_string(&self, row: &QueryRow, key: &str) -> Option<String> {
        let value = row.get(key).or_else(|| {
            row.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })?;

        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn require_string(&self, row: &QueryRow, key: &str, row_number: usize) -> ConnectorResult<String> {
        self.get_string(row, key)
            .ok_or_else(|| ConnectorError::MissingField {
                row: row_number,
                field: key.to_string(),
            })
    }

    /// 解析整数（兼容 "9812.0" 这类整值浮点文本）
    fn require_i64(&self, row: &QueryRow, key: &str, row_number: usize) -> ConnectorResult<i64> {
        let value = self.require_string(row, key, row_number)?;

        if let Ok(v) = value.parse::<i64>() {
            return Ok(v);
        }

        match value.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
            _ => Err(ConnectorError::FieldValueError {
                row: row_number,
                field: key.to_string(),
                message: format!("无法解析为整数: {}", value),
            }),
        }
    }

    fn parse_datetime(
        &self,
        row: &QueryRow,
        key: &str,
        row_number: usize,
    ) -> ConnectorResult<Option<NaiveDateTime>> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => parse_timestamp(&value).map_err(|message| ConnectorError::FieldValueError {
                row: row_number,
                field: key.to_string(),
                message,
            }),
        }
    }
}
