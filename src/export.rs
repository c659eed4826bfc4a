// ==========================================
// NPI 主流程排程系统 - CSV 导出
// ==========================================
// 职责: 汇总排程表导出 / 查询结果调试快照
// 格式: 首行表头; 时间统一为 %Y-%m-%d %H:%M:%S
// ==========================================

use crate::connector::error::ConnectorResult;
use crate::connector::query_connector::QueryRow;
use crate::domain::{CombinedScheduleTable, ReticleAvailabilityTable};
use chrono::NaiveDateTime;
use csv::Writer;
use std::collections::BTreeSet;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// 导出汇总排程表
///
/// 列: NPI, LOT_TYPE, LOT, COMMIT, ORDER, OPERATION, OPER_SHORT, OPER_LONG, LAYER, OUT_DATE, PLAN
pub fn write_schedule_csv<P: AsRef<Path>>(path: P, table: &CombinedScheduleTable) -> ConnectorResult<usize> {
    let mut writer = Writer::from_path(path.as_ref())?;
    writer.write_record([
        "NPI", "LOT_TYPE", "LOT", "COMMIT", "ORDER", "OPERATION", "OPER_SHORT", "OPER_LONG", "LAYER",
        "OUT_DATE", "PLAN",
    ])?;

    for row in table.rows() {
        writer.write_record([
            row.npi_id.clone(),
            row.lot_type.clone(),
            row.lot_id.clone(),
            format_ts(&row.commit_date),
            row.order_index.to_string(),
            row.operation_code.to_string(),
            row.operation_short_desc.clone(),
            row.operation_long_desc.clone(),
            row.layer.clone(),
            row.out_date.as_ref().map(format_ts).unwrap_or_default(),
            format_ts(&row.planned_date),
        ])?;
    }

    writer.flush()?;
    Ok(table.len())
}

/// 导出光罩可用性表
pub fn write_reticle_csv<P: AsRef<Path>>(path: P, table: &ReticleAvailabilityTable) -> ConnectorResult<usize> {
    let mut writer = Writer::from_path(path.as_ref())?;
    writer.write_record([
        "PRODUCT", "LAYER", "RETICLE_ID", "STATUS", "COMMIT_DATE", "TREND_DATE", "ORDER_DATE", "SHIP_DATE",
    ])?;

    let fmt = |d: &Option<chrono::NaiveDate>| d.map(|v| v.to_string()).unwrap_or_default();
    for row in table.rows() {
        writer.write_record([
            row.product.clone(),
            row.layer.clone(),
            row.reticle_id.clone(),
            row.status.to_string(),
            fmt(&row.commit_date),
            fmt(&row.trend_date),
            fmt(&row.order_date),
            fmt(&row.ship_date),
        ])?;
    }

    writer.flush()?;
    Ok(table.len())
}

/// 导出原始查询结果（调试快照）
///
/// 列为所有行列名的并集（字典序）; 缺失单元格写空串
pub fn write_rows_csv<P: AsRef<Path>>(path: P, rows: &[QueryRow]) -> ConnectorResult<usize> {
    let columns: Vec<&String> = rows
        .iter()
        .flat_map(|r| r.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut writer = Writer::from_path(path.as_ref())?;
    writer.write_record(columns.iter().map(|c| c.as_str()))?;

    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(*c).map(|v| v.as_str()).unwrap_or("")),
        )?;
    }

    writer.flush()?;
    Ok(rows.len())
}
