// ==========================================
// NPI 主流程排程系统 - 批次排程投影
// ==========================================
// 职责: 主流程 + 单批次过站记录 + 承诺日期 → 每站计划时间
// 模型: 线性插值（每层等周期, DPML = 总周期天数 / 最大层序）
// 红线: max_order == 0 必须显式报 EmptyFlow, 不得除零
// ==========================================
// 投片日期口径: 取连接后 order_index 最小行的出站时间,
// 而不是原始数据中最早的时间戳（返工/重入可能更早）
// ==========================================

use crate::domain::{CanonicalFlow, LotDescriptor, LotSchedule, OperationVisit, ScheduleRow};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, instrument, warn};

const SECONDS_PER_DAY: f64 = 86_400.0;

// ==========================================
// ScheduleProjector
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScheduleProjector;

/// 连接后的中间行
struct JoinedRow<'a> {
    order_index: usize,
    layer: &'a str,
    visit: &'a OperationVisit,
}

impl ScheduleProjector {
    pub fn new() -> Self {
        Self
    }

    /// 投影单批次排程
    ///
    /// # 参数
    /// - lot_visits: 该批次的过站记录
    /// - flow: 主流程（只读共享）
    /// - lot: 批次描述（批次号/类型/承诺日期）
    /// - npi_id: NPI 标识
    ///
    /// # 错误
    /// - EmptyFlow: 主流程为空 / 无交集 / 最大层序为 0
    /// - MissingCommitDate: 未提供承诺日期
    /// - MissingReleaseDate: 首行无出站时间
    #[instrument(skip(self, lot_visits, flow, lot), fields(lot_id = %lot.lot_id, visits = lot_visits.len()))]
    pub fn project(
        &self,
        lot_visits: &[OperationVisit],
        flow: &CanonicalFlow,
        lot: &LotDescriptor,
        npi_id: &str,
    ) -> EngineResult<LotSchedule> {
        if flow.is_empty() {
            return Err(EngineError::empty_flow(format!(
                "主流程无条目, lot_id={}",
                lot.lot_id
            )));
        }

        let commit_date = lot.commit_date.ok_or_else(|| EngineError::MissingCommitDate {
            lot_id: lot.lot_id.clone(),
        })?;

        // 1~2. 按短描述内连接主流程,按层序稳定排序
        let joined = self.join_with_flow(lot_visits, flow);
        let (first, last) = match (joined.first(), joined.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(EngineError::empty_flow(format!(
                    "批次过站记录与主流程无交集, lot_id={}",
                    lot.lot_id
                )))
            }
        };

        // 5. 最大层序前置校验
        let max_order = last.order_index;
        if max_order == 0 {
            return Err(EngineError::empty_flow(format!(
                "最大层序为 0, lot_id={}",
                lot.lot_id
            )));
        }

        // 3. 投片日期
        let release_date = first.visit.last_out_date.ok_or_else(|| EngineError::MissingReleaseDate {
            lot_id: lot.lot_id.clone(),
            operation: first.visit.operation_short_desc.clone(),
        })?;

        // 4~6. 总周期与 DPML
        // 整天数向下取整（负周期同样向负无穷取整）
        let total_transit_days = (commit_date - release_date)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY as i64);
        if total_transit_days < 0 {
            warn!(
                lot_id = %lot.lot_id,
                commit_date = %commit_date,
                release_date = %release_date,
                "承诺日期早于投片日期，计划时间将递减"
            );
        }
        let days_per_layer = total_transit_days as f64 / max_order as f64;

        // 7~8. 逐行计划时间
        let rows: Vec<ScheduleRow> = joined
            .iter()
            .map(|j| ScheduleRow {
                order_index: j.order_index,
                operation_code: j.visit.operation_code,
                operation_short_desc: j.visit.operation_short_desc.clone(),
                operation_long_desc: j.visit.operation_long_desc.clone(),
                layer: j.layer.to_string(),
                out_date: j.visit.last_out_date,
                planned_date: planned_date(release_date, days_per_layer, j.order_index),
            })
            .collect();

        debug!(
            lot_id = %lot.lot_id,
            rows = rows.len(),
            max_order,
            total_transit_days,
            days_per_layer,
            "批次排程投影完成"
        );

        Ok(LotSchedule {
            lot_id: lot.lot_id.clone(),
            lot_type: lot.lot_type.clone(),
            npi_id: npi_id.to_string(),
            commit_date,
            release_date,
            days_per_layer,
            rows,
        })
    }

    /// 内连接: 每条过站记录 × 主流程中同短描述的每个条目
    fn join_with_flow<'a>(
        &self,
        lot_visits: &'a [OperationVisit],
        flow: &'a CanonicalFlow,
    ) -> Vec<JoinedRow<'a>> {
        let mut joined: Vec<JoinedRow<'a>> = lot_visits
            .iter()
            .flat_map(|visit| {
                flow.entries_for_short_desc(&visit.operation_short_desc)
                    .map(move |entry| JoinedRow {
                        order_index: entry.order_index,
                        layer: entry.layer.as_str(),
                        visit,
                    })
            })
            .collect();

        joined.sort_by_key(|j| j.order_index);
        joined
    }
}

/// release + DPML × order_index 天（秒级取整）
fn planned_date(release_date: NaiveDateTime, days_per_layer: f64, order_index: usize) -> NaiveDateTime {
    let offset_seconds = (days_per_layer * order_index as f64 * SECONDS_PER_DAY).round() as i64;
    release_date + Duration::seconds(offset_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::flow_builder::FlowBuilder;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn visit(op: i64, short: &str, module: &str, seq: i64, out: Option<NaiveDateTime>) -> OperationVisit {
        OperationVisit {
            lot_id: "D1234567".to_string(),
            operation_code: op,
            operation_short_desc: short.to_string(),
            operation_long_desc: format!("{} STEP", short),
            area: "LITHO".to_string(),
            module: module.to_string(),
            first_seen_sequence: seq,
            last_out_date: out,
        }
    }

    fn reference_flow() -> CanonicalFlow {
        let visits = vec![
            visit(100, "START", "PC-STARTS", 1, None),
            visit(200, "VA1", "LI-BE-193", 2, None),
            visit(300, "MT1", "LI-BE-193", 3, None),
            visit(400, "VA2", "LI-BE-193", 4, None),
        ];
        FlowBuilder::default().build(&visits)
    }

    fn lot(commit: Option<NaiveDateTime>) -> LotDescriptor {
        LotDescriptor::new("D1234567", "Lead Lot", commit)
    }

    #[test]
    fn test_uniform_spacing_for_full_flow() {
        let flow = reference_flow();
        let release = ts(2024, 1, 1);
        let lot_visits = vec![
            visit(100, "START", "PC-STARTS", 1, Some(release)),
            visit(200, "VA1", "LI-BE-193", 2, Some(ts(2024, 1, 5))),
            visit(300, "MT1", "LI-BE-193", 3, Some(ts(2024, 1, 9))),
            visit(400, "VA2", "LI-BE-193", 4, None),
        ];

        let schedule = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(ts(2024, 1, 31))), "NPI-1")
            .unwrap();

        assert_eq!(schedule.release_date, release);
        assert_eq!(schedule.days_per_layer, 10.0);
        assert_eq!(schedule.rows.len(), 4);
        for (i, row) in schedule.rows.iter().enumerate() {
            assert_eq!(row.order_index, i);
            assert_eq!(row.planned_date, release + Duration::days(10 * i as i64));
        }
        assert_eq!(schedule.rows[3].out_date, None);
        assert_eq!(schedule.npi_id, "NPI-1");
    }

    #[test]
    fn test_negative_transit_rounds_down() {
        let flow = reference_flow();
        let release = ts(2024, 1, 10);
        let lot_visits = vec![
            visit(100, "START", "PC-STARTS", 1, Some(release)),
            visit(400, "VA2", "LI-BE-193", 4, None),
        ];
        // 承诺早于投片 1.5 天 → -2 整天
        let commit = release - Duration::hours(36);

        let schedule = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(commit)), "NPI-1")
            .unwrap();

        assert_eq!(schedule.days_per_layer, -2.0 / 3.0);
        assert_eq!(schedule.rows[1].planned_date, release - Duration::days(2));
    }

    #[test]
    fn test_fractional_days_per_layer() {
        let flow = reference_flow();
        let release = ts(2024, 1, 1);
        let lot_visits = vec![
            visit(100, "START", "PC-STARTS", 1, Some(release)),
            visit(400, "VA2", "LI-BE-193", 4, None),
        ];

        // 10 天 / 3 层
        let schedule = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(ts(2024, 1, 11))), "NPI-1")
            .unwrap();

        assert_eq!(schedule.rows.len(), 2);
        assert!((schedule.days_per_layer - 10.0 / 3.0).abs() < 1e-9);
        // max_order = 3 → 最后一行落在承诺日期
        assert_eq!(schedule.rows[1].planned_date, ts(2024, 1, 11));
    }

    #[test]
    fn test_unmatched_visits_dropped_and_sorted() {
        let flow = reference_flow();
        let lot_visits = vec![
            visit(300, "MT1", "LI-BE-193", 3, Some(ts(2024, 1, 9))),
            visit(999, "REWORK", "ETCH", 0, Some(ts(2023, 12, 1))),
            visit(100, "START", "PC-STARTS", 1, Some(ts(2024, 1, 1))),
        ];

        let schedule = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(ts(2024, 1, 21))), "NPI-1")
            .unwrap();

        let orders: Vec<usize> = schedule.rows.iter().map(|r| r.order_index).collect();
        assert_eq!(orders, vec![0, 2]);
        // 投片日期不取返工行的更早时间
        assert_eq!(schedule.release_date, ts(2024, 1, 1));
    }

    #[test]
    fn test_empty_flow_rejected() {
        let err = ScheduleProjector::new()
            .project(&[], &CanonicalFlow::default(), &lot(Some(ts(2024, 1, 1))), "NPI-1")
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyFlow { .. }));
    }

    #[test]
    fn test_zero_max_order_rejected() {
        let flow = reference_flow();
        let lot_visits = vec![visit(100, "START", "PC-STARTS", 1, Some(ts(2024, 1, 1)))];
        let err = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(ts(2024, 2, 1))), "NPI-1")
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyFlow { .. }));
    }

    #[test]
    fn test_no_overlap_rejected() {
        let flow = reference_flow();
        let lot_visits = vec![visit(1, "OTHER", "ETCH", 1, Some(ts(2024, 1, 1)))];
        let err = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(ts(2024, 2, 1))), "NPI-1")
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyFlow { .. }));
    }

    #[test]
    fn test_missing_dates() {
        let flow = reference_flow();
        let lot_visits = vec![
            visit(100, "START", "PC-STARTS", 1, None),
            visit(200, "VA1", "LI-BE-193", 2, Some(ts(2024, 1, 5))),
        ];

        let err = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(None), "NPI-1")
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingCommitDate { .. }));

        let err = ScheduleProjector::new()
            .project(&lot_visits, &flow, &lot(Some(ts(2024, 2, 1))), "NPI-1")
            .unwrap_err();
        match err {
            EngineError::MissingReleaseDate { lot_id, operation } => {
                assert_eq!(lot_id, "D1234567");
                assert_eq!(operation, "START");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
