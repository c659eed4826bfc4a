// ==========================================
// NPI 主流程排程系统 - 批次登记簿
// ==========================================
// 职责: 批量拉取批次过站记录 → 投影排程 → 汇总登记
// 并发: 每批次一个阻塞工作线程（spawn_blocking）, join_all 汇合
// 红线:
// - 同一批次号至多登记一次（先写者胜）
// - 单批次失败不得中止同批其他批次
// - 登记簿映射 / 汇总表 / 失败表由同一把锁保护
// ==========================================

use crate::connector::queries::lot_flow_query;
use crate::connector::{LotSelector, QueryConnector, RowMapper};
use crate::domain::{
    BatchReport, CanonicalFlow, CombinedScheduleTable, LotDescriptor, LotOutcome, LotSchedule,
    OperationVisit,
};
use crate::engine::error::{query_labels, EngineError, EngineResult};
use crate::engine::schedule_projector::ScheduleProjector;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 受锁保护的登记状态
#[derive(Debug, Default)]
struct RegistryState {
    schedules: HashMap<String, LotSchedule>,
    table: CombinedScheduleTable,
    failures: HashMap<String, String>, // 批次号 → 最近一次失败原因
}

// ==========================================
// LotRegistry
// ==========================================
#[derive(Clone)]
pub struct LotRegistry {
    flow: Arc<CanonicalFlow>,
    connector: Arc<dyn QueryConnector>,
    data_source: String,
    npi_id: String,
    projector: ScheduleProjector,
    state: Arc<Mutex<RegistryState>>,
}

impl LotRegistry {
    /// # 参数
    /// - flow: 主流程（只读共享）
    /// - connector: 查询连接器（须支持并发调用）
    /// - data_source: 查询数据源标识
    /// - npi_id: 排程行所属 NPI
    pub fn new(
        flow: Arc<CanonicalFlow>,
        connector: Arc<dyn QueryConnector>,
        data_source: impl Into<String>,
        npi_id: impl Into<String>,
    ) -> Self {
        Self {
            flow,
            connector,
            data_source: data_source.into(),
            npi_id: npi_id.into(),
            projector: ScheduleProjector::new(),
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    pub fn flow(&self) -> &CanonicalFlow {
        &self.flow
    }

    pub fn npi_id(&self) -> &str {
        &self.npi_id
    }

    // ==========================================
    // 批量提交
    // ==========================================

    /// 批量登记
    ///
    /// 批内重复以首个为准; 已登记的批次不再拉取;
    /// 所有工作线程结束后才返回。
    #[instrument(skip(self, descriptors), fields(batch_id, lots = descriptors.len()))]
    pub async fn submit_batch(&self, descriptors: Vec<LotDescriptor>) -> EngineResult<BatchReport> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        let started = Instant::now();

        info!(batch_id = %batch_id, lots = descriptors.len(), "开始批量登记批次");

        // 1. 批内去重 + 已登记判定
        let mut outcomes: Vec<(String, Option<LotOutcome>)> = Vec::with_capacity(descriptors.len());
        let mut dispatch: Vec<(usize, LotDescriptor)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        {
            let state = self.lock_state()?;
            for descriptor in descriptors {
                let lot_id = descriptor.lot_id.clone();
                let outcome = if !seen.insert(lot_id.clone()) {
                    Some(LotOutcome::DuplicateInBatch)
                } else if state.schedules.contains_key(&lot_id) {
                    Some(LotOutcome::AlreadyRegistered)
                } else {
                    dispatch.push((outcomes.len(), descriptor));
                    None
                };
                outcomes.push((lot_id, outcome));
            }
        }

        // 2. 每批次一个阻塞工作线程
        let tasks = dispatch.into_iter().map(|(slot, descriptor)| {
            let registry = self.clone();
            let lot_id = descriptor.lot_id.clone();
            let handle = tokio::task::spawn_blocking(move || registry.process_lot(&descriptor));
            async move { (slot, lot_id, handle.await) }
        });

        // 3. 汇合并按批次隔离失败
        for (slot, lot_id, joined) in join_all(tasks).await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => self.record_failure(&lot_id, &e),
                Err(join_error) => {
                    let e = EngineError::WorkerPanicked {
                        lot_id: lot_id.clone(),
                        message: join_error.to_string(),
                    };
                    self.record_failure(&lot_id, &e)
                }
            };
            outcomes[slot].1 = Some(outcome);
        }

        let report = BatchReport {
            batch_id,
            elapsed_ms: started.elapsed().as_millis(),
            outcomes: outcomes
                .into_iter()
                .map(|(lot_id, outcome)| {
                    let outcome = outcome.unwrap_or_else(|| LotOutcome::Failed {
                        reason: "工作线程未返回结果".to_string(),
                    });
                    (lot_id, outcome)
                })
                .collect(),
        };

        info!(
            batch_id = %report.batch_id,
            total = report.outcomes.len(),
            registered = report.registered_count(),
            failed = report.failed_lots().len(),
            elapsed_ms = report.elapsed_ms as u64,
            "批量登记完成"
        );

        Ok(report)
    }

    /// 单批次登记（同步,错误直接返回）
    pub fn add_lot(&self, descriptor: &LotDescriptor) -> EngineResult<LotOutcome> {
        if self.is_registered(&descriptor.lot_id)? {
            return Ok(LotOutcome::AlreadyRegistered);
        }
        self.process_lot(descriptor)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn is_registered(&self, lot_id: &str) -> EngineResult<bool> {
        Ok(self.lock_state()?.schedules.contains_key(lot_id))
    }

    pub fn schedule(&self, lot_id: &str) -> EngineResult<Option<LotSchedule>> {
        Ok(self.lock_state()?.schedules.get(lot_id).cloned())
    }

    /// 已登记批次号（升序）
    pub fn lot_ids(&self) -> EngineResult<Vec<String>> {
        let mut ids: Vec<String> = self.lock_state()?.schedules.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// 汇总表快照
    pub fn combined_table(&self) -> EngineResult<CombinedScheduleTable> {
        Ok(self.lock_state()?.table.clone())
    }

    /// 失败批次快照（批次号 → 原因）
    pub fn failures(&self) -> EngineResult<HashMap<String, String>> {
        Ok(self.lock_state()?.failures.clone())
    }

    pub fn len(&self) -> EngineResult<usize> {
        Ok(self.lock_state()?.schedules.len())
    }

    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    // ==========================================
    // 内部流程
    // ==========================================

    /// 拉取 → 投影 → 登记
    fn process_lot(&self, descriptor: &LotDescriptor) -> EngineResult<LotOutcome> {
        let visits = self.fetch_visits(&descriptor.lot_id)?;
        let schedule = self
            .projector
            .project(&visits, &self.flow, descriptor, &self.npi_id)?;
        self.register(schedule)
    }

    fn fetch_visits(&self, lot_id: &str) -> EngineResult<Vec<OperationVisit>> {
        let query = lot_flow_query(&LotSelector::Lot(lot_id.to_string()));
        let rows = self
            .connector
            .execute(&query, &self.data_source)
            .map_err(|e| EngineError::connector(query_labels::LOT_FLOW, lot_id, e))?;

        RowMapper
            .to_operation_visits(&rows)
            .map_err(|e| EngineError::connector(query_labels::LOT_FLOW, lot_id, e))
    }

    /// 插入映射并追加汇总表（先写者胜）
    fn register(&self, schedule: LotSchedule) -> EngineResult<LotOutcome> {
        let mut state = self.lock_state()?;

        if state.schedules.contains_key(&schedule.lot_id) {
            warn!(lot_id = %schedule.lot_id, "批次已由其他提交登记,丢弃本次结果");
            return Ok(LotOutcome::AlreadyRegistered);
        }

        let row_count = schedule.rows.len();
        state.table.append(&schedule);
        state.failures.remove(&schedule.lot_id);
        info!(lot_id = %schedule.lot_id, rows = row_count, "批次排程已登记");
        state.schedules.insert(schedule.lot_id.clone(), schedule);

        Ok(LotOutcome::Registered { row_count })
    }

    fn record_failure(&self, lot_id: &str, e: &EngineError) -> LotOutcome {
        let reason = e.to_string();
        error!(lot_id = %lot_id, error = %reason, "批次登记失败");

        match self.lock_state() {
            Ok(mut state) => {
                state.failures.insert(lot_id.to_string(), reason.clone());
            }
            Err(lock_error) => {
                warn!(lot_id = %lot_id, error = %lock_error, "失败记录写入失败");
            }
        }

        LotOutcome::Failed { reason }
    }

    fn lock_state(&self) -> EngineResult<MutexGuard<'_, RegistryState>> {
        self.state
            .lock()
            .map_err(|e| EngineError::LockError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectorError, ConnectorResult, QueryRow};
    use crate::domain::OperationVisit;
    use crate::engine::flow_builder::FlowBuilder;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    /// 每个批次返回相同的 4 站过站记录; 批次号含 "BAD" 时报错
    struct StubConnector;

    impl QueryConnector for StubConnector {
        fn execute(&self, query: &str, _source: &str) -> ConnectorResult<Vec<QueryRow>> {
            if query.contains("BAD") {
                return Err(ConnectorError::QueryFailed {
                    source_id: "STUB".into(),
                    message: "timeout".into(),
                });
            }
            let lot = query
                .split("lf.LOT IN ('")
                .nth(1)
                .and_then(|rest| rest.split('\'').next())
                .unwrap_or("UNKNOWN")
                .to_string();
            let rows = [("START", "PC-STARTS", 1, "2024-01-01"), ("VA1", "LI-BE-193", 2, "2024-01-04")]
                .iter()
                .map(|(short, module, seq, out)| {
                    let mut row = QueryRow::new();
                    row.insert("LOT".into(), lot.clone());
                    row.insert("OPERATION".into(), format!("{}", seq * 100));
                    row.insert("OPER_SHORT".into(), short.to_string());
                    row.insert("OPER_LONG".into(), format!("{} STEP", short));
                    row.insert("MODULE".into(), module.to_string());
                    row.insert("SEQ".into(), seq.to_string());
                    row.insert("OUT_DATE".into(), out.to_string());
                    row
                })
                .collect();
            Ok(rows)
        }
    }

    fn registry() -> LotRegistry {
        let visit = |op: i64, short: &str, module: &str, seq: i64| OperationVisit {
            lot_id: "REF00001".into(),
            operation_code: op,
            operation_short_desc: short.into(),
            operation_long_desc: format!("{} STEP", short),
            area: String::new(),
            module: module.into(),
            first_seen_sequence: seq,
            last_out_date: None,
        };
        let flow = FlowBuilder::default().build(&[
            visit(100, "START", "PC-STARTS", 1),
            visit(200, "VA1", "LI-BE-193", 2),
        ]);
        LotRegistry::new(Arc::new(flow), Arc::new(StubConnector), "SRC", "NPI-1")
    }

    #[test]
    fn test_add_lot_then_duplicate() {
        let registry = registry();
        let lot = LotDescriptor::new("D0000001", "Lead Lot", Some(ts(1, 11)));

        assert_eq!(
            registry.add_lot(&lot).unwrap(),
            LotOutcome::Registered { row_count: 2 }
        );
        assert_eq!(registry.add_lot(&lot).unwrap(), LotOutcome::AlreadyRegistered);
        assert_eq!(registry.len().unwrap(), 1);
        assert_eq!(registry.combined_table().unwrap().len(), 2);
    }

    #[test]
    fn test_add_lot_propagates_errors() {
        let registry = registry();
        let err = registry
            .add_lot(&LotDescriptor::new("BAD00001", "Lead Lot", Some(ts(1, 11))))
            .unwrap_err();
        assert!(matches!(err, EngineError::Connector { .. }));
        assert!(registry.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_submit_batch_isolates_failures() {
        let registry = registry();
        let report = registry
            .submit_batch(vec![
                LotDescriptor::new("D0000001", "Lead Lot", Some(ts(1, 11))),
                LotDescriptor::new("BAD00001", "Scout 1", Some(ts(1, 11))),
                LotDescriptor::new("D0000001", "Lead Lot", Some(ts(1, 11))),
                LotDescriptor::new("D0000002", "Scout 1", None),
            ])
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.registered_count(), 1);
        assert_eq!(report.outcomes[2].1, LotOutcome::DuplicateInBatch);
        assert_eq!(report.failed_lots(), vec!["BAD00001", "D0000002"]);

        let failures = registry.failures().unwrap();
        assert!(failures.contains_key("BAD00001"));
        assert!(failures["D0000002"].contains("承诺日期"));
        assert_eq!(registry.lot_ids().unwrap(), vec!["D0000001".to_string()]);
    }
}
