// ==========================================
// NPI 主流程排程系统 - 光罩可用性归并
// ==========================================
// 职责: 光罩原始记录 → 每 (产品, 层别) 一行可用性
// 与主流程/排程管线相互独立,仅共享层别口径
// ==========================================
// 处理顺序:
// 1) 日期清洗（剥离标记字符后解析）
// 2) 版本覆写过滤（光罩号前缀匹配）
// 3) 承诺日期过期 → 以趋势日期替代
// 4) 剔除 Rejected / Processing - Hold With Waiver
// 5) 存在 Shipped 时仅保留 Shipped
// 6) 取最早承诺记录的标识, 日期列取最小值
// ==========================================

use crate::config::flow_config::DEFAULT_STALE_COMMIT_DAYS;
use crate::config::FlowConfig;
use crate::connector::date_parse::parse_marked_date;
use crate::domain::{
    RawReticleRecord, ReticleAvailability, ReticleAvailabilityTable, ReticleStatus, VersionOverrides,
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// 清洗后的中间记录
#[derive(Debug, Clone)]
struct CleanedRecord {
    product: String,
    layer: String,
    reticle_id: String,
    status: ReticleStatus,
    commit_date: Option<NaiveDate>,
    trend_date: Option<NaiveDate>,
    order_date: Option<NaiveDate>,
    ship_date: Option<NaiveDate>,
}

// ==========================================
// ReticleAvailabilityReducer
// ==========================================
#[derive(Debug, Clone)]
pub struct ReticleAvailabilityReducer {
    stale_commit_days: i64,
}

impl ReticleAvailabilityReducer {
    pub fn new(stale_commit_days: i64) -> Self {
        Self { stale_commit_days }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(config.stale_commit_days)
    }

    /// 归并
    ///
    /// # 参数
    /// - raw_records: 光罩原始记录
    /// - overrides: 版本覆写表（无条目的 (产品, 层别) 不过滤）
    /// - today: 过期判断基准日
    #[instrument(skip(self, raw_records, overrides), fields(records = raw_records.len()))]
    pub fn reduce(
        &self,
        raw_records: &[RawReticleRecord],
        overrides: &VersionOverrides,
        today: NaiveDate,
    ) -> ReticleAvailabilityTable {
        let stale_before = self.stale_cutoff(today);

        let cleaned: Vec<CleanedRecord> = raw_records
            .iter()
            .map(Self::clean)
            .filter(|r| Self::matches_override(r, overrides))
            .map(|r| Self::refresh_stale_commit(r, stale_before))
            .filter(|r| !r.status.is_excluded())
            .collect();

        // BTreeMap 保证输出按 (产品, 层别) 排序
        let mut groups: BTreeMap<(String, String), Vec<CleanedRecord>> = BTreeMap::new();
        for record in cleaned {
            groups
                .entry((record.product.clone(), record.layer.clone()))
                .or_default()
                .push(record);
        }

        let rows: Vec<ReticleAvailability> = groups
            .into_values()
            .filter_map(|records| Self::aggregate(Self::prefer_shipped(records)))
            .collect();

        debug!(
            input = raw_records.len(),
            output = rows.len(),
            "光罩可用性归并完成"
        );

        ReticleAvailabilityTable::new(rows)
    }

    /// 过期判断基准: today - 阈值
    ///
    /// 阈值非正或超出日期范围时返回 None（不做过期替换）
    fn stale_cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.stale_commit_days <= 0 {
            warn!(stale_commit_days = self.stale_commit_days, "过期阈值非正，跳过过期替换");
            return None;
        }
        Duration::try_days(self.stale_commit_days).and_then(|d| today.checked_sub_signed(d))
    }

    fn clean(raw: &RawReticleRecord) -> CleanedRecord {
        let date = |value: &Option<String>| value.as_deref().and_then(parse_marked_date);
        CleanedRecord {
            product: raw.product.trim().to_string(),
            layer: raw.layer.trim().to_string(),
            reticle_id: raw.reticle_id.trim().to_string(),
            status: ReticleStatus::parse(&raw.status),
            commit_date: date(&raw.commit_date),
            trend_date: date(&raw.trend_date),
            order_date: date(&raw.order_date),
            ship_date: date(&raw.ship_date),
        }
    }

    fn matches_override(record: &CleanedRecord, overrides: &VersionOverrides) -> bool {
        match overrides.get(&record.product, &record.layer) {
            Some(version) => record.reticle_id.starts_with(version),
            None => true,
        }
    }

    fn refresh_stale_commit(mut record: CleanedRecord, stale_before: Option<NaiveDate>) -> CleanedRecord {
        if let (Some(stale_before), Some(commit), Some(trend)) =
            (stale_before, record.commit_date, record.trend_date)
        {
            if commit < stale_before {
                record.commit_date = Some(trend);
            }
        }
        record
    }

    fn prefer_shipped(records: Vec<CleanedRecord>) -> Vec<CleanedRecord> {
        if records.iter().any(|r| r.status.is_shipped()) {
            records.into_iter().filter(|r| r.status.is_shipped()).collect()
        } else {
            records
        }
    }

    fn aggregate(records: Vec<CleanedRecord>) -> Option<ReticleAvailability> {
        // 最早承诺记录（无承诺日期排最后,并列取首个）
        let earliest = records
            .iter()
            .min_by_key(|r| (r.commit_date.is_none(), r.commit_date))?;

        let min_of = |pick: fn(&CleanedRecord) -> Option<NaiveDate>| records.iter().filter_map(pick).min();

        Some(ReticleAvailability {
            product: earliest.product.clone(),
            layer: earliest.layer.clone(),
            reticle_id: earliest.reticle_id.clone(),
            status: earliest.status.clone(),
            commit_date: min_of(|r| r.commit_date),
            trend_date: min_of(|r| r.trend_date),
            order_date: min_of(|r| r.order_date),
            ship_date: min_of(|r| r.ship_date),
        })
    }
}

impl Default for ReticleAvailabilityReducer {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_COMMIT_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(layer: &str, reticle: &str, status: &str, commit: Option<&str>, trend: Option<&str>) -> RawReticleRecord {
        RawReticleRecord {
            product: "8PXX".to_string(),
            layer: layer.to_string(),
            reticle_id: reticle.to_string(),
            status: status.to_string(),
            commit_date: commit.map(String::from),
            trend_date: trend.map(String::from),
            order_date: None,
            ship_date: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2024, 6, 1)
    }

    #[test]
    fn test_marker_stripped_and_min_commit_kept() {
        let records = vec![
            raw("MT1", "A0-MT1-1", "Ordered", Some("*2024-05-20"), None),
            raw("MT1", "A0-MT1-2", "Ordered", Some("2024/05/10~"), None),
        ];
        let table = ReticleAvailabilityReducer::default().reduce(&records, &VersionOverrides::new(), today());

        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row.reticle_id, "A0-MT1-2");
        assert_eq!(row.commit_date, Some(d(2024, 5, 10)));
    }

    #[test]
    fn test_excluded_statuses_dropped() {
        let records = vec![
            raw("VA1", "A0-VA1-1", "Rejected", Some("2024-05-01"), None),
            raw("VA1", "A0-VA1-2", "Processing - Hold With Waiver", Some("2024-05-02"), None),
            raw("VA1", "A0-VA1-3", "In Fab", Some("2024-05-09"), None),
        ];
        let table = ReticleAvailabilityReducer::default().reduce(&records, &VersionOverrides::new(), today());

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].reticle_id, "A0-VA1-3");
        assert_eq!(table.rows()[0].commit_date, Some(d(2024, 5, 9)));
    }

    #[test]
    fn test_shipped_supersedes_in_flight() {
        let records = vec![
            raw("MT2", "A0-MT2-1", "In Fab", Some("2024-04-01"), None),
            raw("MT2", "A0-MT2-2", "SHIPPED", Some("2024-05-15"), None),
        ];
        let table = ReticleAvailabilityReducer::default().reduce(&records, &VersionOverrides::new(), today());

        let row = table.for_layer("8PXX", "MT2").unwrap();
        assert_eq!(row.status, ReticleStatus::Shipped);
        assert_eq!(row.commit_date, Some(d(2024, 5, 15)));
    }

    #[test]
    fn test_stale_commit_replaced_by_trend() {
        let records = vec![raw("VA2", "A0-VA2-1", "In Fab", Some("2023-01-01"), Some("2024-07-01"))];
        let table = ReticleAvailabilityReducer::default().reduce(&records, &VersionOverrides::new(), today());
        assert_eq!(table.rows()[0].commit_date, Some(d(2024, 7, 1)));

        // 未过期不替换
        let records = vec![raw("VA2", "A0-VA2-1", "In Fab", Some("2024-03-01"), Some("2024-07-01"))];
        let table = ReticleAvailabilityReducer::default().reduce(&records, &VersionOverrides::new(), today());
        assert_eq!(table.rows()[0].commit_date, Some(d(2024, 3, 1)));

        // 无趋势日期时保留原承诺
        let records = vec![raw("VA2", "A0-VA2-1", "In Fab", Some("2023-01-01"), None)];
        let table = ReticleAvailabilityReducer::default().reduce(&records, &VersionOverrides::new(), today());
        assert_eq!(table.rows()[0].commit_date, Some(d(2023, 1, 1)));
    }

    #[test]
    fn test_version_override_filters_by_prefix() {
        let records = vec![
            raw("MT1", "A0-MT1", "In Fab", Some("2024-05-01"), None),
            raw("MT1", "B1-MT1", "In Fab", Some("2024-05-20"), None),
            raw("VA1", "A0-VA1", "In Fab", Some("2024-05-03"), None),
        ];
        let mut overrides = VersionOverrides::new();
        overrides.insert("8PXX", "MT1", "B1");

        let table = ReticleAvailabilityReducer::default().reduce(&records, &overrides, today());

        assert_eq!(table.len(), 2);
        assert_eq!(table.for_layer("8PXX", "MT1").unwrap().reticle_id, "B1-MT1");
        assert_eq!(table.for_layer("8PXX", "VA1").unwrap().reticle_id, "A0-VA1");
        // 输出按层别排序
        assert_eq!(table.rows()[0].layer, "MT1");
    }

    #[test]
    fn test_date_columns_aggregate_by_minimum() {
        let mut first = raw("MT3", "A0-MT3-1", "In Fab", Some("2024-05-01"), None);
        first.order_date = Some("2024-03-10".to_string());
        let mut second = raw("MT3", "A0-MT3-2", "In Fab", Some("2024-05-05"), Some("2024-05-04"));
        second.order_date = Some("2024-02-01".to_string());

        let table = ReticleAvailabilityReducer::default().reduce(&[first, second], &VersionOverrides::new(), today());
        let row = &table.rows()[0];

        assert_eq!(row.reticle_id, "A0-MT3-1");
        assert_eq!(row.order_date, Some(d(2024, 2, 1)));
        assert_eq!(row.trend_date, Some(d(2024, 5, 4)));
    }
}
