// ==========================================
// Mock 查询连接器 - 用于集成测试
// ==========================================
// 按查询类型返回预置结果:
// - 领头批发现 → LOT7 行
// - LOT7 IN    → 参考批次过站记录
// - LOT IN     → 指定批次过站记录（可配置失败 / panic / 延迟）
// ==========================================

use npi_master_flow::connector::{ConnectorError, ConnectorResult, QueryConnector, QueryRow};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// 过站记录: (站点代码, 短描述, 长描述, 模块, 执行序号, 出站时间)
pub type VisitSpec = (i64, &'static str, &'static str, &'static str, i64, Option<&'static str>);

/// 默认参考路线（START / VA1 / MT1 / VA2）
pub const REFERENCE_ROUTE: &[VisitSpec] = &[
    (100, "LOTSTART", "LOT START", "PC-STARTS", 1, None),
    (150, "CLEAN", "WET CLEAN", "WET-CLEAN", 2, None),
    (200, "VA1 L58", "VA1 VIA LITHO", "LI-BE-193", 3, None),
    (300, "MT1 L58", "MT1 METAL LITHO", "LI-BE-193", 4, None),
    (400, "VA2 L8c", "VA2 VIA LITHO", "LI-SAVli", 5, None),
];

pub fn visit_rows(lot: &str, visits: &[VisitSpec]) -> Vec<QueryRow> {
    visits
        .iter()
        .map(|(code, short, long, module, seq, out_date)| {
            let mut row = QueryRow::new();
            row.insert("LOT".to_string(), lot.to_string());
            row.insert("OPERATION".to_string(), code.to_string());
            row.insert("OPER_SHORT".to_string(), short.to_string());
            row.insert("OPER_LONG".to_string(), long.to_string());
            row.insert("AREA".to_string(), "FAB".to_string());
            row.insert("MODULE".to_string(), module.to_string());
            row.insert("SEQ".to_string(), seq.to_string());
            row.insert("OUT_DATE".to_string(), out_date.unwrap_or("").to_string());
            row
        })
        .collect()
}

/// 参考路线 + 指定投片时间
pub fn released_route(release: &'static str) -> Vec<VisitSpec> {
    let mut route = REFERENCE_ROUTE.to_vec();
    route[0].5 = Some(release);
    route
}

#[derive(Default)]
pub struct MockConnector {
    lead_lots: Vec<String>,
    reference_rows: Vec<QueryRow>,
    lot_rows: HashMap<String, Vec<QueryRow>>,
    failing_lots: HashSet<String>,
    panicking_lots: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以 REFERENCE_ROUTE 作为领头批历史
    pub fn with_reference_route() -> Self {
        Self::new().with_reference("D100001", REFERENCE_ROUTE)
    }

    pub fn with_reference(mut self, lot7: &str, visits: &[VisitSpec]) -> Self {
        self.lead_lots.push(lot7.to_string());
        self.reference_rows
            .extend(visit_rows(&format!("{}A", lot7), visits));
        self
    }

    pub fn with_lot(mut self, lot: &str, visits: &[VisitSpec]) -> Self {
        self.lot_rows.insert(lot.to_string(), visit_rows(lot, visits));
        self
    }

    pub fn failing(mut self, lot: &str) -> Self {
        self.failing_lots.insert(lot.to_string());
        self
    }

    pub fn panicking(mut self, lot: &str) -> Self {
        self.panicking_lots.insert(lot.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requested_lot(query: &str) -> Option<&str> {
        query
            .split("lf.LOT IN ('")
            .nth(1)
            .and_then(|rest| rest.split('\'').next())
    }
}

impl QueryConnector for MockConnector {
    fn execute(&self, query: &str, _source: &str) -> ConnectorResult<Vec<QueryRow>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        if query.contains("LOT_TITLE LIKE") {
            return Ok(self
                .lead_lots
                .iter()
                .map(|id| {
                    let mut row = QueryRow::new();
                    row.insert("LOT7".to_string(), id.clone());
                    row
                })
                .collect());
        }

        if query.contains("lf.LOT7 IN") {
            return Ok(self.reference_rows.clone());
        }

        let lot = Self::requested_lot(query).unwrap_or_default();
        if self.panicking_lots.contains(lot) {
            panic!("mock connector panic for {}", lot);
        }
        if self.failing_lots.contains(lot) {
            return Err(ConnectorError::QueryFailed {
                source_id: "MOCK".to_string(),
                message: format!("connection reset while reading {}", lot),
            });
        }

        Ok(self.lot_rows.get(lot).cloned().unwrap_or_default())
    }
}
