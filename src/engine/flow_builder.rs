// ==========================================
// NPI 主流程排程系统 - 主流程构建器
// ==========================================
// 职责: 参考批次的站点过站记录 → 规范化有序主流程
// 输入: OperationVisit 列表（可含重复/噪声）
// 输出: CanonicalFlow（order_index 稠密、从 0 开始）
// ==========================================
// 保留条件（任一满足）:
// - 模块 = 起始检查点模块
// - 站点代码 = 汇总检查点代码
// - 模块 ∈ 光刻模块集合
// ==========================================

use crate::config::FlowTaxonomy;
use crate::domain::{CanonicalFlow, CanonicalFlowEntry, OperationVisit};
use crate::engine::layer_classifier::OperationLayerClassifier;
use tracing::{debug, instrument};

// ==========================================
// FlowBuilder
// ==========================================
#[derive(Debug, Clone)]
pub struct FlowBuilder {
    taxonomy: FlowTaxonomy,
    classifier: OperationLayerClassifier,
}

impl FlowBuilder {
    pub fn new(taxonomy: FlowTaxonomy) -> Self {
        let classifier = OperationLayerClassifier::from_taxonomy(&taxonomy);
        Self { taxonomy, classifier }
    }

    /// 构建主流程
    ///
    /// 无记录满足保留条件时返回空主流程（由调用方决定是否视为错误）
    #[instrument(skip(self, visits), fields(visits = visits.len()))]
    pub fn build(&self, visits: &[OperationVisit]) -> CanonicalFlow {
        // 1. 按首次执行序号稳定排序
        let mut sorted: Vec<&OperationVisit> = visits.iter().collect();
        sorted.sort_by_key(|v| v.first_seen_sequence);

        // 2~6. 过滤 → 编号 → 分类
        let entries: Vec<CanonicalFlowEntry> = sorted
            .into_iter()
            .filter(|v| self.is_retained(v))
            .enumerate()
            .map(|(order_index, v)| CanonicalFlowEntry {
                order_index,
                operation_code: v.operation_code,
                operation_short_desc: v.operation_short_desc.clone(),
                operation_long_desc: v.operation_long_desc.clone(),
                layer: self
                    .classifier
                    .classify(&v.operation_short_desc, &v.operation_long_desc),
            })
            .collect();

        debug!(
            input = visits.len(),
            retained = entries.len(),
            "主流程构建完成"
        );

        CanonicalFlow::from_entries(entries)
    }

    fn is_retained(&self, visit: &OperationVisit) -> bool {
        self.is_start_marker(visit) || self.is_checkpoint_operation(visit) || self.is_litho_module(visit)
    }

    fn is_start_marker(&self, visit: &OperationVisit) -> bool {
        visit.module == self.taxonomy.start_module
    }

    fn is_checkpoint_operation(&self, visit: &OperationVisit) -> bool {
        visit.operation_code == self.taxonomy.checkpoint_operation
    }

    fn is_litho_module(&self, visit: &OperationVisit) -> bool {
        self.taxonomy.is_litho_module(&visit.module)
    }
}

impl Default for FlowBuilder {
    fn default() -> Self {
        Self::new(FlowTaxonomy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(op: i64, short: &str, long: &str, module: &str, seq: i64) -> OperationVisit {
        OperationVisit {
            lot_id: "D1234567".to_string(),
            operation_code: op,
            operation_short_desc: short.to_string(),
            operation_long_desc: long.to_string(),
            area: "AREA".to_string(),
            module: module.to_string(),
            first_seen_sequence: seq,
            last_out_date: None,
        }
    }

    #[test]
    fn test_build_filters_sorts_and_numbers() {
        let visits = vec![
            visit(300, "MT1 L58", "MT1 METAL", "LI-BE-193", 30),
            visit(150, "CLEAN", "WET CLEAN", "WET-ETCH", 15),
            visit(100, "LOTSTART", "LOT START", "PC-STARTS", 10),
            visit(9812, "AGG", "AGGREGATE", "MISC", 40),
            visit(200, "VA1 L8c", "VA1 VIA", "LI-SAVli", 20),
        ];

        let flow = FlowBuilder::default().build(&visits);
        let entries = flow.entries();

        assert_eq!(entries.len(), 4);
        let codes: Vec<i64> = entries.iter().map(|e| e.operation_code).collect();
        assert_eq!(codes, vec![100, 200, 300, 9812]);
        let orders: Vec<usize> = entries.iter().map(|e| e.order_index).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);

        assert_eq!(entries[0].layer, "START");
        assert_eq!(entries[1].layer, "VA1");
        assert_eq!(entries[2].layer, "MT1");
    }

    #[test]
    fn test_equal_sequence_keeps_input_order() {
        let visits = vec![
            visit(2, "B", "B", "LI-WET", 5),
            visit(1, "A", "A", "LI-WET", 5),
        ];
        let flow = FlowBuilder::default().build(&visits);
        assert_eq!(flow.entries()[0].operation_short_desc, "B");
        assert_eq!(flow.entries()[1].operation_short_desc, "A");
    }

    #[test]
    fn test_all_excluded_yields_empty_flow() {
        let visits = vec![
            visit(1, "A", "A", "ETCH", 1),
            visit(2, "B", "B", "DIFF", 2),
        ];
        assert!(FlowBuilder::default().build(&visits).is_empty());
        assert!(FlowBuilder::default().build(&[]).is_empty());
    }

    #[test]
    fn test_custom_taxonomy() {
        let mut taxonomy = FlowTaxonomy::default();
        taxonomy.start_module = "BEGIN".to_string();
        taxonomy.checkpoint_operation = 1;
        taxonomy.litho_modules.clear();

        let visits = vec![
            visit(1, "CP", "CHECKPOINT", "X", 2),
            visit(5, "S", "START", "BEGIN", 1),
            visit(7, "L", "LITHO", "LI-BE-193", 3),
        ];
        let flow = FlowBuilder::new(taxonomy).build(&visits);
        let codes: Vec<i64> = flow.entries().iter().map(|e| e.operation_code).collect();
        assert_eq!(codes, vec![5, 1]);
    }
}
