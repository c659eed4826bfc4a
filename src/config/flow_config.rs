// ==========================================
// NPI 主流程排程系统 - 主流程配置
// ==========================================
// 职责: 层别剥离词表 / 光刻模块集合 / 哨兵值 / 运行参数
// 红线: 业务词表只在此处维护,引擎不得硬编码
// ==========================================

use crate::config::config_reader_trait::FlowConfigReader;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;

/// 起始检查点模块（默认）
pub const DEFAULT_START_MODULE: &str = "PC-STARTS";

/// 汇总检查点站点代码（默认）
pub const DEFAULT_CHECKPOINT_OPERATION: i64 = 9812;

/// 默认数据源
pub const DEFAULT_DATA_SOURCE: &str = "F32_PROD_XEUS";

/// 领头批标题匹配模式（SQL LIKE）
pub const DEFAULT_LEAD_LOT_TITLE_PATTERN: &str = "NPI% LL%";

/// 光罩承诺日期过期阈值（天）
pub const DEFAULT_STALE_COMMIT_DAYS: i64 = 180;

/// 光罩承诺日期过期阈值上限（天）
pub const MAX_STALE_COMMIT_DAYS: i64 = 36_500;

// ==========================================
// TechnologyNode - 工艺节点
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechnologyNode {
    N10,  // 10nm
    N18A, // 18A
}

impl TechnologyNode {
    /// 该节点的光刻模块
    pub fn litho_modules(&self) -> &'static [&'static str] {
        match self {
            TechnologyNode::N10 => &[
                "LI-BE-193",
                "LI-BE-SED",
                "LI-BE-WET",
                "LI-FE-193",
                "LI-PD-WET",
                "LI-SSAFI-WET",
                "LI-WET",
                "LI-FE-248",
            ],
            TechnologyNode::N18A => &[
                "LI-SAVli", "LI-SAYli", "LI-SBHcu", "LI-SBLcu", "LI-SNEli", "LI-SNYli",
            ],
        }
    }

    /// 该节点的工艺配方后缀
    ///
    /// 顺序敏感: 长后缀必须排在其前缀之前（L58 先于 L5）
    pub fn recipe_suffixes(&self) -> &'static [&'static str] {
        match self {
            TechnologyNode::N10 => &["L58", "L5B", "L52", "L46", "L4H", "L4", "L5"],
            TechnologyNode::N18A => &["L8xr", "L8c", "L8s", "L8b", "L86", "L81", "L8d", "L8"],
        }
    }
}

// ==========================================
// FlowTaxonomy - 层别/模块词表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTaxonomy {
    /// 有序剥离词表（按顺序逐个 replace）
    pub strip_tokens: Vec<String>,
    /// 光刻模块集合
    pub litho_modules: BTreeSet<String>,
    /// 起始检查点模块
    pub start_module: String,
    /// 汇总检查点站点代码
    pub checkpoint_operation: i64,
}

impl FlowTaxonomy {
    /// 按工艺节点组合词表
    ///
    /// 剥离词表: 空格、'#', 然后按节点顺序追加配方后缀
    pub fn for_nodes(nodes: &[TechnologyNode]) -> Self {
        let mut strip_tokens = vec![" ".to_string(), "#".to_string()];
        let mut litho_modules = BTreeSet::new();

        for node in nodes {
            strip_tokens.extend(node.recipe_suffixes().iter().map(|s| s.to_string()));
            litho_modules.extend(node.litho_modules().iter().map(|s| s.to_string()));
        }

        Self {
            strip_tokens,
            litho_modules,
            start_module: DEFAULT_START_MODULE.to_string(),
            checkpoint_operation: DEFAULT_CHECKPOINT_OPERATION,
        }
    }

    pub fn is_litho_module(&self, module: &str) -> bool {
        self.litho_modules.contains(module)
    }
}

impl Default for FlowTaxonomy {
    fn default() -> Self {
        Self::for_nodes(&[TechnologyNode::N10, TechnologyNode::N18A])
    }
}

// ==========================================
// FlowConfig - 运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub taxonomy: FlowTaxonomy,
    /// 查询数据源标识
    pub data_source: String,
    /// 领头批标题 LIKE 模式
    pub lead_lot_title_pattern: String,
    /// 光罩承诺日期过期阈值（天）
    pub stale_commit_days: i64,
    /// 调试快照输出目录（None = 不输出）
    #[serde(default)]
    pub snapshot_dir: Option<String>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            taxonomy: FlowTaxonomy::default(),
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            lead_lot_title_pattern: DEFAULT_LEAD_LOT_TITLE_PATTERN.to_string(),
            stale_commit_days: DEFAULT_STALE_COMMIT_DAYS,
            snapshot_dir: None,
        }
    }
}

// 静态配置直接作为读取器使用（测试/命令行场景）
#[async_trait]
impl FlowConfigReader for FlowConfig {
    async fn get_flow_taxonomy(&self) -> Result<FlowTaxonomy, Box<dyn Error>> {
        Ok(self.taxonomy.clone())
    }

    async fn get_data_source(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.data_source.clone())
    }

    async fn get_lead_lot_title_pattern(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.lead_lot_title_pattern.clone())
    }

    async fn get_stale_commit_days(&self) -> Result<i64, Box<dyn Error>> {
        Ok(self.stale_commit_days)
    }

    async fn get_snapshot_dir(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.snapshot_dir.clone())
    }
}
