// ==========================================
// NPI 主流程排程系统 - 配置层
// ==========================================
// 职责: 层别词表、模块集合、查询参数等系统配置
// 存储: 静态默认值 / config_kv 表
// ==========================================

pub mod config_manager;
pub mod config_reader_trait;
pub mod flow_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use config_reader_trait::FlowConfigReader;
pub use flow_config::{FlowConfig, FlowTaxonomy, TechnologyNode};
