// ==========================================
// NPI 主流程排程系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 新品导入批次交期预估（基于历史领头批推导主流程）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 词表与查询参数
pub mod config;

// 数据源层 - 查询连接器与行映射
pub mod connector;

// 引擎层 - 主流程推导与排程投影
pub mod engine;

// 导出 - CSV 输出
pub mod export;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BatchReport, CanonicalFlow, CanonicalFlowEntry, CombinedScheduleTable, LotDescriptor,
    LotKind, LotOutcome, LotSchedule, LotType, OperationVisit, RawReticleRecord,
    ReticleAvailability, ReticleAvailabilityTable, ReticleStatus, ScenarioRecord, ScheduleRecord,
    ScheduleRow, ScoutModifier, VersionOverrides,
};

// 配置
pub use config::{ConfigManager, FlowConfig, FlowConfigReader, FlowTaxonomy, TechnologyNode};

// 数据源
pub use connector::{
    ConnectorError, ConnectorResult, CsvFileSource, QueryConnector, QueryRow,
    SnapshottingConnector, SqliteConnector,
};

// 引擎
pub use engine::{
    determine_lot_type, EngineError, EngineResult, FlowBuilder, LotClassificationFeed,
    LotRegistry, OperationLayerClassifier, ProductPlanner, ProductSettings,
    ReticleAvailabilityReducer, ScheduleProjector,
};

// ==========================================
// 版本信息
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "NPI 主流程排程系统";
