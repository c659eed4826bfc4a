// ==========================================
// NPI 主流程排程系统 - 数据源层
// ==========================================
// 职责: 外部查询能力边界 + 查询文本 + 行映射
// 支持: SQLite 数据源, CSV 侧数据集
// 约束: 所有 SQL 字面量转义后拼接
// ==========================================

pub mod csv_source;
pub mod date_parse;
pub mod error;
pub mod queries;
pub mod query_connector;
pub mod row_mapper;
pub mod snapshot;
pub mod sqlite_connector;

// 重导出核心类型
pub use csv_source::CsvFileSource;
pub use error::{ConnectorError, ConnectorResult};
pub use queries::LotSelector;
pub use query_connector::{QueryConnector, QueryRow};
pub use row_mapper::RowMapper;
pub use snapshot::SnapshottingConnector;
pub use sqlite_connector::SqliteConnector;
