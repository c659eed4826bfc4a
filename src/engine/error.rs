// ==========================================
// NPI 主流程排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 空主流程/零层别必须显式报错,不得退化为默认排程
// ==========================================

use crate::connector::ConnectorError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 配置错误 =====
    #[error("配置错误: {0}")]
    Configuration(String),

    // ===== 主流程错误 =====
    #[error("主流程为空或层别数为零: {context}")]
    EmptyFlow { context: String },

    // ===== 分类源错误 =====
    #[error("NPI 分组不存在: {0}")]
    UnknownGroup(String),

    // ===== 数据源错误 =====
    #[error("数据源查询失败 (query={query}, target={target}): {source}")]
    Connector {
        query: String,
        target: String,
        #[source]
        source: ConnectorError,
    },

    // ===== 批次数据错误 =====
    #[error("批次缺少承诺日期: lot_id={lot_id}")]
    MissingCommitDate { lot_id: String },

    #[error("批次缺少投片日期: lot_id={lot_id}, operation={operation}")]
    MissingReleaseDate { lot_id: String, operation: String },

    // ===== 并发错误 =====
    #[error("批次处理线程异常退出: lot_id={lot_id}, {message}")]
    WorkerPanicked { lot_id: String, message: String },

    #[error("登记簿锁获取失败: {0}")]
    LockError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// 包装数据源错误并附带查询上下文
    pub fn connector(query: &str, target: impl Into<String>, source: ConnectorError) -> Self {
        EngineError::Connector {
            query: query.to_string(),
            target: target.into(),
            source,
        }
    }

    pub fn empty_flow(context: impl Into<String>) -> Self {
        EngineError::EmptyFlow {
            context: context.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 查询标签（日志与错误上下文）
pub mod query_labels {
    pub const LEAD_LOT: &str = "lead_lot_discovery";
    pub const LOT_FLOW: &str = "lot_flow_history";
    pub const NPI_SCENARIO: &str = "npi_scenario";
}
