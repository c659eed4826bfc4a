// ==========================================
// NPI 主流程排程系统 - 数据源层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 数据源层错误类型
#[derive(Error, Debug)]
pub enum ConnectorError {
    // ===== 数据源错误 =====
    #[error("数据源未注册: {0}")]
    SourceNotFound(String),

    #[error("数据库连接失败 (source={source_id}): {message}")]
    DatabaseConnectionError { source_id: String, message: String },

    #[error("查询执行失败 (source={source_id}): {message}")]
    QueryFailed { source_id: String, message: String },

    // ===== 文件错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读写失败: {0}")]
    Io(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 字段映射错误 =====
    #[error("字段缺失 (行 {row}): {field}")]
    MissingField { row: usize, field: String },

    #[error("字段值错误 (行 {row}, 字段 {field}): {message}")]
    FieldValueError {
        row: usize,
        field: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        ConnectorError::Io(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ConnectorError {
    fn from(err: csv::Error) -> Self {
        ConnectorError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ConnectorResult<T> = Result<T, ConnectorError>;
