// ==========================================
// NPI 主流程排程系统 - SQLite 查询连接器
// ==========================================
// 职责: 按数据源标识打开 SQLite 库并执行查询
// 约束: 每次调用独立打开连接（无共享会话,天然支持并发）
// ==========================================

use crate::connector::error::{ConnectorError, ConnectorResult};
use crate::connector::query_connector::{QueryConnector, QueryRow};
use crate::db::open_sqlite_connection;
use rusqlite::types::ValueRef;
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// SqliteConnector
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SqliteConnector {
    sources: HashMap<String, String>, // 数据源标识 → 数据库文件路径
}

impl SqliteConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册数据源
    pub fn with_source(mut self, source: impl Into<String>, db_path: impl Into<String>) -> Self {
        self.sources.insert(source.into(), db_path.into());
        self
    }

    fn db_path(&self, source: &str) -> ConnectorResult<&str> {
        self.sources
            .get(source)
            .map(|p| p.as_str())
            .ok_or_else(|| ConnectorError::SourceNotFound(source.to_string()))
    }
}

/// SQLite 值统一转为文本
fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

impl QueryConnector for SqliteConnector {
    fn execute(&self, query: &str, source: &str) -> ConnectorResult<Vec<QueryRow>> {
        let db_path = self.db_path(source)?;

        let conn = open_sqlite_connection(db_path).map_err(|e| {
            ConnectorError::DatabaseConnectionError {
                source_id: source.to_string(),
                message: e.to_string(),
            }
        })?;

        let query_failed = |e: rusqlite::Error| ConnectorError::QueryFailed {
            source_id: source.to_string(),
            message: e.to_string(),
        };

        let mut stmt = conn.prepare(query).map_err(query_failed)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt.query([]).map_err(query_failed)?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(query_failed)? {
            let mut record = QueryRow::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(query_failed)?;
                record.insert(name.clone(), value_to_text(value));
            }
            result.push(record);
        }

        debug!(source = source, rows = result.len(), "查询完成");
        Ok(result)
    }
}
