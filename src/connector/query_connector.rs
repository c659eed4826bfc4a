// ==========================================
// NPI 主流程排程系统 - 查询连接器 Trait
// ==========================================
// 职责: 定义"执行查询文本 → 返回列名行"的外部能力边界
// 红线: 核心算法不感知连接池/重试策略,由实现方自行决定
// ==========================================

use crate::connector::error::ConnectorResult;
use std::collections::HashMap;
use std::sync::Arc;

/// 查询结果行: 列名 → 文本值（NULL 统一为空串）
pub type QueryRow = HashMap<String, String>;

// ==========================================
// QueryConnector Trait
// ==========================================
// 实现者: SqliteConnector / SnapshottingConnector / 测试桩
// 约束: 必须支持并发独立调用（每次调用独立会话）
pub trait QueryConnector: Send + Sync {
    /// 在指定数据源上执行查询
    ///
    /// # 参数
    /// - query: 查询文本
    /// - source: 数据源标识
    ///
    /// # 返回
    /// - Ok(Vec<QueryRow>): 结果行（按数据源返回顺序）
    /// - Err: 连接或执行失败（对本次调用是致命的）
    fn execute(&self, query: &str, source: &str) -> ConnectorResult<Vec<QueryRow>>;
}

impl<T: QueryConnector + ?Sized> QueryConnector for Arc<T> {
    fn execute(&self, query: &str, source: &str) -> ConnectorResult<Vec<QueryRow>> {
        (**self).execute(query, source)
    }
}

impl<T: QueryConnector + ?Sized> QueryConnector for Box<T> {
    fn execute(&self, query: &str, source: &str) -> ConnectorResult<Vec<QueryRow>> {
        (**self).execute(query, source)
    }
}
