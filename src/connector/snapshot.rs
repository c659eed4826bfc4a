// ==========================================
// NPI 主流程排程系统 - 查询快照装饰器
// ==========================================
// 职责: 包装任意 QueryConnector
// - debug 级别记录查询文本与序号
// - 配置了快照目录时,把每次结果导出为 {label}_query_{n}.csv
// 红线: 快照失败只告警,不影响查询结果
// ==========================================

use crate::connector::error::ConnectorResult;
use crate::connector::query_connector::{QueryConnector, QueryRow};
use crate::export::write_rows_csv;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

pub struct SnapshottingConnector<C> {
    inner: C,
    label: String,
    snapshot_dir: Option<PathBuf>,
    query_count: AtomicUsize,
}

impl<C: QueryConnector> SnapshottingConnector<C> {
    /// # 参数
    /// - inner: 实际执行查询的连接器
    /// - label: 快照文件名前缀（通常为产品名）
    /// - snapshot_dir: 快照目录（None = 仅记录日志）
    pub fn new(inner: C, label: impl Into<String>, snapshot_dir: Option<PathBuf>) -> Self {
        Self {
            inner,
            label: label.into(),
            snapshot_dir,
            query_count: AtomicUsize::new(0),
        }
    }

    /// 已执行的查询次数
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    fn write_snapshot(&self, query_no: usize, rows: &[QueryRow]) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };

        let path = dir.join(format!("{}_query_{}.csv", self.label, query_no));
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "快照目录创建失败");
            return;
        }

        match write_rows_csv(&path, rows) {
            Ok(count) => debug!(path = %path.display(), rows = count, "查询快照已写出"),
            Err(e) => warn!(path = %path.display(), error = %e, "查询快照写出失败"),
        }
    }
}

impl<C: QueryConnector> QueryConnector for SnapshottingConnector<C> {
    fn execute(&self, query: &str, source: &str) -> ConnectorResult<Vec<QueryRow>> {
        let query_no = self.query_count.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(query_no, source, query = %query.trim(), "执行查询");

        let rows = self.inner.execute(query, source)?;
        self.write_snapshot(query_no, &rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::error::ConnectorError;
    use tempfile::tempdir;

    struct FixedConnector;

    impl QueryConnector for FixedConnector {
        fn execute(&self, query: &str, _source: &str) -> ConnectorResult<Vec<QueryRow>> {
            if query.contains("FAIL") {
                return Err(ConnectorError::QueryFailed {
                    source_id: "TEST".into(),
                    message: "boom".into(),
                });
            }
            let mut row = QueryRow::new();
            row.insert("LOT7".into(), "D123456".into());
            Ok(vec![row])
        }
    }

    #[test]
    fn test_snapshots_are_numbered() {
        let dir = tempdir().unwrap();
        let connector = SnapshottingConnector::new(FixedConnector, "8PXX", Some(dir.path().to_path_buf()));

        connector.execute("SELECT 1", "SRC").unwrap();
        connector.execute("SELECT 2", "SRC").unwrap();

        assert_eq!(connector.query_count(), 2);
        assert!(dir.path().join("8PXX_query_1.csv").exists());
        assert!(dir.path().join("8PXX_query_2.csv").exists());
    }

    #[test]
    fn test_failure_passes_through_without_snapshot() {
        let dir = tempdir().unwrap();
        let connector = SnapshottingConnector::new(FixedConnector, "8PXX", Some(dir.path().to_path_buf()));

        assert!(connector.execute("FAIL", "SRC").is_err());
        assert_eq!(connector.query_count(), 1);
        assert!(!dir.path().join("8PXX_query_1.csv").exists());
    }
}
