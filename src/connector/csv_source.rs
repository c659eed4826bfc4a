// ==========================================
// NPI 主流程排程系统 - CSV 文件数据源
// ==========================================
// 用途: 侧数据集（光罩可用性、离线批次清单）从 CSV 读入
// 输出: 与查询连接器一致的 QueryRow 形态
// ==========================================

use crate::connector::error::{ConnectorError, ConnectorResult};
use crate::connector::query_connector::QueryRow;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// CsvFileSource
// ==========================================
pub struct CsvFileSource;

impl CsvFileSource {
    /// 读取 CSV 文件为行集合
    ///
    /// - 首行为表头（去首尾空白）
    /// - 单元格去首尾空白
    /// - 完全空白的行跳过
    pub fn read_rows<P: AsRef<Path>>(&self, file_path: P) -> ConnectorResult<Vec<QueryRow>> {
        let path = file_path.as_ref();

        // 检查文件存在
        if !path.exists() {
            return Err(ConnectorError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = QueryRow::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}
