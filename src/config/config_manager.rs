// ==========================================
// NPI 主流程排程系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::config_reader_trait::FlowConfigReader;
use crate::config::flow_config::{
    FlowTaxonomy, TechnologyNode, DEFAULT_DATA_SOURCE, DEFAULT_LEAD_LOT_TITLE_PATTERN,
    DEFAULT_STALE_COMMIT_DAYS, MAX_STALE_COMMIT_DAYS,
};
use crate::db::{init_config_schema, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（config_kv 不存在时自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 运行日志中记录本次使用的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 读取 JSON 字符串数组配置
    ///
    /// 格式错误时记录告警并返回 None（回退到默认值）
    fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(list) => Ok(Some(list)),
            Err(e) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    error = %e,
                    "列表配置格式错误，使用默认值"
                );
                Ok(None)
            }
        }
    }

    /// 解析工艺节点列表（逗号分隔，如 "N10,N18A"）
    fn get_technology_nodes(&self) -> Result<Vec<TechnologyNode>, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::TECHNOLOGY_NODES, "N10,N18A")?;

        let nodes: Vec<TechnologyNode> = value
            .split(',')
            .filter_map(|s| match s.trim().to_uppercase().as_str() {
                "N10" | "10NM" => Some(TechnologyNode::N10),
                "N18A" | "18A" => Some(TechnologyNode::N18A),
                _ => None,
            })
            .collect();

        if nodes.is_empty() {
            Ok(vec![TechnologyNode::N10, TechnologyNode::N18A])
        } else {
            Ok(nodes)
        }
    }
}

// ==========================================
// FlowConfigReader Trait 实现
// ==========================================
#[async_trait]
impl FlowConfigReader for ConfigManager {
    async fn get_flow_taxonomy(&self) -> Result<FlowTaxonomy, Box<dyn Error>> {
        let nodes = self.get_technology_nodes()?;
        let mut taxonomy = FlowTaxonomy::for_nodes(&nodes);

        // 显式列表优先于节点预设
        if let Some(tokens) = self.get_string_list(config_keys::STRIP_TOKENS)? {
            taxonomy.strip_tokens = tokens;
        }
        if let Some(modules) = self.get_string_list(config_keys::LITHO_MODULES)? {
            taxonomy.litho_modules = modules.into_iter().collect::<BTreeSet<_>>();
        }
        if let Some(start_module) = self.get_config_value(config_keys::START_MODULE)? {
            taxonomy.start_module = start_module.trim().to_string();
        }
        if let Some(code) = self.get_config_value(config_keys::CHECKPOINT_OPERATION)? {
            match code.trim().parse::<i64>() {
                Ok(v) => taxonomy.checkpoint_operation = v,
                Err(_) => tracing::warn!(
                    config_key = config_keys::CHECKPOINT_OPERATION,
                    raw_value = %code,
                    "检查点站点代码格式错误，使用默认值"
                ),
            }
        }

        Ok(taxonomy)
    }

    async fn get_data_source(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::DATA_SOURCE, DEFAULT_DATA_SOURCE)
    }

    async fn get_lead_lot_title_pattern(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::LEAD_LOT_TITLE_PATTERN, DEFAULT_LEAD_LOT_TITLE_PATTERN)
    }

    async fn get_stale_commit_days(&self) -> Result<i64, Box<dyn Error>> {
        let value = match self.get_config_value(config_keys::STALE_COMMIT_DAYS)? {
            Some(v) => v,
            None => return Ok(DEFAULT_STALE_COMMIT_DAYS),
        };

        match value.trim().parse::<i64>() {
            Ok(days) if (1..=MAX_STALE_COMMIT_DAYS).contains(&days) => Ok(days),
            _ => {
                tracing::warn!(
                    config_key = config_keys::STALE_COMMIT_DAYS,
                    raw_value = %value,
                    max = MAX_STALE_COMMIT_DAYS,
                    "过期阈值非法（需为 1..=max 天），使用默认值"
                );
                Ok(DEFAULT_STALE_COMMIT_DAYS)
            }
        }
    }

    async fn get_snapshot_dir(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::SNAPSHOT_DIR)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 层别/模块词表
    pub const TECHNOLOGY_NODES: &str = "flow.technology_nodes";   // "N10,N18A"
    pub const STRIP_TOKENS: &str = "flow.strip_tokens";           // JSON 数组（有序）
    pub const LITHO_MODULES: &str = "flow.litho_modules";         // JSON 数组
    pub const START_MODULE: &str = "flow.start_module";
    pub const CHECKPOINT_OPERATION: &str = "flow.checkpoint_operation";

    // 查询
    pub const DATA_SOURCE: &str = "query.data_source";
    pub const LEAD_LOT_TITLE_PATTERN: &str = "query.lead_lot_title_pattern";

    // 光罩
    pub const STALE_COMMIT_DAYS: &str = "reticle.stale_commit_days";

    // 调试
    pub const SNAPSHOT_DIR: &str = "debug.snapshot_dir";
}
