// ==========================================
// NPI 主流程排程系统 - 配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::flow_config::{FlowConfig, FlowTaxonomy};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// FlowConfigReader Trait
// ==========================================
// 实现者: FlowConfig（静态配置）/ ConfigManager（config_kv 表）
#[async_trait]
pub trait FlowConfigReader: Send + Sync {
    /// 获取层别/模块词表
    ///
    /// # 默认值
    /// - 10nm + 18A 两代词表的并集
    async fn get_flow_taxonomy(&self) -> Result<FlowTaxonomy, Box<dyn Error>>;

    /// 获取查询数据源标识
    ///
    /// # 默认值
    /// - F32_PROD_XEUS
    async fn get_data_source(&self) -> Result<String, Box<dyn Error>>;

    /// 获取领头批标题匹配模式（SQL LIKE）
    ///
    /// # 默认值
    /// - NPI% LL%
    async fn get_lead_lot_title_pattern(&self) -> Result<String, Box<dyn Error>>;

    /// 获取光罩承诺日期过期阈值（天）
    ///
    /// # 默认值
    /// - 180
    async fn get_stale_commit_days(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取调试快照目录
    ///
    /// # 返回
    /// - None: 不输出调试快照
    async fn get_snapshot_dir(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// 一次性读取全部配置
    async fn load_flow_config(&self) -> Result<FlowConfig, Box<dyn Error>> {
        let taxonomy = self.get_flow_taxonomy().await?;
        let data_source = self.get_data_source().await?;
        let lead_lot_title_pattern = self.get_lead_lot_title_pattern().await?;
        let stale_commit_days = self.get_stale_commit_days().await?;
        let snapshot_dir = self.get_snapshot_dir().await?;

        Ok(FlowConfig {
            taxonomy,
            data_source,
            lead_lot_title_pattern,
            stale_commit_days,
            snapshot_dir,
        })
    }
}
