// ==========================================
// NPI 主流程排程系统 - 产品排程编排器
// ==========================================
// 用途: 协调 领头批发现 → 主流程构建 → 批次登记 的执行顺序
// 红线: 产品/NPI 缺失时不得构建任何状态
// ==========================================

use crate::config::{FlowConfig, FlowConfigReader};
use crate::connector::queries::{lead_lot_query, lot_flow_query};
use crate::connector::{LotSelector, QueryConnector, RowMapper, SnapshottingConnector};
use crate::domain::{
    BatchReport, CanonicalFlow, LotDescriptor, LotOutcome, OperationVisit, RawReticleRecord,
    ReticleAvailabilityTable, VersionOverrides,
};
use crate::engine::error::{query_labels, EngineError, EngineResult};
use crate::engine::flow_builder::FlowBuilder;
use crate::engine::lot_registry::LotRegistry;
use crate::engine::reticle_reducer::ReticleAvailabilityReducer;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// ProductSettings - 产品参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSettings {
    pub product: Option<String>, // 产品 LIKE 模式（如 "8PXX%"）
    pub npi: Option<String>,     // NPI 标识
}

impl ProductSettings {
    pub fn new(product: impl Into<String>, npi: impl Into<String>) -> Self {
        Self {
            product: Some(product.into()),
            npi: Some(npi.into()),
        }
    }
}

fn require_setting(value: &Option<String>, name: &str) -> EngineResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(EngineError::Configuration(format!("缺少必填参数: {}", name))),
    }
}

// ==========================================
// ProductPlanner - 产品排程编排器
// ==========================================
pub struct ProductPlanner {
    product: String,
    npi: String,
    config: FlowConfig,
    lead_lots: Vec<String>,
    flow: Arc<CanonicalFlow>,
    registry: LotRegistry,
}

impl ProductPlanner {
    /// 初始化: 发现领头批并构建主流程
    ///
    /// # 参数
    /// - settings: 产品参数（product / npi 必填）
    /// - connector: 查询连接器
    /// - config_reader: 配置读取器
    ///
    /// # 错误
    /// - Configuration: 参数缺失或配置读取失败
    /// - EmptyFlow: 无领头批 / 主流程为空
    /// - Connector: 查询失败
    #[instrument(skip(settings, connector, config_reader), fields(product, npi))]
    pub async fn initialize<R>(
        settings: ProductSettings,
        connector: Arc<dyn QueryConnector>,
        config_reader: &R,
    ) -> EngineResult<Self>
    where
        R: FlowConfigReader + ?Sized,
    {
        // ==========================================
        // 步骤1: 参数校验
        // ==========================================
        let product = require_setting(&settings.product, "product")?;
        let npi = require_setting(&settings.npi, "npi")?;
        let span = tracing::Span::current();
        span.record("product", product.as_str());
        span.record("npi", npi.as_str());

        // ==========================================
        // 步骤2: 读取配置
        // ==========================================
        let config = config_reader
            .load_flow_config()
            .await
            .map_err(|e| EngineError::Configuration(format!("配置读取失败: {}", e)))?;
        debug!(data_source = %config.data_source, litho_modules = config.taxonomy.litho_modules.len(), "配置已加载");

        let connector: Arc<dyn QueryConnector> = match &config.snapshot_dir {
            Some(dir) => Arc::new(SnapshottingConnector::new(
                connector,
                product.trim_end_matches('%'),
                Some(PathBuf::from(dir)),
            )),
            None => connector,
        };

        info!(product = %product, npi = %npi, "开始构建产品主流程");

        // ==========================================
        // 步骤3~4: 领头批发现 + 流程历史（阻塞查询）
        // ==========================================
        let (lead_lots, visits) = {
            let connector = connector.clone();
            let query_product = product.clone();
            let query_config = config.clone();
            tokio::task::spawn_blocking(move || {
                discover_reference_visits(&*connector, &query_product, &query_config)
            })
            .await
            .map_err(|e| EngineError::WorkerPanicked {
                lot_id: product.clone(),
                message: e.to_string(),
            })??
        };

        // ==========================================
        // 步骤5: 构建主流程
        // ==========================================
        let flow = FlowBuilder::new(config.taxonomy.clone()).build(&visits);
        if flow.is_empty() {
            return Err(EngineError::empty_flow(format!(
                "领头批过站记录中无保留站点, product={}",
                product
            )));
        }

        info!(
            product = %product,
            lead_lots = lead_lots.len(),
            flow_entries = flow.len(),
            "产品主流程构建完成"
        );

        // ==========================================
        // 步骤6: 创建登记簿
        // ==========================================
        let flow = Arc::new(flow);
        let registry = LotRegistry::new(flow.clone(), connector, config.data_source.clone(), npi.clone());

        Ok(Self {
            product,
            npi,
            config,
            lead_lots,
            flow,
            registry,
        })
    }

    /// 批量登记批次
    pub async fn load_lot_list(&self, descriptors: Vec<LotDescriptor>) -> EngineResult<BatchReport> {
        self.registry.submit_batch(descriptors).await
    }

    /// 单批次登记
    pub fn add_lot(&self, descriptor: &LotDescriptor) -> EngineResult<LotOutcome> {
        self.registry.add_lot(descriptor)
    }

    /// 光罩可用性（过期阈值取自当前配置）
    pub fn reticle_availability(
        &self,
        raw_records: &[RawReticleRecord],
        overrides: &VersionOverrides,
        today: NaiveDate,
    ) -> ReticleAvailabilityTable {
        ReticleAvailabilityReducer::from_config(&self.config).reduce(raw_records, overrides, today)
    }

    pub fn canonical_flow(&self) -> &CanonicalFlow {
        &self.flow
    }

    pub fn registry(&self) -> &LotRegistry {
        &self.registry
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn npi(&self) -> &str {
        &self.npi
    }

    pub fn lead_lots(&self) -> &[String] {
        &self.lead_lots
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }
}

/// 领头批发现 → 参考批次过站记录
fn discover_reference_visits(
    connector: &dyn QueryConnector,
    product: &str,
    config: &FlowConfig,
) -> EngineResult<(Vec<String>, Vec<OperationVisit>)> {
    let rows = connector
        .execute(
            &lead_lot_query(product, &config.lead_lot_title_pattern),
            &config.data_source,
        )
        .map_err(|e| EngineError::connector(query_labels::LEAD_LOT, product, e))?;

    let lead_lots = RowMapper.to_short_lot_ids(&rows);
    if lead_lots.is_empty() {
        return Err(EngineError::empty_flow(format!(
            "未发现领头批, product={}, pattern={}",
            product, config.lead_lot_title_pattern
        )));
    }
    debug!(product = %product, lead_lots = ?lead_lots, "领头批发现完成");

    let selector = LotSelector::ShortIds(lead_lots.clone());
    let rows = connector
        .execute(&lot_flow_query(&selector), &config.data_source)
        .map_err(|e| EngineError::connector(query_labels::LOT_FLOW, selector.describe(), e))?;
    let visits = RowMapper
        .to_operation_visits(&rows)
        .map_err(|e| EngineError::connector(query_labels::LOT_FLOW, selector.describe(), e))?;

    Ok((lead_lots, visits))
}
