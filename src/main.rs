// ==========================================
// NPI 主流程排程系统 - 命令行入口
// ==========================================
// 用法:
//   npi-master-flow <db_path> <product> <npi> [group] [out_csv]
//
// - db_path: SQLite 库（数据源表 + config_kv 配置表）
// - product: 产品 LIKE 模式（如 8PXX%）
// - npi:     NPI 标识
// - group:   分类源分组（默认与 npi 相同）
// - out_csv: 汇总表输出路径（默认 <npi>_master_flow.csv）
// ==========================================

use npi_master_flow::config::FlowConfigReader;
use npi_master_flow::connector::queries::npi_scenario_query;
use npi_master_flow::engine::query_labels;
use npi_master_flow::export::write_schedule_csv;
use npi_master_flow::{
    logging, ConfigManager, EngineError, LotClassificationFeed, LotOutcome, ProductPlanner,
    ProductSettings, QueryConnector, SqliteConnector,
};
use std::error::Error;
use std::sync::Arc;

const USAGE: &str = "用法: npi-master-flow <db_path> <product> <npi> [group] [out_csv]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let (db_path, product, npi) = match (args.next(), args.next(), args.next()) {
        (Some(db), Some(product), Some(npi)) => (db, product, npi),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    let group = args.next().unwrap_or_else(|| npi.clone());
    let out_csv = args
        .next()
        .unwrap_or_else(|| format!("{}_master_flow.csv", npi));

    tracing::info!("==================================================");
    tracing::info!("{} v{}", npi_master_flow::APP_NAME, npi_master_flow::VERSION);
    tracing::info!("==================================================");
    tracing::info!(db_path = %db_path, "使用数据库");

    // 配置与数据源共用同一个库
    let config_manager = ConfigManager::new(&db_path)?;
    let data_source = config_manager.get_data_source().await?;
    let connector: Arc<dyn QueryConnector> =
        Arc::new(SqliteConnector::new().with_source(data_source.clone(), db_path.clone()));

    // 主流程
    let planner = ProductPlanner::initialize(
        ProductSettings::new(product, npi),
        connector.clone(),
        &config_manager,
    )
    .await?;
    println!(
        "主流程: {} 站, 领头批 {:?}",
        planner.canonical_flow().len(),
        planner.lead_lots()
    );

    // 批次分类源
    let scenario_rows = connector
        .execute(&npi_scenario_query(), &data_source)
        .map_err(|e| EngineError::connector(query_labels::NPI_SCENARIO, group.as_str(), e))?;
    let feed = LotClassificationFeed::from_rows(&scenario_rows)?;
    let lots = feed.get_lots(&group)?;

    // 批量登记
    let report = planner.load_lot_list(lots).await?;
    for (lot_id, outcome) in &report.outcomes {
        match outcome {
            LotOutcome::Registered { row_count } => println!("{:<10} 已登记 ({} 行)", lot_id, row_count),
            LotOutcome::AlreadyRegistered => println!("{:<10} 已存在", lot_id),
            LotOutcome::DuplicateInBatch => println!("{:<10} 批内重复", lot_id),
            LotOutcome::Failed { reason } => println!("{:<10} 失败: {}", lot_id, reason),
        }
    }

    let table = planner.registry().combined_table()?;
    let written = write_schedule_csv(&out_csv, &table)?;
    println!(
        "batch_id={} 登记 {} / {} 批次, 输出 {} 行 → {}",
        report.batch_id,
        report.registered_count(),
        report.outcomes.len(),
        written,
        out_csv
    );

    Ok(())
}
