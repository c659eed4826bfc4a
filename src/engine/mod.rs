// ==========================================
// NPI 主流程排程系统 - 引擎层
// ==========================================
// 职责: 主流程推导、排程投影、批次登记、光罩归并
// 红线: 引擎不直接打开数据库; 查询统一经 QueryConnector
// ==========================================

pub mod error;
pub mod flow_builder;
pub mod layer_classifier;
pub mod lot_classifier;
pub mod lot_registry;
pub mod orchestrator;
pub mod reticle_reducer;
pub mod schedule_projector;

// 重导出核心引擎
pub use error::{query_labels, EngineError, EngineResult};
pub use flow_builder::FlowBuilder;
pub use layer_classifier::OperationLayerClassifier;
pub use lot_classifier::{determine_lot_type, ClassifiedLot, LotClassificationFeed};
pub use lot_registry::LotRegistry;
pub use orchestrator::{ProductPlanner, ProductSettings};
pub use reticle_reducer::ReticleAvailabilityReducer;
pub use schedule_projector::ScheduleProjector;
