// ==========================================
// NPI 主流程排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod flow;
pub mod reticle;
pub mod scenario;
pub mod schedule;
pub mod types;
pub mod visit;

// 重导出核心类型
pub use flow::{CanonicalFlow, CanonicalFlowEntry};
pub use reticle::{RawReticleRecord, ReticleAvailability, ReticleAvailabilityTable, VersionOverrides};
pub use scenario::ScenarioRecord;
pub use schedule::{
    BatchReport, CombinedScheduleTable, LotDescriptor, LotOutcome, LotSchedule, ScheduleRecord,
    ScheduleRow,
};
pub use types::{LotKind, LotType, ReticleStatus, ScoutModifier};
pub use visit::OperationVisit;
