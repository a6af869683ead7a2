// ==========================================
// 零售库存决策支持系统 - 引擎层
// ==========================================
// 职责: 实现决策规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 坏数据降级不报错, 规则输出可解释
// ==========================================

pub mod events;
pub mod future;
pub mod reorder;
pub mod risk;
pub mod statistics;
pub mod transfer;

// 重导出核心引擎
pub use events::{
    InventoryEvent, InventoryEventPublisher, InventoryEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use future::{FutureStateEngine, ImpactSummary, ProjectedRow, RiskCategoryCounts};
pub use reorder::{z_from_service_level, ReorderEngine, RopComputation};
pub use risk::RiskEngine;
pub use statistics::DemandStatisticsEngine;
pub use transfer::TransferMatcher;
