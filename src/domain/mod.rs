// ==========================================
// 零售库存决策支持系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、幂等键构造
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod demand;
pub mod enriched;
pub mod inventory;
pub mod movement;
pub mod scope;
pub mod types;

// 重导出核心类型
pub use demand::{BaselineKpis, DemandStat, LeadTime, SalesRecord};
pub use enriched::{EnrichedRow, StoreRiskSummary};
pub use inventory::{DistanceRecord, InventoryLevel, InventorySnapshotRow};
pub use movement::{
    default_idem_prefix, order_idem_key, transfer_idem_key, ApplyOrdersOutcome,
    ApplyTransfersOutcome, OrderRecord, OrderRow, TransferProposal, TransferRecord, TransferRow,
};
pub use scope::OrgScope;
pub use types::{MovementKind, RiskCategory};
