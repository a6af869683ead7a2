// ==========================================
// 零售库存决策支持系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (人工最终控制权)
// 范围: 补货/风险/调拨决策引擎 + 幂等库存台账;
//       UI、鉴权、通知投递、数据生产属外部协作方
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 决策规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MovementKind, RiskCategory};

// 领域实体
pub use domain::{
    BaselineKpis, DemandStat, DistanceRecord, EnrichedRow, InventoryLevel, InventorySnapshotRow,
    LeadTime, OrderRecord, OrderRow, OrgScope, SalesRecord, StoreRiskSummary, TransferProposal,
    TransferRecord, TransferRow,
};

// 引擎
pub use engine::{
    DemandStatisticsEngine, FutureStateEngine, ImpactSummary, ProjectedRow, ReorderEngine,
    RiskEngine, TransferMatcher,
};

// API
pub use api::{DashboardApi, OperationApi};

// 配置
pub use config::{ConfigManager, EngineParams};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "零售库存决策支持系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
