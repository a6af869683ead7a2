// ==========================================
// 零售库存决策支持系统 - API 层
// ==========================================
// 职责: 面向 UI/审批层的业务接口门面
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod guard;
pub mod operation_api;

// 重导出核心接口
pub use dashboard_api::{DashboardApi, FutureStateReport, DEFAULT_TOP_RISK_LIMIT};
pub use error::{ApiError, ApiResult};
pub use guard::{enforce_orders_scope, enforce_transfers_scope, filter_distances_to_scope};
pub use operation_api::{OperationApi, OrderApprovalReport, TransferApprovalReport};
