// ==========================================
// 零售库存决策支持系统 - 库存变动实体
// ==========================================
// 职责: 订单/调拨的输入行、确认事实、幂等键构造
// 红线: 幂等键格式与既有审计日志逐位兼容, 不得改动
// ==========================================

use crate::domain::types::MovementKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// 审批输入行 (调用方提交)
// ==========================================

/// 待审批的补货订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub store_id: String,
    pub sku_id: String,
    pub qty: i64,
}

/// 待审批的调拨行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRow {
    pub from_store: String,
    pub to_store: String,
    pub sku_id: String,
    pub qty: i64,
}

// ==========================================
// 调拨建议行 (TransferMatcher 输出)
// ==========================================

/// 调拨匹配器产出的建议行
///
/// distance_km / cost_est 仅在提供距离表时有值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferProposal {
    pub sku_id: String,
    pub from_store: String,
    pub to_store: String,
    pub qty: i64,
    pub distance_km: Option<f64>,
    pub cost_est: Option<f64>,
}

impl TransferProposal {
    /// 转换为审批输入行
    pub fn to_transfer_row(&self) -> TransferRow {
        TransferRow {
            from_store: self.from_store.clone(),
            to_store: self.to_store.clone(),
            sku_id: self.sku_id.clone(),
            qty: self.qty,
        }
    }
}

// ==========================================
// 确认事实 (只增不删, 审计日志 + 幂等基底)
// ==========================================

/// 已确认的补货订单
///
/// 唯一约束: (org_id, store_id, sku_id, idem_key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub org_id: String,
    pub store_id: String,
    pub sku_id: String,
    pub qty: i64,
    pub approved_by: Option<String>,
    pub approved_at: NaiveDateTime,
    pub idem_key: String,
}

/// 已确认的调拨
///
/// 唯一约束: (org_id, from_store, to_store, sku_id, idem_key)
/// 不变式: from_store != to_store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: i64,
    pub org_id: String,
    pub from_store: String,
    pub to_store: String,
    pub sku_id: String,
    pub qty: i64,
    pub approved_by: Option<String>,
    pub approved_at: NaiveDateTime,
    pub idem_key: String,
}

// ==========================================
// 幂等键构造
// ==========================================
// 格式与既有审计日志兼容:
//   "{prefix}:order:{store_id}:{sku_id}"
//   "{prefix}:transfer:{from_store}:{to_store}:{sku_id}"
// prefix 由调用方提供, 惯例为 "{org_id}:{actor}:{unix_ts}"

/// 订单幂等键
pub fn order_idem_key(prefix: &str, store_id: &str, sku_id: &str) -> String {
    format!("{}:{}:{}:{}", prefix, MovementKind::Order, store_id, sku_id)
}

/// 调拨幂等键
pub fn transfer_idem_key(prefix: &str, from_store: &str, to_store: &str, sku_id: &str) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        prefix,
        MovementKind::Transfer,
        from_store,
        to_store,
        sku_id
    )
}

/// 默认幂等前缀（"{org_id}:{actor}:{unix_ts}"）
pub fn default_idem_prefix(org_id: &str, actor: &str, unix_ts: i64) -> String {
    format!("{}:{}:{}", org_id, actor, unix_ts)
}

// ==========================================
// 应用结果 (台账返回)
// ==========================================

/// apply_orders 的按行计数结果
///
/// 业务规则结果用计数表达, 不抛错; applied 为实际改变台账状态的行集
/// (供下游通知系统构造消息)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOrdersOutcome {
    pub new_count: usize,
    pub duplicate_count: usize,
    pub applied: Vec<OrderRow>,
}

/// apply_transfers 的按行计数结果
///
/// insufficient 行的事实记录仍然落库(审批事实持久), 但无实际库存移动
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyTransfersOutcome {
    pub applied_count: usize,
    pub duplicate_count: usize,
    pub insufficient_count: usize,
    pub applied: Vec<TransferRow>,
}
