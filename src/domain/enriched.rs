// ==========================================
// 零售库存决策支持系统 - 决策视图行
// ==========================================
// 职责: 需求统计 + 库存 + 提前期的联接视图,
//       附加覆盖天数/风险分类/ROP/S/建议订货量
// 说明: 每次请求重算, 不落库
// ==========================================

use crate::domain::types::RiskCategory;
use serde::{Deserialize, Serialize};

/// 驾驶舱决策表的一行
///
/// days_of_cover 在无需求时为 +inf（序列化时由调用方处理）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub store_id: String,
    pub sku_id: String,
    pub on_hand: i64,
    pub avg_daily_sales: f64,
    pub lead_time_mean_days: f64,
    pub lead_time_std_days: f64,
    pub days_of_cover: f64,
    pub risk: RiskCategory,
    pub rop: f64,
    pub s_level: f64,
    pub suggested_order_qty: i64,
    pub order_explanation: String,
}

/// 单门店的风险分类计数（驾驶舱“按门店的风险”汇总）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRiskSummary {
    pub store_id: String,
    pub stockout_risk: i64,
    pub overstock: i64,
    pub low_demand: i64,
    pub normal: i64,
}
