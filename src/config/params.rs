// ==========================================
// 零售库存决策支持系统 - 引擎参数
// ==========================================
// 说明: 补货/风险/调拨模型的全部可调参数集中于此,
//       默认值即业务口径, 可被 config_kv 覆盖
// ==========================================

use serde::{Deserialize, Serialize};

/// 决策引擎参数全集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    /// 服务水平 (有效区间 [0.80, 0.99], 超出时计算前截断)
    pub service_level: f64,
    /// 补货目标系数 k (S = ROP + k * mu_LT)
    pub order_up_factor: f64,
    /// 超储阈值 (覆盖天数)
    pub overstock_days_threshold: f64,
    /// 需求统计滑动窗口 (天)
    pub demand_window_days: i64,
    /// 每个接收门店最多考察的候选捐出门店数
    pub nearest_donor_limit: usize,
    /// 调拨最小批量 (小于该值的分配被跳过)
    pub min_transfer_batch: i64,
    /// 单 SKU 最多保留的调拨建议数
    pub max_transfers_per_sku: usize,
    /// 调拨成本系数 (每件每公里)
    pub transfer_cost_per_unit_km: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            service_level: 0.95,
            order_up_factor: 1.0,
            overstock_days_threshold: 45.0,
            demand_window_days: 28,
            nearest_donor_limit: 5,
            min_transfer_batch: 1,
            max_transfers_per_sku: 20,
            transfer_cost_per_unit_km: 0.08,
        }
    }
}
