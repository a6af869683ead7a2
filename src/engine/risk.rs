// ==========================================
// 零售库存决策支持系统 - 风险分类引擎
// ==========================================
// 职责: 覆盖天数计算 + 风险分类 + 驾驶舱汇总
// 输入: 需求统计 + 库存 + 提前期
// 输出: 决策视图行 (EnrichedRow, 待补货引擎填充 ROP/S)
// 红线: 每行恰好一个分类, 无副作用, 坏数据不报错
// ==========================================

use crate::domain::demand::LeadTime;
use crate::domain::enriched::{EnrichedRow, StoreRiskSummary};
use crate::domain::inventory::InventoryLevel;
use crate::domain::types::RiskCategory;
use std::collections::BTreeMap;

// ==========================================
// RiskEngine - 风险分类引擎
// ==========================================
pub struct RiskEngine {
    // 无状态引擎,不需要注入依赖
}

impl RiskEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 覆盖天数 = 在库 / 日均销量; 无需求时为 +inf
    pub fn days_of_cover(&self, on_hand: i64, avg_daily_sales: f64) -> f64 {
        if avg_daily_sales > 0.0 {
            on_hand as f64 / avg_daily_sales
        } else {
            f64::INFINITY
        }
    }

    /// 风险分类, 按优先级判定, 首个命中生效:
    /// 1. 日均销量 == 0        -> LOW_DEMAND
    /// 2. 覆盖天数 < 提前期均值 -> STOCKOUT_RISK
    /// 3. 覆盖天数 > 超储阈值   -> OVERSTOCK
    /// 4. 其余                 -> NORMAL
    pub fn classify(
        &self,
        avg_daily_sales: f64,
        days_of_cover: f64,
        lead_time_mean_days: f64,
        overstock_days_threshold: f64,
    ) -> RiskCategory {
        if avg_daily_sales == 0.0 {
            RiskCategory::LowDemand
        } else if days_of_cover < lead_time_mean_days {
            RiskCategory::StockoutRisk
        } else if days_of_cover > overstock_days_threshold {
            RiskCategory::Overstock
        } else {
            RiskCategory::Normal
        }
    }

    /// 构建决策视图基表: 库存 x 需求统计 x 提前期 联接,
    /// 附加覆盖天数与风险分类
    ///
    /// 缺失的需求统计按 0 处理, 缺失的提前期按 0 处理
    /// (提前期为 0 时不会判为 STOCKOUT_RISK, 与业务口径一致)
    ///
    /// # 参数
    /// - `inventory`: 库存行 (快照或实时台账)
    /// - `demand`: (store, sku) -> 日均销量
    /// - `lead_times`: 提前期表
    /// - `overstock_days_threshold`: 超储阈值 (天)
    ///
    /// # 返回
    /// EnrichedRow 列表, ROP/S/建议订货量留待 ReorderEngine 填充
    pub fn risk_table(
        &self,
        inventory: &[InventoryLevel],
        demand: &BTreeMap<(String, String), f64>,
        lead_times: &[LeadTime],
        overstock_days_threshold: f64,
    ) -> Vec<EnrichedRow> {
        let lead_time_map: BTreeMap<(String, String), (f64, f64)> = lead_times
            .iter()
            .map(|lt| {
                (
                    (lt.store_id.clone(), lt.sku_id.clone()),
                    (lt.lead_time_mean_days, lt.lead_time_std_days),
                )
            })
            .collect();

        inventory
            .iter()
            .map(|level| {
                let key = (level.store_id.clone(), level.sku_id.clone());
                let avg_daily_sales = demand.get(&key).copied().unwrap_or(0.0);
                let (lt_mean, lt_std) = lead_time_map.get(&key).copied().unwrap_or((0.0, 0.0));

                let days_of_cover = self.days_of_cover(level.on_hand, avg_daily_sales);
                let risk = self.classify(
                    avg_daily_sales,
                    days_of_cover,
                    lt_mean,
                    overstock_days_threshold,
                );

                EnrichedRow {
                    store_id: level.store_id.clone(),
                    sku_id: level.sku_id.clone(),
                    on_hand: level.on_hand,
                    avg_daily_sales,
                    lead_time_mean_days: lt_mean,
                    lead_time_std_days: lt_std,
                    days_of_cover,
                    risk,
                    rop: 0.0,
                    s_level: 0.0,
                    suggested_order_qty: 0,
                    order_explanation: String::new(),
                }
            })
            .collect()
    }

    /// 按门店汇总风险分类计数
    pub fn summarize_by_store(&self, rows: &[EnrichedRow]) -> Vec<StoreRiskSummary> {
        let mut by_store: BTreeMap<String, StoreRiskSummary> = BTreeMap::new();

        for row in rows {
            let summary = by_store
                .entry(row.store_id.clone())
                .or_insert_with(|| StoreRiskSummary {
                    store_id: row.store_id.clone(),
                    stockout_risk: 0,
                    overstock: 0,
                    low_demand: 0,
                    normal: 0,
                });

            match row.risk {
                RiskCategory::StockoutRisk => summary.stockout_risk += 1,
                RiskCategory::Overstock => summary.overstock += 1,
                RiskCategory::LowDemand => summary.low_demand += 1,
                RiskCategory::Normal => summary.normal += 1,
            }
        }

        by_store.into_values().collect()
    }

    /// 断货风险 Top 列表 (覆盖天数升序, 截取前 limit 行)
    pub fn top_stockout_risks(&self, rows: &[EnrichedRow], limit: usize) -> Vec<EnrichedRow> {
        let mut at_risk: Vec<EnrichedRow> = rows
            .iter()
            .filter(|row| row.risk == RiskCategory::StockoutRisk)
            .cloned()
            .collect();

        at_risk.sort_by(|a, b| {
            a.days_of_cover
                .partial_cmp(&b.days_of_cover)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        at_risk.truncate(limit);
        at_risk
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}
