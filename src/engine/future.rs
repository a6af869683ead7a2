// ==========================================
// 零售库存决策支持系统 - 未来态推演引擎
// ==========================================
// 职责: 将已确认订单/调拨回放到快照上, 产出推演库存与影响摘要
// 输入: 库存快照 + 已确认调拨 + 已确认订单 + include_orders 开关
// 输出: ProjectedRow 列表 + ImpactSummary
// 红线: 只读推演, 不触碰库存台账; 回放与台账实际扣减相互独立
// ==========================================

use crate::domain::demand::LeadTime;
use crate::domain::enriched::EnrichedRow;
use crate::domain::movement::{OrderRecord, TransferRecord};
use crate::domain::types::RiskCategory;
use crate::engine::risk::RiskEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 推演结果行
// ==========================================

/// 单 (store, sku) 的推演结果
///
/// 调拨回放时扣减端用 max(0, ...) 截断 —— 这是推演口径,
/// 台账的真实扣减由条件更新保证非负, 两者语义不同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedRow {
    pub store_id: String,
    pub sku_id: String,
    pub on_hand_before: i64,
    pub on_hand_after_transfers: i64,
    /// include_orders 关闭时为 None
    pub on_hand_after_orders: Option<i64>,
    /// 最终推演值相对快照基线的变化
    pub delta_on_hand: i64,
}

impl ProjectedRow {
    /// 最终推演在库量 (含订单时取订单后值)
    pub fn projected_on_hand(&self) -> i64 {
        self.on_hand_after_orders.unwrap_or(self.on_hand_after_transfers)
    }
}

// ==========================================
// 影响摘要
// ==========================================

/// 四类风险的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskCategoryCounts {
    pub stockout_risk: i64,
    pub overstock: i64,
    pub low_demand: i64,
    pub normal: i64,
}

impl RiskCategoryCounts {
    /// 从风险标签迭代器统计
    pub fn tally<I: IntoIterator<Item = RiskCategory>>(labels: I) -> Self {
        let mut counts = Self::default();
        for label in labels {
            match label {
                RiskCategory::StockoutRisk => counts.stockout_risk += 1,
                RiskCategory::Overstock => counts.overstock += 1,
                RiskCategory::LowDemand => counts.low_demand += 1,
                RiskCategory::Normal => counts.normal += 1,
            }
        }
        counts
    }
}

/// 推演前后风险分布对比
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub before: RiskCategoryCounts,
    pub after: RiskCategoryCounts,
    pub delta_stockout_risk: i64,
    pub delta_overstock: i64,
    pub delta_low_demand: i64,
    pub delta_normal: i64,
}

// ==========================================
// FutureStateEngine - 未来态推演引擎
// ==========================================
pub struct FutureStateEngine {
    risk_engine: RiskEngine,
}

impl FutureStateEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            risk_engine: RiskEngine::new(),
        }
    }

    /// 回放已确认事实, 推演库存
    ///
    /// - 调拨无条件回放: 调出端扣减 (截断到 0), 调入端增加
    /// - include_orders 开启时再叠加订单数量
    /// - 只影响快照中已有的 (store, sku) 行, 快照外的键忽略
    ///
    /// # 参数
    /// - `snapshot`: 基线库存 (store, sku, on_hand)
    /// - `transfers` / `orders`: 已确认事实表
    /// - `include_orders`: 是否叠加订单
    pub fn project(
        &self,
        snapshot: &[(String, String, i64)],
        transfers: &[TransferRecord],
        orders: &[OrderRecord],
        include_orders: bool,
    ) -> Vec<ProjectedRow> {
        let mut index: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut working: Vec<i64> = Vec::with_capacity(snapshot.len());
        for (i, (store_id, sku_id, on_hand)) in snapshot.iter().enumerate() {
            index.insert((store_id.clone(), sku_id.clone()), i);
            working.push(*on_hand);
        }

        // 调拨回放
        for transfer in transfers {
            if transfer.qty <= 0 {
                continue;
            }
            if let Some(&i) = index.get(&(transfer.from_store.clone(), transfer.sku_id.clone())) {
                working[i] = (working[i] - transfer.qty).max(0);
            }
            if let Some(&i) = index.get(&(transfer.to_store.clone(), transfer.sku_id.clone())) {
                working[i] += transfer.qty;
            }
        }
        let after_transfers = working.clone();

        // 订单回放 (可选)
        if include_orders {
            for order in orders {
                if order.qty <= 0 {
                    continue;
                }
                if let Some(&i) = index.get(&(order.store_id.clone(), order.sku_id.clone())) {
                    working[i] += order.qty;
                }
            }
        }

        snapshot
            .iter()
            .enumerate()
            .map(|(i, (store_id, sku_id, on_hand))| {
                let final_value = if include_orders {
                    working[i]
                } else {
                    after_transfers[i]
                };
                ProjectedRow {
                    store_id: store_id.clone(),
                    sku_id: sku_id.clone(),
                    on_hand_before: *on_hand,
                    on_hand_after_transfers: after_transfers[i],
                    on_hand_after_orders: include_orders.then_some(working[i]),
                    delta_on_hand: final_value - on_hand,
                }
            })
            .collect()
    }

    /// 对推演态重新分类风险 (与当前态同一套阈值)
    pub fn future_risks(
        &self,
        projected: &[ProjectedRow],
        demand: &BTreeMap<(String, String), f64>,
        lead_times: &[LeadTime],
        overstock_days_threshold: f64,
    ) -> Vec<RiskCategory> {
        let lead_time_map: BTreeMap<(String, String), f64> = lead_times
            .iter()
            .map(|lt| {
                (
                    (lt.store_id.clone(), lt.sku_id.clone()),
                    lt.lead_time_mean_days,
                )
            })
            .collect();

        projected
            .iter()
            .map(|row| {
                let key = (row.store_id.clone(), row.sku_id.clone());
                let avg_daily_sales = demand.get(&key).copied().unwrap_or(0.0);
                let lt_mean = lead_time_map.get(&key).copied().unwrap_or(0.0);
                let doc = self
                    .risk_engine
                    .days_of_cover(row.projected_on_hand(), avg_daily_sales);
                self.risk_engine
                    .classify(avg_daily_sales, doc, lt_mean, overstock_days_threshold)
            })
            .collect()
    }

    /// 推演前后风险分布对比
    ///
    /// # 参数
    /// - `before`: 当前态决策视图行 (风险已分类)
    /// - `after`: 推演态风险标签
    pub fn summarize_impact(
        &self,
        before: &[EnrichedRow],
        after: &[RiskCategory],
    ) -> ImpactSummary {
        let before_counts = RiskCategoryCounts::tally(before.iter().map(|r| r.risk));
        let after_counts = RiskCategoryCounts::tally(after.iter().copied());

        ImpactSummary {
            before: before_counts,
            after: after_counts,
            delta_stockout_risk: after_counts.stockout_risk - before_counts.stockout_risk,
            delta_overstock: after_counts.overstock - before_counts.overstock,
            delta_low_demand: after_counts.low_demand - before_counts.low_demand,
            delta_normal: after_counts.normal - before_counts.normal,
        }
    }
}

impl Default for FutureStateEngine {
    fn default() -> Self {
        Self::new()
    }
}
