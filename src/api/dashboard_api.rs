// ==========================================
// 零售库存决策支持系统 - 驾驶舱 API
// ==========================================
// 职责: 只读决策视图门面 (统计 -> 分类 -> 补货 -> 调拨建议 -> 推演)
// 调用方: 被排除在外的 UI 层 (提交过滤后的输入表, 接收结果表)
// 红线: 本层不做台账变更; 推演只回放事实, 不触碰实时台账
// ==========================================

use crate::api::error::ApiResult;
use crate::config::EngineParams;
use crate::domain::demand::{BaselineKpis, LeadTime, SalesRecord};
use crate::domain::enriched::{EnrichedRow, StoreRiskSummary};
use crate::domain::inventory::{DistanceRecord, InventoryLevel, InventorySnapshotRow};
use crate::domain::movement::TransferProposal;
use crate::domain::scope::OrgScope;
use crate::engine::future::{FutureStateEngine, ImpactSummary, ProjectedRow};
use crate::engine::reorder::ReorderEngine;
use crate::engine::risk::RiskEngine;
use crate::engine::statistics::DemandStatisticsEngine;
use crate::engine::transfer::TransferMatcher;
use crate::repository::ledger_repo::InventoryLedgerRepository;
use crate::repository::movement_repo::ConfirmedMovementRepository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 断货风险 Top 列表的默认长度
pub const DEFAULT_TOP_RISK_LIMIT: usize = 50;

// ==========================================
// 未来态报告
// ==========================================

/// 推演报告: 行级推演结果 + 风险分布影响摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureStateReport {
    pub projected: Vec<ProjectedRow>,
    pub impact: ImpactSummary,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    risk_engine: RiskEngine,
    reorder_engine: ReorderEngine,
    future_engine: FutureStateEngine,
    ledger_repo: Arc<InventoryLedgerRepository>,
    movement_repo: Arc<ConfirmedMovementRepository>,
}

impl DashboardApi {
    /// 构造函数
    pub fn new(
        ledger_repo: Arc<InventoryLedgerRepository>,
        movement_repo: Arc<ConfirmedMovementRepository>,
    ) -> Self {
        Self {
            risk_engine: RiskEngine::new(),
            reorder_engine: ReorderEngine::new(),
            future_engine: FutureStateEngine::new(),
            ledger_repo,
            movement_repo,
        }
    }

    // ==========================================
    // 决策视图构建
    // ==========================================

    /// 窗口基线 KPI
    pub fn baseline_kpis(
        &self,
        scope: &OrgScope,
        sales: &[SalesRecord],
        params: &EngineParams,
    ) -> Option<BaselineKpis> {
        let scoped = Self::scope_sales(scope, sales);
        let engine = DemandStatisticsEngine::new(params.demand_window_days);
        engine.compute_baseline(&scoped).map(|(kpis, _)| kpis)
    }

    /// 构建决策视图表
    ///
    /// 流程 (与日常运营页一致):
    /// 1. 输入表收敛到授权范围 (前置条件过滤, 不报错)
    /// 2. 滑动窗口需求统计
    /// 3. 实时台账覆盖快照在库量 (台账已播种时以台账为准)
    /// 4. 风险分类 + ROP/S/建议订货量
    pub fn build_enriched_table(
        &self,
        scope: &OrgScope,
        sales: &[SalesRecord],
        snapshot: &[InventorySnapshotRow],
        lead_times: &[LeadTime],
        params: &EngineParams,
    ) -> ApiResult<Vec<EnrichedRow>> {
        let scoped_sales = Self::scope_sales(scope, sales);
        let scoped_snapshot = Self::scope_snapshot(scope, snapshot);
        let scoped_lead_times: Vec<LeadTime> = lead_times
            .iter()
            .filter(|lt| scope.contains_store(&lt.store_id) && scope.contains_sku(&lt.sku_id))
            .cloned()
            .collect();

        let statistics_engine = DemandStatisticsEngine::new(params.demand_window_days);
        let demand = match statistics_engine.compute_baseline(&scoped_sales) {
            Some((_, recent)) => statistics_engine.average_daily_sales(&recent),
            None => BTreeMap::new(),
        };

        let inventory = self.overlay_live_levels(scope, &scoped_snapshot)?;

        let mut rows = self.risk_engine.risk_table(
            &inventory,
            &demand,
            &scoped_lead_times,
            params.overstock_days_threshold,
        );
        self.reorder_engine
            .enrich_with_rop(&mut rows, params.service_level, params.order_up_factor);

        tracing::debug!(
            "决策视图构建完成: org_id={}, rows={}",
            scope.org_id,
            rows.len()
        );
        Ok(rows)
    }

    /// 按门店汇总风险分类
    pub fn risk_summary_by_store(&self, rows: &[EnrichedRow]) -> Vec<StoreRiskSummary> {
        self.risk_engine.summarize_by_store(rows)
    }

    /// 断货风险 Top 列表
    pub fn top_stockout_risks(&self, rows: &[EnrichedRow], limit: usize) -> Vec<EnrichedRow> {
        self.risk_engine.top_stockout_risks(rows, limit)
    }

    /// 建议补货订单 (建议订货量 > 0 的行)
    pub fn suggested_orders(&self, rows: &[EnrichedRow]) -> Vec<EnrichedRow> {
        rows.iter()
            .filter(|row| row.suggested_order_qty > 0)
            .cloned()
            .collect()
    }

    /// 调拨建议
    pub fn suggest_transfers(
        &self,
        scope: &OrgScope,
        enriched: &[EnrichedRow],
        distances: Option<&[DistanceRecord]>,
        params: &EngineParams,
    ) -> Vec<TransferProposal> {
        let scoped_distances =
            distances.map(|d| crate::api::guard::filter_distances_to_scope(d, scope));
        let matcher = TransferMatcher::from_params(params);

        matcher.suggest_transfers(
            enriched,
            scoped_distances.as_deref(),
            Some(&scope.allowed_stores),
            Some(&scope.allowed_skus),
        )
    }

    // ==========================================
    // 未来态推演 (只读)
    // ==========================================

    /// 回放已确认订单/调拨, 产出推演报告
    ///
    /// 以快照为基线 (不叠加实时台账 —— 推演回答的是
    /// "如果全部已确认事实生效, 库存会是什么样", 与台账当前
    /// 已实际扣减多少无关)
    pub fn project_future_state(
        &self,
        scope: &OrgScope,
        sales: &[SalesRecord],
        snapshot: &[InventorySnapshotRow],
        lead_times: &[LeadTime],
        params: &EngineParams,
        include_orders: bool,
    ) -> ApiResult<FutureStateReport> {
        let scoped_sales = Self::scope_sales(scope, sales);
        let scoped_snapshot = Self::scope_snapshot(scope, snapshot);
        let scoped_lead_times: Vec<LeadTime> = lead_times
            .iter()
            .filter(|lt| scope.contains_store(&lt.store_id) && scope.contains_sku(&lt.sku_id))
            .cloned()
            .collect();

        let statistics_engine = DemandStatisticsEngine::new(params.demand_window_days);
        let demand = match statistics_engine.compute_baseline(&scoped_sales) {
            Some((_, recent)) => statistics_engine.average_daily_sales(&recent),
            None => BTreeMap::new(),
        };

        // 当前态 (快照口径) 的风险分布
        let baseline_levels: Vec<InventoryLevel> = scoped_snapshot
            .iter()
            .map(|row| InventoryLevel {
                org_id: scope.org_id.clone(),
                store_id: row.store_id.clone(),
                sku_id: row.sku_id.clone(),
                on_hand: row.on_hand_units,
            })
            .collect();
        let before_rows = self.risk_engine.risk_table(
            &baseline_levels,
            &demand,
            &scoped_lead_times,
            params.overstock_days_threshold,
        );

        // 事实回放
        let orders = self.movement_repo.list_orders(&scope.org_id)?;
        let transfers = self.movement_repo.list_transfers(&scope.org_id)?;

        let baseline: Vec<(String, String, i64)> = scoped_snapshot
            .iter()
            .map(|row| (row.store_id.clone(), row.sku_id.clone(), row.on_hand_units))
            .collect();
        let projected = self
            .future_engine
            .project(&baseline, &transfers, &orders, include_orders);

        let future_risks = self.future_engine.future_risks(
            &projected,
            &demand,
            &scoped_lead_times,
            params.overstock_days_threshold,
        );
        let impact = self.future_engine.summarize_impact(&before_rows, &future_risks);

        Ok(FutureStateReport { projected, impact })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 销量表收敛到授权范围
    fn scope_sales(scope: &OrgScope, sales: &[SalesRecord]) -> Vec<SalesRecord> {
        sales
            .iter()
            .filter(|r| scope.contains_store(&r.store_id) && scope.contains_sku(&r.sku_id))
            .cloned()
            .collect()
    }

    /// 快照收敛到授权范围
    fn scope_snapshot(
        scope: &OrgScope,
        snapshot: &[InventorySnapshotRow],
    ) -> Vec<InventorySnapshotRow> {
        snapshot
            .iter()
            .filter(|r| scope.contains_store(&r.store_id) && scope.contains_sku(&r.sku_id))
            .cloned()
            .collect()
    }

    /// 实时台账覆盖快照在库量
    ///
    /// 台账非空时以台账为准 (台账中没有的组合按 0 处理 ——
    /// 台账播种后即是系统记录); 台账为空时退回快照
    fn overlay_live_levels(
        &self,
        scope: &OrgScope,
        snapshot: &[InventorySnapshotRow],
    ) -> ApiResult<Vec<InventoryLevel>> {
        let mut store_ids: Vec<String> = scope.allowed_stores.iter().cloned().collect();
        store_ids.sort();
        let mut sku_ids: Vec<String> = scope.allowed_skus.iter().cloned().collect();
        sku_ids.sort();

        let live = self
            .ledger_repo
            .fetch_levels(&scope.org_id, &store_ids, &sku_ids)?;

        if live.is_empty() {
            return Ok(snapshot
                .iter()
                .map(|row| InventoryLevel {
                    org_id: scope.org_id.clone(),
                    store_id: row.store_id.clone(),
                    sku_id: row.sku_id.clone(),
                    on_hand: row.on_hand_units,
                })
                .collect());
        }

        let live_map: BTreeMap<(String, String), i64> = live
            .into_iter()
            .map(|level| ((level.store_id, level.sku_id), level.on_hand))
            .collect();

        Ok(snapshot
            .iter()
            .map(|row| InventoryLevel {
                org_id: scope.org_id.clone(),
                store_id: row.store_id.clone(),
                sku_id: row.sku_id.clone(),
                on_hand: live_map
                    .get(&(row.store_id.clone(), row.sku_id.clone()))
                    .copied()
                    .unwrap_or(0),
            })
            .collect())
    }
}
