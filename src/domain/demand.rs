// ==========================================
// 零售库存决策支持系统 - 需求侧实体
// ==========================================
// 职责: 销量历史、需求统计、补货提前期
// 说明: DemandStat 按请求重算,不落库
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 销量记录 (外部数据表, 只读)
// ==========================================
/// 单日单门店单 SKU 的销量记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub store_id: String,
    pub sku_id: String,
    pub units_sold: f64,
}

// ==========================================
// 需求统计 (派生, 瞬态)
// ==========================================
/// 按 (store, sku) 聚合的滑动窗口日均销量
///
/// 不变式: avg_daily_sales >= 0; 窗口内无销量时为 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandStat {
    pub store_id: String,
    pub sku_id: String,
    pub avg_daily_sales: f64,
}

// ==========================================
// 补货提前期 (外部数据表, 只读)
// ==========================================
/// 供应商补货提前期统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTime {
    pub store_id: String,
    pub sku_id: String,
    pub lead_time_mean_days: f64,
    pub lead_time_std_days: f64,
}

// ==========================================
// 基线 KPI (滑动窗口汇总)
// ==========================================
/// 销量窗口的汇总指标（驾驶舱顶部指标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineKpis {
    /// 数据中最近的销售日期
    pub last_date: NaiveDate,
    /// 窗口内总销量
    pub total_units: f64,
    /// 窗口内全网日均销量
    pub avg_daily_units: f64,
    /// 窗口内出现过销量的 (store, sku) 组合数
    pub sku_store_pairs: usize,
}
