// ==========================================
// 零售库存决策支持系统 - 需求统计引擎
// ==========================================
// 职责: 滑动窗口销量统计 (基线 KPI + 按 store/sku 的日均销量)
// 输入: 销量历史表
// 输出: BaselineKpis + DemandStat 集合
// 红线: 无状态引擎, 纯聚合, 坏数据不报错只降级
// ==========================================

use crate::domain::demand::{BaselineKpis, DemandStat, SalesRecord};
use chrono::Duration;
use std::collections::BTreeMap;

// ==========================================
// DemandStatisticsEngine - 需求统计引擎
// ==========================================
pub struct DemandStatisticsEngine {
    /// 滑动窗口天数
    window_days: i64,
}

impl DemandStatisticsEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - `window_days`: 滑动窗口天数 (业务口径 28)
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    /// 计算基线 KPI 并切出窗口内销量
    ///
    /// 窗口 = [最近销售日期 - window_days, 最近销售日期]
    ///
    /// # 返回
    /// - Some((kpis, 窗口内记录)): 有销量数据
    /// - None: 输入为空（驾驶舱显示空态, 不报错）
    pub fn compute_baseline(&self, sales: &[SalesRecord]) -> Option<(BaselineKpis, Vec<SalesRecord>)> {
        let last_date = sales.iter().map(|r| r.date).max()?;
        let window_start = last_date - Duration::days(self.window_days);

        let recent: Vec<SalesRecord> = sales
            .iter()
            .filter(|r| r.date >= window_start)
            .cloned()
            .collect();

        // 按日期汇总后取均值 (全网日均)
        let mut daily_totals: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
        for record in &recent {
            *daily_totals.entry(record.date).or_insert(0.0) += record.units_sold;
        }
        let avg_daily_units = if daily_totals.is_empty() {
            0.0
        } else {
            daily_totals.values().sum::<f64>() / daily_totals.len() as f64
        };

        let total_units: f64 = recent.iter().map(|r| r.units_sold).sum();

        let mut pairs: Vec<(&str, &str)> = recent
            .iter()
            .map(|r| (r.store_id.as_str(), r.sku_id.as_str()))
            .collect();
        pairs.sort();
        pairs.dedup();

        let kpis = BaselineKpis {
            last_date,
            total_units,
            avg_daily_units,
            sku_store_pairs: pairs.len(),
        };

        Some((kpis, recent))
    }

    /// 按 (store, sku) 计算窗口内日均销量（观测行的均值）
    ///
    /// # 返回
    /// (store_id, sku_id) -> 日均销量; 无销量的组合不出现在结果中,
    /// 联接时按 0 处理
    pub fn average_daily_sales(&self, recent: &[SalesRecord]) -> BTreeMap<(String, String), f64> {
        let mut sums: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
        for record in recent {
            let entry = sums
                .entry((record.store_id.clone(), record.sku_id.clone()))
                .or_insert((0.0, 0));
            entry.0 += record.units_sold;
            entry.1 += 1;
        }

        sums.into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect()
    }

    /// 以 DemandStat 列表形式输出窗口内日均销量
    pub fn demand_stats(&self, recent: &[SalesRecord]) -> Vec<DemandStat> {
        self.average_daily_sales(recent)
            .into_iter()
            .map(|((store_id, sku_id), avg_daily_sales)| DemandStat {
                store_id,
                sku_id,
                avg_daily_sales,
            })
            .collect()
    }
}

impl Default for DemandStatisticsEngine {
    fn default() -> Self {
        Self::new(28)
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_record(date: NaiveDate, store: &str, sku: &str, units: f64) -> SalesRecord {
        SalesRecord {
            date,
            store_id: store.to_string(),
            sku_id: sku.to_string(),
            units_sold: units,
        }
    }

    #[test]
    fn test_compute_baseline_empty() {
        let engine = DemandStatisticsEngine::default();
        assert!(engine.compute_baseline(&[]).is_none());
    }

    #[test]
    fn test_compute_baseline_window_filter() {
        let engine = DemandStatisticsEngine::default();
        let sales = vec![
            make_record(make_date(2025, 1, 1), "S1", "K1", 100.0), // 窗口外
            make_record(make_date(2025, 5, 1), "S1", "K1", 10.0),
            make_record(make_date(2025, 5, 2), "S1", "K1", 20.0),
        ];

        let (kpis, recent) = engine.compute_baseline(&sales).unwrap();

        assert_eq!(kpis.last_date, make_date(2025, 5, 2));
        assert_eq!(recent.len(), 2);
        assert_eq!(kpis.total_units, 30.0);
        assert_eq!(kpis.avg_daily_units, 15.0);
        assert_eq!(kpis.sku_store_pairs, 1);
    }

    #[test]
    fn test_average_daily_sales_group_mean() {
        let engine = DemandStatisticsEngine::default();
        let recent = vec![
            make_record(make_date(2025, 5, 1), "S1", "K1", 10.0),
            make_record(make_date(2025, 5, 2), "S1", "K1", 20.0),
            make_record(make_date(2025, 5, 1), "S2", "K1", 5.0),
        ];

        let avg = engine.average_daily_sales(&recent);

        assert_eq!(avg[&("S1".to_string(), "K1".to_string())], 15.0);
        assert_eq!(avg[&("S2".to_string(), "K1".to_string())], 5.0);
        // 无销量组合不出现
        assert!(!avg.contains_key(&("S3".to_string(), "K1".to_string())));
    }

    #[test]
    fn test_demand_stats_non_negative() {
        let engine = DemandStatisticsEngine::default();
        let recent = vec![make_record(make_date(2025, 5, 1), "S1", "K1", 0.0)];

        let stats = engine.demand_stats(&recent);

        assert_eq!(stats.len(), 1);
        assert!(stats[0].avg_daily_sales >= 0.0);
    }
}
