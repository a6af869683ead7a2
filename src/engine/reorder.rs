// ==========================================
// 零售库存决策支持系统 - 补货模型引擎
// ==========================================
// 职责: 服务水平 -> z 值映射, ROP / 补货目标水位 S 计算,
//       建议订货量与可读解释
// 输入: 日均销量 + 提前期统计 + 服务水平/补货系数
// 输出: (ROP, S, suggested_qty, explanation)
// 红线: 坏数据不报错, 负值/缺失一律按 0 处理
// ==========================================

use crate::domain::enriched::EnrichedRow;
use serde::{Deserialize, Serialize};

/// 服务水平有效区间下界
pub const SERVICE_LEVEL_MIN: f64 = 0.80;
/// 服务水平有效区间上界
pub const SERVICE_LEVEL_MAX: f64 = 0.99;

/// z 值兜底（异常输入时等价于 0.95 服务水平）
const DEFAULT_Z: f64 = 1.6449;

/// 正态分位数锚点表 (服务水平 -> z)
const Z_TABLE: [(f64, f64); 7] = [
    (0.80, 0.8416),
    (0.85, 1.036),
    (0.90, 1.2816),
    (0.95, 1.6449),
    (0.975, 1.96),
    (0.98, 2.054),
    (0.99, 2.3263),
];

/// 服务水平映射为 z 值（锚点间分段线性插值）
///
/// 输入先截断到 [0.80, 0.99]; NaN 等异常输入落到兜底值
pub fn z_from_service_level(service_level: f64) -> f64 {
    let p = service_level.clamp(SERVICE_LEVEL_MIN, SERVICE_LEVEL_MAX);

    let (first_p, first_z) = Z_TABLE[0];
    if p <= first_p {
        return first_z;
    }
    let (last_p, last_z) = Z_TABLE[Z_TABLE.len() - 1];
    if p >= last_p {
        return last_z;
    }

    for window in Z_TABLE.windows(2) {
        let (p0, z0) = window[0];
        let (p1, z1) = window[1];
        if p0 <= p && p <= p1 {
            let t = (p - p0) / (p1 - p0);
            return z0 + t * (z1 - z0);
        }
    }

    DEFAULT_Z
}

/// 负值/非有限值按 0 处理
fn coerce_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// ==========================================
// ROP / S 计算结果
// ==========================================

/// 单行的 ROP/S 计算明细（含中间量, 便于解释展示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RopComputation {
    pub rop: f64,
    pub s_level: f64,
    pub mu_lt: f64,
    pub sigma_lt: f64,
    pub z: f64,
}

// ==========================================
// ReorderEngine - 补货模型引擎
// ==========================================
pub struct ReorderEngine {
    // 无状态引擎, 参数逐调用传入
}

impl ReorderEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算 ROP 与补货目标水位 S
    ///
    /// ```text
    /// mu_LT    = avg_daily_sales * lead_time_mean
    /// sigma_LT = avg_daily_sales * lead_time_std
    /// ROP      = max(0, mu_LT + z * sigma_LT)
    /// S        = max(0, ROP + k * mu_LT)
    /// ```
    ///
    /// # 参数
    /// - `avg_daily_sales`: 窗口日均销量
    /// - `lead_time_mean_days` / `lead_time_std_days`: 提前期统计
    /// - `service_level`: 服务水平 (截断到 [0.80, 0.99])
    /// - `order_up_factor`: 补货目标系数 k
    pub fn compute_rop_s(
        &self,
        avg_daily_sales: f64,
        lead_time_mean_days: f64,
        lead_time_std_days: f64,
        service_level: f64,
        order_up_factor: f64,
    ) -> RopComputation {
        let avg_daily_sales = coerce_non_negative(avg_daily_sales);
        let lead_time_mean = coerce_non_negative(lead_time_mean_days);
        let lead_time_std = coerce_non_negative(lead_time_std_days);
        let z = z_from_service_level(service_level);

        let mu_lt = avg_daily_sales * lead_time_mean;
        let sigma_lt = avg_daily_sales * lead_time_std;
        let rop = (mu_lt + z * sigma_lt).max(0.0);
        let s_level = (rop + order_up_factor * mu_lt).max(0.0);

        RopComputation {
            rop,
            s_level,
            mu_lt,
            sigma_lt,
            z,
        }
    }

    /// 建议订货量 = max(0, ceil(S - on_hand))
    pub fn suggested_order_qty(&self, s_level: f64, on_hand: i64) -> i64 {
        let qty = (s_level - on_hand as f64).ceil();
        if qty > 0.0 {
            qty as i64
        } else {
            0
        }
    }

    /// 单行可读解释
    fn order_explanation(&self, on_hand: i64, rop: f64, s_level: f64, qty: i64) -> String {
        if qty > 0 {
            format!(
                "库存{}低于ROP {:.1},建议补货{}件至S {:.1}",
                on_hand, rop, qty, s_level
            )
        } else {
            format!("库存充足(在库{} >= ROP {:.1})", on_hand, rop)
        }
    }

    /// 为决策视图行填充 ROP/S/建议订货量/解释
    ///
    /// 就地更新, 与风险分类解耦（先 risk_table 后 enrich）
    pub fn enrich_with_rop(
        &self,
        rows: &mut [EnrichedRow],
        service_level: f64,
        order_up_factor: f64,
    ) {
        for row in rows.iter_mut() {
            let result = self.compute_rop_s(
                row.avg_daily_sales,
                row.lead_time_mean_days,
                row.lead_time_std_days,
                service_level,
                order_up_factor,
            );
            let qty = self.suggested_order_qty(result.s_level, row.on_hand);

            row.rop = result.rop;
            row.s_level = result.s_level;
            row.suggested_order_qty = qty;
            row.order_explanation = self.order_explanation(row.on_hand, result.rop, result.s_level, qty);
        }
    }
}

impl Default for ReorderEngine {
    fn default() -> Self {
        Self::new()
    }
}
