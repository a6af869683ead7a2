// ==========================================
// 零售库存决策支持系统 - 调拨匹配引擎
// ==========================================
// 职责: 将缺口门店与富余门店按 SKU 贪心配对, 生成调拨建议
// 输入: 决策视图行 (含 ROP/S/风险) + 可选距离表 + 授权范围
// 输出: TransferProposal 列表
// ==========================================
// 算法: 单遍贪心、不回溯。接收方按缺口降序, 每个接收方
//       最多考察 nearest_donor_limit 个候选捐出方, 捐出方
//       剩余富余量用显式映射跟踪并就地扣减。
//       每日建议由人工复核, 不追求全局最优。
// ==========================================

use crate::domain::enriched::EnrichedRow;
use crate::domain::inventory::DistanceRecord;
use crate::domain::movement::TransferProposal;
use crate::domain::types::RiskCategory;
use std::collections::{BTreeMap, HashSet};

/// 缺失距离在截断排序中垫底的哨兵值
const MISSING_DISTANCE_SORT_KM: f64 = 1e9;

// ==========================================
// TransferMatcher - 调拨匹配引擎
// ==========================================
pub struct TransferMatcher {
    /// 单 SKU 最多保留的建议数 (0 表示不设上限)
    max_per_sku: usize,
    /// 每个接收方最多考察的候选捐出方数
    nearest_donor_limit: usize,
    /// 最小调拨批量
    min_batch: i64,
    /// 调拨成本系数 (每件每公里)
    cost_per_unit_km: f64,
}

/// 接收方状态 (缺口门店)
struct Receiver {
    store_id: String,
    need: i64,
}

impl TransferMatcher {
    /// 构造函数
    ///
    /// # 参数
    /// - `max_per_sku`: 单 SKU 建议数上限
    /// - `nearest_donor_limit`: 候选捐出方上限
    /// - `min_batch`: 最小调拨批量
    /// - `cost_per_unit_km`: 成本系数
    pub fn new(
        max_per_sku: usize,
        nearest_donor_limit: usize,
        min_batch: i64,
        cost_per_unit_km: f64,
    ) -> Self {
        Self {
            max_per_sku,
            nearest_donor_limit,
            min_batch,
            cost_per_unit_km,
        }
    }

    /// 按引擎参数构造
    pub fn from_params(params: &crate::config::EngineParams) -> Self {
        Self::new(
            params.max_transfers_per_sku,
            params.nearest_donor_limit,
            params.min_transfer_batch,
            params.transfer_cost_per_unit_km,
        )
    }

    /// 生成调拨建议
    ///
    /// 步骤:
    /// 1. 按授权范围过滤输入行 (空列表视为不限制)
    /// 2. 计算缺口 need = max(0, ROP - on_hand), 富余 surplus = max(0, on_hand - S)
    /// 3. 接收方: need > 0 或 风险为断货; 捐出方: surplus > 0 或 风险为超储
    /// 4. 只处理双方都出现的 SKU (升序遍历, 结果确定)
    /// 5. 接收方按缺口降序 (并列保持输入顺序); 候选捐出方按距离升序取前 N,
    ///    无距离信号时按表序取前 N
    /// 6. 逐候选分配 qty = min(剩余缺口, 捐出方剩余富余), 低于最小批量跳过;
    ///    富余量就地扣减, 已耗尽的捐出方不再回补
    /// 7. 单 SKU 超出上限时按 (距离升序, 数量降序) 截断, 缺失距离垫底
    /// 8. 防御性复核: 剔除范围外与 from == to 的行
    ///
    /// # 参数
    /// - `enriched`: 决策视图行 (须已填充 ROP/S/风险)
    /// - `distances`: 门店距离表 (可选)
    /// - `allowed_stores` / `allowed_skus`: 授权范围 (None 或空集不限制)
    pub fn suggest_transfers(
        &self,
        enriched: &[EnrichedRow],
        distances: Option<&[DistanceRecord]>,
        allowed_stores: Option<&HashSet<String>>,
        allowed_skus: Option<&HashSet<String>>,
    ) -> Vec<TransferProposal> {
        let store_filter = allowed_stores.filter(|s| !s.is_empty());
        let sku_filter = allowed_skus.filter(|s| !s.is_empty());

        // 1. 范围过滤
        let rows: Vec<&EnrichedRow> = enriched
            .iter()
            .filter(|row| store_filter.map_or(true, |s| s.contains(&row.store_id)))
            .filter(|row| sku_filter.map_or(true, |s| s.contains(&row.sku_id)))
            .collect();
        if rows.is_empty() {
            return Vec::new();
        }

        // 2-3. 缺口/富余与双方划分 (截断取整, 与数据口径一致)
        let mut receivers_by_sku: BTreeMap<String, Vec<Receiver>> = BTreeMap::new();
        let mut donors_by_sku: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut remaining_surplus: BTreeMap<(String, String), i64> = BTreeMap::new();

        for row in &rows {
            let need = (row.rop - row.on_hand as f64).max(0.0) as i64;
            let surplus = (row.on_hand as f64 - row.s_level).max(0.0) as i64;

            if need > 0 || row.risk == RiskCategory::StockoutRisk {
                receivers_by_sku
                    .entry(row.sku_id.clone())
                    .or_default()
                    .push(Receiver {
                        store_id: row.store_id.clone(),
                        need,
                    });
            }
            if surplus > 0 || row.risk == RiskCategory::Overstock {
                donors_by_sku
                    .entry(row.sku_id.clone())
                    .or_default()
                    .push(row.store_id.clone());
                remaining_surplus.insert((row.sku_id.clone(), row.store_id.clone()), surplus);
            }
        }

        // 4. 双方共有的 SKU (BTreeMap 键有序, 遍历结果确定)
        let common_skus: Vec<String> = receivers_by_sku
            .keys()
            .filter(|sku| donors_by_sku.contains_key(*sku))
            .cloned()
            .collect();
        if common_skus.is_empty() {
            return Vec::new();
        }

        // 距离表同样收敛到授权范围内
        let scoped_distances: Option<Vec<&DistanceRecord>> = distances.map(|table| {
            table
                .iter()
                .filter(|d| {
                    store_filter.map_or(true, |s| {
                        s.contains(&d.from_store) && s.contains(&d.to_store)
                    })
                })
                .collect()
        });

        let mut proposals: Vec<TransferProposal> = Vec::new();

        for sku in &common_skus {
            let sku_start = proposals.len();

            // 5. 接收方按缺口降序 (sort_by 稳定, 并列保持输入顺序)
            let mut receivers = std::mem::take(receivers_by_sku.get_mut(sku).unwrap());
            receivers.sort_by(|a, b| b.need.cmp(&a.need));

            let donor_stores = &donors_by_sku[sku];

            for receiver in &receivers {
                let mut need = receiver.need;
                if need <= 0 {
                    continue;
                }

                let candidates = self.nearest_donors_for_receiver(
                    donor_stores,
                    &receiver.store_id,
                    scoped_distances.as_deref(),
                );

                // 6. 贪心分配
                for (donor_store, distance_km) in candidates {
                    if need <= 0 {
                        break;
                    }

                    let key = (sku.clone(), donor_store.clone());
                    let surplus = remaining_surplus.get(&key).copied().unwrap_or(0);
                    if surplus <= 0 {
                        continue;
                    }

                    let qty = need.min(surplus);
                    if qty < self.min_batch {
                        continue;
                    }

                    let cost_est =
                        distance_km.map(|d| round2(d * qty as f64 * self.cost_per_unit_km));
                    proposals.push(TransferProposal {
                        sku_id: sku.clone(),
                        from_store: donor_store.clone(),
                        to_store: receiver.store_id.clone(),
                        qty,
                        distance_km,
                        cost_est,
                    });

                    need -= qty;
                    remaining_surplus.insert(key, surplus - qty);
                }
            }

            // 7. 单 SKU 上限截断
            if self.max_per_sku > 0 && proposals.len() - sku_start > self.max_per_sku {
                let sku_rows = proposals.split_off(sku_start);
                proposals.extend(self.truncate_per_sku(sku_rows));
            }
        }

        // 8. 防御性复核
        proposals.retain(|p| {
            p.from_store != p.to_store
                && store_filter
                    .map_or(true, |s| s.contains(&p.from_store) && s.contains(&p.to_store))
                && sku_filter.map_or(true, |s| s.contains(&p.sku_id))
        });

        proposals
    }

    /// 接收方的候选捐出方, 最多 nearest_donor_limit 个
    ///
    /// - 有距离表且存在到该接收方的边: 按距离升序 (并列保持表序)
    /// - 否则: 按捐出方表序, 距离未知
    fn nearest_donors_for_receiver(
        &self,
        donor_stores: &[String],
        receiver_store: &str,
        distances: Option<&[&DistanceRecord]>,
    ) -> Vec<(String, Option<f64>)> {
        let k = self.nearest_donor_limit;

        if let Some(table) = distances {
            let donor_set: HashSet<&str> = donor_stores.iter().map(|s| s.as_str()).collect();
            let mut edges: Vec<&&DistanceRecord> = table
                .iter()
                .filter(|d| {
                    d.to_store == receiver_store && donor_set.contains(d.from_store.as_str())
                })
                .collect();

            if !edges.is_empty() {
                edges.sort_by(|a, b| {
                    a.distance_km
                        .partial_cmp(&b.distance_km)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                return edges
                    .into_iter()
                    .take(k)
                    .map(|d| (d.from_store.clone(), Some(d.distance_km)))
                    .collect();
            }
        }

        donor_stores
            .iter()
            .take(k)
            .map(|store| (store.clone(), None))
            .collect()
    }

    /// 单 SKU 建议行截断: 距离升序、数量降序保留前 max_per_sku 行,
    /// 保留行维持生成顺序
    fn truncate_per_sku(&self, sku_rows: Vec<TransferProposal>) -> Vec<TransferProposal> {
        let mut order: Vec<usize> = (0..sku_rows.len()).collect();
        order.sort_by(|&a, &b| {
            let dist_a = sku_rows[a].distance_km.unwrap_or(MISSING_DISTANCE_SORT_KM);
            let dist_b = sku_rows[b].distance_km.unwrap_or(MISSING_DISTANCE_SORT_KM);
            dist_a
                .partial_cmp(&dist_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(sku_rows[b].qty.cmp(&sku_rows[a].qty))
        });

        let keep: HashSet<usize> = order.into_iter().take(self.max_per_sku).collect();
        sku_rows
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| keep.contains(idx))
            .map(|(_, row)| row)
            .collect()
    }
}

impl Default for TransferMatcher {
    fn default() -> Self {
        Self::from_params(&crate::config::EngineParams::default())
    }
}

/// 保留两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
