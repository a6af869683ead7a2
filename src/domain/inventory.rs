// ==========================================
// 零售库存决策支持系统 - 库存实体
// ==========================================
// 职责: 库存快照(只读输入)与库存台账行(系统记录)
// 红线: on_hand >= 0 恒成立, 由台账条件扣减保证, 不允许事后截断
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 库存快照行 (外部数据表, 只读)
// ==========================================
/// 数据加载方提供的库存快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshotRow {
    pub date: NaiveDate,
    pub store_id: String,
    pub sku_id: String,
    pub on_hand_units: i64,
}

// ==========================================
// 库存台账行 (持久, 可变)
// ==========================================
/// 台账中某 (org, store, sku) 的在库量
///
/// 生命周期: 由快照播种一次, 此后只通过订单/调拨应用变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub org_id: String,
    pub store_id: String,
    pub sku_id: String,
    pub on_hand: i64,
}

// ==========================================
// 门店间距离 (外部数据表, 只读, 可选)
// ==========================================
/// 门店对之间的运输距离
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub from_store: String,
    pub to_store: String,
    pub distance_km: f64,
}
