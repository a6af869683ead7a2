// ==========================================
// 零售库存决策支持系统 - 授权范围校验
// ==========================================
// 职责: 审批前的组织范围强制校验
// 红线: 范围外的行进入 blocked 集合并返回, 绝不静默丢弃
// ==========================================

use crate::domain::inventory::DistanceRecord;
use crate::domain::movement::{OrderRow, TransferRow};
use crate::domain::scope::OrgScope;

/// 订单范围校验: store 与 sku 都须在授权范围内
///
/// # 返回
/// (valid, blocked)
pub fn enforce_orders_scope(
    rows: Vec<OrderRow>,
    scope: &OrgScope,
) -> (Vec<OrderRow>, Vec<OrderRow>) {
    rows.into_iter()
        .partition(|row| scope.contains_store(&row.store_id) && scope.contains_sku(&row.sku_id))
}

/// 调拨范围校验: 调出/调入门店与 sku 都须在授权范围内
///
/// # 返回
/// (valid, blocked)
pub fn enforce_transfers_scope(
    rows: Vec<TransferRow>,
    scope: &OrgScope,
) -> (Vec<TransferRow>, Vec<TransferRow>) {
    rows.into_iter().partition(|row| {
        scope.contains_store(&row.from_store)
            && scope.contains_store(&row.to_store)
            && scope.contains_sku(&row.sku_id)
    })
}

/// 距离表收敛: 只保留两端都在授权门店内的边
pub fn filter_distances_to_scope(
    distances: &[DistanceRecord],
    scope: &OrgScope,
) -> Vec<DistanceRecord> {
    distances
        .iter()
        .filter(|d| scope.contains_store(&d.from_store) && scope.contains_store(&d.to_store))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scope() -> OrgScope {
        OrgScope::new(
            "org1",
            ["S1".to_string(), "S2".to_string()].into_iter().collect(),
            ["K1".to_string()].into_iter().collect(),
        )
    }

    #[test]
    fn test_enforce_orders_scope_partitions() {
        let scope = make_scope();
        let rows = vec![
            OrderRow {
                store_id: "S1".to_string(),
                sku_id: "K1".to_string(),
                qty: 5,
            },
            OrderRow {
                store_id: "S9".to_string(), // 门店范围外
                sku_id: "K1".to_string(),
                qty: 5,
            },
            OrderRow {
                store_id: "S1".to_string(),
                sku_id: "K9".to_string(), // SKU 范围外
                qty: 5,
            },
        ];

        let (valid, blocked) = enforce_orders_scope(rows, &scope);

        assert_eq!(valid.len(), 1);
        assert_eq!(blocked.len(), 2);
        assert_eq!(valid[0].store_id, "S1");
    }

    #[test]
    fn test_enforce_transfers_scope_checks_both_ends() {
        let scope = make_scope();
        let rows = vec![
            TransferRow {
                from_store: "S1".to_string(),
                to_store: "S2".to_string(),
                sku_id: "K1".to_string(),
                qty: 5,
            },
            TransferRow {
                from_store: "S1".to_string(),
                to_store: "S9".to_string(), // 调入端范围外
                sku_id: "K1".to_string(),
                qty: 5,
            },
        ];

        let (valid, blocked) = enforce_transfers_scope(rows, &scope);

        assert_eq!(valid.len(), 1);
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].to_store, "S9");
    }

    #[test]
    fn test_filter_distances_to_scope() {
        let scope = make_scope();
        let distances = vec![
            DistanceRecord {
                from_store: "S1".to_string(),
                to_store: "S2".to_string(),
                distance_km: 10.0,
            },
            DistanceRecord {
                from_store: "S1".to_string(),
                to_store: "S9".to_string(),
                distance_km: 20.0,
            },
        ];

        let filtered = filter_distances_to_scope(&distances, &scope);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].to_store, "S2");
    }
}
