// ==========================================
// 零售库存决策支持系统 - 组织授权范围
// ==========================================
// 职责: 承载鉴权子系统下发的 (org_id, allowed_stores, allowed_skus)
// 说明: 核心将其视为前置条件, 范围外的行被划入 blocked 集合而非报错
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 一次请求的组织授权范围
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgScope {
    pub org_id: String,
    pub allowed_stores: HashSet<String>,
    pub allowed_skus: HashSet<String>,
}

impl OrgScope {
    /// 构造授权范围
    pub fn new(
        org_id: impl Into<String>,
        allowed_stores: HashSet<String>,
        allowed_skus: HashSet<String>,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            allowed_stores,
            allowed_skus,
        }
    }

    /// 门店是否在授权范围内
    pub fn contains_store(&self, store_id: &str) -> bool {
        self.allowed_stores.contains(store_id)
    }

    /// SKU 是否在授权范围内
    pub fn contains_sku(&self, sku_id: &str) -> bool {
        self.allowed_skus.contains(sku_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_membership() {
        let scope = OrgScope::new(
            "org1",
            ["S01".to_string(), "S02".to_string()].into_iter().collect(),
            ["K01".to_string()].into_iter().collect(),
        );

        assert!(scope.contains_store("S01"));
        assert!(!scope.contains_store("S99"));
        assert!(scope.contains_sku("K01"));
        assert!(!scope.contains_sku("K99"));
    }
}
