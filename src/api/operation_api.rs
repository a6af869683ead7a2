// ==========================================
// 零售库存决策支持系统 - 操作 API
// ==========================================
// 职责: 审批流门面 (范围校验 -> 台账应用 -> 事件发布 -> 报告)
// 调用方: 被排除在外的 UI/审批层
// 说明: 事件发布尽力而为, 失败只告警, 不回滚已应用的审批
// ==========================================

use crate::api::error::ApiResult;
use crate::api::guard::{enforce_orders_scope, enforce_transfers_scope};
use crate::domain::inventory::InventoryLevel;
use crate::domain::movement::{OrderRow, TransferRow};
use crate::domain::scope::OrgScope;
use crate::engine::events::{InventoryEvent, InventoryEventPublisher, InventoryEventType, OptionalEventPublisher};
use crate::repository::ledger_repo::InventoryLedgerRepository;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 审批报告
// ==========================================

/// 订单审批结果
///
/// blocked 为范围外被拦截的行 (有账可查, 不静默丢弃);
/// applied 为实际改变台账状态的行集, 供下游通知系统构造消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderApprovalReport {
    pub batch_id: Uuid,
    pub new_count: usize,
    pub duplicate_count: usize,
    pub blocked: Vec<OrderRow>,
    pub applied: Vec<OrderRow>,
}

/// 调拨审批结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferApprovalReport {
    pub batch_id: Uuid,
    pub applied_count: usize,
    pub duplicate_count: usize,
    pub insufficient_count: usize,
    pub blocked: Vec<TransferRow>,
    pub applied: Vec<TransferRow>,
}

// ==========================================
// OperationApi - 操作 API
// ==========================================
pub struct OperationApi {
    ledger_repo: Arc<InventoryLedgerRepository>,
    event_publisher: OptionalEventPublisher,
}

impl OperationApi {
    /// 构造函数
    ///
    /// # 参数
    /// - `ledger_repo`: 库存台账仓储
    /// - `event_publisher`: 事件发布者 (None 表示不发布, 如单元测试)
    pub fn new(
        ledger_repo: Arc<InventoryLedgerRepository>,
        event_publisher: Option<Arc<dyn InventoryEventPublisher>>,
    ) -> Self {
        Self {
            ledger_repo,
            event_publisher: match event_publisher {
                Some(publisher) => OptionalEventPublisher::with_publisher(publisher),
                None => OptionalEventPublisher::none(),
            },
        }
    }

    /// 审批补货订单
    ///
    /// 流程:
    /// 1. 授权范围校验, 范围外的行进入 blocked
    /// 2. 台账幂等应用 (重复提交计入 duplicate, 不二次累加)
    /// 3. 发布 orders_approved 事件 (尽力而为)
    ///
    /// # 参数
    /// - `scope`: 组织授权范围
    /// - `rows`: 待审批行
    /// - `approved_by`: 审批人
    /// - `idem_prefix`: 幂等前缀 (惯例 "{org}:{actor}:{unix_ts}")
    pub fn approve_orders(
        &self,
        scope: &OrgScope,
        rows: Vec<OrderRow>,
        approved_by: &str,
        idem_prefix: &str,
    ) -> ApiResult<OrderApprovalReport> {
        let batch_id = Uuid::new_v4();
        let (valid, blocked) = enforce_orders_scope(rows, scope);

        if !blocked.is_empty() {
            tracing::warn!(
                "订单审批: {} 行被组织范围规则拦截, org_id={}",
                blocked.len(),
                scope.org_id
            );
        }

        if valid.is_empty() {
            return Ok(OrderApprovalReport {
                batch_id,
                new_count: 0,
                duplicate_count: 0,
                blocked,
                applied: Vec::new(),
            });
        }

        let outcome =
            self.ledger_repo
                .apply_orders(&scope.org_id, &valid, approved_by, idem_prefix)?;

        self.publish_event(InventoryEvent::new(
            scope.org_id.clone(),
            InventoryEventType::OrdersApproved,
            json!({
                "batch_id": batch_id.to_string(),
                "approved_by": approved_by,
                "count_new": outcome.new_count,
                "count_dup": outcome.duplicate_count,
                "rows": &outcome.applied,
            }),
        ));

        Ok(OrderApprovalReport {
            batch_id,
            new_count: outcome.new_count,
            duplicate_count: outcome.duplicate_count,
            blocked,
            applied: outcome.applied,
        })
    }

    /// 审批调拨
    ///
    /// 流程同订单审批; 库存不足的行计入 insufficient,
    /// 事实记录保留但无实际移库
    pub fn approve_transfers(
        &self,
        scope: &OrgScope,
        rows: Vec<TransferRow>,
        approved_by: &str,
        idem_prefix: &str,
    ) -> ApiResult<TransferApprovalReport> {
        let batch_id = Uuid::new_v4();
        let (valid, blocked) = enforce_transfers_scope(rows, scope);

        if !blocked.is_empty() {
            tracing::warn!(
                "调拨审批: {} 行被组织范围规则拦截, org_id={}",
                blocked.len(),
                scope.org_id
            );
        }

        if valid.is_empty() {
            return Ok(TransferApprovalReport {
                batch_id,
                applied_count: 0,
                duplicate_count: 0,
                insufficient_count: 0,
                blocked,
                applied: Vec::new(),
            });
        }

        let outcome =
            self.ledger_repo
                .apply_transfers(&scope.org_id, &valid, approved_by, idem_prefix)?;

        self.publish_event(InventoryEvent::new(
            scope.org_id.clone(),
            InventoryEventType::TransfersApproved,
            json!({
                "batch_id": batch_id.to_string(),
                "approved_by": approved_by,
                "count_applied": outcome.applied_count,
                "count_dup": outcome.duplicate_count,
                "count_insufficient": outcome.insufficient_count,
                "rows": &outcome.applied,
            }),
        ));

        Ok(TransferApprovalReport {
            batch_id,
            applied_count: outcome.applied_count,
            duplicate_count: outcome.duplicate_count,
            insufficient_count: outcome.insufficient_count,
            blocked,
            applied: outcome.applied,
        })
    }

    /// 查询授权范围内的台账在库量
    pub fn fetch_inventory_levels(&self, scope: &OrgScope) -> ApiResult<Vec<InventoryLevel>> {
        let mut store_ids: Vec<String> = scope.allowed_stores.iter().cloned().collect();
        store_ids.sort();
        let mut sku_ids: Vec<String> = scope.allowed_skus.iter().cloned().collect();
        sku_ids.sort();

        Ok(self
            .ledger_repo
            .fetch_levels(&scope.org_id, &store_ids, &sku_ids)?)
    }

    /// 尽力而为的事件发布
    fn publish_event(&self, event: InventoryEvent) {
        let org_id = event.org_id.clone();
        let event_type = event.event_type;
        if let Err(e) = self.event_publisher.publish(event) {
            tracing::warn!(
                "事件发布失败 (审批结果不受影响): org_id={}, event_type={}, err={}",
                org_id,
                event_type.as_str(),
                e
            );
        }
    }
}
