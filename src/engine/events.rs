// ==========================================
// 零售库存决策支持系统 - 引擎层事件发布
// ==========================================
// 职责: 定义审批事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Repository 层实现适配器
// 优势: Engine 不依赖存储实现, 通知投递归下游系统负责
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 审批事件类型
// ==========================================

/// 审批事件触发类型
///
/// 字符串标识与既有事件日志兼容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEventType {
    /// 补货订单获批
    OrdersApproved,
    /// 调拨获批
    TransfersApproved,
}

impl InventoryEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            InventoryEventType::OrdersApproved => "orders_approved",
            InventoryEventType::TransfersApproved => "transfers_approved",
        }
    }
}

/// 审批事件
///
/// payload 为事件明细 (审批人、计数、变更行集), 由调用方构造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEvent {
    /// 组织 ID
    pub org_id: String,
    /// 事件类型
    pub event_type: InventoryEventType,
    /// 事件明细
    pub payload: serde_json::Value,
}

impl InventoryEvent {
    /// 构造事件
    pub fn new(
        org_id: impl Into<String>,
        event_type: InventoryEventType,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            event_type,
            payload,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 审批事件发布者 Trait
///
/// Engine 层定义，Repository 层 (事件日志仓储) 实现
/// 核心只负责记录事件事实, 通知投递是下游系统的职责
pub trait InventoryEventPublisher: Send + Sync {
    /// 发布审批事件
    ///
    /// # 参数
    /// - `event`: 审批事件
    ///
    /// # 返回
    /// - `Ok(event_id)`: 事件 ID（如果支持）或空字符串
    /// - `Err`: 发布失败
    fn publish(&self, event: InventoryEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl InventoryEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: InventoryEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - org_id={}, event_type={}",
            event.org_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn InventoryEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn InventoryEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn InventoryEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: InventoryEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - org_id={}, event_type={}",
                    event.org_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_as_str() {
        assert_eq!(InventoryEventType::OrdersApproved.as_str(), "orders_approved");
        assert_eq!(
            InventoryEventType::TransfersApproved.as_str(),
            "transfers_approved"
        );
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let event = InventoryEvent::new(
            "org1",
            InventoryEventType::OrdersApproved,
            json!({"count_new": 1}),
        );

        let result = publisher.publish(event);
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());

        let event = InventoryEvent::new(
            "org1",
            InventoryEventType::TransfersApproved,
            json!({}),
        );

        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_optional_publisher_with_noop() {
        let noop = Arc::new(NoOpEventPublisher) as Arc<dyn InventoryEventPublisher>;
        let publisher = OptionalEventPublisher::with_publisher(noop);
        assert!(publisher.is_configured());

        let event = InventoryEvent::new(
            "org1",
            InventoryEventType::OrdersApproved,
            json!({}),
        );

        assert!(publisher.publish(event).is_ok());
    }
}
