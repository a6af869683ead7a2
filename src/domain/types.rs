// ==========================================
// 零售库存决策支持系统 - 领域类型定义
// ==========================================
// 风险分类是等级制标签,不是评分制
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 风险分类 (Risk Category)
// ==========================================
// 判定优先级: LOW_DEMAND > STOCKOUT_RISK > OVERSTOCK > NORMAL
// 同一行恰好命中一个分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    LowDemand,    // 无近期销量
    StockoutRisk, // 覆盖天数低于补货提前期
    Overstock,    // 覆盖天数超过超储阈值
    Normal,       // 正常
}

impl RiskCategory {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            RiskCategory::LowDemand => "LOW_DEMAND",
            RiskCategory::StockoutRisk => "STOCKOUT_RISK",
            RiskCategory::Overstock => "OVERSTOCK",
            RiskCategory::Normal => "NORMAL",
        }
    }

    /// 所有分类（固定顺序，用于汇总报表）
    pub fn all() -> [RiskCategory; 4] {
        [
            RiskCategory::StockoutRisk,
            RiskCategory::Overstock,
            RiskCategory::LowDemand,
            RiskCategory::Normal,
        ]
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 变动类型 (Movement Kind)
// ==========================================
// 幂等键与事件 payload 中的 kind 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Order,    // 补货订单
    Transfer, // 门店间调拨
}

impl MovementKind {
    /// 转换为字符串标识（幂等键段使用小写）
    pub fn as_str(&self) -> &str {
        match self {
            MovementKind::Order => "order",
            MovementKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
