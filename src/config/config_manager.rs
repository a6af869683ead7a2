// ==========================================
// 零售库存决策支持系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 查找顺序: org scope -> global scope -> 默认值
// ==========================================

use crate::config::params::EngineParams;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 全局 scope 标识
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取某 scope 的配置值
    fn get_scoped_value(&self, scope_id: &str, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope_id, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取配置值: org scope 优先, 回退 global scope
    ///
    /// # 参数
    /// - org_id: 组织 scope（None 表示只查 global）
    /// - key: 配置键
    pub fn get_config_value(
        &self,
        org_id: Option<&str>,
        key: &str,
    ) -> Result<Option<String>, Box<dyn Error>> {
        if let Some(org) = org_id {
            if let Some(v) = self.get_scoped_value(org, key)? {
                return Ok(Some(v));
            }
        }
        self.get_scoped_value(GLOBAL_SCOPE, key)
    }

    /// 写入配置值（INSERT OR REPLACE）
    ///
    /// # 参数
    /// - scope_id: "global" 或 org_id
    pub fn set_config_value(
        &self,
        scope_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT (scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![scope_id, key, value],
        )?;
        Ok(())
    }

    /// 加载引擎参数（缺失键使用默认值, 解析失败回退默认值并告警）
    ///
    /// # 参数
    /// - org_id: 组织 scope（None 表示只取 global/默认）
    pub fn get_engine_params(&self, org_id: Option<&str>) -> Result<EngineParams, Box<dyn Error>> {
        let defaults = EngineParams::default();

        Ok(EngineParams {
            service_level: self.get_f64(org_id, "service_level", defaults.service_level)?,
            order_up_factor: self.get_f64(org_id, "order_up_factor", defaults.order_up_factor)?,
            overstock_days_threshold: self.get_f64(
                org_id,
                "overstock_days_threshold",
                defaults.overstock_days_threshold,
            )?,
            demand_window_days: self.get_i64(org_id, "demand_window_days", defaults.demand_window_days)?,
            nearest_donor_limit: self.get_usize(
                org_id,
                "nearest_donor_limit",
                defaults.nearest_donor_limit,
            )?,
            min_transfer_batch: self.get_i64(org_id, "min_transfer_batch", defaults.min_transfer_batch)?,
            max_transfers_per_sku: self.get_usize(
                org_id,
                "max_transfers_per_sku",
                defaults.max_transfers_per_sku,
            )?,
            transfer_cost_per_unit_km: self.get_f64(
                org_id,
                "transfer_cost_per_unit_km",
                defaults.transfer_cost_per_unit_km,
            )?,
        })
    }

    // ==========================================
    // 类型化读取辅助
    // ==========================================

    fn get_f64(&self, org_id: Option<&str>, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(org_id, key)? {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!("配置值解析失败, 使用默认值: key={}, raw={}", key, raw);
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn get_i64(&self, org_id: Option<&str>, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(org_id, key)? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!("配置值解析失败, 使用默认值: key={}, raw={}", key, raw);
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn get_usize(
        &self,
        org_id: Option<&str>,
        key: &str,
        default: usize,
    ) -> Result<usize, Box<dyn Error>> {
        match self.get_config_value(org_id, key)? {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!("配置值解析失败, 使用默认值: key={}, raw={}", key, raw);
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn create_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_engine_params_defaults() {
        let manager = create_manager();
        let params = manager.get_engine_params(None).unwrap();

        assert_eq!(params, EngineParams::default());
    }

    #[test]
    fn test_org_scope_overrides_global() {
        let manager = create_manager();
        manager.set_config_value(GLOBAL_SCOPE, "service_level", "0.90").unwrap();
        manager.set_config_value("org1", "service_level", "0.99").unwrap();

        let global_params = manager.get_engine_params(None).unwrap();
        assert_eq!(global_params.service_level, 0.90);

        let org_params = manager.get_engine_params(Some("org1")).unwrap();
        assert_eq!(org_params.service_level, 0.99);

        // 未覆写的 org 回退 global
        let other_params = manager.get_engine_params(Some("org2")).unwrap();
        assert_eq!(other_params.service_level, 0.90);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let manager = create_manager();
        manager
            .set_config_value(GLOBAL_SCOPE, "max_transfers_per_sku", "not_a_number")
            .unwrap();

        let params = manager.get_engine_params(None).unwrap();
        assert_eq!(params.max_transfers_per_sku, EngineParams::default().max_transfers_per_sku);
    }
}
