// ==========================================
// 零售库存决策支持系统 - 事件日志仓储
// ==========================================
// 红线: Repository 不含决策逻辑
// ==========================================
// 职责: events 表的追加与游标轮询
// 说明: 实现 Engine 层的 InventoryEventPublisher (依赖倒置),
//       通知投递由下游系统基于本表完成
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::events::{InventoryEvent, InventoryEventPublisher};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 单次轮询的默认上限
pub const DEFAULT_POLL_LIMIT: usize = 200;

// ==========================================
// 事件记录
// ==========================================

/// 已落库的审批事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub org_id: String,
    pub ts: NaiveDateTime,
    pub event_type: String,
    pub payload: serde_json::Value,
}

// ==========================================
// EventLogRepository - 事件日志仓储
// ==========================================
pub struct EventLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EventLogRepository {
    /// 创建新的 EventLogRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加事件
    ///
    /// # 返回
    /// - Ok(EventRecord): 含分配的事件 ID
    pub fn insert_event(
        &self,
        org_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> RepositoryResult<EventRecord> {
        let conn = self.get_conn()?;
        let ts = Utc::now().naive_utc();
        let ts_text = ts.format("%Y-%m-%d %H:%M:%S").to_string();
        let payload_text = serde_json::to_string(payload)
            .map_err(|e| RepositoryError::ValidationError(format!("payload 序列化失败: {}", e)))?;

        conn.execute(
            "INSERT INTO events (org_id, ts, type, payload) VALUES (?1, ?2, ?3, ?4)",
            params![org_id, ts_text, event_type, payload_text],
        )?;
        let id = conn.last_insert_rowid();

        Ok(EventRecord {
            id,
            org_id: org_id.to_string(),
            ts,
            event_type: event_type.to_string(),
            payload: payload.clone(),
        })
    }

    /// 游标轮询: 返回 id > after 的事件与新游标
    ///
    /// # 参数
    /// - after: 上次消费到的事件 ID
    /// - limit: 单次上限 (0 按默认值处理)
    pub fn poll_events(
        &self,
        org_id: &str,
        after: i64,
        limit: usize,
    ) -> RepositoryResult<(Vec<EventRecord>, i64)> {
        let limit = if limit == 0 { DEFAULT_POLL_LIMIT } else { limit };
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, org_id, ts, type, payload
            FROM events
            WHERE org_id = ?1 AND id > ?2
            ORDER BY id ASC
            LIMIT ?3
            "#,
        )?;

        let events = stmt
            .query_map(params![org_id, after, limit as i64], |row| {
                let payload_text: String = row.get(4)?;
                Ok(EventRecord {
                    id: row.get(0)?,
                    org_id: row.get(1)?,
                    ts: NaiveDateTime::parse_from_str(
                        &row.get::<_, String>(2)?,
                        "%Y-%m-%d %H:%M:%S",
                    )
                    .unwrap_or_else(|_| NaiveDateTime::default()),
                    event_type: row.get(3)?,
                    payload: serde_json::from_str(&payload_text)
                        .unwrap_or(serde_json::Value::Null),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let cursor = events.last().map(|e| e.id).unwrap_or(after);
        Ok((events, cursor))
    }
}

// ==========================================
// InventoryEventPublisher 适配
// ==========================================
impl InventoryEventPublisher for EventLogRepository {
    fn publish(
        &self,
        event: InventoryEvent,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let record = self
            .insert_event(&event.org_id, event.event_type.as_str(), &event.payload)
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { e.to_string().into() })?;
        Ok(record.id.to_string())
    }
}
