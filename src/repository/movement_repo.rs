// ==========================================
// 零售库存决策支持系统 - 确认事实仓储
// ==========================================
// 红线: Repository 不含决策逻辑
// ==========================================
// 职责: orders_confirmed / transfers_confirmed 的只读访问
// 用途: 未来态推演与审计查询的数据源
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::movement::{OrderRecord, TransferRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ConfirmedMovementRepository - 确认事实仓储
// ==========================================
pub struct ConfirmedMovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConfirmedMovementRepository {
    /// 创建新的 ConfirmedMovementRepository 实例
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

    /// 解析时间戳（格式异常回退纪元零点, 不阻断查询）
    fn parse_ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| NaiveDateTime::default())
    }

    /// 查询组织的全部已确认订单（按落库顺序）
    pub fn list_orders(&self, org_id: &str) -> RepositoryResult<Vec<OrderRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, org_id, store_id, sku_id, qty, approved_by, approved_at, idem_key
            FROM orders_confirmed
            WHERE org_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![org_id], |row| {
                Ok(OrderRecord {
                    id: row.get(0)?,
                    org_id: row.get(1)?,
                    store_id: row.get(2)?,
                    sku_id: row.get(3)?,
                    qty: row.get(4)?,
                    approved_by: row.get(5)?,
                    approved_at: Self::parse_ts(&row.get::<_, String>(6)?),
                    idem_key: row.get(7)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 查询组织的全部已确认调拨（按落库顺序）
    pub fn list_transfers(&self, org_id: &str) -> RepositoryResult<Vec<TransferRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, org_id, from_store, to_store, sku_id, qty, approved_by, approved_at, idem_key
            FROM transfers_confirmed
            WHERE org_id = ?1
            ORDER BY id ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![org_id], |row| {
                Ok(TransferRecord {
                    id: row.get(0)?,
                    org_id: row.get(1)?,
                    from_store: row.get(2)?,
                    to_store: row.get(3)?,
                    sku_id: row.get(4)?,
                    qty: row.get(5)?,
                    approved_by: row.get(6)?,
                    approved_at: Self::parse_ts(&row.get::<_, String>(7)?),
                    idem_key: row.get(8)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }
}
