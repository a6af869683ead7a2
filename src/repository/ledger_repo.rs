// ==========================================
// 零售库存决策支持系统 - 库存台账仓储
// ==========================================
// 红线: Repository 不含决策逻辑
// ==========================================
// 职责: inventory_levels 台账的播种/查询/幂等变更
// 并发口径: 多操作员跨会话写同一批台账行。每个逻辑单元
//   (一行的事实插入 + 台账更新) 在单个事务内完成, 负库存
//   由条件扣减 (WHERE on_hand >= qty) 这一原子比较更新阻止,
//   不做应用层加锁, 不做读-改-写
// ==========================================

use crate::domain::inventory::{InventoryLevel, InventorySnapshotRow};
use crate::domain::movement::{
    order_idem_key, transfer_idem_key, ApplyOrdersOutcome, ApplyTransfersOutcome, OrderRow,
    TransferRow,
};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// InventoryLedgerRepository - 库存台账仓储
// ==========================================
/// 库存台账仓储
/// 职责: 管理 inventory_levels / orders_confirmed / transfers_confirmed
/// 红线: 业务规则结果用计数返回, 只有基础设施失败才报错
pub struct InventoryLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryLedgerRepository {
    /// 创建新的 InventoryLedgerRepository 实例
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

    /// 当前时间戳（统一格式, 与既有审计日志一致）
    fn now_text() -> String {
        Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    // ==========================================
    // 播种与查询
    // ==========================================

    /// 从快照播种台账（只补缺失行, 已有行以台账为准）
    ///
    /// # 返回
    /// - Ok(usize): 新建的台账行数
    pub fn seed_snapshot(
        &self,
        org_id: &str,
        rows: &[InventorySnapshotRow],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut created = 0;
        for row in rows {
            let inserted = tx.execute(
                r#"
                INSERT OR IGNORE INTO inventory_levels (org_id, store_id, sku_id, on_hand)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![org_id, row.store_id, row.sku_id, row.on_hand_units.max(0)],
            )?;
            created += inserted;
        }

        tx.commit()?;
        tracing::debug!("台账播种完成: org_id={}, created={}", org_id, created);
        Ok(created)
    }

    /// 查询台账在库量
    ///
    /// # 参数
    /// - store_ids / sku_ids: 过滤列表, 空列表表示不过滤该维度
    pub fn fetch_levels(
        &self,
        org_id: &str,
        store_ids: &[String],
        sku_ids: &[String],
    ) -> RepositoryResult<Vec<InventoryLevel>> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            "SELECT org_id, store_id, sku_id, on_hand FROM inventory_levels WHERE org_id = ?1",
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(org_id.to_string())];

        if !store_ids.is_empty() {
            let placeholders: Vec<String> = store_ids
                .iter()
                .enumerate()
                .map(|(i, _)| format!("?{}", values.len() + i + 1))
                .collect();
            sql.push_str(&format!(" AND store_id IN ({})", placeholders.join(", ")));
            for store in store_ids {
                values.push(Box::new(store.clone()));
            }
        }
        if !sku_ids.is_empty() {
            let placeholders: Vec<String> = sku_ids
                .iter()
                .enumerate()
                .map(|(i, _)| format!("?{}", values.len() + i + 1))
                .collect();
            sql.push_str(&format!(" AND sku_id IN ({})", placeholders.join(", ")));
            for sku in sku_ids {
                values.push(Box::new(sku.clone()));
            }
        }
        sql.push_str(" ORDER BY store_id ASC, sku_id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|v| v.as_ref()).collect();

        let levels = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok(InventoryLevel {
                    org_id: row.get(0)?,
                    store_id: row.get(1)?,
                    sku_id: row.get(2)?,
                    on_hand: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(levels)
    }

    /// 查询某 (store, sku) 的在库量（不存在视为 0）
    pub fn on_hand(&self, org_id: &str, store_id: &str, sku_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT on_hand FROM inventory_levels WHERE org_id = ?1 AND store_id = ?2 AND sku_id = ?3",
            params![org_id, store_id, sku_id],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 幂等变更 (操作级协议)
    // ==========================================

    /// 应用已审批的补货订单
    ///
    /// 协议 (逐行, 每行一个事务):
    /// 1. 幂等键 "{prefix}:order:{store}:{sku}"
    /// 2. INSERT OR IGNORE 订单事实; 0 行受影响 -> 重复提交, 跳过变更
    /// 3. 插入成功 -> 台账 upsert 累加 (行不存在则以 0 起建)
    ///
    /// qty <= 0 的行静默跳过 (输入形状问题不阻断整批)
    ///
    /// # 返回
    /// ApplyOrdersOutcome: 计数 + 实际改变台账状态的行集
    pub fn apply_orders(
        &self,
        org_id: &str,
        rows: &[OrderRow],
        approved_by: &str,
        idem_prefix: &str,
    ) -> RepositoryResult<ApplyOrdersOutcome> {
        let conn = self.get_conn()?;
        let mut outcome = ApplyOrdersOutcome::default();
        let approved_at = Self::now_text();

        for row in rows {
            if row.qty <= 0 {
                continue;
            }

            let idem_key = order_idem_key(idem_prefix, &row.store_id, &row.sku_id);
            let tx = conn.unchecked_transaction()?;

            let inserted = tx.execute(
                r#"
                INSERT OR IGNORE INTO orders_confirmed
                    (org_id, store_id, sku_id, qty, approved_by, approved_at, idem_key)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    org_id,
                    row.store_id,
                    row.sku_id,
                    row.qty,
                    approved_by,
                    approved_at,
                    idem_key,
                ],
            )?;

            if inserted == 0 {
                // 幂等重放: 事实已存在, 不得二次累加
                outcome.duplicate_count += 1;
                tx.commit()?;
                continue;
            }

            tx.execute(
                r#"
                INSERT INTO inventory_levels (org_id, store_id, sku_id, on_hand)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (org_id, store_id, sku_id) DO UPDATE SET
                    on_hand = on_hand + excluded.on_hand
                "#,
                params![org_id, row.store_id, row.sku_id, row.qty],
            )?;

            tx.commit()?;
            outcome.new_count += 1;
            outcome.applied.push(row.clone());
        }

        tracing::info!(
            "订单应用完成: org_id={}, new={}, duplicate={}",
            org_id,
            outcome.new_count,
            outcome.duplicate_count
        );
        Ok(outcome)
    }

    /// 应用已审批的调拨
    ///
    /// 协议 (逐行, 每行一个事务):
    /// 1. from == to 或 qty <= 0 的行静默跳过
    /// 2. 幂等键 "{prefix}:transfer:{from}:{to}:{sku}";
    ///    INSERT OR IGNORE 事实, 0 行受影响 -> 重复, 跳过
    /// 3. 确保调出/调入台账行存在 (以 0 起建)
    /// 4. 条件扣减: UPDATE ... SET on_hand = on_hand - qty
    ///    WHERE ... AND on_hand >= qty
    ///    0 行受影响 -> 库存不足, 不执行调入累加;
    ///    事实记录保留 (审批事实持久, 实际移库有条件)
    /// 5. 扣减成功 -> 调入端 upsert 累加
    ///
    /// # 返回
    /// ApplyTransfersOutcome: 计数 + 实际移库的行集
    pub fn apply_transfers(
        &self,
        org_id: &str,
        rows: &[TransferRow],
        approved_by: &str,
        idem_prefix: &str,
    ) -> RepositoryResult<ApplyTransfersOutcome> {
        let conn = self.get_conn()?;
        let mut outcome = ApplyTransfersOutcome::default();
        let approved_at = Self::now_text();

        for row in rows {
            if row.from_store == row.to_store || row.qty <= 0 {
                continue;
            }

            let idem_key =
                transfer_idem_key(idem_prefix, &row.from_store, &row.to_store, &row.sku_id);
            let tx = conn.unchecked_transaction()?;

            let inserted = tx.execute(
                r#"
                INSERT OR IGNORE INTO transfers_confirmed
                    (org_id, from_store, to_store, sku_id, qty, approved_by, approved_at, idem_key)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    org_id,
                    row.from_store,
                    row.to_store,
                    row.sku_id,
                    row.qty,
                    approved_by,
                    approved_at,
                    idem_key,
                ],
            )?;

            if inserted == 0 {
                outcome.duplicate_count += 1;
                tx.commit()?;
                continue;
            }

            // 两端台账行按需起建
            tx.execute(
                "INSERT OR IGNORE INTO inventory_levels (org_id, store_id, sku_id, on_hand) VALUES (?1, ?2, ?3, 0)",
                params![org_id, row.from_store, row.sku_id],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO inventory_levels (org_id, store_id, sku_id, on_hand) VALUES (?1, ?2, ?3, 0)",
                params![org_id, row.to_store, row.sku_id],
            )?;

            // 条件扣减: 原子比较更新, 阻止并发调拨把同一来源扣成负数
            let decremented = tx.execute(
                r#"
                UPDATE inventory_levels
                SET on_hand = on_hand - ?4
                WHERE org_id = ?1 AND store_id = ?2 AND sku_id = ?3 AND on_hand >= ?4
                "#,
                params![org_id, row.from_store, row.sku_id, row.qty],
            )?;

            if decremented == 0 {
                // 库存不足: 审批事实已落库, 但本次无实际移库
                outcome.insufficient_count += 1;
                tx.commit()?;
                continue;
            }

            tx.execute(
                r#"
                INSERT INTO inventory_levels (org_id, store_id, sku_id, on_hand)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (org_id, store_id, sku_id) DO UPDATE SET
                    on_hand = on_hand + excluded.on_hand
                "#,
                params![org_id, row.to_store, row.sku_id, row.qty],
            )?;

            tx.commit()?;
            outcome.applied_count += 1;
            outcome.applied.push(row.clone());
        }

        tracing::info!(
            "调拨应用完成: org_id={}, applied={}, duplicate={}, insufficient={}",
            org_id,
            outcome.applied_count,
            outcome.duplicate_count,
            outcome.insufficient_count
        );
        Ok(outcome)
    }
}
