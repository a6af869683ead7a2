// ==========================================
// 零售库存决策支持系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少多操作员并发写入时的偶发 busy 错误
// - 集中建表语句，保证库存台账/审批事实表/事件表结构一致
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等，CREATE TABLE IF NOT EXISTS）
///
/// 表说明：
/// - inventory_levels: 库存台账（唯一可变实体，主键 org+store+sku）
/// - orders_confirmed / transfers_confirmed: 审批事实表，只增不删，
///   幂等键唯一约束即重复提交去重的依据
/// - events: 审批事件日志（下游通知系统的数据源）
/// - config_kv: 参数配置（scope_id='global' 或 org_id）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS inventory_levels (
            org_id   TEXT NOT NULL,
            store_id TEXT NOT NULL,
            sku_id   TEXT NOT NULL,
            on_hand  INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (org_id, store_id, sku_id)
        );

        CREATE TABLE IF NOT EXISTS orders_confirmed (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id      TEXT NOT NULL,
            store_id    TEXT NOT NULL,
            sku_id      TEXT NOT NULL,
            qty         INTEGER NOT NULL,
            approved_by TEXT,
            approved_at TEXT NOT NULL,
            idem_key    TEXT NOT NULL,
            UNIQUE (org_id, store_id, sku_id, idem_key)
        );
        CREATE INDEX IF NOT EXISTS idx_orders_confirmed_org ON orders_confirmed (org_id);

        CREATE TABLE IF NOT EXISTS transfers_confirmed (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id      TEXT NOT NULL,
            from_store  TEXT NOT NULL,
            to_store    TEXT NOT NULL,
            sku_id      TEXT NOT NULL,
            qty         INTEGER NOT NULL,
            approved_by TEXT,
            approved_at TEXT NOT NULL,
            idem_key    TEXT NOT NULL,
            UNIQUE (org_id, from_store, to_store, sku_id, idem_key)
        );
        CREATE INDEX IF NOT EXISTS idx_transfers_confirmed_org ON transfers_confirmed (org_id);

        CREATE TABLE IF NOT EXISTS events (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            org_id  TEXT NOT NULL,
            ts      TEXT NOT NULL,
            type    TEXT NOT NULL,
            payload TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX IF NOT EXISTS idx_events_org ON events (org_id, id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id   TEXT NOT NULL,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
