// ==========================================
// 零售库存决策支持系统 - 决策运行入口
// ==========================================
// 用途: 不启动 UI 的轻量决策运行:
//   加载输入表 -> 播种台账 -> 构建决策视图 -> 输出建议与推演摘要
//
// 用法:
//   cargo run -- [db_path] [data_dir] [org_id]
// ==========================================

use retail_inventory_dss::api::{DashboardApi, DEFAULT_TOP_RISK_LIMIT};
use retail_inventory_dss::config::ConfigManager;
use retail_inventory_dss::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use retail_inventory_dss::domain::OrgScope;
use retail_inventory_dss::importer;
use retail_inventory_dss::logging;
use retail_inventory_dss::repository::{ConfirmedMovementRepository, InventoryLedgerRepository};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 默认数据库路径（系统数据目录, 失败时退回当前目录）
fn get_default_db_path() -> String {
    match dirs::data_dir() {
        Some(dir) => {
            let app_dir = dir.join("retail-inventory-dss");
            let _ = std::fs::create_dir_all(&app_dir);
            app_dir.join("inventory.db").display().to_string()
        }
        None => "inventory.db".to_string(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 决策支持系统", retail_inventory_dss::APP_NAME);
    tracing::info!("系统版本: {}", retail_inventory_dss::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".to_string()));
    let org_id = args.next().unwrap_or_else(|| "demo-org".to_string());

    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("数据目录: {}", data_dir.display());

    // 数据库初始化
    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    if let Some(version) = read_schema_version(&conn)? {
        if version != CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                "schema_version 不匹配: 库中为 {}, 代码期望 {}",
                version,
                CURRENT_SCHEMA_VERSION
            );
        }
    }
    let conn = Arc::new(Mutex::new(conn));

    // 输入表加载
    let sales = importer::load_sales(&data_dir)?;
    let snapshot = importer::load_inventory_snapshot(&data_dir)?;
    let lead_times = importer::load_lead_times(&data_dir)?;
    let distances = importer::load_distances(&data_dir)?;
    tracing::info!(
        "输入表加载完成: sales={}, snapshot={}, lead_times={}, distances={}",
        sales.len(),
        snapshot.len(),
        lead_times.len(),
        distances.len()
    );

    if snapshot.is_empty() {
        tracing::warn!("库存快照为空, 无法构建决策视图");
        return Ok(());
    }

    // 演示范围: 快照中出现的全部门店与 SKU
    let allowed_stores: HashSet<String> = snapshot.iter().map(|r| r.store_id.clone()).collect();
    let allowed_skus: HashSet<String> = snapshot.iter().map(|r| r.sku_id.clone()).collect();
    let scope = OrgScope::new(org_id.clone(), allowed_stores, allowed_skus);

    // 仓储与配置
    let ledger_repo = Arc::new(InventoryLedgerRepository::from_connection(conn.clone()));
    let movement_repo = Arc::new(ConfirmedMovementRepository::from_connection(conn.clone()));
    let config_manager = ConfigManager::from_connection(conn.clone())?;
    let params = config_manager.get_engine_params(Some(&org_id))?;

    // 台账播种 (只补缺失行)
    let seeded = ledger_repo.seed_snapshot(&org_id, &snapshot)?;
    tracing::info!("台账播种: 新建 {} 行", seeded);

    // 决策视图
    let dashboard = DashboardApi::new(ledger_repo, movement_repo);

    if let Some(kpis) = dashboard.baseline_kpis(&scope, &sales, &params) {
        tracing::info!(
            "基线KPI: last_date={}, total_units={}, avg_daily_units={:.2}, pairs={}",
            kpis.last_date,
            kpis.total_units,
            kpis.avg_daily_units,
            kpis.sku_store_pairs
        );
    }

    let enriched = dashboard.build_enriched_table(&scope, &sales, &snapshot, &lead_times, &params)?;
    tracing::info!("决策视图: {} 行", enriched.len());

    for summary in dashboard.risk_summary_by_store(&enriched) {
        tracing::info!(
            "门店 {}: 断货风险={}, 超储={}, 低需求={}, 正常={}",
            summary.store_id,
            summary.stockout_risk,
            summary.overstock,
            summary.low_demand,
            summary.normal
        );
    }

    let top_risks = dashboard.top_stockout_risks(&enriched, DEFAULT_TOP_RISK_LIMIT);
    tracing::info!("断货风险 Top: {} 行", top_risks.len());

    let orders = dashboard.suggested_orders(&enriched);
    tracing::info!("建议补货订单: {} 行", orders.len());
    for row in orders.iter().take(10) {
        tracing::info!(
            "  {} / {}: {} ({})",
            row.store_id,
            row.sku_id,
            row.suggested_order_qty,
            row.order_explanation
        );
    }

    let distance_table = if distances.is_empty() { None } else { Some(distances.as_slice()) };
    let transfers = dashboard.suggest_transfers(&scope, &enriched, distance_table, &params);
    tracing::info!("调拨建议: {} 行", transfers.len());
    for proposal in transfers.iter().take(10) {
        tracing::info!(
            "  {} : {} -> {} x{} (距离={:?}, 成本={:?})",
            proposal.sku_id,
            proposal.from_store,
            proposal.to_store,
            proposal.qty,
            proposal.distance_km,
            proposal.cost_est
        );
    }

    // 未来态推演
    let report = dashboard.project_future_state(&scope, &sales, &snapshot, &lead_times, &params, true)?;
    tracing::info!(
        "未来态推演: 断货风险 {} -> {} (Δ{}), 超储 {} -> {} (Δ{})",
        report.impact.before.stockout_risk,
        report.impact.after.stockout_risk,
        report.impact.delta_stockout_risk,
        report.impact.before.overstock,
        report.impact.after.overstock,
        report.impact.delta_overstock
    );

    Ok(())
}
