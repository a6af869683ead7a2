// ==========================================
// 零售库存决策支持系统 - CSV 表加载器
// ==========================================
// 职责: 四张输入表的读取 (销量/快照/提前期/距离)
// 约定: 文件缺失返回空表而非报错 (数据加载方可能尚未产出);
//       坏行跳过并告警, 不阻断整表
// ==========================================

use crate::domain::demand::{LeadTime, SalesRecord};
use crate::domain::inventory::{DistanceRecord, InventorySnapshotRow};
use crate::importer::error::ImportResult;
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

/// 销量表文件名
pub const SALES_FILE: &str = "sales.csv";
/// 库存快照文件名
pub const INVENTORY_SNAPSHOT_FILE: &str = "inventory_snapshot.csv";
/// 提前期表文件名
pub const LEAD_TIMES_FILE: &str = "lead_times.csv";
/// 门店距离表文件名
pub const STORE_DISTANCES_FILE: &str = "store_distances.csv";

/// 读取 CSV 为记录列表
///
/// - 文件不存在: 返回空表
/// - 行解析失败: 跳过该行并告警
fn read_csv<T: DeserializeOwned>(path: &Path) -> ImportResult<Vec<T>> {
    if !path.exists() {
        tracing::debug!("输入表缺失, 按空表处理: {}", path.display());
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for (row_idx, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "跳过无法解析的行: file={}, row={}, err={}",
                    path.display(),
                    row_idx + 2,
                    e
                );
            }
        }
    }

    Ok(records)
}

/// 加载销量历史表
pub fn load_sales(data_dir: &Path) -> ImportResult<Vec<SalesRecord>> {
    read_csv(&data_dir.join(SALES_FILE))
}

/// 加载库存快照表
pub fn load_inventory_snapshot(data_dir: &Path) -> ImportResult<Vec<InventorySnapshotRow>> {
    read_csv(&data_dir.join(INVENTORY_SNAPSHOT_FILE))
}

/// 加载提前期表
pub fn load_lead_times(data_dir: &Path) -> ImportResult<Vec<LeadTime>> {
    read_csv(&data_dir.join(LEAD_TIMES_FILE))
}

/// 加载门店距离表
pub fn load_distances(data_dir: &Path) -> ImportResult<Vec<DistanceRecord>> {
    read_csv(&data_dir.join(STORE_DISTANCES_FILE))
}
