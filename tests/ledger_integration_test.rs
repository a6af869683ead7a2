// ==========================================
// 库存台账集成测试
// ==========================================
// 职责: 验证幂等应用、条件扣减、审批事实持久化
// ==========================================


#[cfg(test)]
mod ledger_integration_test {
    use retail_inventory_dss::domain::{OrderRow, TransferRow};
    use retail_inventory_dss::repository::{
        ConfirmedMovementRepository, InventoryLedgerRepository,
    };

    use crate::test_helpers::{create_test_db, make_snapshot_row};

    const ORG: &str = "org1";

    fn make_order(store: &str, sku: &str, qty: i64) -> OrderRow {
        OrderRow {
            store_id: store.to_string(),
            sku_id: sku.to_string(),
            qty,
        }
    }

    fn make_transfer(from: &str, to: &str, sku: &str, qty: i64) -> TransferRow {
        TransferRow {
            from_store: from.to_string(),
            to_store: to.to_string(),
            sku_id: sku.to_string(),
            qty,
        }
    }

    // ==========================================
    // 播种与查询
    // ==========================================

    #[test]
    fn test_seed_snapshot_only_fills_missing_rows() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();

        let created = repo
            .seed_snapshot(ORG, &[make_snapshot_row("S1", "K1", 50)])
            .unwrap();
        assert_eq!(created, 1);

        // 变更后重复播种不覆盖台账值
        repo.apply_orders(ORG, &[make_order("S1", "K1", 10)], "tester", "p1")
            .unwrap();
        let created = repo
            .seed_snapshot(ORG, &[make_snapshot_row("S1", "K1", 50)])
            .unwrap();
        assert_eq!(created, 0);
        assert_eq!(repo.on_hand(ORG, "S1", "K1").unwrap(), 60);
    }

    #[test]
    fn test_fetch_levels_filters_by_store_and_sku() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        repo.seed_snapshot(
            ORG,
            &[
                make_snapshot_row("S1", "K1", 10),
                make_snapshot_row("S1", "K2", 20),
                make_snapshot_row("S2", "K1", 30),
            ],
        )
        .unwrap();

        let levels = repo
            .fetch_levels(ORG, &["S1".to_string()], &["K1".to_string()])
            .unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].on_hand, 10);

        // 空列表表示不过滤该维度
        let levels = repo.fetch_levels(ORG, &[], &[]).unwrap();
        assert_eq!(levels.len(), 3);

        // 其他组织不可见
        let levels = repo.fetch_levels("org2", &[], &[]).unwrap();
        assert!(levels.is_empty());
    }

    // ==========================================
    // 订单应用: 幂等协议
    // ==========================================

    #[test]
    fn test_apply_orders_idempotent_replay() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();

        let rows = vec![make_order("S1", "K1", 10), make_order("S1", "K2", 5)];

        // 第一次提交: 全部新建
        let outcome = repo.apply_orders(ORG, &rows, "ana@x.com", "prefix1").unwrap();
        assert_eq!(outcome.new_count, 2);
        assert_eq!(outcome.duplicate_count, 0);
        assert_eq!(outcome.applied.len(), 2);

        // 相同前缀重放: 全部重复, 台账零变化
        let outcome = repo.apply_orders(ORG, &rows, "ana@x.com", "prefix1").unwrap();
        assert_eq!(outcome.new_count, 0);
        assert_eq!(outcome.duplicate_count, 2);
        assert!(outcome.applied.is_empty());

        assert_eq!(repo.on_hand(ORG, "S1", "K1").unwrap(), 10);
        assert_eq!(repo.on_hand(ORG, "S1", "K2").unwrap(), 5);

        // 不同前缀是新的逻辑动作
        let outcome = repo.apply_orders(ORG, &rows, "ana@x.com", "prefix2").unwrap();
        assert_eq!(outcome.new_count, 2);
        assert_eq!(repo.on_hand(ORG, "S1", "K1").unwrap(), 20);
    }

    #[test]
    fn test_apply_orders_creates_ledger_row_lazily() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();

        // 未播种的 (store, sku): 行以 0 起建后累加
        let outcome = repo
            .apply_orders(ORG, &[make_order("S9", "K9", 7)], "tester", "p1")
            .unwrap();

        assert_eq!(outcome.new_count, 1);
        assert_eq!(repo.on_hand(ORG, "S9", "K9").unwrap(), 7);
    }

    #[test]
    fn test_apply_orders_skips_nonpositive_qty() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();

        let outcome = repo
            .apply_orders(
                ORG,
                &[make_order("S1", "K1", 0), make_order("S1", "K1", -5)],
                "tester",
                "p1",
            )
            .unwrap();

        // 输入形状问题静默跳过, 不计数不报错
        assert_eq!(outcome.new_count, 0);
        assert_eq!(outcome.duplicate_count, 0);
        assert_eq!(repo.on_hand(ORG, "S1", "K1").unwrap(), 0);
    }

    // ==========================================
    // 调拨应用: 条件扣减协议
    // ==========================================

    #[test]
    fn test_apply_transfer_conserves_total() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        repo.seed_snapshot(
            ORG,
            &[make_snapshot_row("A", "K1", 50), make_snapshot_row("B", "K1", 5)],
        )
        .unwrap();

        let outcome = repo
            .apply_transfers(ORG, &[make_transfer("A", "B", "K1", 10)], "tester", "p1")
            .unwrap();

        assert_eq!(outcome.applied_count, 1);
        assert_eq!(outcome.insufficient_count, 0);
        // 守恒: A 精确减 10, B 精确加 10, 总量不变
        assert_eq!(repo.on_hand(ORG, "A", "K1").unwrap(), 40);
        assert_eq!(repo.on_hand(ORG, "B", "K1").unwrap(), 15);
        assert_eq!(
            repo.on_hand(ORG, "A", "K1").unwrap() + repo.on_hand(ORG, "B", "K1").unwrap(),
            55
        );
    }

    #[test]
    fn test_apply_transfer_insufficient_keeps_audit_record() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        let movement_repo = ConfirmedMovementRepository::new(&db_path).unwrap();
        repo.seed_snapshot(ORG, &[make_snapshot_row("A", "K1", 5)]).unwrap();

        let outcome = repo
            .apply_transfers(ORG, &[make_transfer("A", "B", "K1", 10)], "tester", "p1")
            .unwrap();

        assert_eq!(outcome.applied_count, 0);
        assert_eq!(outcome.insufficient_count, 1);
        assert!(outcome.applied.is_empty());

        // 审批事实保留, 但无实际移库
        let records = movement_repo.list_transfers(ORG).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].qty, 10);
        assert_eq!(records[0].idem_key, "p1:transfer:A:B:K1");
        assert_eq!(repo.on_hand(ORG, "A", "K1").unwrap(), 5);
        assert_eq!(repo.on_hand(ORG, "B", "K1").unwrap(), 0);
    }

    #[test]
    fn test_apply_transfer_duplicate_replay() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        repo.seed_snapshot(ORG, &[make_snapshot_row("A", "K1", 50)]).unwrap();

        let rows = vec![make_transfer("A", "B", "K1", 10)];
        let outcome = repo.apply_transfers(ORG, &rows, "tester", "p1").unwrap();
        assert_eq!(outcome.applied_count, 1);

        let outcome = repo.apply_transfers(ORG, &rows, "tester", "p1").unwrap();
        assert_eq!(outcome.applied_count, 0);
        assert_eq!(outcome.duplicate_count, 1);

        // 重放不二次扣减
        assert_eq!(repo.on_hand(ORG, "A", "K1").unwrap(), 40);
        assert_eq!(repo.on_hand(ORG, "B", "K1").unwrap(), 10);
    }

    #[test]
    fn test_apply_transfer_skips_self_transfer() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        let movement_repo = ConfirmedMovementRepository::new(&db_path).unwrap();
        repo.seed_snapshot(ORG, &[make_snapshot_row("A", "K1", 50)]).unwrap();

        let outcome = repo
            .apply_transfers(ORG, &[make_transfer("A", "A", "K1", 10)], "tester", "p1")
            .unwrap();

        assert_eq!(outcome.applied_count, 0);
        assert_eq!(outcome.duplicate_count, 0);
        assert_eq!(outcome.insufficient_count, 0);
        assert!(movement_repo.list_transfers(ORG).unwrap().is_empty());
        assert_eq!(repo.on_hand(ORG, "A", "K1").unwrap(), 50);
    }

    #[test]
    fn test_apply_transfers_partial_batch() {
        // 一批内各行独立: 成功/不足/重复互不影响
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        repo.seed_snapshot(
            ORG,
            &[make_snapshot_row("A", "K1", 30), make_snapshot_row("C", "K1", 3)],
        )
        .unwrap();

        let rows = vec![
            make_transfer("A", "B", "K1", 10), // 成功
            make_transfer("C", "B", "K1", 10), // 库存不足
            make_transfer("A", "B", "K1", 10), // 同批重复 (同幂等键)
        ];
        let outcome = repo.apply_transfers(ORG, &rows, "tester", "p1").unwrap();

        assert_eq!(outcome.applied_count, 1);
        assert_eq!(outcome.insufficient_count, 1);
        assert_eq!(outcome.duplicate_count, 1);
        assert_eq!(repo.on_hand(ORG, "A", "K1").unwrap(), 20);
        assert_eq!(repo.on_hand(ORG, "B", "K1").unwrap(), 10);
        assert_eq!(repo.on_hand(ORG, "C", "K1").unwrap(), 3);
    }

    #[test]
    fn test_order_idem_key_persisted_format() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let repo = InventoryLedgerRepository::new(&db_path).unwrap();
        let movement_repo = ConfirmedMovementRepository::new(&db_path).unwrap();

        repo.apply_orders(
            ORG,
            &[make_order("S1", "K1", 10)],
            "ana@x.com",
            "org1:ana@x.com:1700000000",
        )
        .unwrap();

        let records = movement_repo.list_orders(ORG).unwrap();
        assert_eq!(records.len(), 1);
        // 幂等键格式与既有审计日志逐位兼容
        assert_eq!(records[0].idem_key, "org1:ana@x.com:1700000000:order:S1:K1");
        assert_eq!(records[0].approved_by.as_deref(), Some("ana@x.com"));
    }
}
