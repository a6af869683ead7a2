// ==========================================
// 操作 API 集成测试
// ==========================================
// 职责: 验证审批门面 (范围拦截 -> 台账应用 -> 事件落库)
// ==========================================


#[cfg(test)]
mod operation_api_test {
    use retail_inventory_dss::api::OperationApi;
    use retail_inventory_dss::domain::{OrderRow, TransferRow};
    use retail_inventory_dss::engine::events::InventoryEventPublisher;
    use retail_inventory_dss::repository::{EventLogRepository, InventoryLedgerRepository};
    use std::sync::Arc;

    use crate::test_helpers::{create_test_db, make_scope, make_snapshot_row};

    fn setup_api(db_path: &str) -> (OperationApi, Arc<InventoryLedgerRepository>, Arc<EventLogRepository>) {
        let ledger_repo = Arc::new(InventoryLedgerRepository::new(db_path).unwrap());
        let event_repo = Arc::new(EventLogRepository::new(db_path).unwrap());
        let api = OperationApi::new(
            ledger_repo.clone(),
            Some(event_repo.clone() as Arc<dyn InventoryEventPublisher>),
        );
        (api, ledger_repo, event_repo)
    }

    #[test]
    fn test_approve_orders_blocks_out_of_scope_rows() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger_repo, event_repo) = setup_api(&db_path);
        let scope = make_scope("org1", &["S1", "S2"], &["K1"]);

        let rows = vec![
            OrderRow {
                store_id: "S1".to_string(),
                sku_id: "K1".to_string(),
                qty: 10,
            },
            OrderRow {
                store_id: "S9".to_string(), // 范围外
                sku_id: "K1".to_string(),
                qty: 10,
            },
        ];

        let report = api.approve_orders(&scope, rows, "ana@x.com", "p1").unwrap();

        assert_eq!(report.new_count, 1);
        assert_eq!(report.duplicate_count, 0);
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.blocked[0].store_id, "S9");
        assert_eq!(report.applied.len(), 1);

        // 台账只反映范围内的行
        assert_eq!(ledger_repo.on_hand("org1", "S1", "K1").unwrap(), 10);
        assert_eq!(ledger_repo.on_hand("org1", "S9", "K1").unwrap(), 0);

        // 事件落库, 供下游通知系统轮询
        let (events, cursor) = event_repo.poll_events("org1", 0, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "orders_approved");
        assert_eq!(events[0].payload["count_new"], 1);
        assert_eq!(events[0].payload["approved_by"], "ana@x.com");
        assert_eq!(cursor, events[0].id);
    }

    #[test]
    fn test_approve_orders_duplicate_replay() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger_repo, _event_repo) = setup_api(&db_path);
        let scope = make_scope("org1", &["S1"], &["K1"]);

        let rows = vec![OrderRow {
            store_id: "S1".to_string(),
            sku_id: "K1".to_string(),
            qty: 10,
        }];

        let first = api
            .approve_orders(&scope, rows.clone(), "ana@x.com", "p1")
            .unwrap();
        assert_eq!(first.new_count, 1);
        assert_eq!(first.duplicate_count, 0);

        let second = api.approve_orders(&scope, rows, "ana@x.com", "p1").unwrap();
        assert_eq!(second.new_count, 0);
        assert_eq!(second.duplicate_count, 1);
        assert!(second.applied.is_empty());

        // 台账只累加一次
        assert_eq!(ledger_repo.on_hand("org1", "S1", "K1").unwrap(), 10);
    }

    #[test]
    fn test_approve_transfers_end_to_end() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger_repo, event_repo) = setup_api(&db_path);
        let scope = make_scope("org1", &["S1", "S2"], &["K1"]);

        ledger_repo
            .seed_snapshot("org1", &[make_snapshot_row("S1", "K1", 50)])
            .unwrap();

        let rows = vec![TransferRow {
            from_store: "S1".to_string(),
            to_store: "S2".to_string(),
            sku_id: "K1".to_string(),
            qty: 10,
        }];

        let report = api
            .approve_transfers(&scope, rows, "ana@x.com", "p1")
            .unwrap();

        assert_eq!(report.applied_count, 1);
        assert_eq!(report.insufficient_count, 0);
        assert_eq!(report.applied.len(), 1);

        let levels = api.fetch_inventory_levels(&scope).unwrap();
        let by_store: Vec<(String, i64)> = levels
            .iter()
            .map(|l| (l.store_id.clone(), l.on_hand))
            .collect();
        assert!(by_store.contains(&("S1".to_string(), 40)));
        assert!(by_store.contains(&("S2".to_string(), 10)));

        let (events, _) = event_repo.poll_events("org1", 0, 10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "transfers_approved");
        assert_eq!(events[0].payload["count_applied"], 1);
        assert_eq!(events[0].payload["count_insufficient"], 0);
    }

    #[test]
    fn test_approve_transfers_insufficient_reported_not_raised() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger_repo, _event_repo) = setup_api(&db_path);
        let scope = make_scope("org1", &["S1", "S2"], &["K1"]);

        ledger_repo
            .seed_snapshot("org1", &[make_snapshot_row("S1", "K1", 5)])
            .unwrap();

        let rows = vec![TransferRow {
            from_store: "S1".to_string(),
            to_store: "S2".to_string(),
            sku_id: "K1".to_string(),
            qty: 10,
        }];

        let report = api
            .approve_transfers(&scope, rows, "ana@x.com", "p1")
            .unwrap();

        assert_eq!(report.applied_count, 0);
        assert_eq!(report.insufficient_count, 1);
        // 来源在库不变
        assert_eq!(ledger_repo.on_hand("org1", "S1", "K1").unwrap(), 5);
    }

    #[test]
    fn test_all_blocked_batch_publishes_no_event() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, _ledger_repo, event_repo) = setup_api(&db_path);
        let scope = make_scope("org1", &["S1"], &["K1"]);

        let rows = vec![OrderRow {
            store_id: "S9".to_string(),
            sku_id: "K1".to_string(),
            qty: 10,
        }];

        let report = api.approve_orders(&scope, rows, "ana@x.com", "p1").unwrap();

        assert_eq!(report.new_count, 0);
        assert_eq!(report.blocked.len(), 1);

        let (events, cursor) = event_repo.poll_events("org1", 0, 10).unwrap();
        assert!(events.is_empty());
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_poll_events_cursor_advances() {
        let (_temp_file, db_path) = create_test_db().unwrap();
        let (api, ledger_repo, event_repo) = setup_api(&db_path);
        let scope = make_scope("org1", &["S1", "S2"], &["K1"]);

        ledger_repo
            .seed_snapshot("org1", &[make_snapshot_row("S1", "K1", 100)])
            .unwrap();

        for batch in 0..3 {
            let rows = vec![TransferRow {
                from_store: "S1".to_string(),
                to_store: "S2".to_string(),
                sku_id: "K1".to_string(),
                qty: 10,
            }];
            api.approve_transfers(&scope, rows, "ana@x.com", &format!("p{}", batch))
                .unwrap();
        }

        let (first_page, cursor) = event_repo.poll_events("org1", 0, 2).unwrap();
        assert_eq!(first_page.len(), 2);

        let (second_page, final_cursor) = event_repo.poll_events("org1", cursor, 2).unwrap();
        assert_eq!(second_page.len(), 1);
        assert!(final_cursor > cursor);

        // 游标之后无新事件
        let (empty, unchanged) = event_repo.poll_events("org1", final_cursor, 2).unwrap();
        assert!(empty.is_empty());
        assert_eq!(unchanged, final_cursor);
    }
}
