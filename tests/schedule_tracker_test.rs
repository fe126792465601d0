// ==========================================
// 施工进度 / 到货预警测试
// ==========================================


#[cfg(test)]
mod schedule_tracker_test {
    use chrono::Duration;
    use construction_procurement::api::ApiError;
    use construction_procurement::domain::types::{AlertSeverity, ScheduleItemStatus};
    use construction_procurement::domain::{PurchaseOrder, PurchaseOrderItem};

    use crate::test_helpers::*;

    /// 进度表 + 标准采购单 (2 项, 预计 now+7 天)
    fn schedule_with_order(env: &TestEnv) -> PurchaseOrder {
        let po = created_purchase_order(env, 1_000_000.0);
        let api = &env.state.schedule_api;
        api.create_schedule(PROJECT_NAME, PROJECT_CODE).unwrap();
        api.add_purchase_order(PROJECT_CODE, &po).unwrap();
        po
    }

    fn single_item_order(po_id: &str, days: i64) -> PurchaseOrder {
        let mut po = PurchaseOrder::new(
            po_id.to_string(),
            "INQ000001".to_string(),
            "SUP001".to_string(),
            PROJECT_NAME.to_string(),
            now(),
        );
        po.expected_delivery_date = Some(now() + Duration::days(days));
        po.add_item(PurchaseOrderItem::new(
            "T100".into(),
            "铝窗".into(),
            "标准".into(),
            "樘".into(),
            20,
            3_000.0,
        ));
        po
    }

    #[test]
    fn test_add_purchase_order_creates_pending_items() {
        let env = setup();
        let po = schedule_with_order(&env);

        let schedule = env.state.schedule_api.get_schedule(PROJECT_CODE).unwrap();
        assert_eq!(schedule.schedule_items.len(), 2);
        for item in &schedule.schedule_items {
            assert_eq!(item.po_id, po.po_id);
            assert_eq!(item.status, ScheduleItemStatus::Pending);
            assert_eq!(item.construction_progress, 0.0);
            assert_eq!(item.expected_delivery_date, now() + Duration::days(7));
        }
    }

    #[test]
    fn test_add_order_requires_schedule_and_expected_date() {
        let env = setup();
        let api = &env.state.schedule_api;
        let po = single_item_order("PO000099", 5);
        assert!(matches!(
            api.add_purchase_order(PROJECT_CODE, &po),
            Err(ApiError::NotFound(_))
        ));

        api.create_schedule(PROJECT_NAME, PROJECT_CODE).unwrap();
        let mut no_date = po.clone();
        no_date.expected_delivery_date = None;
        assert!(matches!(
            api.add_purchase_order(PROJECT_CODE, &no_date),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_late_delivery_raises_alert_per_item() {
        let env = setup();
        let po = schedule_with_order(&env);

        let update = env
            .state
            .schedule_api
            .update_delivery_status(PROJECT_CODE, &po.po_id, now() + Duration::days(17))
            .unwrap();

        assert_eq!(update.alerts.len(), 2);
        assert!(update
            .alerts
            .iter()
            .all(|a| a.severity == AlertSeverity::High && a.delay_days == 10));
        assert!(update
            .schedule
            .schedule_items
            .iter()
            .all(|i| i.status == ScheduleItemStatus::Delivered));

        let stored = env.state.schedule_api.get_alerts(None, None).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_alert_severity_thresholds() {
        let env = setup();
        let api = &env.state.schedule_api;
        api.create_schedule(PROJECT_NAME, PROJECT_CODE).unwrap();

        let cases = [
            ("PO000101", 5, Some(AlertSeverity::Medium)),
            ("PO000102", 2, Some(AlertSeverity::Low)),
            ("PO000103", 0, None),
            ("PO000104", -1, None),
        ];
        for (po_id, delay, expected) in cases {
            let po = single_item_order(po_id, 3);
            api.add_purchase_order(PROJECT_CODE, &po).unwrap();
            let update = api
                .update_delivery_status(PROJECT_CODE, po_id, now() + Duration::days(3 + delay))
                .unwrap();
            assert_eq!(update.alerts.first().map(|a| a.severity), expected, "delay {}", delay);
        }

        let medium = api.get_alerts(Some(AlertSeverity::Medium), None).unwrap();
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].po_id, "PO000101");
    }

    #[test]
    fn test_delivery_for_unknown_order_is_not_found() {
        let env = setup();
        schedule_with_order(&env);
        let err = env
            .state
            .schedule_api
            .update_delivery_status(PROJECT_CODE, "PO404", now())
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_progress_updates_all_items_and_overall_mean() {
        let env = setup();
        let po = schedule_with_order(&env);
        let api = &env.state.schedule_api;
        api.add_purchase_order(PROJECT_CODE, &single_item_order("PO000099", 5))
            .unwrap();

        let schedule = api
            .update_construction_progress(PROJECT_CODE, &po.po_id, 100.0, "完工", "engineer-1")
            .unwrap();
        let completed = schedule
            .schedule_items
            .iter()
            .filter(|i| i.status == ScheduleItemStatus::Completed)
            .count();
        assert_eq!(completed, 2);
        assert!((schedule.overall_progress - 200.0 / 3.0).abs() < 1e-9);

        let history = api.get_progress_history(PROJECT_CODE, &po.po_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].updated_by, "engineer-1");
    }

    #[test]
    fn test_progress_out_of_range_is_rejected() {
        let env = setup();
        let po = schedule_with_order(&env);
        let api = &env.state.schedule_api;

        assert!(matches!(
            api.update_construction_progress(PROJECT_CODE, &po.po_id, 120.0, "", "x"),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            api.update_construction_progress(PROJECT_CODE, &po.po_id, -5.0, "", "x"),
            Err(ApiError::ValidationError(_))
        ));
        assert!(api
            .get_progress_history(PROJECT_CODE, &po.po_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_upcoming_and_overdue() {
        let env = setup();
        schedule_with_order(&env);
        let api = &env.state.schedule_api;

        let upcoming = api.get_upcoming_deliveries(PROJECT_CODE, None).unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].remaining_days, 7);
        assert!(api.get_upcoming_deliveries(PROJECT_CODE, Some(3)).unwrap().is_empty());
        assert!(api.get_overdue_items(PROJECT_CODE).unwrap().is_empty());

        env.clock.advance_days(9);
        let overdue = api.get_overdue_items(PROJECT_CODE).unwrap();
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].overdue_days, 2);

        let report = api.generate_schedule_report(PROJECT_CODE).unwrap();
        assert_eq!(report.status_counts.overdue, 2);
        assert_eq!(report.delivery_analysis.pending, 2);
        assert_eq!(report.delivery_analysis.on_time_rate_pct, None);
    }

    #[test]
    fn test_dashboard_and_alert_reading() {
        let env = setup();
        let po = schedule_with_order(&env);
        let api = &env.state.schedule_api;
        api.update_delivery_status(PROJECT_CODE, &po.po_id, now() + Duration::days(12))
            .unwrap();

        let dashboard = api.generate_dashboard().unwrap();
        assert_eq!(dashboard.project_count, 1);
        assert_eq!(dashboard.active_count, 1);
        assert_eq!(dashboard.unread_alert_count, 2);

        let alerts = api.get_alerts(None, Some(1)).unwrap();
        assert_eq!(alerts.len(), 1);
        api.mark_alert_read(&alerts[0].alert_id).unwrap();
        assert_eq!(api.generate_dashboard().unwrap().unread_alert_count, 1);

        assert!(matches!(
            api.mark_alert_read("no-such-alert"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_recreating_schedule_drops_items() {
        let env = setup();
        schedule_with_order(&env);
        let api = &env.state.schedule_api;

        let schedule = api.create_schedule(PROJECT_NAME, PROJECT_CODE).unwrap();
        assert!(schedule.schedule_items.is_empty());
        assert!(api.get_schedule(PROJECT_CODE).unwrap().schedule_items.is_empty());
        assert_eq!(api.list_schedules().unwrap().len(), 1);
    }
}
