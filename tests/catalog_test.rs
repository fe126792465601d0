// ==========================================
// 供应商 / 询价单测试
// ==========================================


#[cfg(test)]
mod catalog_test {
    use construction_procurement::api::ApiError;
    use construction_procurement::domain::{InquiryStatus, SupplierContact, SupplierInput};
    use construction_procurement::repository::InquirySearchCriteria;

    use crate::test_helpers::*;

    #[test]
    fn test_register_supplier_overwrites_contact() {
        let env = setup();
        register_suppliers(&env, &["SUP001"]);

        let updated = env
            .state
            .catalog_api
            .register_supplier(SupplierInput {
                supplier_id: "SUP001".into(),
                company_name: "新名称建材".into(),
                contact: SupplierContact {
                    contact_person: "张三".into(),
                    phone: "0912-345-678".into(),
                    ..Default::default()
                },
            })
            .unwrap();

        assert_eq!(updated.company_name, "新名称建材");
        assert_eq!(updated.contact_person, "张三");
        assert_eq!(env.state.catalog_api.list_suppliers().unwrap().len(), 1);
    }

    #[test]
    fn test_register_supplier_requires_id() {
        let env = setup();
        let err = env
            .state
            .catalog_api
            .register_supplier(SupplierInput {
                supplier_id: "".into(),
                company_name: "无编号".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_inquiry_ids_are_sequential() {
        let env = setup();
        let api = &env.state.catalog_api;
        let a = api.create_inquiry(PROJECT_NAME, PROJECT_CODE, None).unwrap();
        let b = api.create_inquiry(PROJECT_NAME, PROJECT_CODE, None).unwrap();
        assert_eq!(a.inquiry_id, "INQ000001");
        assert_eq!(b.inquiry_id, "INQ000002");
        assert_eq!(a.status, InquiryStatus::Draft);
    }

    #[test]
    fn test_send_without_items_is_rejected() {
        let env = setup();
        register_suppliers(&env, &["SUP001"]);
        let api = &env.state.catalog_api;
        let inquiry = api.create_inquiry(PROJECT_NAME, PROJECT_CODE, None).unwrap();
        api.add_suppliers_to_inquiry(&inquiry.inquiry_id, &["SUP001".to_string()])
            .unwrap();

        let err = api.send_inquiry(&inquiry.inquiry_id).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert_eq!(
            api.get_inquiry(&inquiry.inquiry_id).unwrap().status,
            InquiryStatus::Draft
        );
    }

    #[test]
    fn test_send_without_suppliers_is_rejected() {
        let env = setup();
        let api = &env.state.catalog_api;
        let inquiry = api.create_inquiry(PROJECT_NAME, PROJECT_CODE, None).unwrap();
        api.add_item_to_inquiry(&inquiry.inquiry_id, item_input("T001", "水泥", 10, 180.0))
            .unwrap();

        let err = api.send_inquiry(&inquiry.inquiry_id).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_send_sets_status_and_timestamp() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        assert_eq!(inquiry.status, InquiryStatus::Sent);
        assert_eq!(inquiry.sent_at, Some(now()));

        // 已发送后不可再发送, 也不可再加项目
        let api = &env.state.catalog_api;
        assert!(matches!(
            api.send_inquiry(&inquiry.inquiry_id),
            Err(ApiError::InvalidStateTransition { .. })
        ));
        assert!(matches!(
            api.add_item_to_inquiry(&inquiry.inquiry_id, item_input("T009", "油漆", 1, 1.0)),
            Err(ApiError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_unregistered_and_duplicate_suppliers_are_ignored() {
        let env = setup();
        register_suppliers(&env, &["SUP001", "SUP002"]);
        let api = &env.state.catalog_api;
        let inquiry = api.create_inquiry(PROJECT_NAME, PROJECT_CODE, None).unwrap();

        let ids = api
            .add_suppliers_to_inquiry(
                &inquiry.inquiry_id,
                &["SUP001".into(), "SUP999".into(), "SUP002".into(), "SUP001".into()],
            )
            .unwrap();
        assert_eq!(ids, vec!["SUP001".to_string(), "SUP002".to_string()]);
    }

    #[test]
    fn test_add_item_to_missing_inquiry() {
        let env = setup();
        let err = env
            .state
            .catalog_api
            .add_item_to_inquiry("INQ404", item_input("T001", "水泥", 1, 1.0))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_search_and_report() {
        let env = setup();
        sent_inquiry(&env);
        let api = &env.state.catalog_api;
        api.create_inquiry("其他工程", "PRJ-002", None).unwrap();

        let found = api
            .search_inquiries(&InquirySearchCriteria {
                project_name: Some("信义".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);

        let report = api.generate_inquiry_report().unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.draft, 1);
        assert_eq!(report.rows[0].item_count, 2);
        assert_eq!(report.rows[0].estimated_total, 1000.0 * 175.0 + 10.0 * 16_500.0);

        let export = api.export_inquiry("INQ000001").unwrap();
        assert_eq!(export.items.len(), 2);
        assert_eq!(export.suppliers.len(), 3);
    }
}
