// ==========================================
// 报价 / 比价分析测试
// ==========================================


#[cfg(test)]
mod comparison_engine_test {
    use construction_procurement::api::ApiError;
    use construction_procurement::config::config_keys;
    use construction_procurement::domain::types::{DeliveryRisk, PriceReasonableness};
    use construction_procurement::domain::QuoteSubmission;

    use crate::test_helpers::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_quote_total_is_sum_of_items() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        let quotes = submit_standard_quotes(&env, &inquiry.inquiry_id);

        assert_eq!(quotes[0].quote_id, "QUO000001");
        assert_eq!(quotes[0].total_amount, 340_000.0);
        assert_eq!(quotes[1].total_amount, 360_000.0);
        assert_eq!(quotes[2].total_amount, 330_000.0);
    }

    #[test]
    fn test_default_validity_comes_from_config() {
        let env = setup();
        let api = &env.state.comparison_api;

        let quote = api
            .submit_quote("INQ000001", "SUP001", QuoteSubmission::default())
            .unwrap();
        assert_eq!(quote.validity_days, 30);

        env.state
            .config_manager
            .set_global_config_value(config_keys::DEFAULT_VALIDITY_DAYS, "60")
            .unwrap();
        let quote = api
            .submit_quote("INQ000001", "SUP002", QuoteSubmission::default())
            .unwrap();
        assert_eq!(quote.validity_days, 60);
    }

    #[test]
    fn test_negative_price_rejected() {
        let env = setup();
        let err = env
            .state
            .comparison_api
            .submit_quote(
                "INQ000001",
                "SUP001",
                submission(vec![quote_item("T001", -1.0, 0.0, 3)], 30),
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_detailed_comparison_without_table_is_not_found() {
        let env = setup();
        let err = env
            .state
            .comparison_api
            .generate_detailed_comparison("INQ000001")
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_detailed_comparison_of_standard_quotes() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        submit_standard_quotes(&env, &inquiry.inquiry_id);
        let api = &env.state.comparison_api;
        api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
            .unwrap();

        let detailed = api.generate_detailed_comparison(&inquiry.inquiry_id).unwrap();
        assert_eq!(detailed.basic_info.quote_count, 3);

        // 总价分析
        let pricing = detailed.pricing_analysis.unwrap();
        assert_eq!(pricing.min_total, 330_000.0);
        assert_eq!(pricing.max_total, 360_000.0);
        assert_eq!(pricing.spread, 30_000.0);
        assert!((pricing.spread_pct - 9.09).abs() < 0.01);

        // 项目比价
        let t001 = &detailed.item_comparisons[0];
        assert_eq!(t001.item_id, "T001");
        assert_eq!(t001.min_unit_price, 170.0);
        assert_eq!(t001.max_unit_price, 190.0);
        assert_eq!(t001.reasonableness, PriceReasonableness::HighConsistency);

        // 单价竞争力 (T002 SUP001 与 SUP003 并列最低)
        let comp: Vec<(String, f64)> = detailed
            .supplier_summaries
            .iter()
            .map(|s| (s.supplier_id.clone(), s.competitiveness_pct))
            .collect();
        assert_eq!(comp[0].0, "SUP001");
        assert!(approx(comp[0].1, 50.0));
        assert!(approx(comp[1].1, 0.0));
        assert!(approx(comp[2].1, 100.0));

        // 交期分析
        let delivery = detailed.delivery_analysis.unwrap();
        assert_eq!(delivery.min_days, 5);
        assert_eq!(delivery.max_days, 30);
        assert_eq!(delivery.risk, DeliveryRisk::Medium);

        // 决标建议
        let rec = detailed.recommendation.unwrap();
        assert_eq!(rec.price_winner.supplier_id, "SUP003");
        assert_eq!(rec.delivery_winner.supplier_id, "SUP002");
        assert_eq!(rec.composite_winner.supplier_id, "SUP002");
        let best = rec
            .scores
            .iter()
            .find(|s| s.supplier_id == "SUP002")
            .unwrap()
            .total_score;
        assert!(rec.scores.iter().all(|s| s.total_score <= best));
    }

    #[test]
    fn test_composite_winner_independent_of_submission_order() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        let api = &env.state.comparison_api;

        // 与标准报价相同, 提交顺序相反
        api.submit_quote(
            &inquiry.inquiry_id,
            "SUP003",
            submission(
                vec![
                    quote_item("T001", 170.0, 170_000.0, 20),
                    quote_item("T002", 16_000.0, 160_000.0, 30),
                ],
                15,
            ),
        )
        .unwrap();
        api.submit_quote(
            &inquiry.inquiry_id,
            "SUP002",
            submission(
                vec![
                    quote_item("T001", 190.0, 190_000.0, 5),
                    quote_item("T002", 17_000.0, 170_000.0, 7),
                ],
                45,
            ),
        )
        .unwrap();
        api.submit_quote(
            &inquiry.inquiry_id,
            "SUP001",
            submission(
                vec![
                    quote_item("T001", 180.0, 180_000.0, 7),
                    quote_item("T002", 16_000.0, 160_000.0, 14),
                ],
                30,
            ),
        )
        .unwrap();
        api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
            .unwrap();

        let rec = api
            .generate_detailed_comparison(&inquiry.inquiry_id)
            .unwrap()
            .recommendation
            .unwrap();
        assert_eq!(rec.composite_winner.supplier_id, "SUP002");
        assert_eq!(rec.price_winner.supplier_id, "SUP003");
    }

    #[test]
    fn test_empty_table_has_no_analysis() {
        let env = setup();
        let api = &env.state.comparison_api;
        api.create_comparison_table("INQ000001", PROJECT_NAME).unwrap();

        let detailed = api.generate_detailed_comparison("INQ000001").unwrap();
        assert_eq!(detailed.basic_info.quote_count, 0);
        assert!(detailed.pricing_analysis.is_none());
        assert!(detailed.delivery_analysis.is_none());
        assert!(detailed.recommendation.is_none());
    }

    #[test]
    fn test_recreating_table_clears_selection() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        submit_standard_quotes(&env, &inquiry.inquiry_id);
        let api = &env.state.comparison_api;

        api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
            .unwrap();
        let table = api
            .select_supplier(&inquiry.inquiry_id, "SUP001", "老客户")
            .unwrap();
        assert_eq!(table.selected_supplier_id.as_deref(), Some("SUP001"));
        assert_eq!(table.decision_date, Some(now()));

        let table = api
            .create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
            .unwrap();
        assert!(table.selected_supplier_id.is_none());
        assert_eq!(table.quote_ids.len(), 3);
    }

    #[test]
    fn test_selected_quote_is_latest_from_supplier() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        submit_standard_quotes(&env, &inquiry.inquiry_id);
        let api = &env.state.comparison_api;
        let revised = api
            .submit_quote(
                &inquiry.inquiry_id,
                "SUP002",
                submission(vec![quote_item("T001", 185.0, 185_000.0, 5)], 45),
            )
            .unwrap();

        api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
            .unwrap();
        assert!(api.find_selected_quote(&inquiry.inquiry_id).unwrap().is_none());

        api.select_supplier(&inquiry.inquiry_id, "SUP002", "议价后").unwrap();
        let selected = api.find_selected_quote(&inquiry.inquiry_id).unwrap().unwrap();
        assert_eq!(selected.quote_id, revised.quote_id);
    }

    #[test]
    fn test_export_recommends_composite_winner() {
        let env = setup();
        let inquiry = sent_inquiry(&env);
        submit_standard_quotes(&env, &inquiry.inquiry_id);
        let api = &env.state.comparison_api;
        api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
            .unwrap();

        let export = api.export_comparison(&inquiry.inquiry_id).unwrap();
        assert_eq!(export.supplier_rows.len(), 3);
        assert_eq!(export.item_rows.len(), 2);
        assert_eq!(export.analysis.recommended_supplier_id.as_deref(), Some("SUP002"));
    }

    #[test]
    fn test_update_missing_quote_status() {
        let env = setup();
        let err = env
            .state
            .comparison_api
            .update_quote_status("QUO404", construction_procurement::QuoteStatus::Accepted)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    /// (供应商, 明细, 有效天数); 与标准报价相同
    fn standard_submissions() -> Vec<(&'static str, QuoteSubmission)> {
        vec![
            (
                "SUP001",
                submission(
                    vec![
                        quote_item("T001", 180.0, 180_000.0, 7),
                        quote_item("T002", 16_000.0, 160_000.0, 14),
                    ],
                    30,
                ),
            ),
            (
                "SUP002",
                submission(
                    vec![
                        quote_item("T001", 190.0, 190_000.0, 5),
                        quote_item("T002", 17_000.0, 170_000.0, 7),
                    ],
                    45,
                ),
            ),
            (
                "SUP003",
                submission(
                    vec![
                        quote_item("T001", 170.0, 170_000.0, 20),
                        quote_item("T002", 16_000.0, 160_000.0, 30),
                    ],
                    15,
                ),
            ),
        ]
    }

    /// 0.5 × (1 - 价差比) + 0.3 × (1 - 交期差比) + 有效期分 (>= 30 天 0.2, 否则 0.1)
    fn weighted_score(total: f64, min_total: f64, avg_days: f64, best_avg_days: f64, validity_days: u32) -> f64 {
        let price = 0.5 * (1.0 - (total - min_total) / min_total);
        let delivery = 0.3 * (1.0 - (avg_days - best_avg_days) / best_avg_days);
        let validity = if validity_days >= 30 { 0.2 } else { 0.1 };
        price + delivery + validity
    }

    #[test]
    fn test_composite_scores_match_weighted_formula_in_any_order() {
        // 最低总额 330000 (SUP003), 最短平均交期 6 天 (SUP002)
        let expected = [
            ("SUP001", weighted_score(340_000.0, 330_000.0, 10.5, 6.0, 30)),
            ("SUP002", weighted_score(360_000.0, 330_000.0, 6.0, 6.0, 45)),
            ("SUP003", weighted_score(330_000.0, 330_000.0, 25.0, 6.0, 15)),
        ];
        assert!(approx(expected[1].1, 0.5 * (1.0 - 30_000.0 / 330_000.0) + 0.3 + 0.2));

        for order in [[0, 1, 2], [2, 0, 1], [1, 2, 0], [2, 1, 0]] {
            let env = setup();
            let inquiry = sent_inquiry(&env);
            let api = &env.state.comparison_api;
            let submissions = standard_submissions();
            for idx in order {
                let (supplier_id, body) = &submissions[idx];
                api.submit_quote(&inquiry.inquiry_id, supplier_id, body.clone())
                    .unwrap();
            }
            api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
                .unwrap();

            let rec = api
                .generate_detailed_comparison(&inquiry.inquiry_id)
                .unwrap()
                .recommendation
                .unwrap();

            let submitted: Vec<&str> = rec.scores.iter().map(|s| s.supplier_id.as_str()).collect();
            let wanted: Vec<&str> = order.iter().map(|i| submissions[*i].0).collect();
            assert_eq!(submitted, wanted, "order {:?}", order);

            for (supplier_id, score) in expected {
                let actual = rec
                    .scores
                    .iter()
                    .find(|s| s.supplier_id == supplier_id)
                    .unwrap();
                assert!(
                    approx(actual.total_score, score),
                    "order {:?} {}: {} != {}",
                    order,
                    supplier_id,
                    actual.total_score,
                    score
                );
            }
            assert_eq!(rec.composite_winner.supplier_id, "SUP002", "order {:?}", order);
            assert_eq!(rec.price_winner.supplier_id, "SUP003", "order {:?}", order);
            assert_eq!(rec.delivery_winner.supplier_id, "SUP002", "order {:?}", order);
        }
    }

    #[test]
    fn test_ties_go_to_first_submitted_quote() {
        for (first, second) in [("SUP001", "SUP002"), ("SUP002", "SUP001")] {
            let env = setup();
            let inquiry = sent_inquiry(&env);
            let api = &env.state.comparison_api;

            // 总额/平均交期/有效期完全相同, 第三家各项都较差
            for supplier_id in [first, second] {
                api.submit_quote(
                    &inquiry.inquiry_id,
                    supplier_id,
                    submission(
                        vec![
                            quote_item("T001", 180.0, 180_000.0, 6),
                            quote_item("T002", 16_000.0, 160_000.0, 10),
                        ],
                        30,
                    ),
                )
                .unwrap();
            }
            api.submit_quote(
                &inquiry.inquiry_id,
                "SUP003",
                submission(
                    vec![
                        quote_item("T001", 200.0, 200_000.0, 9),
                        quote_item("T002", 17_000.0, 170_000.0, 12),
                    ],
                    15,
                ),
            )
            .unwrap();
            api.create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)
                .unwrap();

            let rec = api
                .generate_detailed_comparison(&inquiry.inquiry_id)
                .unwrap()
                .recommendation
                .unwrap();
            assert!(approx(rec.scores[0].total_score, rec.scores[1].total_score));
            assert!(approx(rec.scores[0].total_score, 1.0));
            assert_eq!(rec.price_winner.supplier_id, first);
            assert_eq!(rec.delivery_winner.supplier_id, first);
            assert_eq!(rec.composite_winner.supplier_id, first);
        }
    }
}
