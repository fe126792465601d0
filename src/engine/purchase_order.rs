// ==========================================
// 工程采购管理系统 - 采购单引擎
// ==========================================
// 红线: Engine 不拼 SQL, 拒绝必须给出原因
// 职责:
// - 由决标报价 + 原询价单生成采购单
// - 确认判定 (状态 -> 预算校验 -> 扣减 -> 确认 -> 成本控制记录)
// - 交货登记与延误天数
// ==========================================

use crate::domain::budget::{BudgetRecord, ConfirmRejection};
use crate::domain::inquiry::Inquiry;
use crate::domain::purchase_order::{CostControlRecord, PurchaseOrder, PurchaseOrderItem};
use crate::domain::quote::Quote;
use crate::domain::types::{DeliveryStatus, PurchaseOrderStatus};
use crate::engine::budget::BudgetEngine;
use crate::engine::statistics::ceil_days_between;
use crate::i18n;
use chrono::{Duration, NaiveDateTime};
use tracing::instrument;

/// 采购单生成参数
#[derive(Debug, Clone)]
pub struct OrderDraft<'a> {
    pub po_id: String,
    pub inquiry: &'a Inquiry,
    pub supplier_id: String,
    pub quote: &'a Quote,
    pub project_name: String,
    pub delivery_address: String,
}

pub struct PurchaseOrderEngine {
    // 无状态引擎,不需要注入依赖
}

impl PurchaseOrderEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成采购单
    ///
    /// 明细取自原询价单 (名称/规格/单位/数量) + 报价单价;
    /// 询价单中找不到的项目使用占位描述 (数量 1) 并记 warn。
    /// 预计到货 = now + 报价最长交货天数
    #[instrument(skip_all, fields(po_id = %draft.po_id, quote_id = %draft.quote.quote_id))]
    pub fn build_order(&self, draft: OrderDraft<'_>, now: NaiveDateTime) -> PurchaseOrder {
        let mut po = PurchaseOrder::new(
            draft.po_id,
            draft.inquiry.inquiry_id.clone(),
            draft.supplier_id,
            draft.project_name,
            now,
        );
        po.payment_terms = draft.quote.payment_terms.clone();
        po.delivery_address = draft.delivery_address;
        po.expected_delivery_date =
            Some(now + Duration::days(draft.quote.max_delivery_days() as i64));

        for quote_item in &draft.quote.items {
            let item = match draft.inquiry.find_item(&quote_item.item_id) {
                Some(source) => PurchaseOrderItem::new(
                    quote_item.item_id.clone(),
                    source.item_name.clone(),
                    source.specification.clone(),
                    source.unit.clone(),
                    source.quantity,
                    quote_item.unit_price,
                ),
                None => {
                    tracing::warn!(
                        item_id = %quote_item.item_id,
                        inquiry_id = %draft.inquiry.inquiry_id,
                        "询价单中无此项目，使用占位描述"
                    );
                    placeholder_item(&quote_item.item_id, quote_item.unit_price)
                }
            };
            po.add_item(item);
        }
        po
    }

    /// 确认判定（在确认事务内执行）
    ///
    /// # 返回
    /// - Ok(CostControlRecord): 已扣减预算并标记确认, 由调用方落库
    /// - Err(ConfirmRejection): 拒绝, 入参未被修改
    pub fn decide_confirmation(
        &self,
        po: &mut PurchaseOrder,
        budget: Option<&mut BudgetRecord>,
        now: NaiveDateTime,
    ) -> Result<CostControlRecord, ConfirmRejection> {
        if po.status != PurchaseOrderStatus::Created {
            return Err(ConfirmRejection::NotCreated {
                current: po.status.to_string(),
            });
        }

        BudgetEngine::new()
            .validate(po, budget.as_deref())
            .map_err(ConfirmRejection::Budget)?;

        if let Some(record) = budget {
            record.deduct(po.total_amount, now);
        }
        po.confirm(now);
        Ok(CostControlRecord::purchased(po, now))
    }

    /// 登记交货
    ///
    /// 延误天数 = ceil((实际 - 预计) / 1 天); 无预计日期时不计算
    pub fn apply_delivery(
        &self,
        po: &mut PurchaseOrder,
        actual: NaiveDateTime,
        delivery_status: DeliveryStatus,
        now: NaiveDateTime,
    ) {
        po.actual_delivery_date = Some(actual);
        po.delivery_status = Some(delivery_status);
        po.delivery_delay_days = po
            .expected_delivery_date
            .map(|expected| ceil_days_between(expected, actual));
        po.last_updated_at = Some(now);

        match po.delivery_delay_days {
            Some(days) if days > 0 => {
                tracing::info!(po_id = %po.po_id, delay_days = days, "采购单延误交货")
            }
            _ => tracing::info!(po_id = %po.po_id, "采购单准时交货"),
        }
    }
}

impl Default for PurchaseOrderEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder_item(item_id: &str, unit_price: f64) -> PurchaseOrderItem {
    PurchaseOrderItem::new(
        item_id.to_string(),
        i18n::placeholder_item_name(item_id),
        i18n::placeholder_specification(),
        i18n::placeholder_unit(),
        1,
        unit_price,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::budget::BudgetRejection;
    use crate::domain::inquiry::InquiryItem;
    use crate::domain::quote::QuoteItem;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn inquiry() -> Inquiry {
        let mut inquiry = Inquiry::new("INQ000001".into(), "A".into(), "P-A".into(), None, now());
        inquiry.add_item(InquiryItem {
            item_id: "T001".into(),
            item_name: "水泥".into(),
            specification: "P.O 42.5".into(),
            unit: "包".into(),
            quantity: 500,
            estimated_unit_price: 185.0,
        });
        inquiry
    }

    fn quote() -> Quote {
        let mut q = Quote::new("QUO000001".into(), "INQ000001".into(), "S1".into(), "月結30天".into(), 30, now());
        for (id, price, days) in [("T001", 180.0, 7), ("X999", 50.0, 12)] {
            q.add_quote_item(QuoteItem {
                item_id: id.into(),
                unit_price: price,
                total_price: price,
                delivery_days: days,
                remarks: String::new(),
            });
        }
        q
    }

    fn build() -> PurchaseOrder {
        let (inquiry, quote) = (inquiry(), quote());
        PurchaseOrderEngine::new().build_order(
            OrderDraft {
                po_id: "PO000001".into(),
                inquiry: &inquiry,
                supplier_id: "S1".into(),
                quote: &quote,
                project_name: "A".into(),
                delivery_address: "工地".into(),
            },
            now(),
        )
    }

    #[test]
    fn test_build_resolves_items_from_inquiry() {
        let po = build();
        assert_eq!(po.items[0].quantity, 500);
        assert_eq!(po.items[0].item_name, "水泥");
        assert_eq!(po.items[1].quantity, 1);
        assert_eq!(po.total_amount, 90_000.0 + 50.0);
        assert_eq!(po.expected_delivery_date, Some(now() + Duration::days(12)));
        assert_eq!(po.payment_terms, "月結30天");
    }

    #[test]
    fn test_confirmation_rejections_leave_inputs_unchanged() {
        let engine = PurchaseOrderEngine::new();
        let mut po = build();
        let mut budget = BudgetRecord::new("A".into(), 1_000.0, 0.0, now());

        let err = engine.decide_confirmation(&mut po, Some(&mut budget), now()).unwrap_err();
        assert!(matches!(err, ConfirmRejection::Budget(BudgetRejection::InsufficientBudget { .. })));
        assert_eq!(po.status, PurchaseOrderStatus::Created);
        assert_eq!(budget.used_budget, 0.0);

        let mut budget = BudgetRecord::new("A".into(), 1_000_000.0, 0.0, now());
        let record = engine.decide_confirmation(&mut po, Some(&mut budget), now()).unwrap();
        assert_eq!(record.amount, po.total_amount);
        assert_eq!(budget.used_budget, po.total_amount);

        let err = engine.decide_confirmation(&mut po, Some(&mut budget), now()).unwrap_err();
        assert!(matches!(err, ConfirmRejection::NotCreated { .. }));
        assert_eq!(budget.used_budget, po.total_amount);
    }

    #[test]
    fn test_delivery_delay_is_ceiled() {
        let engine = PurchaseOrderEngine::new();
        let mut po = build();
        let expected = po.expected_delivery_date.unwrap();
        engine.apply_delivery(&mut po, expected + Duration::hours(25), DeliveryStatus::Delivered, now());
        assert_eq!(po.delivery_delay_days, Some(2));
        assert!(!po.is_on_time());

        engine.apply_delivery(&mut po, expected - Duration::days(1), DeliveryStatus::Delivered, now());
        assert_eq!(po.delivery_delay_days, Some(-1));
        assert!(po.is_on_time());
    }
}
