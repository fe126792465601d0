// ==========================================
// 工程采购管理系统 - 询价单
// ==========================================
// 状态机: DRAFT -> SENT (不可逆, 需 >=1 明细 且 >=1 目标供应商)
//         SENT -> COMPLETED (外部设置)
// ==========================================

use crate::domain::types::InquiryStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 询价明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryItem {
    pub item_id: String,
    pub item_name: String,
    pub specification: String,
    pub unit: String,
    pub quantity: u32,
    pub estimated_unit_price: f64,
}

impl InquiryItem {
    /// 预估总价 = 数量 × 预估单价
    pub fn estimated_total_price(&self) -> f64 {
        self.quantity as f64 * self.estimated_unit_price
    }
}

/// 询价单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub inquiry_id: String,
    pub project_name: String,
    pub project_code: String,
    pub created_at: NaiveDateTime,
    pub expected_order_date: Option<NaiveDate>,
    pub sent_at: Option<NaiveDateTime>,
    pub items: Vec<InquiryItem>,
    pub target_supplier_ids: Vec<String>, // 弱引用, 仅保存编号
    pub status: InquiryStatus,
}

/// 发送前置条件不满足的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    NotDraft(InquiryStatus),
    NoItems,
    NoSuppliers,
}

impl Inquiry {
    pub fn new(
        inquiry_id: String,
        project_name: String,
        project_code: String,
        expected_order_date: Option<NaiveDate>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            inquiry_id,
            project_name,
            project_code,
            created_at: now,
            expected_order_date,
            sent_at: None,
            items: Vec::new(),
            target_supplier_ids: Vec::new(),
            status: InquiryStatus::Draft,
        }
    }

    pub fn add_item(&mut self, item: InquiryItem) {
        self.items.push(item);
    }

    /// 添加目标供应商（重复编号忽略）
    ///
    /// # 返回
    /// - 新增的数量
    pub fn add_target_suppliers<I>(&mut self, supplier_ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for id in supplier_ids {
            if !self.target_supplier_ids.contains(&id) {
                self.target_supplier_ids.push(id);
                added += 1;
            }
        }
        added
    }

    pub fn find_item(&self, item_id: &str) -> Option<&InquiryItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// 预估总金额
    pub fn estimated_total(&self) -> f64 {
        self.items.iter().map(|i| i.estimated_total_price()).sum()
    }

    /// 检查是否可发送
    pub fn check_sendable(&self) -> Result<(), SendRejection> {
        if self.status != InquiryStatus::Draft {
            return Err(SendRejection::NotDraft(self.status));
        }
        if self.items.is_empty() {
            return Err(SendRejection::NoItems);
        }
        if self.target_supplier_ids.is_empty() {
            return Err(SendRejection::NoSuppliers);
        }
        Ok(())
    }

    /// 发送询价单
    pub fn send(&mut self, now: NaiveDateTime) -> Result<(), SendRejection> {
        self.check_sendable()?;
        self.status = InquiryStatus::Sent;
        self.sent_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_item(id: &str) -> InquiryItem {
        InquiryItem {
            item_id: id.to_string(),
            item_name: "水泥".to_string(),
            specification: "P.O 42.5".to_string(),
            unit: "包".to_string(),
            quantity: 500,
            estimated_unit_price: 180.0,
        }
    }

    #[test]
    fn test_send_requires_items_then_suppliers() {
        let mut inquiry = Inquiry::new("INQ000001".into(), "A".into(), "P-A".into(), None, now());
        assert_eq!(inquiry.send(now()), Err(SendRejection::NoItems));

        inquiry.add_item(make_item("T001"));
        assert_eq!(inquiry.send(now()), Err(SendRejection::NoSuppliers));

        inquiry.add_target_suppliers(vec!["SUP001".to_string()]);
        assert!(inquiry.send(now()).is_ok());
        assert_eq!(inquiry.status, InquiryStatus::Sent);
        assert_eq!(inquiry.sent_at, Some(now()));

        // 不可重复发送
        assert_eq!(
            inquiry.send(now()),
            Err(SendRejection::NotDraft(InquiryStatus::Sent))
        );
    }

    #[test]
    fn test_duplicate_targets_ignored() {
        let mut inquiry = Inquiry::new("INQ000001".into(), "A".into(), "P-A".into(), None, now());
        let added = inquiry.add_target_suppliers(vec![
            "SUP001".to_string(),
            "SUP002".to_string(),
            "SUP001".to_string(),
        ]);
        assert_eq!(added, 2);
        assert_eq!(inquiry.target_supplier_ids, vec!["SUP001", "SUP002"]);
    }

    #[test]
    fn test_estimated_total() {
        let mut inquiry = Inquiry::new("INQ000001".into(), "A".into(), "P-A".into(), None, now());
        inquiry.add_item(make_item("T001"));
        assert_eq!(inquiry.estimated_total(), 90_000.0);
    }
}
