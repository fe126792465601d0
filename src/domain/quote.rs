// ==========================================
// 工程采购管理系统 - 报价单
// ==========================================
// 不变量: total_amount == Σ items.total_price (每次追加明细后重算)
// 同一 (询价单, 供应商) 可多次提交, 每次生成独立报价单
// ==========================================

use crate::domain::types::QuoteStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 报价明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub item_id: String,
    pub unit_price: f64,
    pub total_price: f64,
    pub delivery_days: u32, // 交货天数
    #[serde(default)]
    pub remarks: String,
}

/// 报价单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: String,
    pub inquiry_id: String,
    pub supplier_id: String,
    pub quoted_date: NaiveDateTime,
    pub items: Vec<QuoteItem>,
    pub payment_terms: String,
    pub validity_days: u32, // 报价有效天数
    pub total_amount: f64,
    pub status: QuoteStatus,
}

/// 报价提交输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuoteSubmission {
    #[serde(default)]
    pub items: Vec<QuoteItem>,
    #[serde(default)]
    pub payment_terms: String,
    /// 缺省时取配置的默认有效天数
    #[serde(default)]
    pub validity_days: Option<u32>,
}

impl Quote {
    pub fn new(
        quote_id: String,
        inquiry_id: String,
        supplier_id: String,
        payment_terms: String,
        validity_days: u32,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            quote_id,
            inquiry_id,
            supplier_id,
            quoted_date: now,
            items: Vec::new(),
            payment_terms,
            validity_days,
            total_amount: 0.0,
            status: QuoteStatus::Submitted,
        }
    }

    /// 追加报价明细并重算总额
    pub fn add_quote_item(&mut self, item: QuoteItem) {
        self.items.push(item);
        self.recalculate_total();
    }

    fn recalculate_total(&mut self) {
        self.total_amount = self.items.iter().map(|i| i.total_price).sum();
    }

    /// 平均交货天数（无明细时为 0）
    pub fn average_delivery_days(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.items.iter().map(|i| i.delivery_days as u64).sum();
        sum as f64 / self.items.len() as f64
    }

    /// 最长交货天数（无明细时为 0）
    pub fn max_delivery_days(&self) -> u32 {
        self.items.iter().map(|i| i.delivery_days).max().unwrap_or(0)
    }

    pub fn find_item(&self, item_id: &str) -> Option<&QuoteItem> {
        self.items.iter().find(|i| i.item_id == item_id)
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

    fn item(id: &str, unit_price: f64, total: f64, days: u32) -> QuoteItem {
        QuoteItem {
            item_id: id.to_string(),
            unit_price,
            total_price: total,
            delivery_days: days,
            remarks: String::new(),
        }
    }

    #[test]
    fn test_total_is_sum_after_every_addition() {
        let mut quote = Quote::new(
            "QUO000001".into(),
            "INQ000001".into(),
            "SUP001".into(),
            "月結30天".into(),
            30,
            now(),
        );
        assert_eq!(quote.total_amount, 0.0);

        let items = [
            item("T001", 180.0, 90_000.0, 7),
            item("T002", 5.5, 110_000.0, 10),
            item("T003", 21_000.0, 315_000.0, 14),
        ];
        for it in items {
            quote.add_quote_item(it);
            let expected: f64 = quote.items.iter().map(|i| i.total_price).sum();
            assert_eq!(quote.total_amount, expected);
        }
        assert_eq!(quote.total_amount, 515_000.0);
    }

    #[test]
    fn test_delivery_days_aggregates() {
        let mut quote = Quote::new("Q".into(), "I".into(), "S".into(), String::new(), 30, now());
        assert_eq!(quote.average_delivery_days(), 0.0);
        assert_eq!(quote.max_delivery_days(), 0);

        quote.add_quote_item(item("T001", 1.0, 1.0, 7));
        quote.add_quote_item(item("T002", 1.0, 1.0, 14));
        assert_eq!(quote.average_delivery_days(), 10.5);
        assert_eq!(quote.max_delivery_days(), 14);
    }
}
