// ==========================================
// 工程采购管理系统 - 比价引擎
// ==========================================
// 红线: Engine 不拼 SQL
// 输入: 比价表 + 其引用的报价单 (按提交顺序)
// 输出: DetailedComparison (供应商总览 / 项目比较 / 总价与交期分析 / 决标建议)
// 并列: 一律取先出现者
// ==========================================

use crate::config::policy::{DeliveryRiskThresholds, ProcurementPolicy, ReasonablenessThresholds};
use crate::domain::comparison::{
    Candidate, ComparisonBasicInfo, ComparisonExport, ComparisonExportAnalysis, ComparisonTable,
    DeliveryAnalysis, DetailedComparison, ItemComparison, ItemComparisonRow, ItemOffer,
    PricingAnalysis, QuoteScore, Recommendation, SupplierSummary,
};
use crate::domain::quote::Quote;
use crate::domain::types::{DeliveryRisk, PriceReasonableness};
use crate::engine::scoring::composite_score;
use crate::engine::statistics;
use tracing::instrument;

// ==========================================
// ComparisonEngine - 比价引擎
// ==========================================
pub struct ComparisonEngine {
    // 无状态引擎,不需要注入依赖
}

impl ComparisonEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成详细比价分析
    ///
    /// # 参数
    /// - `table`: 比价表
    /// - `quotes`: 比价表引用的报价单, 按提交顺序
    /// - `policy`: 评分权重与阈值
    #[instrument(skip_all, fields(inquiry_id = %table.inquiry_id, quotes = quotes.len()))]
    pub fn generate_detailed(
        &self,
        table: &ComparisonTable,
        quotes: &[Quote],
        policy: &ProcurementPolicy,
    ) -> DetailedComparison {
        let item_comparisons = self.compare_items(quotes, &policy.reasonableness);
        let supplier_summaries = self.summarize_suppliers(quotes, &item_comparisons);

        DetailedComparison {
            basic_info: ComparisonBasicInfo {
                inquiry_id: table.inquiry_id.clone(),
                project_name: table.project_name.clone(),
                created_at: table.created_at,
                quote_count: quotes.len(),
            },
            supplier_summaries,
            item_comparisons,
            pricing_analysis: self.analyze_pricing(quotes),
            delivery_analysis: self.analyze_delivery(quotes, &policy.delivery_risk),
            recommendation: self.recommend(quotes, policy),
        }
    }

    /// 生成比价导出结构
    pub fn build_export(&self, detailed: &DetailedComparison) -> ComparisonExport {
        ComparisonExport {
            basic_info: detailed.basic_info.clone(),
            supplier_rows: detailed.supplier_summaries.clone(),
            item_rows: detailed
                .item_comparisons
                .iter()
                .map(|c| ItemComparisonRow {
                    item_id: c.item_id.clone(),
                    min_unit_price: c.min_unit_price,
                    max_unit_price: c.max_unit_price,
                    price_spread_pct: c.price_spread_pct,
                    reasonableness: c.reasonableness,
                })
                .collect(),
            analysis: ComparisonExportAnalysis {
                pricing: detailed.pricing_analysis.clone(),
                delivery: detailed.delivery_analysis.clone(),
                recommended_supplier_id: detailed
                    .recommendation
                    .as_ref()
                    .map(|r| r.composite_winner.supplier_id.clone()),
            },
        }
    }

    // ==========================================
    // 项目比较
    // ==========================================

    /// 按项目汇总各供应商报价 (项目按首次出现排序, 同一供应商后报价覆盖先报价)
    pub fn compare_items(
        &self,
        quotes: &[Quote],
        thresholds: &ReasonablenessThresholds,
    ) -> Vec<ItemComparison> {
        let mut grouped: Vec<(String, Vec<ItemOffer>)> = Vec::new();

        for quote in quotes {
            for item in &quote.items {
                let offer = ItemOffer {
                    supplier_id: quote.supplier_id.clone(),
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                    delivery_days: item.delivery_days,
                };
                let idx = match grouped.iter().position(|(id, _)| *id == item.item_id) {
                    Some(idx) => idx,
                    None => {
                        grouped.push((item.item_id.clone(), Vec::new()));
                        grouped.len() - 1
                    }
                };
                let offers = &mut grouped[idx].1;
                match offers.iter_mut().find(|o| o.supplier_id == offer.supplier_id) {
                    Some(existing) => *existing = offer,
                    None => offers.push(offer),
                }
            }
        }

        grouped
            .into_iter()
            .map(|(item_id, offers)| {
                let prices: Vec<f64> = offers.iter().map(|o| o.unit_price).collect();
                let min_unit_price = statistics::min(&prices).unwrap_or(0.0);
                let max_unit_price = statistics::max(&prices).unwrap_or(0.0);
                let cv = statistics::coefficient_of_variation(&prices).unwrap_or(0.0);
                ItemComparison {
                    item_id,
                    offers,
                    min_unit_price,
                    max_unit_price,
                    price_spread_pct: statistics::spread_pct(min_unit_price, max_unit_price),
                    coefficient_of_variation: cv,
                    reasonableness: classify_reasonableness(cv, thresholds),
                }
            })
            .collect()
    }

    // ==========================================
    // 供应商总览
    // ==========================================

    fn summarize_suppliers(
        &self,
        quotes: &[Quote],
        item_comparisons: &[ItemComparison],
    ) -> Vec<SupplierSummary> {
        let mut summaries: Vec<SupplierSummary> = Vec::new();

        for quote in quotes {
            let summary = SupplierSummary {
                supplier_id: quote.supplier_id.clone(),
                quote_id: quote.quote_id.clone(),
                total_amount: quote.total_amount,
                payment_terms: quote.payment_terms.clone(),
                validity_days: quote.validity_days,
                average_delivery_days: quote.average_delivery_days(),
                competitiveness_pct: competitiveness(&quote.supplier_id, item_comparisons),
            };
            match summaries.iter_mut().find(|s| s.supplier_id == summary.supplier_id) {
                Some(existing) => *existing = summary,
                None => summaries.push(summary),
            }
        }
        summaries
    }

    // ==========================================
    // 总价 / 交期分析
    // ==========================================

    pub fn analyze_pricing(&self, quotes: &[Quote]) -> Option<PricingAnalysis> {
        let totals: Vec<f64> = quotes.iter().map(|q| q.total_amount).collect();
        let min_total = statistics::min(&totals)?;
        let max_total = statistics::max(&totals)?;
        let mean_total = statistics::mean(&totals)?;
        Some(PricingAnalysis {
            min_total,
            max_total,
            mean_total,
            spread: max_total - min_total,
            spread_pct: statistics::spread_pct(min_total, max_total),
        })
    }

    pub fn analyze_delivery(
        &self,
        quotes: &[Quote],
        thresholds: &DeliveryRiskThresholds,
    ) -> Option<DeliveryAnalysis> {
        let days: Vec<u32> = quotes
            .iter()
            .flat_map(|q| q.items.iter().map(|i| i.delivery_days))
            .collect();
        let min_days = *days.iter().min()?;
        let max_days = *days.iter().max()?;
        let as_f64: Vec<f64> = days.iter().map(|d| *d as f64).collect();
        let mean_days = statistics::mean(&as_f64)?;

        let risk = if max_days > thresholds.high_above_days {
            DeliveryRisk::High
        } else if max_days > thresholds.medium_above_days {
            DeliveryRisk::Medium
        } else {
            DeliveryRisk::Low
        };

        Some(DeliveryAnalysis {
            min_days,
            max_days,
            mean_days,
            risk,
        })
    }

    // ==========================================
    // 决标建议
    // ==========================================

    /// 最低价 / 最快交期 / 综合评分 三项建议
    pub fn recommend(&self, quotes: &[Quote], policy: &ProcurementPolicy) -> Option<Recommendation> {
        let first = quotes.first()?;

        let mut price_winner = first;
        let mut delivery_winner = first;
        for quote in quotes.iter().skip(1) {
            if quote.total_amount < price_winner.total_amount {
                price_winner = quote;
            }
            if quote.average_delivery_days() < delivery_winner.average_delivery_days() {
                delivery_winner = quote;
            }
        }
        let min_total = price_winner.total_amount;
        let best_avg = delivery_winner.average_delivery_days();

        let scores: Vec<QuoteScore> = quotes
            .iter()
            .map(|q| {
                let parts = composite_score(
                    q.total_amount,
                    min_total,
                    q.average_delivery_days(),
                    best_avg,
                    q.validity_days,
                    &policy.scoring,
                );
                QuoteScore {
                    supplier_id: q.supplier_id.clone(),
                    quote_id: q.quote_id.clone(),
                    price_score: parts.price_score,
                    delivery_score: parts.delivery_score,
                    validity_score: parts.validity_score,
                    total_score: parts.total(),
                }
            })
            .collect();

        let mut best_idx = 0;
        for (idx, score) in scores.iter().enumerate().skip(1) {
            if score.total_score > scores[best_idx].total_score {
                best_idx = idx;
            }
        }
        let composite = &quotes[best_idx];

        tracing::debug!(
            price_winner = %price_winner.supplier_id,
            delivery_winner = %delivery_winner.supplier_id,
            composite_winner = %composite.supplier_id,
            "决标建议已生成"
        );

        Some(Recommendation {
            price_winner: candidate(price_winner),
            delivery_winner: candidate(delivery_winner),
            composite_winner: candidate(composite),
            scores,
        })
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn candidate(quote: &Quote) -> Candidate {
    Candidate {
        supplier_id: quote.supplier_id.clone(),
        quote_id: quote.quote_id.clone(),
    }
}

/// 单价竞争力: 该供应商报价的项目中, 单价等于最低价的比例 (并列均计入)
fn competitiveness(supplier_id: &str, item_comparisons: &[ItemComparison]) -> f64 {
    let mut quoted = 0usize;
    let mut lowest = 0usize;
    for comparison in item_comparisons {
        if let Some(offer) = comparison.offers.iter().find(|o| o.supplier_id == supplier_id) {
            quoted += 1;
            if offer.unit_price == comparison.min_unit_price {
                lowest += 1;
            }
        }
    }
    statistics::pct(lowest as f64, quoted as f64)
}

pub fn classify_reasonableness(cv: f64, thresholds: &ReasonablenessThresholds) -> PriceReasonableness {
    if cv < thresholds.high_consistency_below {
        PriceReasonableness::HighConsistency
    } else if cv < thresholds.reasonable_below {
        PriceReasonableness::ReasonableVariance
    } else if cv < thresholds.large_below {
        PriceReasonableness::LargeVariance
    } else {
        PriceReasonableness::ExcessiveVariance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::QuoteItem;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn item(id: &str, unit_price: f64, qty: f64, days: u32) -> QuoteItem {
        QuoteItem {
            item_id: id.to_string(),
            unit_price,
            total_price: unit_price * qty,
            delivery_days: days,
            remarks: String::new(),
        }
    }

    fn quote(id: &str, supplier: &str, validity: u32, items: Vec<QuoteItem>) -> Quote {
        let mut q = Quote::new(
            id.to_string(),
            "INQ000001".into(),
            supplier.to_string(),
            "月結30天".into(),
            validity,
            now(),
        );
        for i in items {
            q.add_quote_item(i);
        }
        q
    }

    fn table() -> ComparisonTable {
        ComparisonTable::new("INQ000001".into(), "A".into(), vec![], now())
    }

    #[test]
    fn test_item_comparison_and_competitiveness() {
        let quotes = vec![
            quote("Q1", "S1", 30, vec![item("T001", 180.0, 500.0, 7), item("T002", 5_500.0, 20.0, 10)]),
            quote("Q2", "S2", 30, vec![item("T001", 175.0, 500.0, 5), item("T002", 5_500.0, 20.0, 12)]),
        ];
        let engine = ComparisonEngine::new();
        let result = engine.generate_detailed(&table(), &quotes, &ProcurementPolicy::default());

        assert_eq!(result.item_comparisons.len(), 2);
        assert_eq!(result.item_comparisons[0].min_unit_price, 175.0);
        assert_eq!(result.supplier_summaries[0].competitiveness_pct, 50.0);
        assert_eq!(result.supplier_summaries[1].competitiveness_pct, 100.0);
        assert_eq!(
            result.item_comparisons[1].reasonableness,
            PriceReasonableness::HighConsistency
        );
    }

    #[test]
    fn test_same_supplier_later_quote_overrides() {
        let quotes = vec![
            quote("Q1", "S1", 30, vec![item("T001", 200.0, 1.0, 7)]),
            quote("Q2", "S2", 30, vec![item("T001", 190.0, 1.0, 7)]),
            quote("Q3", "S1", 30, vec![item("T001", 180.0, 1.0, 7)]),
        ];
        let result = ComparisonEngine::new().generate_detailed(&table(), &quotes, &ProcurementPolicy::default());
        assert_eq!(result.supplier_summaries.len(), 2);
        assert_eq!(result.supplier_summaries[0].quote_id, "Q3");
        assert_eq!(result.item_comparisons[0].offers.len(), 2);
        assert_eq!(result.item_comparisons[0].offers[0].unit_price, 180.0);
    }

    #[test]
    fn test_empty_quotes_have_no_analysis() {
        let result = ComparisonEngine::new().generate_detailed(&table(), &[], &ProcurementPolicy::default());
        assert!(result.pricing_analysis.is_none());
        assert!(result.delivery_analysis.is_none());
        assert!(result.recommendation.is_none());

        let no_items = vec![quote("Q1", "S1", 30, vec![])];
        let result = ComparisonEngine::new().generate_detailed(&table(), &no_items, &ProcurementPolicy::default());
        assert!(result.pricing_analysis.is_some());
        assert!(result.delivery_analysis.is_none());
    }

    #[test]
    fn test_delivery_risk_levels() {
        let engine = ComparisonEngine::new();
        let t = DeliveryRiskThresholds::default();
        let risk = |days: u32| {
            engine
                .analyze_delivery(&[quote("Q", "S", 30, vec![item("T", 1.0, 1.0, days)])], &t)
                .unwrap()
                .risk
        };
        assert_eq!(risk(31), DeliveryRisk::High);
        assert_eq!(risk(30), DeliveryRisk::Medium);
        assert_eq!(risk(14), DeliveryRisk::Low);
    }

    #[test]
    fn test_reasonableness_bands() {
        let t = ReasonablenessThresholds::default();
        assert_eq!(classify_reasonableness(0.05, &t), PriceReasonableness::HighConsistency);
        assert_eq!(classify_reasonableness(0.10, &t), PriceReasonableness::ReasonableVariance);
        assert_eq!(classify_reasonableness(0.25, &t), PriceReasonableness::LargeVariance);
        assert_eq!(classify_reasonableness(0.30, &t), PriceReasonableness::ExcessiveVariance);
    }
}
