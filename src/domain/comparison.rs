// ==========================================
// 工程采购管理系统 - 比价表与比价分析结果
// ==========================================
// 比价表: 每个询价单一张, 重建即覆盖 (含决标结果)
// 报价单按编号引用, 不复制
// ==========================================

use crate::domain::types::{DeliveryRisk, PriceReasonableness};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 比价表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub inquiry_id: String,
    pub project_name: String,
    pub created_at: NaiveDateTime,
    pub quote_ids: Vec<String>, // 按提交顺序
    pub selected_supplier_id: Option<String>,
    pub decision_reason: Option<String>,
    pub decision_date: Option<NaiveDateTime>,
}

impl ComparisonTable {
    pub fn new(
        inquiry_id: String,
        project_name: String,
        quote_ids: Vec<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            inquiry_id,
            project_name,
            created_at: now,
            quote_ids,
            selected_supplier_id: None,
            decision_reason: None,
            decision_date: None,
        }
    }

    /// 记录决标结果（不校验该供应商是否报价）
    pub fn select_supplier(&mut self, supplier_id: String, reason: String, now: NaiveDateTime) {
        self.selected_supplier_id = Some(supplier_id);
        self.decision_reason = Some(reason);
        self.decision_date = Some(now);
    }

    pub fn is_decided(&self) -> bool {
        self.selected_supplier_id.is_some()
    }
}

// ==========================================
// 比价分析结果
// ==========================================

/// 详细比价分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedComparison {
    pub basic_info: ComparisonBasicInfo,
    pub supplier_summaries: Vec<SupplierSummary>,
    pub item_comparisons: Vec<ItemComparison>,
    /// 无报价时为 None
    pub pricing_analysis: Option<PricingAnalysis>,
    /// 无任何报价明细时为 None
    pub delivery_analysis: Option<DeliveryAnalysis>,
    /// 无报价时为 None
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonBasicInfo {
    pub inquiry_id: String,
    pub project_name: String,
    pub created_at: NaiveDateTime,
    pub quote_count: usize,
}

/// 供应商总览（同一供应商多次报价时以后提交者为准, 位置按首次出现）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub supplier_id: String,
    pub quote_id: String,
    pub total_amount: f64,
    pub payment_terms: String,
    pub validity_days: u32,
    pub average_delivery_days: f64,
    /// 单价竞争力: 该供应商报价项目中单价为最低价的比例 (%)
    pub competitiveness_pct: f64,
}

/// 单个供应商对某项目的报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOffer {
    pub supplier_id: String,
    pub unit_price: f64,
    pub total_price: f64,
    pub delivery_days: u32,
}

/// 项目比较
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemComparison {
    pub item_id: String,
    pub offers: Vec<ItemOffer>,
    pub min_unit_price: f64,
    pub max_unit_price: f64,
    /// (max - min) / min × 100
    pub price_spread_pct: f64,
    /// 变异系数 = 总体标准差 / 平均值
    pub coefficient_of_variation: f64,
    pub reasonableness: PriceReasonableness,
}

/// 总价分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingAnalysis {
    pub min_total: f64,
    pub max_total: f64,
    pub mean_total: f64,
    pub spread: f64,
    pub spread_pct: f64,
}

/// 交期分析（所有报价明细合并统计）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAnalysis {
    pub min_days: u32,
    pub max_days: u32,
    pub mean_days: f64,
    pub risk: DeliveryRisk,
}

/// 候选报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub supplier_id: String,
    pub quote_id: String,
}

/// 单个报价的综合评分明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteScore {
    pub supplier_id: String,
    pub quote_id: String,
    pub price_score: f64,
    pub delivery_score: f64,
    pub validity_score: f64,
    pub total_score: f64,
}

/// 决标建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub price_winner: Candidate,
    pub delivery_winner: Candidate,
    pub composite_winner: Candidate,
    pub scores: Vec<QuoteScore>,
}

// ==========================================
// 比价导出结构
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonExport {
    pub basic_info: ComparisonBasicInfo,
    pub supplier_rows: Vec<SupplierSummary>,
    pub item_rows: Vec<ItemComparisonRow>,
    pub analysis: ComparisonExportAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemComparisonRow {
    pub item_id: String,
    pub min_unit_price: f64,
    pub max_unit_price: f64,
    pub price_spread_pct: f64,
    pub reasonableness: PriceReasonableness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonExportAnalysis {
    pub pricing: Option<PricingAnalysis>,
    pub delivery: Option<DeliveryAnalysis>,
    pub recommended_supplier_id: Option<String>,
}
