// ==========================================
// 工程采购管理系统 - 报表结构
// ==========================================
// 只读汇总结构, 字段名稳定 (snake_case), 供报表/界面层渲染
// 百分比以原始 f64 保存, 取整属于展示层
// ==========================================

use crate::domain::purchase_order::PurchaseOrderItem;
use crate::domain::types::{
    DeliveryStatus, InquiryStatus, MaterialCategory, PurchaseOrderStatus, ReportType,
    ScheduleItemStatus,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 统计期间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// None 表示全部项目
    pub project_name: Option<String>,
}

impl ReportPeriod {
    /// 创建日期是否落在期间内（含两端）
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.date();
        if let Some(from) = self.date_from {
            if day < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if day > to {
                return false;
            }
        }
        true
    }
}

// ==========================================
// 采购报表
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReport {
    pub period: ReportPeriod,
    pub overall: PurchaseOverallStats,
    pub delivery_performance: DeliveryPerformance,
    pub supplier_performance: Vec<SupplierPerformance>,
    pub details: Vec<PurchaseReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOverallStats {
    pub order_count: usize,
    pub total_amount: f64,
    pub confirmed_count: usize,
    /// 已确认但未到货
    pub pending_delivery_count: usize,
    pub delivered_count: usize,
}

/// 交期表现（仅统计已到货采购单）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPerformance {
    pub delivered_count: usize,
    pub on_time_rate_pct: f64,
    /// 正延误天数之和 / 已到货数
    pub average_delay_days: f64,
    pub max_delay_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPerformance {
    pub supplier_id: String,
    pub order_count: usize,
    pub total_amount: f64,
    pub on_time_count: usize,
    pub delivered_count: usize,
    /// 无到货记录时为 None
    pub on_time_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReportRow {
    pub po_id: String,
    pub project_name: String,
    pub supplier_id: String,
    pub created_at: NaiveDateTime,
    pub total_amount: f64,
    pub status: PurchaseOrderStatus,
    pub expected_delivery_date: Option<NaiveDateTime>,
    pub actual_delivery_date: Option<NaiveDateTime>,
    pub delivery_delay_days: i64,
}

// ==========================================
// 施工进度报表
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub project_name: String,
    pub project_code: String,
    pub created_at: NaiveDateTime,
    pub overall_progress: f64,
    pub status_counts: ScheduleStatusCounts,
    pub delivery_analysis: ScheduleDeliveryAnalysis,
    pub progress_distribution: ProgressDistribution,
    pub items: Vec<ScheduleReportRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStatusCounts {
    pub total: usize,
    pub pending: usize,
    pub delivered: usize,
    pub completed: usize,
    /// 待交货且已过预计交期
    pub overdue: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDeliveryAnalysis {
    pub on_time: usize,
    pub late: usize,
    pub pending: usize,
    /// 仅对延误项求平均
    pub average_delay_days: f64,
    pub max_delay_days: i64,
    /// 准时 / (准时 + 延误); 无到货项时为 None
    pub on_time_rate_pct: Option<f64>,
}

/// 施工进度分布 (0 / 1-25 / 26-50 / 51-75 / 76-99 / 100)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressDistribution {
    pub not_started: usize,
    pub pct_1_25: usize,
    pub pct_26_50: usize,
    pub pct_51_75: usize,
    pub pct_76_99: usize,
    pub finished: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReportRow {
    pub po_id: String,
    pub item_name: String,
    pub expected_delivery_date: NaiveDateTime,
    pub actual_delivery_date: Option<NaiveDateTime>,
    pub construction_progress: f64,
    pub status: ScheduleItemStatus,
    /// 已到货: max(0, 延误天数); 未到货且逾期: 逾期天数; 否则 0
    pub delay_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingDelivery {
    pub po_id: String,
    pub item_name: String,
    pub expected_delivery_date: NaiveDateTime,
    pub remaining_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueItem {
    pub po_id: String,
    pub item_name: String,
    pub expected_delivery_date: NaiveDateTime,
    pub overdue_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDashboard {
    pub project_count: usize,
    pub active_count: usize,
    pub completed_count: usize,
    pub unread_alert_count: usize,
    pub projects: Vec<DashboardProjectRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardProjectRow {
    pub project_name: String,
    pub project_code: String,
    pub overall_progress: f64,
    pub item_count: usize,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleExport {
    pub report: ScheduleReport,
    pub upcoming: Vec<UpcomingDelivery>,
    pub overdue: Vec<OverdueItem>,
}

// ==========================================
// 询价单报表 / 导出
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryReport {
    pub total: usize,
    pub draft: usize,
    pub sent: usize,
    pub completed: usize,
    pub rows: Vec<InquiryReportRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryReportRow {
    pub inquiry_id: String,
    pub project_name: String,
    pub project_code: String,
    pub created_at: NaiveDateTime,
    pub status: InquiryStatus,
    pub item_count: usize,
    pub supplier_count: usize,
    pub estimated_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryExport {
    pub row: InquiryReportRow,
    pub expected_order_date: Option<NaiveDate>,
    pub items: Vec<crate::domain::inquiry::InquiryItem>,
    pub suppliers: Vec<InquirySupplierRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquirySupplierRow {
    pub supplier_id: String,
    pub company_name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
}

// ==========================================
// 工程采购明细报表
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringReport {
    pub summary: EngineeringSummary,
    pub phases: Vec<PhaseStats>,
    pub suppliers: Vec<SupplierPurchaseStats>,
    pub details: Vec<EngineeringDetailRow>,
    pub cost_breakdown: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringSummary {
    pub order_count: usize,
    pub total_amount: f64,
    pub confirmed_count: usize,
    pub in_progress_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub phase: String,
    pub order_count: usize,
    pub total_amount: f64,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPurchaseStats {
    pub supplier_id: String,
    pub order_count: usize,
    pub total_amount: f64,
    pub distinct_item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringDetailRow {
    pub po_id: String,
    pub supplier_id: String,
    pub supplier_name: String,
    pub project_phase: String,
    pub total_amount: f64,
    pub delivery_status: Option<DeliveryStatus>,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub total_cost: f64,
    pub categories: Vec<CategoryCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCost {
    pub category: MaterialCategory,
    pub amount: f64,
    pub share_pct: f64,
}

// ==========================================
// 材料采购明细报表
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialReport {
    pub summary: MaterialSummary,
    pub categories: Vec<MaterialCategoryStats>,
    pub suppliers: Vec<SupplierMaterialStats>,
    pub materials: Vec<MaterialRow>,
    pub price_analysis: Vec<MaterialPriceAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub material_count: usize,
    pub total_amount: f64,
    pub supplier_count: usize,
    /// 无供货记录时为 None
    pub unit_price_range: Option<UnitPriceRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPriceRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCategoryStats {
    pub category: MaterialCategory,
    pub material_count: usize,
    pub total_amount: f64,
    pub total_quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierMaterialStats {
    pub supplier_id: String,
    pub material_count: usize,
    pub total_amount: f64,
    pub lines: Vec<SupplierMaterialLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierMaterialLine {
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// 按 (品名, 规格) 合并的材料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub item_name: String,
    pub specification: String,
    pub unit: String,
    pub total_quantity: u64,
    pub total_amount: f64,
    /// 总数量为 0 时为 0
    pub average_unit_price: f64,
    pub suppliers: Vec<MaterialSupplyLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSupplyLine {
    pub supplier_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// 多家供货的材料单价分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPriceAnalysis {
    pub item_name: String,
    pub min_unit_price: f64,
    pub max_unit_price: f64,
    pub mean_unit_price: f64,
    pub spread: f64,
    pub spread_pct: f64,
    pub supplier_line_count: usize,
}

// ==========================================
// 项目比较报表
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeReport {
    pub generated_at: NaiveDateTime,
    pub projects: Vec<ProjectComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectComparison {
    pub project_name: String,
    pub order_count: usize,
    pub total_amount: f64,
    pub average_order_amount: f64,
    pub supplier_count: usize,
    pub cost_efficiency: CostEfficiency,
    pub cost_breakdown: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEfficiency {
    pub average_cost_per_item: f64,
    pub order_count: usize,
    /// 前三大供应商金额占比 (%)
    pub top3_supplier_concentration_pct: f64,
}

// ==========================================
// 已保存报表 / 报表范本
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPayload {
    Engineering(EngineeringReport),
    Material(MaterialReport),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub report_id: String,
    pub report_type: ReportType,
    pub project_name: String,
    pub generated_at: NaiveDateTime,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub payload: ReportPayload,
}

/// 报表导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportExportFormat {
    Summary,
    Detailed,
}

/// 报表导出结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportExport {
    Summary {
        report_id: String,
        report_type: ReportType,
        project_name: String,
        generated_at: NaiveDateTime,
        summary: serde_json::Value,
    },
    Detailed(StoredReport),
}

/// 报表范本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub report_type: ReportType,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}
