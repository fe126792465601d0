// ==========================================
// 工程采购管理系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// 展示文本: 通过 label() 经 i18n 获取, 不作为数据契约
// ==========================================

use crate::i18n;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 询价单状态
// ==========================================
// DRAFT -> SENT 不可逆; SENT -> COMPLETED 由外部设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryStatus {
    Draft,     // 草稿
    Sent,      // 已发送
    Completed, // 已完成
}

impl InquiryStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(InquiryStatus::Draft),
            "SENT" => Some(InquiryStatus::Sent),
            "COMPLETED" => Some(InquiryStatus::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            InquiryStatus::Draft => i18n::t("inquiry_status.draft"),
            InquiryStatus::Sent => i18n::t("inquiry_status.sent"),
            InquiryStatus::Completed => i18n::t("inquiry_status.completed"),
        }
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InquiryStatus::Draft => write!(f, "DRAFT"),
            InquiryStatus::Sent => write!(f, "SENT"),
            InquiryStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 报价单状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Submitted,   // 已提交
    UnderReview, // 审核中
    Accepted,    // 已接受
    Rejected,    // 已拒绝
}

impl QuoteStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "SUBMITTED" => Some(QuoteStatus::Submitted),
            "UNDER_REVIEW" => Some(QuoteStatus::UnderReview),
            "ACCEPTED" => Some(QuoteStatus::Accepted),
            "REJECTED" => Some(QuoteStatus::Rejected),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            QuoteStatus::Submitted => i18n::t("quote_status.submitted"),
            QuoteStatus::UnderReview => i18n::t("quote_status.under_review"),
            QuoteStatus::Accepted => i18n::t("quote_status.accepted"),
            QuoteStatus::Rejected => i18n::t("quote_status.rejected"),
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteStatus::Submitted => write!(f, "SUBMITTED"),
            QuoteStatus::UnderReview => write!(f, "UNDER_REVIEW"),
            QuoteStatus::Accepted => write!(f, "ACCEPTED"),
            QuoteStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

// ==========================================
// 采购单状态
// ==========================================
// 本系统只推导 CREATED -> CONFIRMED; 其余状态由外部设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Created,   // 已建立
    Confirmed, // 已确认
    Shipped,   // 已出货
    Delivered, // 已交货
    Cancelled, // 已取消
}

impl PurchaseOrderStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(PurchaseOrderStatus::Created),
            "CONFIRMED" => Some(PurchaseOrderStatus::Confirmed),
            "SHIPPED" => Some(PurchaseOrderStatus::Shipped),
            "DELIVERED" => Some(PurchaseOrderStatus::Delivered),
            "CANCELLED" => Some(PurchaseOrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PurchaseOrderStatus::Created => i18n::t("po_status.created"),
            PurchaseOrderStatus::Confirmed => i18n::t("po_status.confirmed"),
            PurchaseOrderStatus::Shipped => i18n::t("po_status.shipped"),
            PurchaseOrderStatus::Delivered => i18n::t("po_status.delivered"),
            PurchaseOrderStatus::Cancelled => i18n::t("po_status.cancelled"),
        }
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseOrderStatus::Created => write!(f, "CREATED"),
            PurchaseOrderStatus::Confirmed => write!(f, "CONFIRMED"),
            PurchaseOrderStatus::Shipped => write!(f, "SHIPPED"),
            PurchaseOrderStatus::Delivered => write!(f, "DELIVERED"),
            PurchaseOrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 交货状态 (采购单到货登记)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Delivered,          // 全部到货
    PartiallyDelivered, // 部分到货
}

impl DeliveryStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DELIVERED" => Some(DeliveryStatus::Delivered),
            "PARTIALLY_DELIVERED" => Some(DeliveryStatus::PartiallyDelivered),
            _ => None,
        }
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        DeliveryStatus::Delivered
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Delivered => write!(f, "DELIVERED"),
            DeliveryStatus::PartiallyDelivered => write!(f, "PARTIALLY_DELIVERED"),
        }
    }
}

// ==========================================
// 进度项状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleItemStatus {
    Pending,   // 待交货
    Delivered, // 已交货
    Completed, // 施工完成 (进度 100)
}

impl ScheduleItemStatus {
    pub fn label(&self) -> String {
        match self {
            ScheduleItemStatus::Pending => i18n::t("schedule_status.pending"),
            ScheduleItemStatus::Delivered => i18n::t("schedule_status.delivered"),
            ScheduleItemStatus::Completed => i18n::t("schedule_status.completed"),
        }
    }
}

impl fmt::Display for ScheduleItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleItemStatus::Pending => write!(f, "PENDING"),
            ScheduleItemStatus::Delivered => write!(f, "DELIVERED"),
            ScheduleItemStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 预警类型 / 严重度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    DeliveryDelay,
}

impl AlertType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DELIVERY_DELAY" => Some(AlertType::DeliveryDelay),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            AlertType::DeliveryDelay => i18n::t("alert_type.delivery_delay"),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::DeliveryDelay => write!(f, "DELIVERY_DELAY"),
        }
    }
}

/// 预警严重度 (LOW <= 3天, MEDIUM 4-7天, HIGH > 7天; 阈值可配置)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(AlertSeverity::Low),
            "MEDIUM" => Some(AlertSeverity::Medium),
            "HIGH" => Some(AlertSeverity::High),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            AlertSeverity::Low => i18n::t("alert_severity.low"),
            AlertSeverity::Medium => i18n::t("alert_severity.medium"),
            AlertSeverity::High => i18n::t("alert_severity.high"),
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Low => write!(f, "LOW"),
            AlertSeverity::Medium => write!(f, "MEDIUM"),
            AlertSeverity::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 交期风险
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryRisk {
    Low,
    Medium,
    High,
}

impl DeliveryRisk {
    pub fn label(&self) -> String {
        match self {
            DeliveryRisk::Low => i18n::t("delivery_risk.low"),
            DeliveryRisk::Medium => i18n::t("delivery_risk.medium"),
            DeliveryRisk::High => i18n::t("delivery_risk.high"),
        }
    }
}

impl fmt::Display for DeliveryRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryRisk::Low => write!(f, "LOW"),
            DeliveryRisk::Medium => write!(f, "MEDIUM"),
            DeliveryRisk::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 价格合理性 (由变异系数判定)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceReasonableness {
    HighConsistency,    // CV < 0.10
    ReasonableVariance, // CV < 0.20
    LargeVariance,      // CV < 0.30
    ExcessiveVariance,  // 其余, 需检视
}

impl PriceReasonableness {
    pub fn label(&self) -> String {
        match self {
            PriceReasonableness::HighConsistency => {
                i18n::t("price_reasonableness.high_consistency")
            }
            PriceReasonableness::ReasonableVariance => {
                i18n::t("price_reasonableness.reasonable_variance")
            }
            PriceReasonableness::LargeVariance => i18n::t("price_reasonableness.large_variance"),
            PriceReasonableness::ExcessiveVariance => {
                i18n::t("price_reasonableness.excessive_variance")
            }
        }
    }
}

impl fmt::Display for PriceReasonableness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceReasonableness::HighConsistency => write!(f, "HIGH_CONSISTENCY"),
            PriceReasonableness::ReasonableVariance => write!(f, "REASONABLE_VARIANCE"),
            PriceReasonableness::LargeVariance => write!(f, "LARGE_VARIANCE"),
            PriceReasonableness::ExcessiveVariance => write!(f, "EXCESSIVE_VARIANCE"),
        }
    }
}

// ==========================================
// 材料分类 (按品名关键字归类)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialCategory {
    Structural,   // 混凝土/水泥
    Steel,        // 钢筋/钢材
    Masonry,      // 砖/瓦
    Electrical,   // 电线/开关
    Plumbing,     // 管线/阀门
    DoorsWindows, // 门/窗
    Finishing,    // 油漆/涂料
    Other,
}

impl MaterialCategory {
    pub fn label(&self) -> String {
        match self {
            MaterialCategory::Structural => i18n::t("material_category.structural"),
            MaterialCategory::Steel => i18n::t("material_category.steel"),
            MaterialCategory::Masonry => i18n::t("material_category.masonry"),
            MaterialCategory::Electrical => i18n::t("material_category.electrical"),
            MaterialCategory::Plumbing => i18n::t("material_category.plumbing"),
            MaterialCategory::DoorsWindows => i18n::t("material_category.doors_windows"),
            MaterialCategory::Finishing => i18n::t("material_category.finishing"),
            MaterialCategory::Other => i18n::t("material_category.other"),
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialCategory::Structural => write!(f, "STRUCTURAL"),
            MaterialCategory::Steel => write!(f, "STEEL"),
            MaterialCategory::Masonry => write!(f, "MASONRY"),
            MaterialCategory::Electrical => write!(f, "ELECTRICAL"),
            MaterialCategory::Plumbing => write!(f, "PLUMBING"),
            MaterialCategory::DoorsWindows => write!(f, "DOORS_WINDOWS"),
            MaterialCategory::Finishing => write!(f, "FINISHING"),
            MaterialCategory::Other => write!(f, "OTHER"),
        }
    }
}

// ==========================================
// 报表类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    Engineering, // 工程采购报表
    Material,    // 材料采购报表
}

impl ReportType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ENGINEERING" => Some(ReportType::Engineering),
            "MATERIAL" => Some(ReportType::Material),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ReportType::Engineering => i18n::t("report_type.engineering"),
            ReportType::Material => i18n::t("report_type.material"),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Engineering => write!(f, "ENGINEERING"),
            ReportType::Material => write!(f, "MATERIAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde_code() {
        let json = serde_json::to_string(&PurchaseOrderStatus::Confirmed).unwrap();
        assert_eq!(json, format!("\"{}\"", PurchaseOrderStatus::Confirmed));

        let json = serde_json::to_string(&PriceReasonableness::ExcessiveVariance).unwrap();
        assert_eq!(json, format!("\"{}\"", PriceReasonableness::ExcessiveVariance));
    }

    #[test]
    fn test_from_db_str_round_trip() {
        for status in [
            InquiryStatus::Draft,
            InquiryStatus::Sent,
            InquiryStatus::Completed,
        ] {
            assert_eq!(InquiryStatus::from_db_str(&status.to_string()), Some(status));
        }
        assert_eq!(QuoteStatus::from_db_str("UNDER_REVIEW"), Some(QuoteStatus::UnderReview));
        assert_eq!(PurchaseOrderStatus::from_db_str("UNKNOWN"), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }
}
