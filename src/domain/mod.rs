// ==========================================
// 工程采购管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、实体自身的不变量维护
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod budget;
pub mod comparison;
pub mod inquiry;
pub mod purchase_order;
pub mod quote;
pub mod report;
pub mod schedule;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use budget::{BudgetRecord, BudgetRejection, BudgetStatus, ConfirmRejection};
pub use comparison::{ComparisonTable, DetailedComparison, Recommendation};
pub use inquiry::{Inquiry, InquiryItem, SendRejection};
pub use purchase_order::{CostControlRecord, PurchaseOrder, PurchaseOrderItem, StatusChange};
pub use quote::{Quote, QuoteItem, QuoteSubmission};
pub use schedule::{Alert, ConstructionSchedule, ProgressRecord, ScheduleItem};
pub use supplier::{CooperationRecord, Supplier, SupplierContact, SupplierInput};
pub use types::{
    AlertSeverity, AlertType, DeliveryRisk, DeliveryStatus, InquiryStatus, MaterialCategory,
    PriceReasonableness, PurchaseOrderStatus, QuoteStatus, ReportType, ScheduleItemStatus,
};
