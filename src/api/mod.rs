// ==========================================
// 工程采购管理系统 - API 层
// ==========================================
// 职责: 对外业务接口, 入参校验 + 编排 Repository / Engine
// ==========================================

pub mod budget_api;
pub mod catalog_api;
pub mod comparison_api;
pub mod error;
pub mod purchase_order_api;
pub mod report_api;
pub mod schedule_api;
pub mod validator;

// 重导出核心类型
pub use budget_api::BudgetApi;
pub use catalog_api::{CatalogApi, InquiryItemInput};
pub use comparison_api::ComparisonApi;
pub use error::{ApiError, ApiResult};
pub use purchase_order_api::PurchaseOrderApi;
pub use report_api::ReportApi;
pub use schedule_api::{DeliveryUpdate, ScheduleApi};
