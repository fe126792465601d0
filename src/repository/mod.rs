// ==========================================
// 工程采购管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod budget_repo;
pub(crate) mod codec;
pub mod comparison_repo;
pub mod error;
pub mod inquiry_repo;
pub mod purchase_order_repo;
pub mod quote_repo;
pub mod report_repo;
pub mod schedule_repo;
pub mod supplier_repo;

// 重导出核心仓储
pub use budget_repo::BudgetRepository;
pub use comparison_repo::ComparisonRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inquiry_repo::{InquiryRepository, InquirySearchCriteria};
pub use purchase_order_repo::{ConfirmedOrder, PurchaseOrderRepository};
pub use quote_repo::QuoteRepository;
pub use report_repo::ReportRepository;
pub use schedule_repo::{AlertRepository, ProgressRepository, ScheduleAppend, ScheduleRepository};
pub use supplier_repo::SupplierRepository;
