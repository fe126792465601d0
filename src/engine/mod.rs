// ==========================================
// 工程采购管理系统 - 引擎层
// ==========================================
// 职责: 实现采购决策规则, 纯计算
// 红线: Engine 不拼 SQL, 所有拒绝必须输出原因
// ==========================================

pub mod budget;
pub mod comparison;
pub mod purchase_order;
pub mod report;
pub mod schedule;
pub mod scoring;
pub mod statistics;

// 重导出核心引擎
pub use budget::BudgetEngine;
pub use comparison::ComparisonEngine;
pub use purchase_order::{OrderDraft, PurchaseOrderEngine};
pub use report::{categorize_item, ReportEngine};
pub use schedule::ScheduleEngine;
pub use scoring::{composite_score, ScoreParts};
