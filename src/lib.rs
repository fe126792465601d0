// ==========================================
// 工程采购管理系统 - 核心库
// ==========================================
// 流程: 供应商/询价单 -> 报价 -> 比价决标 -> 采购单(预算确认) -> 到货/施工进度 -> 报表
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-TW");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 策略参数
pub mod config;

// 可注入能力 - 编号 / 时钟
pub mod ports;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// CSV 导出
pub mod export;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::types::{
    AlertSeverity, DeliveryStatus, InquiryStatus, PurchaseOrderStatus, QuoteStatus, ReportType,
};

pub use domain::{
    Alert, BudgetRecord, ComparisonTable, ConstructionSchedule, DetailedComparison, Inquiry,
    InquiryItem, PurchaseOrder, Quote, QuoteItem, QuoteSubmission, Supplier, SupplierInput,
};

pub use engine::{BudgetEngine, ComparisonEngine, PurchaseOrderEngine, ReportEngine, ScheduleEngine};

pub use api::{
    ApiError, ApiResult, BudgetApi, CatalogApi, ComparisonApi, PurchaseOrderApi, ReportApi,
    ScheduleApi,
};

pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工程采购管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
