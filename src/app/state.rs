// ==========================================
// 工程采购管理系统 - 应用状态
// ==========================================
// 职责: 打开共享连接, 组装 Repository / API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{BudgetApi, CatalogApi, ComparisonApi, PurchaseOrderApi, ReportApi, ScheduleApi};
use crate::config::ConfigManager;
use crate::db;
use crate::ports::{Clock, ProcurementIds, SequentialIdGenerator, SystemClock, UuidGenerator};
use crate::repository::{
    AlertRepository, BudgetRepository, ComparisonRepository, InquiryRepository, ProgressRepository,
    PurchaseOrderRepository, QuoteRepository, ReportRepository, ScheduleRepository, SupplierRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CONSTRUCTION_PROCUREMENT_DB_PATH";

/// 应用状态
///
/// 所有 API 共享同一把连接锁
pub struct AppState {
    /// 数据库路径 (内存库为 ":memory:")
    pub db_path: String,

    pub catalog_api: Arc<CatalogApi>,
    pub comparison_api: Arc<ComparisonApi>,
    pub budget_api: Arc<BudgetApi>,
    pub purchase_order_api: Arc<PurchaseOrderApi>,
    pub schedule_api: Arc<ScheduleApi>,
    pub report_api: Arc<ReportApi>,

    /// 配置管理器（策略参数 / 报表范本 / 配置快照）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 打开 (或新建) 数据库并创建应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 顺序编号从库中已有的最大序号之后继续
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = db::open_shared_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let ids = {
            let guard = conn.lock().map_err(|e| format!("数据库锁获取失败: {}", e))?;
            resume_ids(&guard).map_err(|e| format!("无法读取已用编号: {}", e))?
        };

        Self::with_components(db_path, conn, ids, Arc::new(SystemClock))
    }

    /// 内存数据库 + 指定时钟 (演示 / 测试)
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self, String> {
        let conn = db::open_in_memory().map_err(|e| format!("无法创建内存数据库: {}", e))?;
        Self::with_components(":memory:".to_string(), conn, ProcurementIds::sequential(), clock)
    }

    /// 由已打开的连接与注入的编号/时钟组装
    pub fn with_components(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        ids: ProcurementIds,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let supplier_repo = Arc::new(SupplierRepository::new(conn.clone()));
        let inquiry_repo = Arc::new(InquiryRepository::new(conn.clone()));
        let quote_repo = Arc::new(QuoteRepository::new(conn.clone()));
        let comparison_repo = Arc::new(ComparisonRepository::new(conn.clone()));
        let budget_repo = Arc::new(BudgetRepository::new(conn.clone()));
        let po_repo = Arc::new(PurchaseOrderRepository::new(conn.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::new(conn.clone()));
        let progress_repo = Arc::new(ProgressRepository::new(conn.clone()));
        let alert_repo = Arc::new(AlertRepository::new(conn.clone()));
        let report_repo = Arc::new(ReportRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let catalog_api = Arc::new(CatalogApi::new(
            supplier_repo.clone(),
            inquiry_repo.clone(),
            ids.inquiry.clone(),
            clock.clone(),
        ));
        let comparison_api = Arc::new(ComparisonApi::new(
            quote_repo,
            comparison_repo,
            config_manager.clone(),
            ids.quote.clone(),
            clock.clone(),
        ));
        let budget_api = Arc::new(BudgetApi::new(budget_repo, clock.clone()));
        let purchase_order_api = Arc::new(PurchaseOrderApi::new(
            po_repo.clone(),
            inquiry_repo,
            supplier_repo.clone(),
            ids.purchase_order.clone(),
            clock.clone(),
        ));
        let schedule_api = Arc::new(ScheduleApi::new(
            schedule_repo,
            progress_repo,
            alert_repo,
            config_manager.clone(),
            ids.record.clone(),
            clock.clone(),
        ));
        let report_api = Arc::new(ReportApi::new(
            po_repo,
            supplier_repo,
            report_repo,
            config_manager.clone(),
            ids.engineering_report.clone(),
            ids.material_report.clone(),
            clock,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            catalog_api,
            comparison_api,
            budget_api,
            purchase_order_api,
            schedule_api,
            report_api,
            config_manager,
        })
    }
}

/// 已有库的编号续接: 各前缀从最大已用序号 + 1 开始
pub fn resume_ids(conn: &Connection) -> rusqlite::Result<ProcurementIds> {
    let seq = |table: &str, column: &str, prefix: &str| -> rusqlite::Result<Arc<SequentialIdGenerator>> {
        let sql = format!(
            "SELECT MAX(CAST(SUBSTR({col}, {start}) AS INTEGER)) FROM {table} WHERE {col} LIKE '{prefix}%'",
            col = column,
            start = prefix.len() + 1,
            table = table,
            prefix = prefix,
        );
        let max: Option<i64> = conn.query_row(&sql, [], |row| row.get(0))?;
        let first = max.map(|n| n.max(0) as u64 + 1).unwrap_or(1);
        Ok(Arc::new(SequentialIdGenerator::starting_at(prefix, first)))
    };

    Ok(ProcurementIds {
        inquiry: seq("inquiry", "inquiry_id", ProcurementIds::INQUIRY_PREFIX)?,
        quote: seq("quote", "quote_id", ProcurementIds::QUOTE_PREFIX)?,
        purchase_order: seq("purchase_order", "po_id", ProcurementIds::PURCHASE_ORDER_PREFIX)?,
        engineering_report: seq(
            "procurement_report",
            "report_id",
            ProcurementIds::ENGINEERING_REPORT_PREFIX,
        )?,
        material_report: seq(
            "procurement_report",
            "report_id",
            ProcurementIds::MATERIAL_REPORT_PREFIX,
        )?,
        record: Arc::new(UuidGenerator),
    })
}

/// 默认数据库路径
///
/// 优先使用环境变量 `CONSTRUCTION_PROCUREMENT_DB_PATH`, 否则放在用户数据目录
pub fn get_default_db_path() -> String {
    if let Ok(custom) = std::env::var(DB_PATH_ENV) {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./construction_procurement.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("construction-procurement");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("construction_procurement.db");
        }
    }

    path.to_string_lossy().to_string()
}
