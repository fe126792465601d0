// ==========================================
// 工程采购管理系统 - 应用层
// ==========================================
// 职责: 组装共享连接与各 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, resume_ids, AppState};
