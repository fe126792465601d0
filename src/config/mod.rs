// ==========================================
// 工程采购管理系统 - 配置层
// ==========================================
// 职责: 评分权重、阈值与缺省值的读取与覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod policy;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use policy::{
    AlertThresholds, DeliveryRiskThresholds, ProcurementDefaults, ProcurementPolicy,
    ReasonablenessThresholds, ScoringWeights,
};
