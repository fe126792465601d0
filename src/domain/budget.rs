// ==========================================
// 工程采购管理系统 - 预算台账
// ==========================================
// 每个项目一条记录; remaining = total - used
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 项目预算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub project_name: String,
    pub total_budget: f64,
    pub used_budget: f64,
    pub updated_at: NaiveDateTime,
}

impl BudgetRecord {
    pub fn new(project_name: String, total_budget: f64, used_budget: f64, now: NaiveDateTime) -> Self {
        Self {
            project_name,
            total_budget,
            used_budget,
            updated_at: now,
        }
    }

    /// 剩余预算
    pub fn remaining_budget(&self) -> f64 {
        self.total_budget - self.used_budget
    }

    pub fn can_cover(&self, amount: f64) -> bool {
        self.remaining_budget() >= amount
    }

    /// 扣减（不做重复扣减保护, 由调用方保证只确认一次）
    pub fn deduct(&mut self, amount: f64, now: NaiveDateTime) {
        self.used_budget += amount;
        self.updated_at = now;
    }
}

/// 预算状态视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub project_name: String,
    pub total_budget: f64,
    pub used_budget: f64,
    pub remaining_budget: f64,
}

impl From<&BudgetRecord> for BudgetStatus {
    fn from(record: &BudgetRecord) -> Self {
        Self {
            project_name: record.project_name.clone(),
            total_budget: record.total_budget,
            used_budget: record.used_budget,
            remaining_budget: record.remaining_budget(),
        }
    }
}

/// 预算校验不通过的原因
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetRejection {
    BudgetNotFound { project_name: String },
    InsufficientBudget { project_name: String, remaining: f64, required: f64 },
}

/// 采购单确认被拒绝的原因（确认事务内判定, 拒绝时不落任何修改）
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmRejection {
    NotCreated { current: String },
    Budget(BudgetRejection),
}
