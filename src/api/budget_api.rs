// ==========================================
// 工程采购管理系统 - 预算台账 API
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::budget::{BudgetRecord, BudgetStatus};
use crate::domain::purchase_order::{CostControlRecord, PurchaseOrder};
use crate::engine::BudgetEngine;
use crate::ports::Clock;
use crate::repository::budget_repo::BudgetRepository;

pub struct BudgetApi {
    budget_repo: Arc<BudgetRepository>,
    clock: Arc<dyn Clock>,
    engine: BudgetEngine,
}

impl BudgetApi {
    pub fn new(budget_repo: Arc<BudgetRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            budget_repo,
            clock,
            engine: BudgetEngine::new(),
        }
    }

    /// 设置项目预算 (覆盖已有记录)
    ///
    /// # 参数
    /// - `total_budget`: 总预算
    /// - `used_budget`: 已使用金额, 新项目传 0
    pub fn set_budget(&self, project_name: &str, total_budget: f64, used_budget: f64) -> ApiResult<BudgetStatus> {
        validator::require_non_empty("project_name", project_name)?;
        validator::require_amount("total_budget", total_budget)?;
        validator::require_amount("used_budget", used_budget)?;

        let record = BudgetRecord::new(
            project_name.to_string(),
            total_budget,
            used_budget,
            self.clock.now(),
        );
        self.budget_repo.upsert(&record)?;

        info!(project = %project_name, total_budget, used_budget, "项目预算已设置");
        Ok(BudgetStatus::from(&record))
    }

    /// 校验采购单金额是否在预算内 (不修改台账)
    pub fn validate(&self, po: &PurchaseOrder) -> ApiResult<()> {
        let record = self.budget_repo.find_by_project(&po.project_name)?;
        self.engine.validate(po, record.as_ref())?;
        Ok(())
    }

    /// 直接扣减 (不校验余额, 不防重复扣减)
    pub fn deduct(&self, project_name: &str, amount: f64) -> ApiResult<BudgetStatus> {
        validator::require_amount("amount", amount)?;
        let record = self.budget_repo.deduct(project_name, amount, self.clock.now())?;
        info!(
            project = %project_name,
            amount,
            remaining = record.remaining_budget(),
            "预算已扣减"
        );
        Ok(BudgetStatus::from(&record))
    }

    pub fn get_budget_status(&self, project_name: &str) -> ApiResult<BudgetStatus> {
        let record = self
            .budget_repo
            .find_by_project(project_name)?
            .ok_or_else(|| ApiError::BudgetNotFound {
                project: project_name.to_string(),
            })?;
        Ok(BudgetStatus::from(&record))
    }

    pub fn list_cost_control(&self, project_name: &str) -> ApiResult<Vec<CostControlRecord>> {
        Ok(self.budget_repo.list_cost_control(project_name)?)
    }
}
