// ==========================================
// 工程采购管理系统 - 预算校验引擎
// ==========================================
// 红线: 校验为纯判定, 不修改台账
// ==========================================

use crate::domain::budget::{BudgetRecord, BudgetRejection};
use crate::domain::purchase_order::PurchaseOrder;

pub struct BudgetEngine {
    // 无状态引擎,不需要注入依赖
}

impl BudgetEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 校验采购单总额是否在项目剩余预算内
    ///
    /// # 参数
    /// - `po`: 待确认采购单
    /// - `budget`: 项目预算记录, None 表示未设置预算
    pub fn validate(&self, po: &PurchaseOrder, budget: Option<&BudgetRecord>) -> Result<(), BudgetRejection> {
        let record = budget.ok_or_else(|| BudgetRejection::BudgetNotFound {
            project_name: po.project_name.clone(),
        })?;

        if !record.can_cover(po.total_amount) {
            return Err(BudgetRejection::InsufficientBudget {
                project_name: po.project_name.clone(),
                remaining: record.remaining_budget(),
                required: po.total_amount,
            });
        }
        Ok(())
    }
}

impl Default for BudgetEngine {
    fn default() -> Self {
        Self::new()
    }
}
