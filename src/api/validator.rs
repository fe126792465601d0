// ==========================================
// 工程采购管理系统 - 输入校验器
// ==========================================
// 职责: API 入参的必填/数值校验, 在任何修改之前执行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::inquiry::InquiryItem;
use crate::domain::quote::QuoteSubmission;
use crate::domain::supplier::SupplierInput;

/// 必填文本
pub fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 金额: 有限且 >= 0
pub fn require_amount(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::ValidationError(format!(
            "{}必须为非负数值: {}",
            field, value
        )));
    }
    Ok(())
}

pub fn validate_supplier_input(input: &SupplierInput) -> ApiResult<()> {
    require_non_empty("supplier_id", &input.supplier_id)?;
    require_non_empty("company_name", &input.company_name)?;
    Ok(())
}

pub fn validate_inquiry_item(item: &InquiryItem) -> ApiResult<()> {
    require_non_empty("item_id", &item.item_id)?;
    require_non_empty("item_name", &item.item_name)?;
    require_amount("estimated_unit_price", item.estimated_unit_price)?;
    Ok(())
}

/// 报价提交: 逐项校验编号与价格 (不比对询价项目)
pub fn validate_quote_submission(submission: &QuoteSubmission) -> ApiResult<()> {
    for item in &submission.items {
        require_non_empty("item_id", &item.item_id)?;
        require_amount("unit_price", item.unit_price)?;
        require_amount("total_price", item.total_price)?;
    }
    Ok(())
}

/// 施工进度: [0, 100]
pub fn validate_progress(progress: f64) -> ApiResult<()> {
    if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
        return Err(ApiError::ValidationError(format!(
            "施工进度必须在 0-100 之间: {}",
            progress
        )));
    }
    Ok(())
}
