// ==========================================
// 工程采购管理系统 - 报价 / 比价 API
// ==========================================
// 职责: 报价提交, 比价表建立, 详细比价分析, 决标
// 依赖: ComparisonEngine (纯计算) + ConfigManager (评分策略)
// ==========================================

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::comparison::{ComparisonExport, ComparisonTable, DetailedComparison};
use crate::domain::quote::{Quote, QuoteSubmission};
use crate::domain::types::QuoteStatus;
use crate::engine::ComparisonEngine;
use crate::ports::{Clock, IdGenerator};
use crate::repository::comparison_repo::ComparisonRepository;
use crate::repository::quote_repo::QuoteRepository;

pub struct ComparisonApi {
    quote_repo: Arc<QuoteRepository>,
    comparison_repo: Arc<ComparisonRepository>,
    config_manager: Arc<ConfigManager>,
    quote_ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    engine: ComparisonEngine,
}

impl ComparisonApi {
    pub fn new(
        quote_repo: Arc<QuoteRepository>,
        comparison_repo: Arc<ComparisonRepository>,
        config_manager: Arc<ConfigManager>,
        quote_ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quote_repo,
            comparison_repo,
            config_manager,
            quote_ids,
            clock,
            engine: ComparisonEngine::new(),
        }
    }

    // ==========================================
    // 报价
    // ==========================================

    /// 提交报价
    ///
    /// # 参数
    /// - `inquiry_id`: 询价单编号 (不校验明细是否与询价项目一致)
    /// - `supplier_id`: 供应商编号
    /// - `submission`: 报价明细/付款条件/有效天数
    ///
    /// # 返回
    /// - 已保存的报价单 (总额 = 明细合计)
    pub fn submit_quote(
        &self,
        inquiry_id: &str,
        supplier_id: &str,
        submission: QuoteSubmission,
    ) -> ApiResult<Quote> {
        validator::require_non_empty("inquiry_id", inquiry_id)?;
        validator::require_non_empty("supplier_id", supplier_id)?;
        validator::validate_quote_submission(&submission)?;

        let validity_days = match submission.validity_days {
            Some(days) => days,
            None => self.config_manager.load_policy()?.defaults.validity_days,
        };

        let mut quote = Quote::new(
            self.quote_ids.next(),
            inquiry_id.to_string(),
            supplier_id.to_string(),
            submission.payment_terms,
            validity_days,
            self.clock.now(),
        );
        for item in submission.items {
            quote.add_quote_item(item);
        }
        self.quote_repo.insert(&quote)?;

        info!(
            quote_id = %quote.quote_id,
            inquiry_id,
            supplier_id,
            total_amount = quote.total_amount,
            "报价已提交"
        );
        Ok(quote)
    }

    pub fn get_quote(&self, quote_id: &str) -> ApiResult<Quote> {
        self.quote_repo
            .find_by_id(quote_id)?
            .ok_or_else(|| ApiError::NotFound(format!("报价单{}不存在", quote_id)))
    }

    pub fn get_quotes_by_inquiry(&self, inquiry_id: &str) -> ApiResult<Vec<Quote>> {
        Ok(self.quote_repo.list_by_inquiry(inquiry_id)?)
    }

    pub fn update_quote_status(&self, quote_id: &str, status: QuoteStatus) -> ApiResult<()> {
        self.quote_repo.update_status(quote_id, status)?;
        info!(quote_id, status = %status, "报价单状态已更新");
        Ok(())
    }

    // ==========================================
    // 比价表
    // ==========================================

    /// 建立比价表: 收集该询价单全部报价 (提交顺序), 覆盖旧表及其决标
    pub fn create_comparison_table(&self, inquiry_id: &str, project_name: &str) -> ApiResult<ComparisonTable> {
        let quote_ids = self
            .quote_repo
            .list_by_inquiry(inquiry_id)?
            .into_iter()
            .map(|q| q.quote_id)
            .collect();

        let table = ComparisonTable::new(
            inquiry_id.to_string(),
            project_name.to_string(),
            quote_ids,
            self.clock.now(),
        );
        self.comparison_repo.save(&table)?;

        info!(inquiry_id, quotes = table.quote_ids.len(), "比价表已建立");
        Ok(table)
    }

    pub fn get_comparison_table(&self, inquiry_id: &str) -> ApiResult<ComparisonTable> {
        self.comparison_repo
            .find_by_inquiry(inquiry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("询价单{}尚未建立比价表", inquiry_id)))
    }

    /// 详细比价分析
    #[instrument(skip(self))]
    pub fn generate_detailed_comparison(&self, inquiry_id: &str) -> ApiResult<DetailedComparison> {
        let table = self.get_comparison_table(inquiry_id)?;
        let quotes = self.quote_repo.find_by_ids(&table.quote_ids)?;
        let policy = self.config_manager.load_policy()?;

        let detailed = self.engine.generate_detailed(&table, &quotes, &policy);
        debug!(
            items = detailed.item_comparisons.len(),
            suppliers = detailed.supplier_summaries.len(),
            "比价分析完成"
        );
        Ok(detailed)
    }

    /// 决标 (不校验该供应商是否报价)
    pub fn select_supplier(&self, inquiry_id: &str, supplier_id: &str, reason: &str) -> ApiResult<ComparisonTable> {
        let now = self.clock.now();
        let (table, _) = self
            .comparison_repo
            .update_atomically(inquiry_id, |table| -> ApiResult<()> {
                table.select_supplier(supplier_id.to_string(), reason.to_string(), now);
                Ok(())
            })?;

        info!(inquiry_id, supplier_id, reason, "已决标");
        Ok(table)
    }

    /// 决标供应商最后提交的报价单
    ///
    /// # 返回
    /// - Ok(None): 尚未决标, 或决标供应商没有报价
    pub fn find_selected_quote(&self, inquiry_id: &str) -> ApiResult<Option<Quote>> {
        let table = self.get_comparison_table(inquiry_id)?;
        let Some(selected) = table.selected_supplier_id.as_deref() else {
            return Ok(None);
        };

        let quotes = self.quote_repo.find_by_ids(&table.quote_ids)?;
        Ok(quotes.into_iter().rev().find(|q| q.supplier_id == selected))
    }

    pub fn export_comparison(&self, inquiry_id: &str) -> ApiResult<ComparisonExport> {
        let detailed = self.generate_detailed_comparison(inquiry_id)?;
        Ok(self.engine.build_export(&detailed))
    }
}
