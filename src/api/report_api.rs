// ==========================================
// 工程采购管理系统 - 报表 API
// ==========================================
// 职责: 工程采购报表 / 材料采购报表 / 项目比较报表, 已保存报表管理, 报表范本
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::report::{
    ComparativeReport, ReportExport, ReportExportFormat, ReportPayload, ReportPeriod, ReportTemplate,
    StoredReport,
};
use crate::domain::types::ReportType;
use crate::engine::ReportEngine;
use crate::ports::{Clock, IdGenerator};
use crate::repository::purchase_order_repo::PurchaseOrderRepository;
use crate::repository::report_repo::ReportRepository;
use crate::repository::supplier_repo::SupplierRepository;

pub struct ReportApi {
    po_repo: Arc<PurchaseOrderRepository>,
    supplier_repo: Arc<SupplierRepository>,
    report_repo: Arc<ReportRepository>,
    config_manager: Arc<ConfigManager>,
    engineering_ids: Arc<dyn IdGenerator>,
    material_ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    engine: ReportEngine,
}

impl ReportApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        po_repo: Arc<PurchaseOrderRepository>,
        supplier_repo: Arc<SupplierRepository>,
        report_repo: Arc<ReportRepository>,
        config_manager: Arc<ConfigManager>,
        engineering_ids: Arc<dyn IdGenerator>,
        material_ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            po_repo,
            supplier_repo,
            report_repo,
            config_manager,
            engineering_ids,
            material_ids,
            clock,
            engine: ReportEngine::new(),
        }
    }

    /// 项目采购单, 按建立日期过滤
    fn project_orders(
        &self,
        project_name: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> ApiResult<Vec<PurchaseOrder>> {
        validator::require_non_empty("project_name", project_name)?;
        let period = ReportPeriod {
            date_from,
            date_to,
            project_name: Some(project_name.to_string()),
        };
        Ok(self
            .po_repo
            .list_by_project(project_name)?
            .into_iter()
            .filter(|po| period.contains(po.created_at))
            .collect())
    }

    // ==========================================
    // 生成
    // ==========================================

    /// 工程采购报表 (生成后保存, 编号 ENG...)
    #[instrument(skip(self))]
    pub fn generate_engineering_report(
        &self,
        project_name: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> ApiResult<StoredReport> {
        let orders = self.project_orders(project_name, date_from, date_to)?;
        let supplier_names: HashMap<String, String> = self
            .supplier_repo
            .list_all()?
            .into_iter()
            .map(|s| (s.supplier_id, s.company_name))
            .collect();

        let report = StoredReport {
            report_id: self.engineering_ids.next(),
            report_type: ReportType::Engineering,
            project_name: project_name.to_string(),
            generated_at: self.clock.now(),
            date_from,
            date_to,
            payload: ReportPayload::Engineering(self.engine.engineering_report(&orders, &supplier_names)),
        };
        self.report_repo.insert(&report)?;

        info!(report_id = %report.report_id, orders = orders.len(), "工程采购报表已生成");
        Ok(report)
    }

    /// 材料采购报表 (生成后保存, 编号 MAT...)
    #[instrument(skip(self))]
    pub fn generate_material_report(
        &self,
        project_name: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> ApiResult<StoredReport> {
        let orders = self.project_orders(project_name, date_from, date_to)?;

        let report = StoredReport {
            report_id: self.material_ids.next(),
            report_type: ReportType::Material,
            project_name: project_name.to_string(),
            generated_at: self.clock.now(),
            date_from,
            date_to,
            payload: ReportPayload::Material(self.engine.material_report(&orders)),
        };
        self.report_repo.insert(&report)?;

        info!(report_id = %report.report_id, orders = orders.len(), "材料采购报表已生成");
        Ok(report)
    }

    /// 多项目比较 (不保存)
    pub fn generate_comparative_report(&self, project_names: &[String]) -> ApiResult<ComparativeReport> {
        let mut projects = Vec::with_capacity(project_names.len());
        for name in project_names {
            let orders = self.po_repo.list_by_project(name)?;
            projects.push(self.engine.project_comparison(name, &orders));
        }
        Ok(ComparativeReport {
            generated_at: self.clock.now(),
            projects,
        })
    }

    // ==========================================
    // 已保存报表
    // ==========================================

    pub fn get_report(&self, report_id: &str) -> ApiResult<StoredReport> {
        self.report_repo
            .find_by_id(report_id)?
            .ok_or_else(|| ApiError::NotFound(format!("报表{}不存在", report_id)))
    }

    pub fn list_reports(&self) -> ApiResult<Vec<StoredReport>> {
        Ok(self.report_repo.list_all()?)
    }

    pub fn delete_report(&self, report_id: &str) -> ApiResult<()> {
        if !self.report_repo.delete(report_id)? {
            return Err(ApiError::NotFound(format!("报表{}不存在", report_id)));
        }
        info!(report_id, "报表已删除");
        Ok(())
    }

    /// 导出报表
    ///
    /// # 参数
    /// - `format`: SUMMARY 仅输出汇总段, DETAILED 输出完整报表
    pub fn export_report(&self, report_id: &str, format: ReportExportFormat) -> ApiResult<ReportExport> {
        let report = self.get_report(report_id)?;
        match format {
            ReportExportFormat::Detailed => Ok(ReportExport::Detailed(report)),
            ReportExportFormat::Summary => {
                let summary = match &report.payload {
                    ReportPayload::Engineering(body) => serde_json::to_value(&body.summary),
                    ReportPayload::Material(body) => serde_json::to_value(&body.summary),
                }
                .map_err(|e| ApiError::InternalError(format!("报表汇总序列化失败: {}", e)))?;

                Ok(ReportExport::Summary {
                    report_id: report.report_id,
                    report_type: report.report_type,
                    project_name: report.project_name,
                    generated_at: report.generated_at,
                    summary,
                })
            }
        }
    }

    // ==========================================
    // 报表范本
    // ==========================================

    pub fn create_report_template(&self, name: &str, template: &ReportTemplate) -> ApiResult<()> {
        validator::require_non_empty("template_name", name)?;
        self.config_manager.save_report_template(name, template)?;
        info!(template = name, report_type = %template.report_type, "报表范本已保存");
        Ok(())
    }

    pub fn list_report_templates(&self) -> ApiResult<Vec<String>> {
        Ok(self.config_manager.list_report_templates()?)
    }

    /// 按范本生成报表
    pub fn generate_report_from_template(&self, name: &str, project_name: &str) -> ApiResult<StoredReport> {
        let template = self
            .config_manager
            .get_report_template(name)?
            .ok_or_else(|| ApiError::NotFound(format!("报表范本{}不存在", name)))?;

        match template.report_type {
            ReportType::Engineering => {
                self.generate_engineering_report(project_name, template.date_from, template.date_to)
            }
            ReportType::Material => {
                self.generate_material_report(project_name, template.date_from, template.date_to)
            }
        }
    }
}
