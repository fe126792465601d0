// ==========================================
// 工程采购管理系统 - 供应商 / 询价单 API
// ==========================================
// 职责: 供应商登记与联系方式维护, 询价单建立/明细/目标供应商/发送
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::inquiry::{Inquiry, InquiryItem};
use crate::domain::report::{InquiryExport, InquiryReport, InquiryReportRow, InquirySupplierRow};
use crate::domain::supplier::{Supplier, SupplierContact, SupplierInput};
use crate::domain::types::InquiryStatus;
use crate::ports::{Clock, IdGenerator};
use crate::repository::inquiry_repo::{InquiryRepository, InquirySearchCriteria};
use crate::repository::supplier_repo::SupplierRepository;

/// 询价明细输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquiryItemInput {
    pub item_id: String,
    pub item_name: String,
    #[serde(default)]
    pub specification: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: u32,
    pub estimated_unit_price: f64,
}

impl From<InquiryItemInput> for InquiryItem {
    fn from(input: InquiryItemInput) -> Self {
        InquiryItem {
            item_id: input.item_id,
            item_name: input.item_name,
            specification: input.specification,
            unit: input.unit,
            quantity: input.quantity,
            estimated_unit_price: input.estimated_unit_price,
        }
    }
}

// ==========================================
// CatalogApi
// ==========================================

pub struct CatalogApi {
    supplier_repo: Arc<SupplierRepository>,
    inquiry_repo: Arc<InquiryRepository>,
    inquiry_ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl CatalogApi {
    pub fn new(
        supplier_repo: Arc<SupplierRepository>,
        inquiry_repo: Arc<InquiryRepository>,
        inquiry_ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            supplier_repo,
            inquiry_repo,
            inquiry_ids,
            clock,
        }
    }

    // ==========================================
    // 供应商
    // ==========================================

    /// 登记供应商; 已存在时覆盖名称与联系方式, 保留合作记录
    pub fn register_supplier(&self, input: SupplierInput) -> ApiResult<Supplier> {
        validator::validate_supplier_input(&input)?;
        let now = self.clock.now();

        let supplier_id = input.supplier_id.clone();
        let supplier = self
            .supplier_repo
            .merge_atomically(&supplier_id, |existing| match existing {
                Some(mut existing) => {
                    existing.company_name = input.company_name;
                    existing.update_contact(input.contact, now);
                    existing
                }
                None => Supplier::new(input, now),
            })?;

        info!(supplier_id = %supplier.supplier_id, "供应商已登记");
        Ok(supplier)
    }

    pub fn get_supplier(&self, supplier_id: &str) -> ApiResult<Supplier> {
        self.supplier_repo
            .find_by_id(supplier_id)?
            .ok_or_else(|| ApiError::NotFound(format!("供应商{}不存在", supplier_id)))
    }

    pub fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.supplier_repo.list_all()?)
    }

    pub fn update_supplier_contact(&self, supplier_id: &str, contact: SupplierContact) -> ApiResult<Supplier> {
        let now = self.clock.now();
        let (supplier, _) = self
            .supplier_repo
            .update_atomically(supplier_id, |supplier| -> ApiResult<()> {
                supplier.update_contact(contact, now);
                Ok(())
            })?;
        Ok(supplier)
    }

    // ==========================================
    // 询价单
    // ==========================================

    /// 建立询价单 (DRAFT)
    pub fn create_inquiry(
        &self,
        project_name: &str,
        project_code: &str,
        expected_order_date: Option<NaiveDate>,
    ) -> ApiResult<Inquiry> {
        validator::require_non_empty("project_name", project_name)?;
        validator::require_non_empty("project_code", project_code)?;

        let inquiry = Inquiry::new(
            self.inquiry_ids.next(),
            project_name.to_string(),
            project_code.to_string(),
            expected_order_date,
            self.clock.now(),
        );
        self.inquiry_repo.save(&inquiry)?;

        info!(inquiry_id = %inquiry.inquiry_id, project = %project_name, "询价单已建立");
        Ok(inquiry)
    }

    pub fn get_inquiry(&self, inquiry_id: &str) -> ApiResult<Inquiry> {
        self.inquiry_repo
            .find_by_id(inquiry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("询价单{}不存在", inquiry_id)))
    }

    /// 添加询价项目 (仅 DRAFT)
    pub fn add_item_to_inquiry(&self, inquiry_id: &str, input: InquiryItemInput) -> ApiResult<Inquiry> {
        let item: InquiryItem = input.into();
        validator::validate_inquiry_item(&item)?;

        let (inquiry, _) = self
            .inquiry_repo
            .update_atomically(inquiry_id, |inquiry| -> ApiResult<()> {
                if inquiry.status != InquiryStatus::Draft {
                    return Err(ApiError::InvalidStateTransition {
                        from: inquiry.status.to_string(),
                        to: InquiryStatus::Draft.to_string(),
                    });
                }
                inquiry.add_item(item);
                Ok(())
            })?;
        Ok(inquiry)
    }

    /// 添加目标供应商: 未登记的编号忽略, 重复编号忽略
    ///
    /// # 返回
    /// - 当前全部目标供应商编号
    pub fn add_suppliers_to_inquiry(&self, inquiry_id: &str, supplier_ids: &[String]) -> ApiResult<Vec<String>> {
        let existing = self.supplier_repo.filter_existing(supplier_ids)?;
        if existing.len() < supplier_ids.len() {
            warn!(
                inquiry_id,
                requested = supplier_ids.len(),
                registered = existing.len(),
                "部分供应商未登记，已忽略"
            );
        }

        let (inquiry, _) = self
            .inquiry_repo
            .update_atomically(inquiry_id, |inquiry| -> ApiResult<usize> {
                Ok(inquiry.add_target_suppliers(existing))
            })?;
        Ok(inquiry.target_supplier_ids)
    }

    /// 发送询价单 (DRAFT -> SENT)
    pub fn send_inquiry(&self, inquiry_id: &str) -> ApiResult<Inquiry> {
        let now = self.clock.now();
        let (inquiry, _) = self
            .inquiry_repo
            .update_atomically(inquiry_id, |inquiry| -> ApiResult<()> {
                inquiry.send(now)?;
                Ok(())
            })?;

        info!(
            inquiry_id,
            suppliers = inquiry.target_supplier_ids.len(),
            items = inquiry.items.len(),
            "询价单已发送"
        );
        Ok(inquiry)
    }

    /// 外部设置询价单状态 (如 SENT -> COMPLETED)
    pub fn update_inquiry_status(&self, inquiry_id: &str, status: InquiryStatus) -> ApiResult<Inquiry> {
        let (inquiry, _) = self
            .inquiry_repo
            .update_atomically(inquiry_id, |inquiry| -> ApiResult<()> {
                inquiry.status = status;
                Ok(())
            })?;
        Ok(inquiry)
    }

    pub fn list_inquiries(&self) -> ApiResult<Vec<Inquiry>> {
        Ok(self.inquiry_repo.list_all()?)
    }

    pub fn list_inquiries_by_status(&self, status: InquiryStatus) -> ApiResult<Vec<Inquiry>> {
        Ok(self.inquiry_repo.list_by_status(status)?)
    }

    pub fn search_inquiries(&self, criteria: &InquirySearchCriteria) -> ApiResult<Vec<Inquiry>> {
        Ok(self.inquiry_repo.search(criteria)?)
    }

    // ==========================================
    // 询价单报表 / 导出
    // ==========================================

    pub fn generate_inquiry_report(&self) -> ApiResult<InquiryReport> {
        let inquiries = self.inquiry_repo.list_all()?;
        let count = |status: InquiryStatus| inquiries.iter().filter(|i| i.status == status).count();

        Ok(InquiryReport {
            total: inquiries.len(),
            draft: count(InquiryStatus::Draft),
            sent: count(InquiryStatus::Sent),
            completed: count(InquiryStatus::Completed),
            rows: inquiries.iter().map(report_row).collect(),
        })
    }

    /// 导出询价单 (基本资料 / 明细 / 目标供应商联系方式)
    pub fn export_inquiry(&self, inquiry_id: &str) -> ApiResult<InquiryExport> {
        let inquiry = self.get_inquiry(inquiry_id)?;

        let mut suppliers = Vec::with_capacity(inquiry.target_supplier_ids.len());
        for supplier_id in &inquiry.target_supplier_ids {
            match self.supplier_repo.find_by_id(supplier_id)? {
                Some(s) => suppliers.push(InquirySupplierRow {
                    supplier_id: s.supplier_id,
                    company_name: s.company_name,
                    contact_person: s.contact_person,
                    phone: s.phone,
                    email: s.email,
                }),
                None => warn!(inquiry_id, supplier_id = %supplier_id, "目标供应商已不存在"),
            }
        }

        Ok(InquiryExport {
            row: report_row(&inquiry),
            expected_order_date: inquiry.expected_order_date,
            items: inquiry.items,
            suppliers,
        })
    }
}

fn report_row(inquiry: &Inquiry) -> InquiryReportRow {
    InquiryReportRow {
        inquiry_id: inquiry.inquiry_id.clone(),
        project_name: inquiry.project_name.clone(),
        project_code: inquiry.project_code.clone(),
        created_at: inquiry.created_at,
        status: inquiry.status,
        item_count: inquiry.items.len(),
        supplier_count: inquiry.target_supplier_ids.len(),
        estimated_total: inquiry.estimated_total(),
    }
}
