// ==========================================
// 工程采购管理系统 - 采购单 API
// ==========================================
// 职责: 采购单生成 / 确认 (预算事务) / 交货登记 / 状态维护 / 采购报表
// 红线: 确认失败时采购单与预算台账均不得修改
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::purchase_order::{PurchaseOrder, PurchaseOrderExport};
use crate::domain::quote::Quote;
use crate::domain::report::{PurchaseReport, ReportPeriod};
use crate::domain::supplier::CooperationRecord;
use crate::domain::types::{DeliveryStatus, PurchaseOrderStatus};
use crate::engine::{OrderDraft, PurchaseOrderEngine, ReportEngine};
use crate::ports::{Clock, IdGenerator};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inquiry_repo::InquiryRepository;
use crate::repository::purchase_order_repo::{ConfirmedOrder, PurchaseOrderRepository};
use crate::repository::supplier_repo::SupplierRepository;

pub struct PurchaseOrderApi {
    po_repo: Arc<PurchaseOrderRepository>,
    inquiry_repo: Arc<InquiryRepository>,
    supplier_repo: Arc<SupplierRepository>,
    po_ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    engine: PurchaseOrderEngine,
    report_engine: ReportEngine,
}

impl PurchaseOrderApi {
    pub fn new(
        po_repo: Arc<PurchaseOrderRepository>,
        inquiry_repo: Arc<InquiryRepository>,
        supplier_repo: Arc<SupplierRepository>,
        po_ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            po_repo,
            inquiry_repo,
            supplier_repo,
            po_ids,
            clock,
            engine: PurchaseOrderEngine::new(),
            report_engine: ReportEngine::new(),
        }
    }

    /// 由决标报价生成采购单 (CREATED)
    ///
    /// # 参数
    /// - `inquiry_id`: 原询价单, 明细名称/规格/单位/数量由此解析
    /// - `supplier_id`: 决标供应商
    /// - `selected_quote`: 决标报价, 提供单价/交货天数/付款条件
    /// - `project_name`: 项目名称 (预算台账键)
    /// - `delivery_address`: 交货地址
    pub fn generate(
        &self,
        inquiry_id: &str,
        supplier_id: &str,
        selected_quote: &Quote,
        project_name: &str,
        delivery_address: &str,
    ) -> ApiResult<PurchaseOrder> {
        validator::require_non_empty("project_name", project_name)?;
        let inquiry = self
            .inquiry_repo
            .find_by_id(inquiry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("询价单{}不存在", inquiry_id)))?;

        if selected_quote.supplier_id != supplier_id {
            warn!(
                quote_id = %selected_quote.quote_id,
                quote_supplier = %selected_quote.supplier_id,
                supplier_id,
                "报价单供应商与采购单供应商不一致"
            );
        }

        let po = self.engine.build_order(
            OrderDraft {
                po_id: self.po_ids.next(),
                inquiry: &inquiry,
                supplier_id: supplier_id.to_string(),
                quote: selected_quote,
                project_name: project_name.to_string(),
                delivery_address: delivery_address.to_string(),
            },
            self.clock.now(),
        );
        self.po_repo.save(&po)?;

        info!(
            po_id = %po.po_id,
            supplier_id,
            total_amount = po.total_amount,
            "采购单已生成"
        );
        Ok(po)
    }

    /// 确认采购单
    ///
    /// 状态检查 + 预算校验 + 扣减 + 状态变更 + 成本控制记录在同一事务内完成。
    ///
    /// # 返回
    /// - Err(NotFound): 采购单不存在
    /// - Err(ConfirmationFailed): 状态非 CREATED 或预算不足/未设置, 无任何修改
    #[instrument(skip(self))]
    pub fn confirm(&self, po_id: &str) -> ApiResult<PurchaseOrder> {
        let now = self.clock.now();
        let outcome = self
            .po_repo
            .confirm_atomically(po_id, |po, budget| self.engine.decide_confirmation(po, budget, now))?;

        let ConfirmedOrder { order, budget, .. } = match outcome {
            Ok(confirmed) => confirmed,
            Err(rejection) => {
                warn!(po_id, reason = ?rejection, "采购单确认被拒绝");
                return Err(ApiError::ConfirmationFailed {
                    po_id: po_id.to_string(),
                    source: Box::new(ApiError::from(rejection)),
                });
            }
        };

        info!(
            po_id,
            amount = order.total_amount,
            remaining = budget.remaining_budget(),
            "采购单已确认"
        );

        // 确认已提交, 合作记录写入失败不影响确认结果
        if let Err(e) = self.append_cooperation(&order, now) {
            warn!(po_id, supplier_id = %order.supplier_id, error = %e, "合作记录写入失败");
        }
        Ok(order)
    }

    fn append_cooperation(&self, order: &PurchaseOrder, now: NaiveDateTime) -> ApiResult<()> {
        let record = CooperationRecord {
            po_id: order.po_id.clone(),
            project_name: order.project_name.clone(),
            amount: order.total_amount,
            recorded_at: now,
        };
        let appended = self
            .supplier_repo
            .update_atomically(&order.supplier_id, |supplier| -> RepositoryResult<()> {
                supplier.record_cooperation(record);
                Ok(())
            });
        match appended {
            Ok(_) => Ok(()),
            Err(RepositoryError::NotFound { .. }) => {
                warn!(supplier_id = %order.supplier_id, "供应商未登记，跳过合作记录");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 登记交货
    pub fn record_delivery(
        &self,
        po_id: &str,
        actual_date: NaiveDateTime,
        delivery_status: DeliveryStatus,
    ) -> ApiResult<PurchaseOrder> {
        let now = self.clock.now();
        let (po, _) = self.po_repo.update_atomically(po_id, |po| -> ApiResult<()> {
            self.engine.apply_delivery(po, actual_date, delivery_status, now);
            Ok(())
        })?;
        Ok(po)
    }

    /// 外部设置状态; 备注非空时追加状态历史
    pub fn update_status(&self, po_id: &str, status: PurchaseOrderStatus, remarks: &str) -> ApiResult<PurchaseOrder> {
        let now = self.clock.now();
        let (po, _) = self.po_repo.update_atomically(po_id, |po| -> ApiResult<()> {
            po.update_status(status, remarks, now);
            Ok(())
        })?;
        info!(po_id, status = %status, "采购单状态已更新");
        Ok(po)
    }

    /// 指定工程阶段 (报表按阶段汇总)
    pub fn assign_project_phase(&self, po_id: &str, phase: &str) -> ApiResult<PurchaseOrder> {
        let phase = (!phase.trim().is_empty()).then(|| phase.to_string());
        let (po, _) = self.po_repo.update_atomically(po_id, |po| -> ApiResult<()> {
            po.project_phase = phase;
            Ok(())
        })?;
        Ok(po)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, po_id: &str) -> ApiResult<PurchaseOrder> {
        self.po_repo
            .find_by_id(po_id)?
            .ok_or_else(|| ApiError::NotFound(format!("采购单{}不存在", po_id)))
    }

    pub fn list_all(&self) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(self.po_repo.list_all()?)
    }

    pub fn list_by_project(&self, project_name: &str) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(self.po_repo.list_by_project(project_name)?)
    }

    pub fn list_by_supplier(&self, supplier_id: &str) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(self.po_repo.list_by_supplier(supplier_id)?)
    }

    pub fn list_by_status(&self, status: PurchaseOrderStatus) -> ApiResult<Vec<PurchaseOrder>> {
        Ok(self.po_repo.list_by_status(status)?)
    }

    // ==========================================
    // 报表 / 导出
    // ==========================================

    /// 采购报表
    ///
    /// # 参数
    /// - `date_from` / `date_to`: 建立日期范围 (含端点), None 不限
    /// - `project_name`: None 时统计全部项目
    pub fn generate_purchase_report(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        project_name: Option<&str>,
    ) -> ApiResult<PurchaseReport> {
        let orders = match project_name {
            Some(name) => self.po_repo.list_by_project(name)?,
            None => self.po_repo.list_all()?,
        };
        let period = ReportPeriod {
            date_from,
            date_to,
            project_name: project_name.map(str::to_string),
        };
        Ok(self.report_engine.purchase_report(&orders, period))
    }

    pub fn export_purchase_order(&self, po_id: &str) -> ApiResult<PurchaseOrderExport> {
        let po = self.get(po_id)?;
        Ok(PurchaseOrderExport::from_order(&po))
    }
}
