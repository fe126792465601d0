// ==========================================
// 工程采购管理系统 - 采购单
// ==========================================
// 不变量: total_amount == Σ items.total_price (每次追加明细后重算)
// 状态机: CREATED -> CONFIRMED (仅确认一次, 确认时扣减预算)
// ==========================================

use crate::domain::types::{DeliveryStatus, PurchaseOrderStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 采购明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub item_id: String,
    pub item_name: String,
    pub specification: String,
    pub unit: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64, // = quantity × unit_price
}

impl PurchaseOrderItem {
    pub fn new(
        item_id: String,
        item_name: String,
        specification: String,
        unit: String,
        quantity: u32,
        unit_price: f64,
    ) -> Self {
        Self {
            item_id,
            item_name,
            specification,
            unit,
            quantity,
            unit_price,
            total_price: quantity as f64 * unit_price,
        }
    }
}

/// 状态变更记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub changed_at: NaiveDateTime,
    pub previous_status: PurchaseOrderStatus,
    pub new_status: PurchaseOrderStatus,
    pub remarks: String,
}

/// 采购单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub po_id: String,
    pub inquiry_id: String,
    pub supplier_id: String,
    pub project_name: String,
    pub project_phase: Option<String>, // 工程阶段, 报表中缺省归入主体工程
    pub created_at: NaiveDateTime,
    pub items: Vec<PurchaseOrderItem>,
    pub total_amount: f64,
    pub payment_terms: String,
    pub delivery_address: String,
    pub expected_delivery_date: Option<NaiveDateTime>,
    pub actual_delivery_date: Option<NaiveDateTime>,
    pub delivery_delay_days: Option<i64>, // 正数为延误天数, <=0 为准时
    pub delivery_status: Option<DeliveryStatus>,
    pub status: PurchaseOrderStatus,
    pub confirmed_at: Option<NaiveDateTime>,
    pub last_updated_at: Option<NaiveDateTime>,
    pub status_history: Vec<StatusChange>,
}

impl PurchaseOrder {
    pub fn new(
        po_id: String,
        inquiry_id: String,
        supplier_id: String,
        project_name: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            po_id,
            inquiry_id,
            supplier_id,
            project_name,
            project_phase: None,
            created_at: now,
            items: Vec::new(),
            total_amount: 0.0,
            payment_terms: String::new(),
            delivery_address: String::new(),
            expected_delivery_date: None,
            actual_delivery_date: None,
            delivery_delay_days: None,
            delivery_status: None,
            status: PurchaseOrderStatus::Created,
            confirmed_at: None,
            last_updated_at: None,
            status_history: Vec::new(),
        }
    }

    /// 追加采购明细并重算总额
    pub fn add_item(&mut self, item: PurchaseOrderItem) {
        self.items.push(item);
        self.total_amount = self.items.iter().map(|i| i.total_price).sum();
    }

    /// 标记为已确认（调用方负责预算校验与扣减）
    pub fn confirm(&mut self, now: NaiveDateTime) {
        self.status = PurchaseOrderStatus::Confirmed;
        self.confirmed_at = Some(now);
        self.last_updated_at = Some(now);
    }

    /// 更新状态; 备注非空时写入状态历史
    pub fn update_status(&mut self, status: PurchaseOrderStatus, remarks: &str, now: NaiveDateTime) {
        let previous = self.status;
        self.status = status;
        self.last_updated_at = Some(now);
        if !remarks.is_empty() {
            self.status_history.push(StatusChange {
                changed_at: now,
                previous_status: previous,
                new_status: status,
                remarks: remarks.to_string(),
            });
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.actual_delivery_date.is_some()
    }

    /// 已交货且未延误
    pub fn is_on_time(&self) -> bool {
        self.is_delivered() && self.delivery_delay_days.unwrap_or(0) <= 0
    }
}

/// 成本控制记录（采购单确认时写入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostControlRecord {
    pub po_id: String,
    pub project_name: String,
    pub amount: f64,
    pub recorded_at: NaiveDateTime,
    pub status: String,
}

impl CostControlRecord {
    pub const STATUS_PURCHASED: &'static str = "PURCHASED";

    pub fn purchased(po: &PurchaseOrder, now: NaiveDateTime) -> Self {
        Self {
            po_id: po.po_id.clone(),
            project_name: po.project_name.clone(),
            amount: po.total_amount,
            recorded_at: now,
            status: Self::STATUS_PURCHASED.to_string(),
        }
    }
}

// ==========================================
// 采购单导出结构
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderExport {
    pub header: PurchaseOrderExportHeader,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderExportHeader {
    pub po_id: String,
    pub project_name: String,
    pub supplier_id: String,
    pub created_at: NaiveDateTime,
    pub total_amount: f64,
    pub payment_terms: String,
    pub delivery_address: String,
    pub expected_delivery_date: Option<NaiveDateTime>,
    pub status: PurchaseOrderStatus,
}

impl PurchaseOrderExport {
    pub fn from_order(po: &PurchaseOrder) -> Self {
        Self {
            header: PurchaseOrderExportHeader {
                po_id: po.po_id.clone(),
                project_name: po.project_name.clone(),
                supplier_id: po.supplier_id.clone(),
                created_at: po.created_at,
                total_amount: po.total_amount,
                payment_terms: po.payment_terms.clone(),
                delivery_address: po.delivery_address.clone(),
                expected_delivery_date: po.expected_delivery_date,
                status: po.status,
            },
            items: po.items.clone(),
        }
    }

    /// 由明细重新汇总的总额
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.total_price).sum()
    }
}
