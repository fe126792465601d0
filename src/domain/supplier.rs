// ==========================================
// 工程采购管理系统 - 供应商
// ==========================================
// 身份 (supplier_id / company_name) 不可变, 联系方式可更新
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 供应商
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: String,  // 供应商编号
    pub company_name: String, // 公司名称
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub cooperation_history: Vec<CooperationRecord>, // 合作记录 (采购单确认后追加)
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 合作记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooperationRecord {
    pub po_id: String,
    pub project_name: String,
    pub amount: f64,
    pub recorded_at: NaiveDateTime,
}

/// 供应商登记输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierInput {
    pub supplier_id: String,
    pub company_name: String,
    #[serde(default)]
    pub contact: SupplierContact,
}

/// 可变的联系方式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierContact {
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl Supplier {
    pub fn new(input: SupplierInput, now: NaiveDateTime) -> Self {
        let SupplierInput {
            supplier_id,
            company_name,
            contact,
        } = input;
        Self {
            supplier_id,
            company_name,
            contact_person: contact.contact_person,
            phone: contact.phone,
            email: contact.email,
            address: contact.address,
            cooperation_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contact(&self) -> SupplierContact {
        SupplierContact {
            contact_person: self.contact_person.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
        }
    }

    /// 更新联系方式
    pub fn update_contact(&mut self, contact: SupplierContact, now: NaiveDateTime) {
        self.contact_person = contact.contact_person;
        self.phone = contact.phone;
        self.email = contact.email;
        self.address = contact.address;
        self.updated_at = now;
    }

    /// 追加合作记录
    pub fn record_cooperation(&mut self, record: CooperationRecord) {
        self.updated_at = record.recorded_at;
        self.cooperation_history.push(record);
    }

    /// 累计合作金额
    pub fn total_cooperation_amount(&self) -> f64 {
        self.cooperation_history.iter().map(|r| r.amount).sum()
    }
}
