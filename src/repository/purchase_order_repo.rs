// ==========================================
// 工程采购管理系统 - 采购单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 确认下单: 采购单 + 预算 + 成本控制记录在同一事务内读写,
//           判定逻辑由调用方以闭包传入, 拒绝时整体回滚
// ==========================================

use crate::domain::budget::{BudgetRecord, ConfirmRejection};
use crate::domain::purchase_order::{CostControlRecord, PurchaseOrder, PurchaseOrderItem, StatusChange};
use crate::domain::types::{DeliveryStatus, PurchaseOrderStatus};
use crate::repository::budget_repo::{insert_cost_control, load_budget, write_budget};
use crate::repository::codec::{from_json, parse_code, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 确认成功的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedOrder {
    pub order: PurchaseOrder,
    pub budget: BudgetRecord,
    pub cost_control: CostControlRecord,
}

/// 采购单仓储
pub struct PurchaseOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

struct PurchaseOrderRow {
    po_id: String,
    inquiry_id: String,
    supplier_id: String,
    project_name: String,
    project_phase: Option<String>,
    created_at: NaiveDateTime,
    items_json: String,
    total_amount: f64,
    payment_terms: String,
    delivery_address: String,
    expected_delivery_date: Option<NaiveDateTime>,
    actual_delivery_date: Option<NaiveDateTime>,
    delivery_delay_days: Option<i64>,
    delivery_status: Option<String>,
    status: String,
    confirmed_at: Option<NaiveDateTime>,
    last_updated_at: Option<NaiveDateTime>,
    status_history_json: String,
}

impl PurchaseOrderRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            po_id: row.get(0)?,
            inquiry_id: row.get(1)?,
            supplier_id: row.get(2)?,
            project_name: row.get(3)?,
            project_phase: row.get(4)?,
            created_at: row.get(5)?,
            items_json: row.get(6)?,
            total_amount: row.get(7)?,
            payment_terms: row.get(8)?,
            delivery_address: row.get(9)?,
            expected_delivery_date: row.get(10)?,
            actual_delivery_date: row.get(11)?,
            delivery_delay_days: row.get(12)?,
            delivery_status: row.get(13)?,
            status: row.get(14)?,
            confirmed_at: row.get(15)?,
            last_updated_at: row.get(16)?,
            status_history_json: row.get(17)?,
        })
    }

    fn into_order(self) -> RepositoryResult<PurchaseOrder> {
        let items: Vec<PurchaseOrderItem> = from_json("items_json", &self.items_json)?;
        let status_history: Vec<StatusChange> =
            from_json("status_history_json", &self.status_history_json)?;
        let delivery_status = match self.delivery_status {
            Some(raw) => Some(parse_code("delivery_status", &raw, DeliveryStatus::from_db_str)?),
            None => None,
        };
        Ok(PurchaseOrder {
            po_id: self.po_id,
            inquiry_id: self.inquiry_id,
            supplier_id: self.supplier_id,
            project_name: self.project_name,
            project_phase: self.project_phase,
            created_at: self.created_at,
            items,
            total_amount: self.total_amount,
            payment_terms: self.payment_terms,
            delivery_address: self.delivery_address,
            expected_delivery_date: self.expected_delivery_date,
            actual_delivery_date: self.actual_delivery_date,
            delivery_delay_days: self.delivery_delay_days,
            delivery_status,
            status: parse_code("status", &self.status, PurchaseOrderStatus::from_db_str)?,
            confirmed_at: self.confirmed_at,
            last_updated_at: self.last_updated_at,
            status_history,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT po_id, inquiry_id, supplier_id, project_name, project_phase, created_at,
           items_json, total_amount, payment_terms, delivery_address,
           expected_delivery_date, actual_delivery_date, delivery_delay_days, delivery_status,
           status, confirmed_at, last_updated_at, status_history_json
    FROM purchase_order
"#;

fn load_order(conn: &Connection, po_id: &str) -> RepositoryResult<Option<PurchaseOrder>> {
    let sql = format!("{} WHERE po_id = ?1", SELECT_COLUMNS);
    match conn.query_row(&sql, params![po_id], PurchaseOrderRow::from_row) {
        Ok(row) => Ok(Some(row.into_order()?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_order(conn: &Connection, po: &PurchaseOrder) -> RepositoryResult<()> {
    let items = to_json(&po.items)?;
    let history = to_json(&po.status_history)?;
    conn.execute(
        r#"
        INSERT INTO purchase_order (
            po_id, inquiry_id, supplier_id, project_name, project_phase, created_at,
            items_json, total_amount, payment_terms, delivery_address,
            expected_delivery_date, actual_delivery_date, delivery_delay_days, delivery_status,
            status, confirmed_at, last_updated_at, status_history_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ON CONFLICT(po_id) DO UPDATE SET
            project_phase = excluded.project_phase,
            items_json = excluded.items_json,
            total_amount = excluded.total_amount,
            payment_terms = excluded.payment_terms,
            delivery_address = excluded.delivery_address,
            expected_delivery_date = excluded.expected_delivery_date,
            actual_delivery_date = excluded.actual_delivery_date,
            delivery_delay_days = excluded.delivery_delay_days,
            delivery_status = excluded.delivery_status,
            status = excluded.status,
            confirmed_at = excluded.confirmed_at,
            last_updated_at = excluded.last_updated_at,
            status_history_json = excluded.status_history_json
        "#,
        params![
            po.po_id,
            po.inquiry_id,
            po.supplier_id,
            po.project_name,
            po.project_phase,
            po.created_at,
            items,
            po.total_amount,
            po.payment_terms,
            po.delivery_address,
            po.expected_delivery_date,
            po.actual_delivery_date,
            po.delivery_delay_days,
            po.delivery_status.map(|s| s.to_string()),
            po.status.to_string(),
            po.confirmed_at,
            po.last_updated_at,
            history,
        ],
    )?;
    Ok(())
}

impl PurchaseOrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存采购单（新增或整体覆盖）
    pub fn save(&self, po: &PurchaseOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_order(&conn, po)
    }

    pub fn find_by_id(&self, po_id: &str) -> RepositoryResult<Option<PurchaseOrder>> {
        let conn = self.get_conn()?;
        load_order(&conn, po_id)
    }

    fn query_list(&self, where_sql: &str, value: Option<&str>) -> RepositoryResult<Vec<PurchaseOrder>> {
        let conn = self.get_conn()?;
        let sql = format!("{} {} ORDER BY rowid", SELECT_COLUMNS, where_sql);
        let mut stmt = conn.prepare(&sql)?;
        let rows = match value {
            Some(v) => stmt
                .query_map(params![v], PurchaseOrderRow::from_row)?
                .collect::<SqliteResult<Vec<_>>>()?,
            None => stmt
                .query_map([], PurchaseOrderRow::from_row)?
                .collect::<SqliteResult<Vec<_>>>()?,
        };
        rows.into_iter().map(PurchaseOrderRow::into_order).collect()
    }

    /// 全部采购单（按建立顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<PurchaseOrder>> {
        self.query_list("", None)
    }

    pub fn list_by_project(&self, project_name: &str) -> RepositoryResult<Vec<PurchaseOrder>> {
        self.query_list("WHERE project_name = ?1", Some(project_name))
    }

    pub fn list_by_supplier(&self, supplier_id: &str) -> RepositoryResult<Vec<PurchaseOrder>> {
        self.query_list("WHERE supplier_id = ?1", Some(supplier_id))
    }

    pub fn list_by_status(&self, status: PurchaseOrderStatus) -> RepositoryResult<Vec<PurchaseOrder>> {
        self.query_list("WHERE status = ?1", Some(&status.to_string()))
    }

    /// 读取-修改-写回采购单, 整个过程持有连接锁并处于同一 IMMEDIATE 事务
    ///
    /// # 参数
    /// - `apply`: 修改采购单; 返回 Err 时回滚, 不写入任何内容
    ///
    /// # 返回
    /// - Err(NotFound): 采购单不存在
    /// - Ok((修改后的采购单, apply 的返回值))
    pub fn update_atomically<T, E, F>(&self, po_id: &str, apply: F) -> Result<(PurchaseOrder, T), E>
    where
        F: FnOnce(&mut PurchaseOrder) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut order = load_order(&tx, po_id)?
            .ok_or_else(|| RepositoryError::not_found("PurchaseOrder", po_id))?;
        let output = apply(&mut order)?;

        write_order(&tx, &order)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((order, output))
    }

    /// 原子确认下单
    ///
    /// # 参数
    /// - `po_id`: 采购单号
    /// - `decide`: 判定并修改采购单/预算, 返回成本控制记录; 返回 Err 表示拒绝
    ///
    /// # 返回
    /// - Err(NotFound): 采购单不存在
    /// - Ok(Err(ConfirmRejection)): 判定拒绝, 未写入任何修改
    /// - Ok(Ok(ConfirmedOrder)): 已提交
    ///
    /// # 说明
    /// 持有共享连接锁并以 IMMEDIATE 事务执行, 同一预算的并发确认串行化
    pub fn confirm_atomically<F>(
        &self,
        po_id: &str,
        decide: F,
    ) -> RepositoryResult<Result<ConfirmedOrder, ConfirmRejection>>
    where
        F: FnOnce(&mut PurchaseOrder, Option<&mut BudgetRecord>) -> Result<CostControlRecord, ConfirmRejection>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut order = load_order(&tx, po_id)?
            .ok_or_else(|| RepositoryError::not_found("PurchaseOrder", po_id))?;
        let mut budget = load_budget(&tx, &order.project_name)?;

        let cost_control = match decide(&mut order, budget.as_mut()) {
            Ok(record) => record,
            // tx 在此处 drop, 自动回滚
            Err(rejection) => return Ok(Err(rejection)),
        };

        let budget = budget.ok_or_else(|| {
            RepositoryError::InternalError(format!(
                "确认通过但预算记录缺失: project={}",
                order.project_name
            ))
        })?;

        write_order(&tx, &order)?;
        write_budget(&tx, &budget)?;
        insert_cost_control(&tx, &cost_control)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(Ok(ConfirmedOrder {
            order,
            budget,
            cost_control,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::budget::BudgetRejection;
    use crate::repository::budget_repo::BudgetRepository;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_test_po(id: &str, project: &str, supplier: &str) -> PurchaseOrder {
        let mut po = PurchaseOrder::new(
            id.to_string(),
            "INQ000001".to_string(),
            supplier.to_string(),
            project.to_string(),
            now(),
        );
        po.add_item(PurchaseOrderItem::new(
            "T001".into(),
            "水泥".into(),
            "P.O 42.5".into(),
            "包".into(),
            500,
            180.0,
        ));
        po
    }

    #[test]
    fn test_save_and_queries() {
        let repo = PurchaseOrderRepository::new(open_in_memory().unwrap());
        repo.save(&make_test_po("PO000001", "A", "SUP001")).unwrap();
        repo.save(&make_test_po("PO000002", "B", "SUP001")).unwrap();
        repo.save(&make_test_po("PO000003", "A", "SUP002")).unwrap();

        assert_eq!(repo.list_all().unwrap().len(), 3);
        assert_eq!(repo.list_by_project("A").unwrap().len(), 2);
        assert_eq!(repo.list_by_supplier("SUP001").unwrap().len(), 2);
        assert_eq!(
            repo.list_by_status(PurchaseOrderStatus::Created).unwrap().len(),
            3
        );
        let found = repo.find_by_id("PO000002").unwrap().unwrap();
        assert_eq!(found, make_test_po("PO000002", "B", "SUP001"));
    }

    #[test]
    fn test_rejected_confirm_writes_nothing() {
        let conn = open_in_memory().unwrap();
        let repo = PurchaseOrderRepository::new(conn.clone());
        let budgets = BudgetRepository::new(conn);
        budgets.upsert(&BudgetRecord::new("A".into(), 100.0, 0.0, now())).unwrap();
        repo.save(&make_test_po("PO000001", "A", "SUP001")).unwrap();

        let result = repo
            .confirm_atomically("PO000001", |po, budget| {
                po.confirm(now());
                if let Some(b) = budget {
                    b.deduct(po.total_amount, now());
                }
                Err(ConfirmRejection::Budget(BudgetRejection::InsufficientBudget {
                    project_name: "A".into(),
                    remaining: 100.0,
                    required: 90_000.0,
                }))
            })
            .unwrap();
        assert!(result.is_err());

        let po = repo.find_by_id("PO000001").unwrap().unwrap();
        assert_eq!(po.status, PurchaseOrderStatus::Created);
        assert_eq!(budgets.find_by_project("A").unwrap().unwrap().used_budget, 0.0);
        assert!(budgets.list_cost_control("A").unwrap().is_empty());
    }

    #[test]
    fn test_update_atomically_writes_or_rolls_back() {
        let repo = PurchaseOrderRepository::new(open_in_memory().unwrap());
        repo.save(&make_test_po("PO000001", "A", "SUP001")).unwrap();

        let (updated, previous) = repo
            .update_atomically("PO000001", |po| -> RepositoryResult<Option<String>> {
                Ok(po.project_phase.replace("基础工程".to_string()))
            })
            .unwrap();
        assert_eq!(previous, None);
        assert_eq!(updated.project_phase.as_deref(), Some("基础工程"));
        assert_eq!(repo.find_by_id("PO000001").unwrap().unwrap(), updated);

        let err = repo
            .update_atomically("PO000001", |po| -> RepositoryResult<()> {
                po.project_phase = None;
                Err(RepositoryError::InternalError("拒绝".into()))
            })
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InternalError(_)));
        let stored = repo.find_by_id("PO000001").unwrap().unwrap();
        assert_eq!(stored.project_phase.as_deref(), Some("基础工程"));

        let missing = repo
            .update_atomically("PO404", |_| -> RepositoryResult<()> { unreachable!() })
            .unwrap_err();
        assert!(matches!(missing, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_confirm_missing_order() {
        let repo = PurchaseOrderRepository::new(open_in_memory().unwrap());
        let err = repo
            .confirm_atomically("PO404", |_, _| unreachable!())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
