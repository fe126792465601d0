// ==========================================
// 工程采购管理系统 - 供应商仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::supplier::{CooperationRecord, Supplier};
use crate::repository::codec::{from_json, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 供应商仓储
/// 职责: 管理 supplier 表
pub struct SupplierRepository {
    conn: Arc<Mutex<Connection>>,
}

struct SupplierRow {
    supplier_id: String,
    company_name: String,
    contact_person: String,
    phone: String,
    email: String,
    address: String,
    cooperation_history_json: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl SupplierRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            supplier_id: row.get(0)?,
            company_name: row.get(1)?,
            contact_person: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
            address: row.get(5)?,
            cooperation_history_json: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_supplier(self) -> RepositoryResult<Supplier> {
        let cooperation_history: Vec<CooperationRecord> =
            from_json("cooperation_history_json", &self.cooperation_history_json)?;
        Ok(Supplier {
            supplier_id: self.supplier_id,
            company_name: self.company_name,
            contact_person: self.contact_person,
            phone: self.phone,
            email: self.email,
            address: self.address,
            cooperation_history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT supplier_id, company_name, contact_person, phone, email, address,
           cooperation_history_json, created_at, updated_at
    FROM supplier
"#;

fn load_supplier(conn: &Connection, supplier_id: &str) -> RepositoryResult<Option<Supplier>> {
    let sql = format!("{} WHERE supplier_id = ?1", SELECT_COLUMNS);
    let result = conn.query_row(&sql, params![supplier_id], SupplierRow::from_row);

    match result {
        Ok(row) => Ok(Some(row.into_supplier()?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_supplier(conn: &Connection, supplier: &Supplier) -> RepositoryResult<()> {
    let history = to_json(&supplier.cooperation_history)?;
    conn.execute(
        r#"
        INSERT INTO supplier (
            supplier_id, company_name, contact_person, phone, email, address,
            cooperation_history_json, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(supplier_id) DO UPDATE SET
            company_name = excluded.company_name,
            contact_person = excluded.contact_person,
            phone = excluded.phone,
            email = excluded.email,
            address = excluded.address,
            cooperation_history_json = excluded.cooperation_history_json,
            updated_at = excluded.updated_at
        "#,
        params![
            supplier.supplier_id,
            supplier.company_name,
            supplier.contact_person,
            supplier.phone,
            supplier.email,
            supplier.address,
            history,
            supplier.created_at,
            supplier.updated_at,
        ],
    )?;
    Ok(())
}

impl SupplierRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或覆盖供应商
    pub fn upsert(&self, supplier: &Supplier) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_supplier(&conn, supplier)
    }

    /// 按编号查询
    ///
    /// # 返回
    /// - Ok(Some(Supplier)): 找到
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, supplier_id: &str) -> RepositoryResult<Option<Supplier>> {
        let conn = self.get_conn()?;
        load_supplier(&conn, supplier_id)
    }

    /// 以现有记录 (可能不存在) 合并出新记录并写回, 读写处于同一事务
    pub fn merge_atomically<F>(&self, supplier_id: &str, merge: F) -> RepositoryResult<Supplier>
    where
        F: FnOnce(Option<Supplier>) -> Supplier,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let supplier = merge(load_supplier(&tx, supplier_id)?);
        write_supplier(&tx, &supplier)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(supplier)
    }

    /// 读取-修改-写回供应商
    ///
    /// # 返回
    /// - Err(NotFound): 供应商未登记
    /// - Err(apply 的错误): 已回滚
    pub fn update_atomically<T, E, F>(&self, supplier_id: &str, apply: F) -> Result<(Supplier, T), E>
    where
        F: FnOnce(&mut Supplier) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut supplier = load_supplier(&tx, supplier_id)?
            .ok_or_else(|| RepositoryError::not_found("Supplier", supplier_id))?;
        let output = apply(&mut supplier)?;

        write_supplier(&tx, &supplier)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((supplier, output))
    }

    /// 查询全部供应商（按编号排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Supplier>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY supplier_id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], SupplierRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.into_iter().map(SupplierRow::into_supplier).collect()
    }

    /// 在给定编号中筛选已登记的供应商编号（保持输入顺序）
    pub fn filter_existing(&self, supplier_ids: &[String]) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT 1 FROM supplier WHERE supplier_id = ?1")?;
        let mut existing = Vec::new();
        for id in supplier_ids {
            if stmt.exists(params![id])? {
                existing.push(id.clone());
            }
        }
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::supplier::{SupplierContact, SupplierInput};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_test_supplier(id: &str) -> Supplier {
        Supplier::new(
            SupplierInput {
                supplier_id: id.to_string(),
                company_name: format!("{} 建材行", id),
                contact: SupplierContact {
                    contact_person: "王先生".to_string(),
                    phone: "02-1234-5678".to_string(),
                    email: "sales@example.com".to_string(),
                    address: "台北市".to_string(),
                },
            },
            now(),
        )
    }

    #[test]
    fn test_upsert_and_find() {
        let repo = SupplierRepository::new(open_in_memory().unwrap());
        let mut supplier = make_test_supplier("SUP001");
        repo.upsert(&supplier).unwrap();

        supplier.record_cooperation(CooperationRecord {
            po_id: "PO000001".to_string(),
            project_name: "A".to_string(),
            amount: 1000.0,
            recorded_at: now(),
        });
        repo.upsert(&supplier).unwrap();

        let found = repo.find_by_id("SUP001").unwrap().unwrap();
        assert_eq!(found, supplier);
        assert!(repo.find_by_id("SUP404").unwrap().is_none());
    }

    #[test]
    fn test_update_and_merge_atomically() {
        let repo = SupplierRepository::new(open_in_memory().unwrap());
        let created = repo
            .merge_atomically("SUP001", |existing| {
                assert!(existing.is_none());
                make_test_supplier("SUP001")
            })
            .unwrap();

        let (updated, count) = repo
            .update_atomically("SUP001", |supplier| -> RepositoryResult<usize> {
                supplier.record_cooperation(CooperationRecord {
                    po_id: "PO000001".to_string(),
                    project_name: "A".to_string(),
                    amount: 500.0,
                    recorded_at: now(),
                });
                Ok(supplier.cooperation_history.len())
            })
            .unwrap();
        assert_eq!(count, 1);

        let merged = repo
            .merge_atomically("SUP001", |existing| {
                let mut supplier = existing.unwrap();
                supplier.company_name = "改名建材行".to_string();
                supplier
            })
            .unwrap();
        assert_eq!(merged.cooperation_history, updated.cooperation_history);
        assert_eq!(merged.created_at, created.created_at);
        assert_eq!(repo.find_by_id("SUP001").unwrap().unwrap(), merged);

        let err = repo
            .update_atomically("SUP404", |_| -> RepositoryResult<()> { unreachable!() })
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_filter_existing_keeps_order() {
        let repo = SupplierRepository::new(open_in_memory().unwrap());
        repo.upsert(&make_test_supplier("SUP002")).unwrap();
        repo.upsert(&make_test_supplier("SUP001")).unwrap();

        let ids = vec!["SUP001".to_string(), "SUP999".to_string(), "SUP002".to_string()];
        assert_eq!(repo.filter_existing(&ids).unwrap(), vec!["SUP001", "SUP002"]);
        assert_eq!(repo.list_all().unwrap().len(), 2);
    }
}
