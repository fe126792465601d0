// ==========================================
// 工程采购管理系统 - 询价单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 明细与目标供应商以 JSON 列随主记录整体读写
// ==========================================

use crate::domain::inquiry::{Inquiry, InquiryItem};
use crate::domain::types::InquiryStatus;
use crate::repository::codec::{from_json, parse_code, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 询价单查询条件（均为可选, 组合为 AND）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquirySearchCriteria {
    /// 项目名称包含
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub status: Option<InquiryStatus>,
    #[serde(default)]
    pub created_from: Option<NaiveDate>,
    #[serde(default)]
    pub created_to: Option<NaiveDate>,
}

/// 询价单仓储
pub struct InquiryRepository {
    conn: Arc<Mutex<Connection>>,
}

struct InquiryRow {
    inquiry_id: String,
    project_name: String,
    project_code: String,
    created_at: NaiveDateTime,
    expected_order_date: Option<NaiveDate>,
    sent_at: Option<NaiveDateTime>,
    status: String,
    items_json: String,
    target_supplier_ids_json: String,
}

impl InquiryRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            inquiry_id: row.get(0)?,
            project_name: row.get(1)?,
            project_code: row.get(2)?,
            created_at: row.get(3)?,
            expected_order_date: row.get(4)?,
            sent_at: row.get(5)?,
            status: row.get(6)?,
            items_json: row.get(7)?,
            target_supplier_ids_json: row.get(8)?,
        })
    }

    fn into_inquiry(self) -> RepositoryResult<Inquiry> {
        let items: Vec<InquiryItem> = from_json("items_json", &self.items_json)?;
        let target_supplier_ids: Vec<String> =
            from_json("target_supplier_ids_json", &self.target_supplier_ids_json)?;
        Ok(Inquiry {
            inquiry_id: self.inquiry_id,
            project_name: self.project_name,
            project_code: self.project_code,
            created_at: self.created_at,
            expected_order_date: self.expected_order_date,
            sent_at: self.sent_at,
            items,
            target_supplier_ids,
            status: parse_code("status", &self.status, InquiryStatus::from_db_str)?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT inquiry_id, project_name, project_code, created_at, expected_order_date,
           sent_at, status, items_json, target_supplier_ids_json
    FROM inquiry
"#;

fn load_inquiry(conn: &Connection, inquiry_id: &str) -> RepositoryResult<Option<Inquiry>> {
    let sql = format!("{} WHERE inquiry_id = ?1", SELECT_COLUMNS);
    let result = conn.query_row(&sql, params![inquiry_id], InquiryRow::from_row);

    match result {
        Ok(row) => Ok(Some(row.into_inquiry()?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_inquiry(conn: &Connection, inquiry: &Inquiry) -> RepositoryResult<()> {
    let items = to_json(&inquiry.items)?;
    let targets = to_json(&inquiry.target_supplier_ids)?;
    conn.execute(
        r#"
        INSERT INTO inquiry (
            inquiry_id, project_name, project_code, created_at, expected_order_date,
            sent_at, status, items_json, target_supplier_ids_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(inquiry_id) DO UPDATE SET
            project_name = excluded.project_name,
            project_code = excluded.project_code,
            expected_order_date = excluded.expected_order_date,
            sent_at = excluded.sent_at,
            status = excluded.status,
            items_json = excluded.items_json,
            target_supplier_ids_json = excluded.target_supplier_ids_json
        "#,
        params![
            inquiry.inquiry_id,
            inquiry.project_name,
            inquiry.project_code,
            inquiry.created_at,
            inquiry.expected_order_date,
            inquiry.sent_at,
            inquiry.status.to_string(),
            items,
            targets,
        ],
    )?;
    Ok(())
}

impl InquiryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存询价单（新增或整体覆盖）
    pub fn save(&self, inquiry: &Inquiry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_inquiry(&conn, inquiry)
    }

    pub fn find_by_id(&self, inquiry_id: &str) -> RepositoryResult<Option<Inquiry>> {
        let conn = self.get_conn()?;
        load_inquiry(&conn, inquiry_id)
    }

    /// 读取-修改-写回询价单 (同一 IMMEDIATE 事务)
    ///
    /// # 返回
    /// - Err(NotFound): 询价单不存在
    /// - Err(apply 的错误): 已回滚, 询价单不变
    pub fn update_atomically<T, E, F>(&self, inquiry_id: &str, apply: F) -> Result<(Inquiry, T), E>
    where
        F: FnOnce(&mut Inquiry) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut inquiry = load_inquiry(&tx, inquiry_id)?
            .ok_or_else(|| RepositoryError::not_found("Inquiry", inquiry_id))?;
        let output = apply(&mut inquiry)?;

        write_inquiry(&tx, &inquiry)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((inquiry, output))
    }

    /// 查询全部询价单（按建立顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Inquiry>> {
        self.search(&InquirySearchCriteria::default())
    }

    pub fn list_by_status(&self, status: InquiryStatus) -> RepositoryResult<Vec<Inquiry>> {
        self.search(&InquirySearchCriteria {
            status: Some(status),
            ..Default::default()
        })
    }

    /// 条件查询
    pub fn search(&self, criteria: &InquirySearchCriteria) -> RepositoryResult<Vec<Inquiry>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(name) = criteria.project_name.as_deref().filter(|n| !n.is_empty()) {
            clauses.push("instr(project_name, ?) > 0");
            values.push(name.to_string());
        }
        if let Some(status) = criteria.status {
            clauses.push("status = ?");
            values.push(status.to_string());
        }
        if let Some(from) = criteria.created_from {
            clauses.push("date(created_at) >= ?");
            values.push(from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = criteria.created_to {
            clauses.push("date(created_at) <= ?");
            values.push(to.format("%Y-%m-%d").to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("{} {} ORDER BY rowid", SELECT_COLUMNS, where_sql);

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), InquiryRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.into_iter().map(InquiryRow::into_inquiry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_test_inquiry(id: &str, project: &str, day: u32) -> Inquiry {
        let mut inquiry = Inquiry::new(
            id.to_string(),
            project.to_string(),
            format!("P-{}", id),
            NaiveDate::from_ymd_opt(2024, 4, 1),
            at(day),
        );
        inquiry.add_item(InquiryItem {
            item_id: "T001".to_string(),
            item_name: "水泥".to_string(),
            specification: "P.O 42.5".to_string(),
            unit: "包".to_string(),
            quantity: 500,
            estimated_unit_price: 180.0,
        });
        inquiry
    }

    #[test]
    fn test_save_round_trip() {
        let repo = InquiryRepository::new(open_in_memory().unwrap());
        let mut inquiry = make_test_inquiry("INQ000001", "台北商辦大樓", 1);
        repo.save(&inquiry).unwrap();

        inquiry.add_target_suppliers(vec!["SUP001".to_string()]);
        inquiry.send(at(2)).unwrap();
        repo.save(&inquiry).unwrap();

        let found = repo.find_by_id("INQ000001").unwrap().unwrap();
        assert_eq!(found, inquiry);
    }

    #[test]
    fn test_rejected_update_leaves_inquiry_unchanged() {
        let repo = InquiryRepository::new(open_in_memory().unwrap());
        let inquiry = make_test_inquiry("INQ000001", "台北商辦大樓", 1);
        repo.save(&inquiry).unwrap();

        let rejected = repo.update_atomically("INQ000001", |inq| -> RepositoryResult<()> {
            inq.send(at(2))
                .map_err(|r| RepositoryError::InternalError(format!("{:?}", r)))
        });
        assert!(matches!(rejected, Err(RepositoryError::InternalError(_))));
        assert_eq!(repo.find_by_id("INQ000001").unwrap().unwrap(), inquiry);

        let (sent, added) = repo
            .update_atomically("INQ000001", |inq| -> RepositoryResult<usize> {
                let added = inq.add_target_suppliers(vec!["SUP001".to_string()]);
                inq.send(at(2))
                    .map_err(|r| RepositoryError::InternalError(format!("{:?}", r)))?;
                Ok(added)
            })
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(sent.status, InquiryStatus::Sent);
        assert_eq!(repo.find_by_id("INQ000001").unwrap().unwrap(), sent);
    }

    #[test]
    fn test_search_filters() {
        let repo = InquiryRepository::new(open_in_memory().unwrap());
        repo.save(&make_test_inquiry("INQ000001", "台北商辦大樓", 1)).unwrap();
        repo.save(&make_test_inquiry("INQ000002", "新竹廠房", 5)).unwrap();
        repo.save(&make_test_inquiry("INQ000003", "台北捷運站", 10)).unwrap();

        let taipei = repo
            .search(&InquirySearchCriteria {
                project_name: Some("台北".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(taipei.len(), 2);
        assert_eq!(taipei[0].inquiry_id, "INQ000001");

        let ranged = repo
            .search(&InquirySearchCriteria {
                created_from: NaiveDate::from_ymd_opt(2024, 3, 2),
                created_to: NaiveDate::from_ymd_opt(2024, 3, 10),
                ..Default::default()
            })
            .unwrap();
        let ids: Vec<_> = ranged.iter().map(|i| i.inquiry_id.as_str()).collect();
        assert_eq!(ids, vec!["INQ000002", "INQ000003"]);

        assert_eq!(repo.list_by_status(InquiryStatus::Draft).unwrap().len(), 3);
        assert!(repo.list_by_status(InquiryStatus::Sent).unwrap().is_empty());
    }
}
