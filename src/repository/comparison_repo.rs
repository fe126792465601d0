// ==========================================
// 工程采购管理系统 - 比价表仓储
// ==========================================
// 每个询价单一张比价表; save 为整体覆盖 (重建会清除决标结果)
// ==========================================

use crate::domain::comparison::ComparisonTable;
use crate::repository::codec::{from_json, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 比价表仓储
pub struct ComparisonRepository {
    conn: Arc<Mutex<Connection>>,
}

struct ComparisonRow {
    inquiry_id: String,
    project_name: String,
    created_at: NaiveDateTime,
    quote_ids_json: String,
    selected_supplier_id: Option<String>,
    decision_reason: Option<String>,
    decision_date: Option<NaiveDateTime>,
}

impl ComparisonRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            inquiry_id: row.get(0)?,
            project_name: row.get(1)?,
            created_at: row.get(2)?,
            quote_ids_json: row.get(3)?,
            selected_supplier_id: row.get(4)?,
            decision_reason: row.get(5)?,
            decision_date: row.get(6)?,
        })
    }

    fn into_table(self) -> RepositoryResult<ComparisonTable> {
        Ok(ComparisonTable {
            inquiry_id: self.inquiry_id,
            project_name: self.project_name,
            created_at: self.created_at,
            quote_ids: from_json("quote_ids_json", &self.quote_ids_json)?,
            selected_supplier_id: self.selected_supplier_id,
            decision_reason: self.decision_reason,
            decision_date: self.decision_date,
        })
    }
}

fn load_table(conn: &Connection, inquiry_id: &str) -> RepositoryResult<Option<ComparisonTable>> {
    let result = conn.query_row(
        r#"
        SELECT inquiry_id, project_name, created_at, quote_ids_json,
               selected_supplier_id, decision_reason, decision_date
        FROM comparison_table
        WHERE inquiry_id = ?1
        "#,
        params![inquiry_id],
        ComparisonRow::from_row,
    );

    match result {
        Ok(row) => Ok(Some(row.into_table()?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_table(conn: &Connection, table: &ComparisonTable) -> RepositoryResult<()> {
    let quote_ids = to_json(&table.quote_ids)?;
    conn.execute(
        r#"
        INSERT OR REPLACE INTO comparison_table (
            inquiry_id, project_name, created_at, quote_ids_json,
            selected_supplier_id, decision_reason, decision_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            table.inquiry_id,
            table.project_name,
            table.created_at,
            quote_ids,
            table.selected_supplier_id,
            table.decision_reason,
            table.decision_date,
        ],
    )?;
    Ok(())
}

impl ComparisonRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存比价表（整体覆盖）
    pub fn save(&self, table: &ComparisonTable) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_table(&conn, table)
    }

    pub fn find_by_inquiry(&self, inquiry_id: &str) -> RepositoryResult<Option<ComparisonTable>> {
        let conn = self.get_conn()?;
        load_table(&conn, inquiry_id)
    }

    /// 读取-修改-写回比价表 (同一 IMMEDIATE 事务)
    ///
    /// # 返回
    /// - Err(NotFound): 该询价单尚无比价表
    pub fn update_atomically<T, E, F>(&self, inquiry_id: &str, apply: F) -> Result<(ComparisonTable, T), E>
    where
        F: FnOnce(&mut ComparisonTable) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut table = load_table(&tx, inquiry_id)?
            .ok_or_else(|| RepositoryError::not_found("ComparisonTable", inquiry_id))?;
        let output = apply(&mut table)?;

        write_table(&tx, &table)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((table, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_rebuild_replaces_selection() {
        let repo = ComparisonRepository::new(open_in_memory().unwrap());
        let mut table = ComparisonTable::new(
            "INQ1".to_string(),
            "A".to_string(),
            vec!["QUO000001".to_string()],
            now(),
        );
        table.select_supplier("SUP001".to_string(), "價格最低".to_string(), now());
        repo.save(&table).unwrap();
        assert_eq!(repo.find_by_inquiry("INQ1").unwrap().unwrap(), table);

        let rebuilt = ComparisonTable::new(
            "INQ1".to_string(),
            "A".to_string(),
            vec!["QUO000001".to_string(), "QUO000002".to_string()],
            now(),
        );
        repo.save(&rebuilt).unwrap();
        let found = repo.find_by_inquiry("INQ1").unwrap().unwrap();
        assert!(found.selected_supplier_id.is_none());
        assert_eq!(found.quote_ids.len(), 2);
    }

    #[test]
    fn test_decision_update_requires_table() {
        let repo = ComparisonRepository::new(open_in_memory().unwrap());
        let err = repo
            .update_atomically("INQ404", |_| -> RepositoryResult<()> { unreachable!() })
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        repo.save(&ComparisonTable::new("INQ1".to_string(), "A".to_string(), vec![], now()))
            .unwrap();
        let (table, _) = repo
            .update_atomically("INQ1", |table| -> RepositoryResult<()> {
                table.select_supplier("SUP002".to_string(), "交期最短".to_string(), now());
                Ok(())
            })
            .unwrap();
        assert_eq!(table.selected_supplier_id.as_deref(), Some("SUP002"));
        assert_eq!(repo.find_by_inquiry("INQ1").unwrap().unwrap(), table);
    }
}
