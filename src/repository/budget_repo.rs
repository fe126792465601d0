// ==========================================
// 工程采购管理系统 - 预算台账仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 行级读写函数对 Connection 开放, 供采购单确认事务复用
// ==========================================

use crate::domain::budget::BudgetRecord;
use crate::domain::purchase_order::CostControlRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 预算台账仓储
pub struct BudgetRepository {
    conn: Arc<Mutex<Connection>>,
}

fn budget_from_row(row: &Row<'_>) -> SqliteResult<BudgetRecord> {
    Ok(BudgetRecord {
        project_name: row.get(0)?,
        total_budget: row.get(1)?,
        used_budget: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn cost_control_from_row(row: &Row<'_>) -> SqliteResult<CostControlRecord> {
    Ok(CostControlRecord {
        po_id: row.get(0)?,
        project_name: row.get(1)?,
        amount: row.get(2)?,
        recorded_at: row.get(3)?,
        status: row.get(4)?,
    })
}

/// 读取预算记录（事务内复用）
pub(crate) fn load_budget(conn: &Connection, project_name: &str) -> RepositoryResult<Option<BudgetRecord>> {
    let record = conn
        .query_row(
            r#"
            SELECT project_name, total_budget, used_budget, updated_at
            FROM budget_record
            WHERE project_name = ?1
            "#,
            params![project_name],
            budget_from_row,
        )
        .optional()?;
    Ok(record)
}

/// 写入预算记录（整体覆盖, 事务内复用）
pub(crate) fn write_budget(conn: &Connection, record: &BudgetRecord) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO budget_record (project_name, total_budget, used_budget, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(project_name) DO UPDATE SET
            total_budget = excluded.total_budget,
            used_budget = excluded.used_budget,
            updated_at = excluded.updated_at
        "#,
        params![
            record.project_name,
            record.total_budget,
            record.used_budget,
            record.updated_at,
        ],
    )?;
    Ok(())
}

/// 写入成本控制记录（事务内复用）
pub(crate) fn insert_cost_control(conn: &Connection, record: &CostControlRecord) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO cost_control_record (po_id, project_name, amount, recorded_at, status)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            record.po_id,
            record.project_name,
            record.amount,
            record.recorded_at,
            record.status,
        ],
    )?;
    Ok(())
}

impl BudgetRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 设置预算（整体覆盖, 不累加）
    pub fn upsert(&self, record: &BudgetRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_budget(&conn, record)
    }

    pub fn find_by_project(&self, project_name: &str) -> RepositoryResult<Option<BudgetRecord>> {
        let conn = self.get_conn()?;
        load_budget(&conn, project_name)
    }

    /// 扣减预算（单条 UPDATE, 不做余额校验）
    ///
    /// # 返回
    /// - Err(NotFound): 项目无预算记录
    pub fn deduct(
        &self,
        project_name: &str,
        amount: f64,
        now: chrono::NaiveDateTime,
    ) -> RepositoryResult<BudgetRecord> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE budget_record
            SET used_budget = used_budget + ?1, updated_at = ?2
            WHERE project_name = ?3
            "#,
            params![amount, now, project_name],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("BudgetRecord", project_name));
        }
        load_budget(&conn, project_name)?
            .ok_or_else(|| RepositoryError::not_found("BudgetRecord", project_name))
    }

    /// 查询项目的成本控制记录（按写入顺序）
    pub fn list_cost_control(&self, project_name: &str) -> RepositoryResult<Vec<CostControlRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT po_id, project_name, amount, recorded_at, status
            FROM cost_control_record
            WHERE project_name = ?1
            ORDER BY rowid
            "#,
        )?;
        let records = stmt
            .query_map(params![project_name], cost_control_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_set_overwrites_and_deduct_accumulates() {
        let repo = BudgetRepository::new(open_in_memory().unwrap());
        repo.upsert(&BudgetRecord::new("A".into(), 1_000.0, 100.0, now())).unwrap();
        repo.upsert(&BudgetRecord::new("A".into(), 2_000_000.0, 200_000.0, now())).unwrap();

        let record = repo.deduct("A", 50_000.0, now()).unwrap();
        assert_eq!(record.used_budget, 250_000.0);
        assert_eq!(record.remaining_budget(), 1_750_000.0);
    }

    #[test]
    fn test_deduct_missing_project() {
        let repo = BudgetRepository::new(open_in_memory().unwrap());
        let err = repo.deduct("無此專案", 1.0, now()).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
