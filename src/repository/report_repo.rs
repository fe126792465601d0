// ==========================================
// 工程采购管理系统 - 采购报表仓储
// ==========================================
// 报表整体以 JSON 保存 (payload_json), 类型/项目/时间冗余为列供列表查询
// ==========================================

use crate::domain::report::StoredReport;
use crate::repository::codec::{from_json, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, report: &StoredReport) -> RepositoryResult<()> {
        let payload = to_json(report)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO procurement_report (report_id, report_type, project_name, generated_at, payload_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                report.report_id,
                report.report_type.to_string(),
                report.project_name,
                report.generated_at,
                payload,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<StoredReport>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT payload_json FROM procurement_report WHERE report_id = ?1",
            params![report_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(raw) => Ok(Some(from_json("payload_json", &raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 全部报表（按生成顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<StoredReport>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT payload_json FROM procurement_report ORDER BY rowid")?;
        let raws = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        raws.iter().map(|raw| from_json("payload_json", raw)).collect()
    }

    /// 删除报表
    ///
    /// # 返回
    /// - true: 已删除; false: 不存在
    pub fn delete(&self, report_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM procurement_report WHERE report_id = ?1",
            params![report_id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::report::{
        CostBreakdown, EngineeringReport, EngineeringSummary, ReportPayload,
    };
    use crate::domain::types::ReportType;
    use chrono::NaiveDate;

    fn make_report(id: &str) -> StoredReport {
        StoredReport {
            report_id: id.to_string(),
            report_type: ReportType::Engineering,
            project_name: "A".into(),
            generated_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            date_from: None,
            date_to: None,
            payload: ReportPayload::Engineering(EngineeringReport {
                summary: EngineeringSummary {
                    order_count: 0,
                    total_amount: 0.0,
                    confirmed_count: 0,
                    in_progress_count: 0,
                },
                phases: vec![],
                suppliers: vec![],
                details: vec![],
                cost_breakdown: CostBreakdown {
                    total_cost: 0.0,
                    categories: vec![],
                },
            }),
        }
    }

    #[test]
    fn test_insert_find_delete() {
        let repo = ReportRepository::new(open_in_memory().unwrap());
        repo.insert(&make_report("ENG000001")).unwrap();
        repo.insert(&make_report("ENG000002")).unwrap();

        assert_eq!(repo.find_by_id("ENG000001").unwrap(), Some(make_report("ENG000001")));
        assert_eq!(repo.list_all().unwrap().len(), 2);
        assert!(repo.delete("ENG000001").unwrap());
        assert!(!repo.delete("ENG000001").unwrap());
        assert!(repo.find_by_id("ENG000001").unwrap().is_none());
    }
}
