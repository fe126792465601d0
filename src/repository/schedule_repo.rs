// ==========================================
// 工程采购管理系统 - 施工进度仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 包含: 进度表 / 进度记录 / 延误预警
// ==========================================

use crate::domain::schedule::{Alert, ConstructionSchedule, ProgressRecord, ScheduleItem};
use crate::domain::types::{AlertSeverity, AlertType};
use crate::repository::codec::{from_json, parse_code, to_json};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// ScheduleRepository - 进度表
// ==========================================

pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

struct ScheduleRow {
    project_code: String,
    project_name: String,
    created_at: NaiveDateTime,
    overall_progress: f64,
    items_json: String,
}

impl ScheduleRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            project_code: row.get(0)?,
            project_name: row.get(1)?,
            created_at: row.get(2)?,
            overall_progress: row.get(3)?,
            items_json: row.get(4)?,
        })
    }

    fn into_schedule(self) -> RepositoryResult<ConstructionSchedule> {
        let schedule_items: Vec<ScheduleItem> = from_json("items_json", &self.items_json)?;
        Ok(ConstructionSchedule {
            project_name: self.project_name,
            project_code: self.project_code,
            created_at: self.created_at,
            schedule_items,
            overall_progress: self.overall_progress,
        })
    }
}

const SELECT_SCHEDULE: &str = r#"
    SELECT project_code, project_name, created_at, overall_progress, items_json
    FROM construction_schedule
"#;

fn load_schedule(conn: &Connection, project_code: &str) -> RepositoryResult<Option<ConstructionSchedule>> {
    let sql = format!("{} WHERE project_code = ?1", SELECT_SCHEDULE);
    let result = conn.query_row(&sql, params![project_code], ScheduleRow::from_row);

    match result {
        Ok(row) => Ok(Some(row.into_schedule()?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_schedule(conn: &Connection, schedule: &ConstructionSchedule) -> RepositoryResult<()> {
    let items = to_json(&schedule.schedule_items)?;
    conn.execute(
        r#"
        INSERT OR REPLACE INTO construction_schedule (
            project_code, project_name, created_at, overall_progress, items_json
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            schedule.project_code,
            schedule.project_name,
            schedule.created_at,
            schedule.overall_progress,
            items,
        ],
    )?;
    Ok(())
}

/// 进度表更新时同一事务内追加的记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleAppend {
    pub alerts: Vec<Alert>,
    pub progress: Option<ProgressRecord>,
}

impl ScheduleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存进度表（同项目编号整体覆盖）
    pub fn save(&self, schedule: &ConstructionSchedule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_schedule(&conn, schedule)
    }

    pub fn find_by_code(&self, project_code: &str) -> RepositoryResult<Option<ConstructionSchedule>> {
        let conn = self.get_conn()?;
        load_schedule(&conn, project_code)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<ConstructionSchedule>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY rowid", SELECT_SCHEDULE);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], ScheduleRow::from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.into_iter().map(ScheduleRow::into_schedule).collect()
    }

    /// 读取-修改-写回进度表, 连同预警/进度记录在同一 IMMEDIATE 事务内提交
    ///
    /// # 参数
    /// - `apply`: 修改进度表并返回需追加的记录; 返回 Err 时回滚, 不写入任何内容
    ///
    /// # 返回
    /// - Err(NotFound): 进度表不存在
    /// - Ok((修改后的进度表, 已追加的记录))
    pub fn update_atomically<E, F>(
        &self,
        project_code: &str,
        apply: F,
    ) -> Result<(ConstructionSchedule, ScheduleAppend), E>
    where
        F: FnOnce(&mut ConstructionSchedule) -> Result<ScheduleAppend, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut schedule = load_schedule(&tx, project_code)?
            .ok_or_else(|| RepositoryError::not_found("ConstructionSchedule", project_code))?;
        let append = apply(&mut schedule)?;

        write_schedule(&tx, &schedule)?;
        for alert in &append.alerts {
            insert_alert(&tx, alert)?;
        }
        if let Some(record) = &append.progress {
            insert_progress(&tx, record)?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok((schedule, append))
    }
}

// ==========================================
// ProgressRepository - 进度记录（只追加）
// ==========================================

pub struct ProgressRepository {
    conn: Arc<Mutex<Connection>>,
}

fn progress_from_row(row: &Row<'_>) -> SqliteResult<ProgressRecord> {
    Ok(ProgressRecord {
        record_id: row.get(0)?,
        project_code: row.get(1)?,
        po_id: row.get(2)?,
        progress: row.get(3)?,
        remarks: row.get(4)?,
        updated_by: row.get(5)?,
        recorded_at: row.get(6)?,
    })
}

fn insert_progress(conn: &Connection, record: &ProgressRecord) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO progress_record (
            record_id, project_code, po_id, progress, remarks, updated_by, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            record.record_id,
            record.project_code,
            record.po_id,
            record.progress,
            record.remarks,
            record.updated_by,
            record.recorded_at,
        ],
    )?;
    Ok(())
}

impl ProgressRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, record: &ProgressRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_progress(&conn, record)
    }

    /// 按 (项目编号, 采购单号) 查询进度历史（按写入顺序）
    pub fn list_by_key(&self, project_code: &str, po_id: &str) -> RepositoryResult<Vec<ProgressRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, project_code, po_id, progress, remarks, updated_by, recorded_at
            FROM progress_record
            WHERE project_code = ?1 AND po_id = ?2
            ORDER BY rowid
            "#,
        )?;
        let records = stmt
            .query_map(params![project_code, po_id], progress_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }
}

// ==========================================
// AlertRepository - 延误预警
// ==========================================

pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

struct AlertRow {
    alert_id: String,
    alert_type: String,
    project_code: String,
    po_id: String,
    item_name: String,
    delay_days: i64,
    expected_date: NaiveDateTime,
    actual_date: NaiveDateTime,
    severity: String,
    created_at: NaiveDateTime,
    is_read: bool,
    read_at: Option<NaiveDateTime>,
}

impl AlertRow {
    fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            alert_id: row.get(0)?,
            alert_type: row.get(1)?,
            project_code: row.get(2)?,
            po_id: row.get(3)?,
            item_name: row.get(4)?,
            delay_days: row.get(5)?,
            expected_date: row.get(6)?,
            actual_date: row.get(7)?,
            severity: row.get(8)?,
            created_at: row.get(9)?,
            is_read: row.get(10)?,
            read_at: row.get(11)?,
        })
    }

    fn into_alert(self) -> RepositoryResult<Alert> {
        Ok(Alert {
            alert_id: self.alert_id,
            alert_type: parse_code("alert_type", &self.alert_type, AlertType::from_db_str)?,
            project_code: self.project_code,
            po_id: self.po_id,
            item_name: self.item_name,
            delay_days: self.delay_days,
            expected_date: self.expected_date,
            actual_date: self.actual_date,
            severity: parse_code("severity", &self.severity, AlertSeverity::from_db_str)?,
            created_at: self.created_at,
            is_read: self.is_read,
            read_at: self.read_at,
        })
    }
}

fn insert_alert(conn: &Connection, alert: &Alert) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO schedule_alert (
            alert_id, alert_type, project_code, po_id, item_name, delay_days,
            expected_date, actual_date, severity, created_at, is_read, read_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            alert.alert_id,
            alert.alert_type.to_string(),
            alert.project_code,
            alert.po_id,
            alert.item_name,
            alert.delay_days,
            alert.expected_date,
            alert.actual_date,
            alert.severity.to_string(),
            alert.created_at,
            alert.is_read,
            alert.read_at,
        ],
    )?;
    Ok(())
}

impl AlertRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, alert: &Alert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_alert(&conn, alert)
    }

    /// 查询预警（新到旧）
    ///
    /// # 参数
    /// - `severity`: 严重度过滤, None 表示全部
    /// - `limit`: 条数上限
    pub fn list(&self, severity: Option<AlertSeverity>, limit: usize) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT alert_id, alert_type, project_code, po_id, item_name, delay_days,
                   expected_date, actual_date, severity, created_at, is_read, read_at
            FROM schedule_alert
            WHERE (?1 IS NULL OR severity = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt
            .query_map(
                params![severity.map(|s| s.to_string()), limit as i64],
                AlertRow::from_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    pub fn count_unread(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM schedule_alert WHERE is_read = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 标记已读
    ///
    /// # 返回
    /// - Err(NotFound): 预警不存在
    pub fn mark_read(&self, alert_id: &str, now: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE schedule_alert SET is_read = 1, read_at = ?1 WHERE alert_id = ?2",
            params![now, alert_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Alert", alert_id));
        }
        Ok(())
    }
}
