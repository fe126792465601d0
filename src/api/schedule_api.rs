// ==========================================
// 工程采购管理系统 - 施工进度 API
// ==========================================
// 职责: 进度表维护, 到货登记与延误预警, 施工进度记录, 进度报表/看板
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::report::{OverdueItem, ScheduleDashboard, ScheduleExport, ScheduleReport, UpcomingDelivery};
use crate::domain::schedule::{Alert, ConstructionSchedule, ProgressRecord};
use crate::domain::types::AlertSeverity;
use crate::engine::ScheduleEngine;
use crate::ports::{Clock, IdGenerator};
use crate::repository::schedule_repo::{AlertRepository, ProgressRepository, ScheduleAppend, ScheduleRepository};

/// 到货登记结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub schedule: ConstructionSchedule,
    pub alerts: Vec<Alert>,
}

pub struct ScheduleApi {
    schedule_repo: Arc<ScheduleRepository>,
    progress_repo: Arc<ProgressRepository>,
    alert_repo: Arc<AlertRepository>,
    config_manager: Arc<ConfigManager>,
    record_ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    engine: ScheduleEngine,
}

impl ScheduleApi {
    pub fn new(
        schedule_repo: Arc<ScheduleRepository>,
        progress_repo: Arc<ProgressRepository>,
        alert_repo: Arc<AlertRepository>,
        config_manager: Arc<ConfigManager>,
        record_ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            schedule_repo,
            progress_repo,
            alert_repo,
            config_manager,
            record_ids,
            clock,
            engine: ScheduleEngine::new(),
        }
    }

    /// 建立进度表; 同一项目代码重复建立时覆盖 (原进度项丢弃)
    pub fn create_schedule(&self, project_name: &str, project_code: &str) -> ApiResult<ConstructionSchedule> {
        validator::require_non_empty("project_name", project_name)?;
        validator::require_non_empty("project_code", project_code)?;

        let schedule = ConstructionSchedule::new(
            project_name.to_string(),
            project_code.to_string(),
            self.clock.now(),
        );
        self.schedule_repo.save(&schedule)?;

        info!(project_code, project_name, "进度表已建立");
        Ok(schedule)
    }

    pub fn get_schedule(&self, project_code: &str) -> ApiResult<ConstructionSchedule> {
        self.schedule_repo
            .find_by_code(project_code)?
            .ok_or_else(|| ApiError::NotFound(format!("项目{}尚未建立进度表", project_code)))
    }

    pub fn list_schedules(&self) -> ApiResult<Vec<ConstructionSchedule>> {
        Ok(self.schedule_repo.list_all()?)
    }

    /// 将采购单明细加入进度表 (每项一个待交货进度项)
    pub fn add_purchase_order(&self, project_code: &str, po: &PurchaseOrder) -> ApiResult<ConstructionSchedule> {
        let (schedule, _) = self
            .schedule_repo
            .update_atomically(project_code, |schedule| -> ApiResult<ScheduleAppend> {
                let items = self.engine.items_from_order(po).ok_or_else(|| {
                    ApiError::ValidationError(format!("采购单{}没有预计到货日期", po.po_id))
                })?;
                for item in items {
                    schedule.add_schedule_item(item);
                }
                Ok(ScheduleAppend::default())
            })?;

        info!(project_code, po_id = %po.po_id, items = schedule.schedule_items.len(), "采购单已加入进度表");
        Ok(schedule)
    }

    /// 登记到货: 更新该采购单全部进度项, 延误项生成预警
    ///
    /// 进度表与预警在同一事务内写入
    #[instrument(skip(self))]
    pub fn update_delivery_status(
        &self,
        project_code: &str,
        po_id: &str,
        actual_date: NaiveDateTime,
    ) -> ApiResult<DeliveryUpdate> {
        let policy = self.config_manager.load_policy()?;
        let now = self.clock.now();

        let (schedule, append) = self
            .schedule_repo
            .update_atomically(project_code, |schedule| -> ApiResult<ScheduleAppend> {
                let touched = schedule.update_delivery_status(po_id, actual_date);
                if touched.is_empty() {
                    return Err(no_items_for(project_code, po_id));
                }
                let alerts = self.engine.delay_alerts(
                    schedule,
                    &touched,
                    &policy.alert,
                    self.record_ids.as_ref(),
                    now,
                );
                Ok(ScheduleAppend {
                    alerts,
                    progress: None,
                })
            })?;

        info!(alerts = append.alerts.len(), "到货已登记");
        Ok(DeliveryUpdate {
            schedule,
            alerts: append.alerts,
        })
    }

    /// 更新施工进度并记录进度历史
    ///
    /// # 参数
    /// - `progress`: 0-100, 超出范围为 ValidationError
    /// - `updated_by`: 操作人标识
    pub fn update_construction_progress(
        &self,
        project_code: &str,
        po_id: &str,
        progress: f64,
        remarks: &str,
        updated_by: &str,
    ) -> ApiResult<ConstructionSchedule> {
        validator::validate_progress(progress)?;
        let record = ProgressRecord {
            record_id: self.record_ids.next(),
            recorded_at: self.clock.now(),
            project_code: project_code.to_string(),
            po_id: po_id.to_string(),
            progress,
            remarks: remarks.to_string(),
            updated_by: updated_by.to_string(),
        };

        let (schedule, _) = self
            .schedule_repo
            .update_atomically(project_code, |schedule| -> ApiResult<ScheduleAppend> {
                if schedule.update_construction_progress(po_id, progress) == 0 {
                    return Err(no_items_for(project_code, po_id));
                }
                Ok(ScheduleAppend {
                    alerts: Vec::new(),
                    progress: Some(record),
                })
            })?;

        info!(
            project_code,
            po_id,
            progress,
            overall = schedule.overall_progress,
            "施工进度已更新"
        );
        Ok(schedule)
    }

    pub fn get_progress_history(&self, project_code: &str, po_id: &str) -> ApiResult<Vec<ProgressRecord>> {
        Ok(self.progress_repo.list_by_key(project_code, po_id)?)
    }

    // ==========================================
    // 报表 / 看板
    // ==========================================

    pub fn generate_schedule_report(&self, project_code: &str) -> ApiResult<ScheduleReport> {
        let schedule = self.get_schedule(project_code)?;
        Ok(self.engine.generate_report(&schedule, self.clock.now()))
    }

    /// 即将到货
    ///
    /// # 参数
    /// - `days`: 窗口天数, None 时取配置默认值
    pub fn get_upcoming_deliveries(&self, project_code: &str, days: Option<i64>) -> ApiResult<Vec<UpcomingDelivery>> {
        let schedule = self.get_schedule(project_code)?;
        let days = match days {
            Some(days) => days,
            None => self.config_manager.load_policy()?.defaults.upcoming_window_days,
        };
        Ok(self.engine.upcoming_deliveries(&schedule, self.clock.now(), days))
    }

    pub fn get_overdue_items(&self, project_code: &str) -> ApiResult<Vec<OverdueItem>> {
        let schedule = self.get_schedule(project_code)?;
        Ok(self.engine.overdue_items(&schedule, self.clock.now()))
    }

    pub fn generate_dashboard(&self) -> ApiResult<ScheduleDashboard> {
        let schedules = self.schedule_repo.list_all()?;
        let unread = self.alert_repo.count_unread()?;
        Ok(self.engine.dashboard(&schedules, unread, self.clock.now()))
    }

    pub fn export_schedule(&self, project_code: &str) -> ApiResult<ScheduleExport> {
        let schedule = self.get_schedule(project_code)?;
        let now = self.clock.now();
        let window = self.config_manager.load_policy()?.defaults.upcoming_window_days;

        Ok(ScheduleExport {
            report: self.engine.generate_report(&schedule, now),
            upcoming: self.engine.upcoming_deliveries(&schedule, now, window),
            overdue: self.engine.overdue_items(&schedule, now),
        })
    }

    // ==========================================
    // 预警
    // ==========================================

    /// 预警列表 (最新优先)
    ///
    /// # 参数
    /// - `severity`: None 不过滤
    /// - `limit`: None 时取配置默认值
    pub fn get_alerts(&self, severity: Option<AlertSeverity>, limit: Option<usize>) -> ApiResult<Vec<Alert>> {
        let limit = match limit {
            Some(limit) => limit,
            None => self.config_manager.load_policy()?.defaults.alert_list_limit,
        };
        Ok(self.alert_repo.list(severity, limit)?)
    }

    pub fn mark_alert_read(&self, alert_id: &str) -> ApiResult<()> {
        self.alert_repo.mark_read(alert_id, self.clock.now())?;
        Ok(())
    }
}

fn no_items_for(project_code: &str, po_id: &str) -> ApiError {
    ApiError::NotFound(format!("进度表{}中没有采购单{}的项目", project_code, po_id))
}
