// ==========================================
// 工程采购管理系统 - 施工进度表
// ==========================================
// 每个项目编号一张进度表, 重建即覆盖
// overall_progress = 所有进度项施工进度的算术平均 (无进度项为 0)
// ==========================================

use crate::domain::types::{AlertSeverity, AlertType, ScheduleItemStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 进度项（由采购明细派生）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub po_id: String,
    pub item_name: String,
    pub expected_delivery_date: NaiveDateTime,
    pub actual_delivery_date: Option<NaiveDateTime>,
    pub status: ScheduleItemStatus,
    pub construction_progress: f64, // 0-100
}

impl ScheduleItem {
    pub fn pending(po_id: String, item_name: String, expected_delivery_date: NaiveDateTime) -> Self {
        Self {
            po_id,
            item_name,
            expected_delivery_date,
            actual_delivery_date: None,
            status: ScheduleItemStatus::Pending,
            construction_progress: 0.0,
        }
    }

    pub fn is_overdue_at(&self, now: NaiveDateTime) -> bool {
        self.status == ScheduleItemStatus::Pending && self.expected_delivery_date < now
    }
}

/// 施工进度表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionSchedule {
    pub project_name: String,
    pub project_code: String,
    pub created_at: NaiveDateTime,
    pub schedule_items: Vec<ScheduleItem>,
    pub overall_progress: f64,
}

impl ConstructionSchedule {
    pub fn new(project_name: String, project_code: String, now: NaiveDateTime) -> Self {
        Self {
            project_name,
            project_code,
            created_at: now,
            schedule_items: Vec::new(),
            overall_progress: 0.0,
        }
    }

    pub fn add_schedule_item(&mut self, item: ScheduleItem) {
        self.schedule_items.push(item);
        self.recalculate_overall_progress();
    }

    /// 登记到货: 更新该采购单的全部进度项
    ///
    /// # 返回
    /// - 被更新的进度项下标
    pub fn update_delivery_status(&mut self, po_id: &str, actual: NaiveDateTime) -> Vec<usize> {
        let mut touched = Vec::new();
        for (idx, item) in self.schedule_items.iter_mut().enumerate() {
            if item.po_id == po_id {
                item.actual_delivery_date = Some(actual);
                item.status = ScheduleItemStatus::Delivered;
                touched.push(idx);
            }
        }
        touched
    }

    /// 更新施工进度: 该采购单的全部进度项; >=100 视为完工
    ///
    /// # 返回
    /// - 被更新的进度项数量
    pub fn update_construction_progress(&mut self, po_id: &str, progress: f64) -> usize {
        let mut touched = 0;
        for item in self.schedule_items.iter_mut().filter(|i| i.po_id == po_id) {
            item.construction_progress = progress;
            if progress >= 100.0 {
                item.status = ScheduleItemStatus::Completed;
            }
            touched += 1;
        }
        self.recalculate_overall_progress();
        touched
    }

    fn recalculate_overall_progress(&mut self) {
        if self.schedule_items.is_empty() {
            self.overall_progress = 0.0;
            return;
        }
        let sum: f64 = self
            .schedule_items
            .iter()
            .map(|i| i.construction_progress)
            .sum();
        self.overall_progress = sum / self.schedule_items.len() as f64;
    }
}

/// 施工进度记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub record_id: String,
    pub recorded_at: NaiveDateTime,
    pub project_code: String,
    pub po_id: String,
    pub progress: f64,
    pub remarks: String,
    pub updated_by: String,
}

/// 交期延误预警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub alert_type: AlertType,
    pub project_code: String,
    pub po_id: String,
    pub item_name: String,
    pub delay_days: i64,
    pub expected_date: NaiveDateTime,
    pub actual_date: NaiveDateTime,
    pub severity: AlertSeverity,
    pub created_at: NaiveDateTime,
    pub is_read: bool,
    pub read_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_schedule() -> ConstructionSchedule {
        let mut schedule = ConstructionSchedule::new("A".into(), "P-A".into(), now());
        let due = now() + Duration::days(10);
        schedule.add_schedule_item(ScheduleItem::pending("PO1".into(), "水泥".into(), due));
        schedule.add_schedule_item(ScheduleItem::pending("PO1".into(), "紅磚".into(), due));
        schedule.add_schedule_item(ScheduleItem::pending("PO2".into(), "鋼筋".into(), due));
        schedule
    }

    #[test]
    fn test_progress_updates_every_item_of_po() {
        let mut schedule = make_schedule();
        let touched = schedule.update_construction_progress("PO1", 100.0);
        assert_eq!(touched, 2);
        assert!(schedule.schedule_items[..2]
            .iter()
            .all(|i| i.status == ScheduleItemStatus::Completed));
        assert_eq!(schedule.schedule_items[2].status, ScheduleItemStatus::Pending);
        assert_eq!(schedule.overall_progress, 200.0 / 3.0);
    }

    #[test]
    fn test_partial_progress_keeps_status() {
        let mut schedule = make_schedule();
        schedule.update_construction_progress("PO2", 40.0);
        assert_eq!(schedule.schedule_items[2].status, ScheduleItemStatus::Pending);
        assert_eq!(schedule.overall_progress, 40.0 / 3.0);
    }

    #[test]
    fn test_delivery_updates_every_item_of_po() {
        let mut schedule = make_schedule();
        let touched = schedule.update_delivery_status("PO1", now());
        assert_eq!(touched, vec![0, 1]);
        assert_eq!(schedule.schedule_items[1].status, ScheduleItemStatus::Delivered);
        assert!(schedule.update_delivery_status("PO9", now()).is_empty());
    }
}
