// ==========================================
// 工程采购管理系统 - 施工进度引擎
// ==========================================
// 红线: Engine 不拼 SQL
// 职责:
// - 采购单 -> 进度项
// - 到货延误预警 (严重度按阈值分级)
// - 进度报表 / 即将到货 / 逾期 / 看板
// ==========================================

use crate::config::policy::AlertThresholds;
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::report::{
    DashboardProjectRow, OverdueItem, ProgressDistribution, ScheduleDashboard,
    ScheduleDeliveryAnalysis, ScheduleReport, ScheduleReportRow, ScheduleStatusCounts,
    UpcomingDelivery,
};
use crate::domain::schedule::{Alert, ConstructionSchedule, ScheduleItem};
use crate::domain::types::{AlertSeverity, AlertType, ScheduleItemStatus};
use crate::engine::statistics::{ceil_days_between, pct};
use crate::ports::IdGenerator;
use chrono::{Duration, NaiveDateTime};
use tracing::instrument;

pub struct ScheduleEngine {
    // 无状态引擎,不需要注入依赖
}

impl ScheduleEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 采购单明细 -> 待交货进度项
    ///
    /// # 返回
    /// - None: 采购单无预计到货日期
    pub fn items_from_order(&self, po: &PurchaseOrder) -> Option<Vec<ScheduleItem>> {
        let expected = po.expected_delivery_date?;
        Some(
            po.items
                .iter()
                .map(|item| ScheduleItem::pending(po.po_id.clone(), item.item_name.clone(), expected))
                .collect(),
        )
    }

    /// 延误严重度; 未延误返回 None
    pub fn alert_severity(&self, delay_days: i64, thresholds: &AlertThresholds) -> Option<AlertSeverity> {
        if delay_days <= 0 {
            None
        } else if delay_days > thresholds.high_above_days {
            Some(AlertSeverity::High)
        } else if delay_days > thresholds.medium_above_days {
            Some(AlertSeverity::Medium)
        } else {
            Some(AlertSeverity::Low)
        }
    }

    /// 为本次到货登记涉及的进度项生成延误预警
    ///
    /// # 参数
    /// - `touched`: 本次更新的进度项下标
    pub fn delay_alerts(
        &self,
        schedule: &ConstructionSchedule,
        touched: &[usize],
        thresholds: &AlertThresholds,
        ids: &dyn IdGenerator,
        now: NaiveDateTime,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for item in touched.iter().filter_map(|idx| schedule.schedule_items.get(*idx)) {
            let actual = match item.actual_delivery_date {
                Some(actual) => actual,
                None => continue,
            };
            let delay_days = ceil_days_between(item.expected_delivery_date, actual);
            if let Some(severity) = self.alert_severity(delay_days, thresholds) {
                tracing::warn!(
                    project_code = %schedule.project_code,
                    po_id = %item.po_id,
                    item_name = %item.item_name,
                    delay_days,
                    severity = %severity,
                    "到货延误预警"
                );
                alerts.push(Alert {
                    alert_id: ids.next(),
                    alert_type: AlertType::DeliveryDelay,
                    project_code: schedule.project_code.clone(),
                    po_id: item.po_id.clone(),
                    item_name: item.item_name.clone(),
                    delay_days,
                    expected_date: item.expected_delivery_date,
                    actual_date: actual,
                    severity,
                    created_at: now,
                    is_read: false,
                    read_at: None,
                });
            }
        }
        alerts
    }

    // ==========================================
    // 报表
    // ==========================================

    #[instrument(skip_all, fields(project_code = %schedule.project_code))]
    pub fn generate_report(&self, schedule: &ConstructionSchedule, now: NaiveDateTime) -> ScheduleReport {
        let items = &schedule.schedule_items;

        let mut status_counts = ScheduleStatusCounts {
            total: items.len(),
            ..Default::default()
        };
        for item in items {
            match item.status {
                ScheduleItemStatus::Pending => status_counts.pending += 1,
                ScheduleItemStatus::Delivered => status_counts.delivered += 1,
                ScheduleItemStatus::Completed => status_counts.completed += 1,
            }
            if item.is_overdue_at(now) {
                status_counts.overdue += 1;
            }
        }

        ScheduleReport {
            project_name: schedule.project_name.clone(),
            project_code: schedule.project_code.clone(),
            created_at: schedule.created_at,
            overall_progress: schedule.overall_progress,
            status_counts,
            delivery_analysis: self.analyze_delivery(items),
            progress_distribution: progress_distribution(items),
            items: items
                .iter()
                .map(|item| ScheduleReportRow {
                    po_id: item.po_id.clone(),
                    item_name: item.item_name.clone(),
                    expected_delivery_date: item.expected_delivery_date,
                    actual_delivery_date: item.actual_delivery_date,
                    construction_progress: item.construction_progress,
                    status: item.status,
                    delay_days: row_delay_days(item, now),
                })
                .collect(),
        }
    }

    fn analyze_delivery(&self, items: &[ScheduleItem]) -> ScheduleDeliveryAnalysis {
        let mut analysis = ScheduleDeliveryAnalysis::default();
        let mut late_total = 0i64;

        for item in items {
            if item.status == ScheduleItemStatus::Pending {
                analysis.pending += 1;
                continue;
            }
            if let Some(actual) = item.actual_delivery_date {
                let delay = ceil_days_between(item.expected_delivery_date, actual);
                if delay > 0 {
                    analysis.late += 1;
                    late_total += delay;
                    analysis.max_delay_days = analysis.max_delay_days.max(delay);
                } else {
                    analysis.on_time += 1;
                }
            }
        }

        if analysis.late > 0 {
            analysis.average_delay_days = late_total as f64 / analysis.late as f64;
        }
        let delivered = analysis.on_time + analysis.late;
        if delivered > 0 {
            analysis.on_time_rate_pct = Some(pct(analysis.on_time as f64, delivered as f64));
        }
        analysis
    }

    /// 即将到货: 待交货且 now <= 预计 <= now + days
    pub fn upcoming_deliveries(
        &self,
        schedule: &ConstructionSchedule,
        now: NaiveDateTime,
        days: i64,
    ) -> Vec<UpcomingDelivery> {
        let horizon = now + Duration::days(days);
        schedule
            .schedule_items
            .iter()
            .filter(|i| i.status == ScheduleItemStatus::Pending)
            .filter(|i| i.expected_delivery_date >= now && i.expected_delivery_date <= horizon)
            .map(|i| UpcomingDelivery {
                po_id: i.po_id.clone(),
                item_name: i.item_name.clone(),
                expected_delivery_date: i.expected_delivery_date,
                remaining_days: ceil_days_between(now, i.expected_delivery_date),
            })
            .collect()
    }

    /// 逾期: 待交货且预计到货早于 now
    pub fn overdue_items(&self, schedule: &ConstructionSchedule, now: NaiveDateTime) -> Vec<OverdueItem> {
        schedule
            .schedule_items
            .iter()
            .filter(|i| i.is_overdue_at(now))
            .map(|i| OverdueItem {
                po_id: i.po_id.clone(),
                item_name: i.item_name.clone(),
                expected_delivery_date: i.expected_delivery_date,
                overdue_days: ceil_days_between(i.expected_delivery_date, now),
            })
            .collect()
    }

    /// 进度看板
    pub fn dashboard(
        &self,
        schedules: &[ConstructionSchedule],
        unread_alert_count: usize,
        now: NaiveDateTime,
    ) -> ScheduleDashboard {
        let completed_count = schedules.iter().filter(|s| s.overall_progress >= 100.0).count();
        ScheduleDashboard {
            project_count: schedules.len(),
            active_count: schedules.len() - completed_count,
            completed_count,
            unread_alert_count,
            projects: schedules
                .iter()
                .map(|s| DashboardProjectRow {
                    project_name: s.project_name.clone(),
                    project_code: s.project_code.clone(),
                    overall_progress: s.overall_progress,
                    item_count: s.schedule_items.len(),
                    overdue_count: s.schedule_items.iter().filter(|i| i.is_overdue_at(now)).count(),
                })
                .collect(),
        }
    }
}

impl Default for ScheduleEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn row_delay_days(item: &ScheduleItem, now: NaiveDateTime) -> i64 {
    match item.actual_delivery_date {
        Some(actual) => ceil_days_between(item.expected_delivery_date, actual).max(0),
        None if item.expected_delivery_date < now => ceil_days_between(item.expected_delivery_date, now),
        None => 0,
    }
}

fn progress_distribution(items: &[ScheduleItem]) -> ProgressDistribution {
    let mut dist = ProgressDistribution::default();
    for item in items {
        let p = item.construction_progress;
        if p <= 0.0 {
            dist.not_started += 1;
        } else if p <= 25.0 {
            dist.pct_1_25 += 1;
        } else if p <= 50.0 {
            dist.pct_26_50 += 1;
        } else if p <= 75.0 {
            dist.pct_51_75 += 1;
        } else if p < 100.0 {
            dist.pct_76_99 += 1;
        } else {
            dist.finished += 1;
        }
    }
    dist
}
