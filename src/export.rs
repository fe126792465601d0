// ==========================================
// 工程采购管理系统 - CSV 导出
// ==========================================
// 职责: 将比价 / 采购单 / 进度导出结构写成 CSV
// 格式: 多段落, 段落之间空一行, 每段首行为段名
// ==========================================

use std::io::Write;

use chrono::NaiveDateTime;
use csv::{Writer, WriterBuilder};
use thiserror::Error;

use crate::domain::comparison::ComparisonExport;
use crate::domain::purchase_order::PurchaseOrderExport;
use crate::domain::report::ScheduleExport;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("输出失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

fn writer<W: Write>(out: W) -> Writer<W> {
    WriterBuilder::new().flexible(true).from_writer(out)
}

fn fmt_time(at: NaiveDateTime) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

fn fmt_opt_time(at: Option<NaiveDateTime>) -> String {
    at.map(fmt_time).unwrap_or_default()
}

fn fmt_money(v: f64) -> String {
    format!("{:.2}", v)
}

fn blank<W: Write>(w: &mut Writer<W>) -> ExportResult<()> {
    w.write_record([""])?;
    Ok(())
}

/// 比价导出: 基本资料 / 供应商汇总 / 项目比价 / 分析结论
pub fn write_comparison_csv<W: Write>(export: &ComparisonExport, out: W) -> ExportResult<()> {
    let mut w = writer(out);
    let info = &export.basic_info;

    w.write_record(["basic_info"])?;
    w.write_record(["inquiry_id", "project_name", "created_at", "quote_count"])?;
    w.write_record([
        info.inquiry_id.clone(),
        info.project_name.clone(),
        fmt_time(info.created_at),
        info.quote_count.to_string(),
    ])?;
    blank(&mut w)?;

    w.write_record(["suppliers"])?;
    w.write_record([
        "supplier_id",
        "quote_id",
        "total_amount",
        "payment_terms",
        "validity_days",
        "average_delivery_days",
        "competitiveness_pct",
    ])?;
    for row in &export.supplier_rows {
        w.write_record([
            row.supplier_id.clone(),
            row.quote_id.clone(),
            fmt_money(row.total_amount),
            row.payment_terms.clone(),
            row.validity_days.to_string(),
            format!("{:.1}", row.average_delivery_days),
            format!("{:.1}", row.competitiveness_pct),
        ])?;
    }
    blank(&mut w)?;

    w.write_record(["items"])?;
    w.write_record([
        "item_id",
        "min_unit_price",
        "max_unit_price",
        "price_spread_pct",
        "reasonableness",
    ])?;
    for row in &export.item_rows {
        w.write_record([
            row.item_id.clone(),
            fmt_money(row.min_unit_price),
            fmt_money(row.max_unit_price),
            format!("{:.2}", row.price_spread_pct),
            row.reasonableness.label(),
        ])?;
    }
    blank(&mut w)?;

    let analysis = &export.analysis;
    w.write_record(["analysis"])?;
    if let Some(pricing) = &analysis.pricing {
        w.write_record(["min_total".to_string(), fmt_money(pricing.min_total)])?;
        w.write_record(["max_total".to_string(), fmt_money(pricing.max_total)])?;
        w.write_record(["spread_pct".to_string(), format!("{:.2}", pricing.spread_pct)])?;
    }
    if let Some(delivery) = &analysis.delivery {
        w.write_record(["delivery_risk".to_string(), delivery.risk.label()])?;
    }
    w.write_record([
        "recommended_supplier_id".to_string(),
        analysis.recommended_supplier_id.clone().unwrap_or_default(),
    ])?;

    w.flush()?;
    Ok(())
}

/// 采购单导出: 表头段 + 明细段
pub fn write_purchase_order_csv<W: Write>(export: &PurchaseOrderExport, out: W) -> ExportResult<()> {
    let mut w = writer(out);
    let h = &export.header;

    w.write_record(["purchase_order"])?;
    w.write_record([
        "po_id",
        "project_name",
        "supplier_id",
        "created_at",
        "total_amount",
        "payment_terms",
        "delivery_address",
        "expected_delivery_date",
        "status",
    ])?;
    w.write_record([
        h.po_id.clone(),
        h.project_name.clone(),
        h.supplier_id.clone(),
        fmt_time(h.created_at),
        fmt_money(h.total_amount),
        h.payment_terms.clone(),
        h.delivery_address.clone(),
        fmt_opt_time(h.expected_delivery_date),
        h.status.label(),
    ])?;
    blank(&mut w)?;

    w.write_record(["items"])?;
    w.write_record([
        "item_id",
        "item_name",
        "specification",
        "unit",
        "quantity",
        "unit_price",
        "total_price",
    ])?;
    for item in &export.items {
        w.write_record([
            item.item_id.clone(),
            item.item_name.clone(),
            item.specification.clone(),
            item.unit.clone(),
            item.quantity.to_string(),
            fmt_money(item.unit_price),
            fmt_money(item.total_price),
        ])?;
    }

    w.flush()?;
    Ok(())
}

/// 进度导出: 项目概况 / 进度项 / 即将到货 / 逾期
pub fn write_schedule_csv<W: Write>(export: &ScheduleExport, out: W) -> ExportResult<()> {
    let mut w = writer(out);
    let report = &export.report;

    w.write_record(["schedule"])?;
    w.write_record(["project_name", "project_code", "created_at", "overall_progress"])?;
    w.write_record([
        report.project_name.clone(),
        report.project_code.clone(),
        fmt_time(report.created_at),
        format!("{:.1}", report.overall_progress),
    ])?;
    blank(&mut w)?;

    w.write_record(["items"])?;
    w.write_record([
        "po_id",
        "item_name",
        "expected_delivery_date",
        "actual_delivery_date",
        "construction_progress",
        "status",
        "delay_days",
    ])?;
    for row in &report.items {
        w.write_record([
            row.po_id.clone(),
            row.item_name.clone(),
            fmt_time(row.expected_delivery_date),
            fmt_opt_time(row.actual_delivery_date),
            format!("{:.1}", row.construction_progress),
            row.status.label(),
            row.delay_days.to_string(),
        ])?;
    }
    blank(&mut w)?;

    w.write_record(["upcoming"])?;
    w.write_record(["po_id", "item_name", "expected_delivery_date", "remaining_days"])?;
    for row in &export.upcoming {
        w.write_record([
            row.po_id.clone(),
            row.item_name.clone(),
            fmt_time(row.expected_delivery_date),
            row.remaining_days.to_string(),
        ])?;
    }
    blank(&mut w)?;

    w.write_record(["overdue"])?;
    w.write_record(["po_id", "item_name", "expected_delivery_date", "overdue_days"])?;
    for row in &export.overdue {
        w.write_record([
            row.po_id.clone(),
            row.item_name.clone(),
            fmt_time(row.expected_delivery_date),
            row.overdue_days.to_string(),
        ])?;
    }

    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purchase_order::{PurchaseOrder, PurchaseOrderItem};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_purchase_order_csv_has_item_rows() {
        let mut po = PurchaseOrder::new("PO000001".into(), "INQ000001".into(), "SUP001".into(), "A".into(), now());
        po.add_item(PurchaseOrderItem::new(
            "T001".into(),
            "水泥".into(),
            "袋装".into(),
            "包".into(),
            10,
            350.0,
        ));

        let mut buf = Vec::new();
        write_purchase_order_csv(&PurchaseOrderExport::from_order(&po), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("purchase_order\n"));
        assert!(text.contains("PO000001,A,SUP001,2024-03-01 09:00:00,3500.00"));
        assert!(text.contains("T001,水泥,袋装,包,10,350.00,3500.00"));
    }
}
