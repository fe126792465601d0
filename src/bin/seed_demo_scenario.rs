// ==========================================
// 演示场景: 询价 -> 比价 -> 决标 -> 采购单确认 -> 到货/进度 -> 报表
// ==========================================
// 用法: seed_demo_scenario [db_path] [csv_out_dir]
// ==========================================

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local};

use construction_procurement::api::InquiryItemInput;
use construction_procurement::app::{get_default_db_path, AppState};
use construction_procurement::domain::{QuoteItem, QuoteSubmission, SupplierContact, SupplierInput};
use construction_procurement::domain::types::DeliveryStatus;
use construction_procurement::{export, logging};

const PROJECT_NAME: &str = "示范住宅大楼";
const PROJECT_CODE: &str = "DEMO-001";
const PROJECT_BUDGET: f64 = 1_000_000.0;

fn main() -> Result<()> {
    logging::init_from_env();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let out_dir = std::env::args().nth(2).map(PathBuf::from);

    backup_and_reset_db(&db_path)?;
    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;

    // ===== 供应商 =====
    let suppliers = [
        ("SUP001", "宏建材料行", "陈经理"),
        ("SUP002", "大成钢铁", "林小姐"),
        ("SUP003", "永安建材", "王先生"),
    ];
    for (id, name, contact) in suppliers {
        state.catalog_api.register_supplier(SupplierInput {
            supplier_id: id.to_string(),
            company_name: name.to_string(),
            contact: SupplierContact {
                contact_person: contact.to_string(),
                phone: "02-1234-5678".to_string(),
                email: format!("{}@example.com", id.to_lowercase()),
                address: String::new(),
            },
        })?;
    }

    // ===== 询价单 =====
    let inquiry = state.catalog_api.create_inquiry(
        PROJECT_NAME,
        PROJECT_CODE,
        Some(Local::now().date_naive() + Duration::days(7)),
    )?;
    let items = [
        ("T001", "水泥", "波特兰一型", "包", 500, 180.0),
        ("T002", "钢筋", "#4 SD280", "吨", 20, 26_000.0),
        ("T003", "红砖", "标准砖", "块", 20_000, 4.5),
    ];
    for (id, name, spec, unit, qty, price) in items {
        state.catalog_api.add_item_to_inquiry(
            &inquiry.inquiry_id,
            InquiryItemInput {
                item_id: id.to_string(),
                item_name: name.to_string(),
                specification: spec.to_string(),
                unit: unit.to_string(),
                quantity: qty,
                estimated_unit_price: price,
            },
        )?;
    }
    let supplier_ids: Vec<String> = suppliers.iter().map(|(id, _, _)| id.to_string()).collect();
    state
        .catalog_api
        .add_suppliers_to_inquiry(&inquiry.inquiry_id, &supplier_ids)?;
    state.catalog_api.send_inquiry(&inquiry.inquiry_id)?;

    // ===== 报价 =====
    let offers = [
        ("SUP001", [(175.0, 7), (26_500.0, 10), (4.4, 5)], 30),
        ("SUP002", [(185.0, 5), (25_200.0, 7), (4.8, 7)], 45),
        ("SUP003", [(170.0, 14), (26_800.0, 21), (4.2, 10)], 15),
    ];
    for (supplier_id, prices, validity) in offers {
        let quote_items = items
            .iter()
            .zip(prices)
            .map(|((item_id, _, _, _, qty, _), (unit_price, days))| QuoteItem {
                item_id: item_id.to_string(),
                unit_price,
                total_price: unit_price * *qty as f64,
                delivery_days: days,
                remarks: String::new(),
            })
            .collect();
        state.comparison_api.submit_quote(
            &inquiry.inquiry_id,
            supplier_id,
            QuoteSubmission {
                items: quote_items,
                payment_terms: "货到30天".to_string(),
                validity_days: Some(validity),
            },
        )?;
    }

    // ===== 比价与决标 =====
    state
        .comparison_api
        .create_comparison_table(&inquiry.inquiry_id, PROJECT_NAME)?;
    let detailed = state
        .comparison_api
        .generate_detailed_comparison(&inquiry.inquiry_id)?;
    let winner = detailed
        .recommendation
        .as_ref()
        .map(|r| r.composite_winner.supplier_id.clone())
        .context("没有可推荐的供应商")?;
    state
        .comparison_api
        .select_supplier(&inquiry.inquiry_id, &winner, "综合评分最高")?;
    let quote = state
        .comparison_api
        .find_selected_quote(&inquiry.inquiry_id)?
        .context("决标供应商没有报价")?;

    // ===== 采购单 =====
    state.budget_api.set_budget(PROJECT_NAME, PROJECT_BUDGET, 0.0)?;
    let po = state.purchase_order_api.generate(
        &inquiry.inquiry_id,
        &winner,
        &quote,
        PROJECT_NAME,
        "示范住宅大楼工地",
    )?;
    let po = state.purchase_order_api.confirm(&po.po_id)?;

    // ===== 进度 =====
    state.schedule_api.create_schedule(PROJECT_NAME, PROJECT_CODE)?;
    state.schedule_api.add_purchase_order(PROJECT_CODE, &po)?;
    let late = po
        .expected_delivery_date
        .map(|d| d + Duration::days(3))
        .unwrap_or_else(|| Local::now().naive_local());
    state
        .purchase_order_api
        .record_delivery(&po.po_id, late, DeliveryStatus::Delivered)?;
    let update = state
        .schedule_api
        .update_delivery_status(PROJECT_CODE, &po.po_id, late)?;
    state
        .schedule_api
        .update_construction_progress(PROJECT_CODE, &po.po_id, 40.0, "基础工程施工中", "demo")?;

    // ===== 报表 =====
    let engineering = state
        .report_api
        .generate_engineering_report(PROJECT_NAME, None, None)?;
    let material = state
        .report_api
        .generate_material_report(PROJECT_NAME, None, None)?;

    if let Some(dir) = out_dir {
        write_csv_exports(&state, &dir, &inquiry.inquiry_id, &po.po_id)?;
    }

    let budget = state.budget_api.get_budget_status(PROJECT_NAME)?;
    eprintln!("数据库: {}", db_path);
    eprintln!("询价单: {}  决标供应商: {}", inquiry.inquiry_id, winner);
    eprintln!("采购单: {}  金额: {:.2}", po.po_id, po.total_amount);
    eprintln!("剩余预算: {:.2}", budget.remaining_budget);
    eprintln!("到货预警: {}", update.alerts.len());
    eprintln!("报表: {} / {}", engineering.report_id, material.report_id);

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path).with_context(|| format!("备份失败: {}", db_path))?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn write_csv_exports(state: &AppState, dir: &Path, inquiry_id: &str, po_id: &str) -> Result<()> {
    fs::create_dir_all(dir)?;

    let comparison = state.comparison_api.export_comparison(inquiry_id)?;
    export::write_comparison_csv(&comparison, File::create(dir.join("comparison.csv"))?)?;

    let po = state.purchase_order_api.export_purchase_order(po_id)?;
    export::write_purchase_order_csv(&po, File::create(dir.join("purchase_order.csv"))?)?;

    let schedule = state.schedule_api.export_schedule(PROJECT_CODE)?;
    export::write_schedule_csv(&schedule, File::create(dir.join("schedule.csv"))?)?;

    eprintln!("CSV 已导出至 {}", dir.display());
    Ok(())
}
