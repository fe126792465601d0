// ==========================================
// 工程采购管理系统 - 报表引擎
// ==========================================
// 红线: Engine 不拼 SQL, 只做只读汇总
// 输入: 已按项目/期间取出的采购单
// 分组输出一律按首次出现排序
// ==========================================

use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::report::{
    CategoryCost, CostBreakdown, CostEfficiency, DeliveryPerformance, EngineeringDetailRow,
    EngineeringReport, EngineeringSummary, MaterialCategoryStats, MaterialPriceAnalysis,
    MaterialReport, MaterialRow, MaterialSummary, MaterialSupplyLine, PhaseStats,
    ProjectComparison, PurchaseOverallStats, PurchaseReport, PurchaseReportRow, ReportPeriod,
    SupplierMaterialLine, SupplierMaterialStats, SupplierPerformance, SupplierPurchaseStats,
    UnitPriceRange,
};
use crate::domain::types::{MaterialCategory, PurchaseOrderStatus};
use crate::engine::statistics::{self, pct};
use crate::i18n;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// 按关键字归类材料
pub fn categorize_item(item_name: &str) -> MaterialCategory {
    let has = |keys: &[&str]| keys.iter().any(|k| item_name.contains(k));
    if has(&["混凝土", "水泥"]) {
        MaterialCategory::Structural
    } else if has(&["鋼筋", "钢筋", "鋼材", "钢材"]) {
        MaterialCategory::Steel
    } else if has(&["磚", "砖", "瓦"]) {
        MaterialCategory::Masonry
    } else if has(&["電線", "电线", "開關", "开关"]) {
        MaterialCategory::Electrical
    } else if has(&["管線", "管线", "閥門", "阀门"]) {
        MaterialCategory::Plumbing
    } else if has(&["門", "门", "窗"]) {
        MaterialCategory::DoorsWindows
    } else if has(&["油漆", "塗料", "涂料"]) {
        MaterialCategory::Finishing
    } else {
        MaterialCategory::Other
    }
}

/// 按键分组的累加器, 保留首次出现顺序
fn entry_index<K: PartialEq>(keys: &mut Vec<K>, key: K) -> usize {
    match keys.iter().position(|k| *k == key) {
        Some(idx) => idx,
        None => {
            keys.push(key);
            keys.len() - 1
        }
    }
}

pub struct ReportEngine {
    // 无状态引擎,不需要注入依赖
}

impl ReportEngine {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 采购报表
    // ==========================================

    /// 采购报表
    ///
    /// # 参数
    /// - `orders`: 全部采购单, 按期间(创建日期) 与项目过滤
    #[instrument(skip_all)]
    pub fn purchase_report(&self, orders: &[PurchaseOrder], period: ReportPeriod) -> PurchaseReport {
        let selected: Vec<&PurchaseOrder> = orders
            .iter()
            .filter(|po| period.contains(po.created_at))
            .filter(|po| match &period.project_name {
                Some(name) => po.project_name == *name,
                None => true,
            })
            .collect();

        let delivered: Vec<&&PurchaseOrder> = selected.iter().filter(|po| po.is_delivered()).collect();
        let overall = PurchaseOverallStats {
            order_count: selected.len(),
            total_amount: selected.iter().map(|po| po.total_amount).sum(),
            confirmed_count: selected
                .iter()
                .filter(|po| po.status == PurchaseOrderStatus::Confirmed)
                .count(),
            pending_delivery_count: selected
                .iter()
                .filter(|po| po.status == PurchaseOrderStatus::Confirmed && !po.is_delivered())
                .count(),
            delivered_count: delivered.len(),
        };

        let on_time = delivered.iter().filter(|po| po.is_on_time()).count();
        let positive_delay: i64 = delivered
            .iter()
            .map(|po| po.delivery_delay_days.unwrap_or(0).max(0))
            .sum();
        let delivery_performance = DeliveryPerformance {
            delivered_count: delivered.len(),
            on_time_rate_pct: pct(on_time as f64, delivered.len() as f64),
            average_delay_days: if delivered.is_empty() {
                0.0
            } else {
                positive_delay as f64 / delivered.len() as f64
            },
            max_delay_days: delivered
                .iter()
                .map(|po| po.delivery_delay_days.unwrap_or(0))
                .max()
                .unwrap_or(0),
        };

        let mut supplier_ids: Vec<String> = Vec::new();
        let mut supplier_performance: Vec<SupplierPerformance> = Vec::new();
        for po in &selected {
            let idx = entry_index(&mut supplier_ids, po.supplier_id.clone());
            if idx == supplier_performance.len() {
                supplier_performance.push(SupplierPerformance {
                    supplier_id: po.supplier_id.clone(),
                    order_count: 0,
                    total_amount: 0.0,
                    on_time_count: 0,
                    delivered_count: 0,
                    on_time_rate_pct: None,
                });
            }
            let perf = &mut supplier_performance[idx];
            perf.order_count += 1;
            perf.total_amount += po.total_amount;
            if po.is_delivered() {
                perf.delivered_count += 1;
                if po.is_on_time() {
                    perf.on_time_count += 1;
                }
            }
        }
        for perf in &mut supplier_performance {
            if perf.delivered_count > 0 {
                perf.on_time_rate_pct = Some(pct(perf.on_time_count as f64, perf.delivered_count as f64));
            }
        }

        let details = selected
            .iter()
            .map(|po| PurchaseReportRow {
                po_id: po.po_id.clone(),
                project_name: po.project_name.clone(),
                supplier_id: po.supplier_id.clone(),
                created_at: po.created_at,
                total_amount: po.total_amount,
                status: po.status,
                expected_delivery_date: po.expected_delivery_date,
                actual_delivery_date: po.actual_delivery_date,
                delivery_delay_days: po.delivery_delay_days.unwrap_or(0),
            })
            .collect();

        PurchaseReport {
            period,
            overall,
            delivery_performance,
            supplier_performance,
            details,
        }
    }

    // ==========================================
    // 工程采购明细报表
    // ==========================================

    /// # 参数
    /// - `orders`: 已过滤的项目采购单
    /// - `supplier_names`: 供应商编号 -> 公司名称 (未登记时显示编号)
    #[instrument(skip_all, fields(orders = orders.len()))]
    pub fn engineering_report(
        &self,
        orders: &[PurchaseOrder],
        supplier_names: &HashMap<String, String>,
    ) -> EngineeringReport {
        let default_phase = i18n::default_phase();

        let summary = EngineeringSummary {
            order_count: orders.len(),
            total_amount: orders.iter().map(|po| po.total_amount).sum(),
            confirmed_count: orders
                .iter()
                .filter(|po| po.status == PurchaseOrderStatus::Confirmed)
                .count(),
            in_progress_count: orders
                .iter()
                .filter(|po| po.status == PurchaseOrderStatus::Created)
                .count(),
        };

        let mut phase_keys: Vec<String> = Vec::new();
        let mut phases: Vec<PhaseStats> = Vec::new();
        let mut supplier_keys: Vec<String> = Vec::new();
        let mut suppliers: Vec<SupplierPurchaseStats> = Vec::new();
        let mut supplier_items: Vec<HashSet<String>> = Vec::new();

        for po in orders {
            let phase = po.project_phase.clone().unwrap_or_else(|| default_phase.clone());
            let idx = entry_index(&mut phase_keys, phase.clone());
            if idx == phases.len() {
                phases.push(PhaseStats {
                    phase,
                    order_count: 0,
                    total_amount: 0.0,
                    item_count: 0,
                });
            }
            phases[idx].order_count += 1;
            phases[idx].total_amount += po.total_amount;
            phases[idx].item_count += po.items.len();

            let idx = entry_index(&mut supplier_keys, po.supplier_id.clone());
            if idx == suppliers.len() {
                suppliers.push(SupplierPurchaseStats {
                    supplier_id: po.supplier_id.clone(),
                    order_count: 0,
                    total_amount: 0.0,
                    distinct_item_count: 0,
                });
                supplier_items.push(HashSet::new());
            }
            suppliers[idx].order_count += 1;
            suppliers[idx].total_amount += po.total_amount;
            supplier_items[idx].extend(po.items.iter().map(|i| i.item_name.clone()));
            suppliers[idx].distinct_item_count = supplier_items[idx].len();
        }

        let details = orders
            .iter()
            .map(|po| EngineeringDetailRow {
                po_id: po.po_id.clone(),
                supplier_id: po.supplier_id.clone(),
                supplier_name: supplier_names
                    .get(&po.supplier_id)
                    .cloned()
                    .unwrap_or_else(|| po.supplier_id.clone()),
                project_phase: po.project_phase.clone().unwrap_or_else(|| default_phase.clone()),
                total_amount: po.total_amount,
                delivery_status: po.delivery_status,
                items: po.items.clone(),
            })
            .collect();

        EngineeringReport {
            summary,
            phases,
            suppliers,
            details,
            cost_breakdown: self.cost_breakdown(orders),
        }
    }

    /// 成本按材料类别拆分; 占比分母为采购单总额
    pub fn cost_breakdown(&self, orders: &[PurchaseOrder]) -> CostBreakdown {
        let total_cost: f64 = orders.iter().map(|po| po.total_amount).sum();
        let mut keys: Vec<MaterialCategory> = Vec::new();
        let mut amounts: Vec<f64> = Vec::new();

        for item in orders.iter().flat_map(|po| po.items.iter()) {
            let idx = entry_index(&mut keys, categorize_item(&item.item_name));
            if idx == amounts.len() {
                amounts.push(0.0);
            }
            amounts[idx] += item.total_price;
        }

        CostBreakdown {
            total_cost,
            categories: keys
                .into_iter()
                .zip(amounts)
                .map(|(category, amount)| CategoryCost {
                    category,
                    amount,
                    share_pct: pct(amount, total_cost),
                })
                .collect(),
        }
    }

    // ==========================================
    // 材料采购明细报表
    // ==========================================

    #[instrument(skip_all, fields(orders = orders.len()))]
    pub fn material_report(&self, orders: &[PurchaseOrder]) -> MaterialReport {
        let materials = self.merge_materials(orders);

        let all_prices: Vec<f64> = materials
            .iter()
            .flat_map(|m| m.suppliers.iter().map(|s| s.unit_price))
            .collect();
        let unit_price_range = match (
            statistics::min(&all_prices),
            statistics::max(&all_prices),
            statistics::mean(&all_prices),
        ) {
            (Some(min), Some(max), Some(mean)) => Some(UnitPriceRange { min, max, mean }),
            _ => None,
        };
        let supplier_count = materials
            .iter()
            .flat_map(|m| m.suppliers.iter().map(|s| s.supplier_id.as_str()))
            .collect::<HashSet<_>>()
            .len();

        let summary = MaterialSummary {
            material_count: materials.len(),
            total_amount: materials.iter().map(|m| m.total_amount).sum(),
            supplier_count,
            unit_price_range,
        };

        // 类别统计
        let mut category_keys: Vec<MaterialCategory> = Vec::new();
        let mut categories: Vec<MaterialCategoryStats> = Vec::new();
        for material in &materials {
            let category = categorize_item(&material.item_name);
            let idx = entry_index(&mut category_keys, category);
            if idx == categories.len() {
                categories.push(MaterialCategoryStats {
                    category,
                    material_count: 0,
                    total_amount: 0.0,
                    total_quantity: 0,
                });
            }
            categories[idx].material_count += 1;
            categories[idx].total_amount += material.total_amount;
            categories[idx].total_quantity += material.total_quantity;
        }

        // 供应商材料统计
        let mut supplier_keys: Vec<String> = Vec::new();
        let mut suppliers: Vec<SupplierMaterialStats> = Vec::new();
        for material in &materials {
            for line in &material.suppliers {
                let idx = entry_index(&mut supplier_keys, line.supplier_id.clone());
                if idx == suppliers.len() {
                    suppliers.push(SupplierMaterialStats {
                        supplier_id: line.supplier_id.clone(),
                        material_count: 0,
                        total_amount: 0.0,
                        lines: Vec::new(),
                    });
                }
                let stats = &mut suppliers[idx];
                stats.material_count += 1;
                stats.total_amount += line.subtotal;
                stats.lines.push(SupplierMaterialLine {
                    item_name: material.item_name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                });
            }
        }

        let price_analysis = materials
            .iter()
            .filter(|m| m.suppliers.len() > 1)
            .filter_map(|m| {
                let prices: Vec<f64> = m.suppliers.iter().map(|s| s.unit_price).collect();
                let min = statistics::min(&prices)?;
                let max = statistics::max(&prices)?;
                Some(MaterialPriceAnalysis {
                    item_name: m.item_name.clone(),
                    min_unit_price: min,
                    max_unit_price: max,
                    mean_unit_price: statistics::mean(&prices)?,
                    spread: max - min,
                    spread_pct: statistics::spread_pct(min, max),
                    supplier_line_count: m.suppliers.len(),
                })
            })
            .collect();

        MaterialReport {
            summary,
            categories,
            suppliers,
            materials,
            price_analysis,
        }
    }

    /// 按 (品名, 规格) 合并采购明细
    fn merge_materials(&self, orders: &[PurchaseOrder]) -> Vec<MaterialRow> {
        let mut keys: Vec<(String, String)> = Vec::new();
        let mut rows: Vec<MaterialRow> = Vec::new();

        for po in orders {
            for item in &po.items {
                let idx = entry_index(&mut keys, (item.item_name.clone(), item.specification.clone()));
                if idx == rows.len() {
                    rows.push(MaterialRow {
                        item_name: item.item_name.clone(),
                        specification: item.specification.clone(),
                        unit: item.unit.clone(),
                        total_quantity: 0,
                        total_amount: 0.0,
                        average_unit_price: 0.0,
                        suppliers: Vec::new(),
                    });
                }
                let row = &mut rows[idx];
                row.total_quantity += item.quantity as u64;
                row.total_amount += item.total_price;
                row.suppliers.push(MaterialSupplyLine {
                    supplier_id: po.supplier_id.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    subtotal: item.quantity as f64 * item.unit_price,
                });
            }
        }

        for row in &mut rows {
            if row.total_quantity > 0 {
                row.average_unit_price = row.total_amount / row.total_quantity as f64;
            }
        }
        rows
    }

    // ==========================================
    // 项目比较报表
    // ==========================================

    pub fn project_comparison(&self, project_name: &str, orders: &[PurchaseOrder]) -> ProjectComparison {
        let total_amount: f64 = orders.iter().map(|po| po.total_amount).sum();
        let total_items: usize = orders.iter().map(|po| po.items.len()).sum();

        let mut supplier_keys: Vec<String> = Vec::new();
        let mut supplier_costs: Vec<f64> = Vec::new();
        for po in orders {
            let idx = entry_index(&mut supplier_keys, po.supplier_id.clone());
            if idx == supplier_costs.len() {
                supplier_costs.push(0.0);
            }
            supplier_costs[idx] += po.total_amount;
        }
        supplier_costs.sort_by(|a, b| b.total_cmp(a));
        let top3: f64 = supplier_costs.iter().take(3).sum();

        ProjectComparison {
            project_name: project_name.to_string(),
            order_count: orders.len(),
            total_amount,
            average_order_amount: if orders.is_empty() {
                0.0
            } else {
                total_amount / orders.len() as f64
            },
            supplier_count: supplier_keys.len(),
            cost_efficiency: CostEfficiency {
                average_cost_per_item: if total_items == 0 {
                    0.0
                } else {
                    total_amount / total_items as f64
                },
                order_count: orders.len(),
                top3_supplier_concentration_pct: pct(top3, total_amount),
            },
            cost_breakdown: self.cost_breakdown(orders),
        }
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}
