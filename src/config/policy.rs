use serde::{Deserialize, Serialize};

/// 采购决策策略（权重 / 阈值）
///
/// 存储位置：config_kv（scope_id='global'），逐项读取，缺省回落到默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcurementPolicy {
    #[serde(default)]
    pub scoring: ScoringWeights,

    #[serde(default)]
    pub reasonableness: ReasonablenessThresholds,

    #[serde(default)]
    pub delivery_risk: DeliveryRiskThresholds,

    #[serde(default)]
    pub alert: AlertThresholds,

    #[serde(default)]
    pub defaults: ProcurementDefaults,
}

/// 综合评分权重
///
/// score = price_weight × (1 - 价格差距) + delivery_weight × (1 - 交期差距)
///       + (validity_days >= validity_threshold_days ? validity_full : validity_reduced)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub price_weight: f64,
    pub delivery_weight: f64,
    pub validity_full: f64,
    pub validity_reduced: f64,
    pub validity_threshold_days: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price_weight: 0.5,
            delivery_weight: 0.3,
            validity_full: 0.2,
            validity_reduced: 0.1,
            validity_threshold_days: 30,
        }
    }
}

/// 价格合理性阈值（变异系数）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReasonablenessThresholds {
    pub high_consistency_below: f64,
    pub reasonable_below: f64,
    pub large_below: f64,
}

impl Default for ReasonablenessThresholds {
    fn default() -> Self {
        Self {
            high_consistency_below: 0.10,
            reasonable_below: 0.20,
            large_below: 0.30,
        }
    }
}

/// 交期风险阈值（最长交货天数严格大于阈值）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRiskThresholds {
    pub high_above_days: u32,
    pub medium_above_days: u32,
}

impl Default for DeliveryRiskThresholds {
    fn default() -> Self {
        Self {
            high_above_days: 30,
            medium_above_days: 14,
        }
    }
}

/// 延误预警严重度阈值（延误天数严格大于阈值）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub high_above_days: i64,
    pub medium_above_days: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high_above_days: 7,
            medium_above_days: 3,
        }
    }
}

/// 其余缺省值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcurementDefaults {
    /// 报价有效天数
    pub validity_days: u32,
    /// 即将到货查询窗口（天）
    pub upcoming_window_days: i64,
    /// 预警列表条数上限
    pub alert_list_limit: usize,
}

impl Default for ProcurementDefaults {
    fn default() -> Self {
        Self {
            validity_days: 30,
            upcoming_window_days: 7,
            alert_list_limit: 50,
        }
    }
}
