// ==========================================
// 工程采购管理系统 - 综合评分
// ==========================================
// score = w_price × (1 - 价格差距) + w_delivery × (1 - 交期差距) + 有效期分
// 差距 = (值 - 最优值) / 最优值; 最优值为 0 时: 值相同取 0, 否则取 1
// ==========================================

use crate::config::policy::ScoringWeights;

/// 评分分项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParts {
    pub price_score: f64,
    pub delivery_score: f64,
    pub validity_score: f64,
}

impl ScoreParts {
    pub fn total(&self) -> f64 {
        self.price_score + self.delivery_score + self.validity_score
    }
}

/// 相对最优值的差距
pub fn relative_gap(value: f64, best: f64) -> f64 {
    if best == 0.0 {
        if value == best {
            0.0
        } else {
            1.0
        }
    } else {
        (value - best) / best
    }
}

/// 计算单个报价的综合评分
///
/// # 参数
/// - `total`: 报价总额
/// - `min_total`: 所有报价中的最低总额
/// - `avg_delivery`: 该报价平均交货天数
/// - `best_avg_delivery`: 所有报价中最短的平均交货天数
/// - `validity_days`: 报价有效天数
pub fn composite_score(
    total: f64,
    min_total: f64,
    avg_delivery: f64,
    best_avg_delivery: f64,
    validity_days: u32,
    weights: &ScoringWeights,
) -> ScoreParts {
    let validity_score = if validity_days >= weights.validity_threshold_days {
        weights.validity_full
    } else {
        weights.validity_reduced
    };
    ScoreParts {
        price_score: weights.price_weight * (1.0 - relative_gap(total, min_total)),
        delivery_score: weights.delivery_weight * (1.0 - relative_gap(avg_delivery, best_avg_delivery)),
        validity_score,
    }
}
