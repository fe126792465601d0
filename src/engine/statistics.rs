// ==========================================
// 工程采购管理系统 - 统计工具
// ==========================================
// 纯函数, 空输入返回 None (由调用方决定缺省口径)
// ==========================================

use chrono::NaiveDateTime;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// 总体标准差
pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// 变异系数 = 总体标准差 / 均值 (均值为 0 时取 0)
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sd = population_stddev(values)?;
    if m == 0.0 {
        return Some(0.0);
    }
    Some(sd / m)
}

/// 价差百分比 = (max - min) / min × 100 (min 为 0 时取 0)
pub fn spread_pct(min: f64, max: f64) -> f64 {
    if min == 0.0 {
        return 0.0;
    }
    (max - min) / min * 100.0
}

/// 百分比 (分母为 0 时取 0)
pub fn pct(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// 天数差向上取整: ceil((to - from) / 1 天), 毫秒精度
pub fn ceil_days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let millis = (to - from).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_basic_stats() {
        let totals = [340_000.0, 360_000.0, 330_000.0];
        assert_eq!(min(&totals), Some(330_000.0));
        assert_eq!(max(&totals), Some(360_000.0));
        assert_eq!(mean(&totals), Some(343_333.333_333_333_3));
        assert!((spread_pct(330_000.0, 360_000.0) - 9.090_909).abs() < 1e-4);
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_cv_zero_mean() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), Some(0.0));
        assert_eq!(coefficient_of_variation(&[5.0, 5.0]), Some(0.0));
        let cv = coefficient_of_variation(&[90.0, 110.0]).unwrap();
        assert!((cv - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_ceil_days() {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(ceil_days_between(base, base), 0);
        assert_eq!(ceil_days_between(base, base + Duration::hours(1)), 1);
        assert_eq!(ceil_days_between(base, base + Duration::days(5)), 5);
        assert_eq!(ceil_days_between(base, base - Duration::hours(30)), -1);
    }
}
