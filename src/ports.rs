// ==========================================
// 工程采购管理系统 - 可注入能力 (编号 / 时钟)
// ==========================================
// 职责: 编号生成与当前时间均通过 trait 注入,
//       测试可提供确定性实现, 不依赖进程级共享计数器
// ==========================================

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// ==========================================
// IdGenerator - 编号生成
// ==========================================

/// 编号生成器
pub trait IdGenerator: Send + Sync {
    /// 生成下一个编号
    fn next(&self) -> String;
}

/// 前缀 + 定长序号的编号生成器 (INQ000001, PO000001, ...)
pub struct SequentialIdGenerator {
    prefix: String,
    width: usize,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub const DEFAULT_WIDTH: usize = 6;

    pub fn new(prefix: &str) -> Self {
        Self::starting_at(prefix, 1)
    }

    /// 从指定序号开始（已有数据的库需要跳过已用序号）
    pub fn starting_at(prefix: &str, first: u64) -> Self {
        Self {
            prefix: prefix.to_string(),
            width: Self::DEFAULT_WIDTH,
            counter: AtomicU64::new(first),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }
}

/// UUID 编号（预警/进度记录）
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// ==========================================
// Clock - 当前时间
// ==========================================

/// 时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// 系统本地时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// 固定时钟，可手动推进
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance_days(&self, days: i64) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += Duration::days(days);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// ==========================================
// ProcurementIds - 各实体编号生成器集合
// ==========================================

/// 各实体编号生成器
#[derive(Clone)]
pub struct ProcurementIds {
    pub inquiry: Arc<dyn IdGenerator>,
    pub quote: Arc<dyn IdGenerator>,
    pub purchase_order: Arc<dyn IdGenerator>,
    pub engineering_report: Arc<dyn IdGenerator>,
    pub material_report: Arc<dyn IdGenerator>,
    pub record: Arc<dyn IdGenerator>,
}

impl ProcurementIds {
    pub const INQUIRY_PREFIX: &'static str = "INQ";
    pub const QUOTE_PREFIX: &'static str = "QUO";
    pub const PURCHASE_ORDER_PREFIX: &'static str = "PO";
    pub const ENGINEERING_REPORT_PREFIX: &'static str = "ENG";
    pub const MATERIAL_REPORT_PREFIX: &'static str = "MAT";

    /// 全部从 1 开始的顺序编号（空库 / 测试）
    pub fn sequential() -> Self {
        Self {
            inquiry: Arc::new(SequentialIdGenerator::new(Self::INQUIRY_PREFIX)),
            quote: Arc::new(SequentialIdGenerator::new(Self::QUOTE_PREFIX)),
            purchase_order: Arc::new(SequentialIdGenerator::new(Self::PURCHASE_ORDER_PREFIX)),
            engineering_report: Arc::new(SequentialIdGenerator::new(
                Self::ENGINEERING_REPORT_PREFIX,
            )),
            material_report: Arc::new(SequentialIdGenerator::new(Self::MATERIAL_REPORT_PREFIX)),
            record: Arc::new(UuidGenerator),
        }
    }
}

impl Default for ProcurementIds {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_sequential_ids_are_zero_padded() {
        let gen = SequentialIdGenerator::new("INQ");
        assert_eq!(gen.next(), "INQ000001");
        assert_eq!(gen.next(), "INQ000002");

        let po = SequentialIdGenerator::starting_at("PO", 42);
        assert_eq!(po.next(), "PO000042");
    }

    #[test]
    fn test_fixed_clock_advance() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let clock = FixedClock::new(start);
        clock.advance_days(10);
        assert_eq!(clock.now(), start + Duration::days(10));
    }
}
