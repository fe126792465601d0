// ==========================================
// 工程采购管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 当前仅 global)
// ==========================================

use crate::config::policy::ProcurementPolicy;
use crate::domain::report::ReportTemplate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取单项数值配置; 缺失回落默认值, 格式错误记 warn 后回落默认值
    fn get_parsed_or<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 加载采购决策策略
    ///
    /// 逐项读取 config_kv, 未配置的项使用 ProcurementPolicy::default()
    pub fn load_policy(&self) -> RepositoryResult<ProcurementPolicy> {
        let d = ProcurementPolicy::default();
        let mut policy = d.clone();

        policy.scoring.price_weight = self.get_parsed_or(config_keys::PRICE_WEIGHT, d.scoring.price_weight)?;
        policy.scoring.delivery_weight =
            self.get_parsed_or(config_keys::DELIVERY_WEIGHT, d.scoring.delivery_weight)?;
        policy.scoring.validity_full = self.get_parsed_or(config_keys::VALIDITY_FULL, d.scoring.validity_full)?;
        policy.scoring.validity_reduced =
            self.get_parsed_or(config_keys::VALIDITY_REDUCED, d.scoring.validity_reduced)?;
        policy.scoring.validity_threshold_days = self.get_parsed_or(
            config_keys::VALIDITY_THRESHOLD_DAYS,
            d.scoring.validity_threshold_days,
        )?;

        policy.reasonableness.high_consistency_below = self.get_parsed_or(
            config_keys::CV_HIGH_CONSISTENCY,
            d.reasonableness.high_consistency_below,
        )?;
        policy.reasonableness.reasonable_below =
            self.get_parsed_or(config_keys::CV_REASONABLE, d.reasonableness.reasonable_below)?;
        policy.reasonableness.large_below =
            self.get_parsed_or(config_keys::CV_LARGE, d.reasonableness.large_below)?;

        policy.delivery_risk.high_above_days =
            self.get_parsed_or(config_keys::DELIVERY_RISK_HIGH_DAYS, d.delivery_risk.high_above_days)?;
        policy.delivery_risk.medium_above_days = self.get_parsed_or(
            config_keys::DELIVERY_RISK_MEDIUM_DAYS,
            d.delivery_risk.medium_above_days,
        )?;

        policy.alert.high_above_days =
            self.get_parsed_or(config_keys::ALERT_HIGH_DAYS, d.alert.high_above_days)?;
        policy.alert.medium_above_days =
            self.get_parsed_or(config_keys::ALERT_MEDIUM_DAYS, d.alert.medium_above_days)?;

        policy.defaults.validity_days =
            self.get_parsed_or(config_keys::DEFAULT_VALIDITY_DAYS, d.defaults.validity_days)?;
        policy.defaults.upcoming_window_days =
            self.get_parsed_or(config_keys::UPCOMING_WINDOW_DAYS, d.defaults.upcoming_window_days)?;
        policy.defaults.alert_list_limit =
            self.get_parsed_or(config_keys::ALERT_LIST_LIMIT, d.defaults.alert_list_limit)?;

        Ok(policy)
    }

    /// 获取所有 global 配置的快照（JSON 对象, 按键排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置（覆盖同名键, 单事务）
    ///
    /// # 返回
    /// - 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                r#"
                INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2
                "#,
                params![key, value],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    // ===== 报表范本 =====

    /// 保存报表范本（config_kv: report_template/{name}）
    pub fn save_report_template(&self, name: &str, template: &ReportTemplate) -> RepositoryResult<()> {
        let value = serde_json::to_string(template)?;
        self.set_global_config_value(&template_key(name), &value)
    }

    pub fn get_report_template(&self, name: &str) -> RepositoryResult<Option<ReportTemplate>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        match self.get_global_config_value(&template_key(name))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// 列出全部报表范本名称（按名称排序）
    pub fn list_report_templates(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM config_kv WHERE scope_id = 'global' AND key LIKE ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![format!("{}%", config_keys::REPORT_TEMPLATE_PREFIX)], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys
            .into_iter()
            .filter_map(|k| {
                k.strip_prefix(config_keys::REPORT_TEMPLATE_PREFIX)
                    .map(str::to_string)
            })
            .collect())
    }
}

fn template_key(name: &str) -> String {
    format!("{}{}", config_keys::REPORT_TEMPLATE_PREFIX, name.trim())
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 综合评分
    pub const PRICE_WEIGHT: &str = "scoring_price_weight";
    pub const DELIVERY_WEIGHT: &str = "scoring_delivery_weight";
    pub const VALIDITY_FULL: &str = "scoring_validity_full";
    pub const VALIDITY_REDUCED: &str = "scoring_validity_reduced";
    pub const VALIDITY_THRESHOLD_DAYS: &str = "scoring_validity_threshold_days";

    // 价格合理性 (变异系数)
    pub const CV_HIGH_CONSISTENCY: &str = "cv_high_consistency_below";
    pub const CV_REASONABLE: &str = "cv_reasonable_below";
    pub const CV_LARGE: &str = "cv_large_below";

    // 交期风险
    pub const DELIVERY_RISK_HIGH_DAYS: &str = "delivery_risk_high_above_days";
    pub const DELIVERY_RISK_MEDIUM_DAYS: &str = "delivery_risk_medium_above_days";

    // 延误预警
    pub const ALERT_HIGH_DAYS: &str = "alert_high_above_days";
    pub const ALERT_MEDIUM_DAYS: &str = "alert_medium_above_days";

    // 缺省值
    pub const DEFAULT_VALIDITY_DAYS: &str = "default_validity_days";
    pub const UPCOMING_WINDOW_DAYS: &str = "upcoming_window_days";
    pub const ALERT_LIST_LIMIT: &str = "alert_list_limit";

    // 报表范本 (JSON)
    pub const REPORT_TEMPLATE_PREFIX: &str = "report_template/";
}
