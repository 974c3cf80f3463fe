// ==========================================
// 玻璃深加工排产系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载排产参数，缺失或非法时回落默认值
// 存储: config_kv 表 (scope_id='global')
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::domain::types::HorizonPolicy;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Weekday;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const HORIZON_DAYS: &str = "forecast_horizon_days";
    pub const HORIZON_POLICY: &str = "forecast_horizon_policy";
    pub const ITERATION_CAP_FACTOR: &str = "forecast_iteration_cap_factor";
    pub const DEFAULT_STATION_CAPACITY: &str = "default_station_capacity_m2";
    pub const DEFAULT_THICKNESS_FACTOR: &str = "default_thickness_factor";
    pub const CANONICALIZE_ROUTES: &str = "canonicalize_routes";
    pub const LOOKAHEAD_DAYS: &str = "sequencing_lookahead_days";
    pub const URGENT_THRESHOLD_DAYS: &str = "sequencing_urgent_threshold_days";
    pub const BATCH_BONUS: &str = "sequencing_batch_bonus";
    pub const IMPACT_THROUGHPUT: &str = "impact_throughput_m2_per_day";
    pub const IMPACT_CRITICAL_DAYS: &str = "impact_critical_days";
    pub const NON_WORKING_WEEKDAYS: &str = "calendar_non_working_weekdays";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 加载排产参数
    ///
    /// 每个键独立回落：缺失用默认值，非法值记录告警后用默认值
    pub fn load_planner_config(&self) -> RepositoryResult<PlannerConfig> {
        let defaults = PlannerConfig::default();

        Ok(PlannerConfig {
            horizon_days: self
                .parsed(config_keys::HORIZON_DAYS, defaults.horizon_days)?
                .max(1),
            horizon_policy: self.parsed_with(
                config_keys::HORIZON_POLICY,
                defaults.horizon_policy,
                HorizonPolicy::from_str,
            )?,
            iteration_cap_factor: self
                .parsed(config_keys::ITERATION_CAP_FACTOR, defaults.iteration_cap_factor)?
                .max(1),
            default_station_capacity_m2: self.parsed(
                config_keys::DEFAULT_STATION_CAPACITY,
                defaults.default_station_capacity_m2,
            )?,
            default_thickness_factor: self.parsed(
                config_keys::DEFAULT_THICKNESS_FACTOR,
                defaults.default_thickness_factor,
            )?,
            canonicalize_routes: self.parsed_with(
                config_keys::CANONICALIZE_ROUTES,
                defaults.canonicalize_routes,
                parse_bool,
            )?,
            lookahead_days: self.parsed(config_keys::LOOKAHEAD_DAYS, defaults.lookahead_days)?,
            urgent_threshold_days: self.parsed(
                config_keys::URGENT_THRESHOLD_DAYS,
                defaults.urgent_threshold_days,
            )?,
            batch_bonus: self.parsed(config_keys::BATCH_BONUS, defaults.batch_bonus)?,
            impact_throughput_m2_per_day: self.parsed(
                config_keys::IMPACT_THROUGHPUT,
                defaults.impact_throughput_m2_per_day,
            )?,
            impact_critical_days: self
                .parsed(config_keys::IMPACT_CRITICAL_DAYS, defaults.impact_critical_days)?,
            non_working_weekdays: self.parsed_with(
                config_keys::NON_WORKING_WEEKDAYS,
                defaults.non_working_weekdays.clone(),
                parse_weekdays,
            )?,
        })
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        self.parsed_with(key, default, |raw| raw.trim().parse().ok())
    }

    fn parsed_with<T>(
        &self,
        key: &str,
        default: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> RepositoryResult<T> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match parse(&raw) {
                Some(value) => Ok(value),
                None => {
                    warn!(key = key, value = %raw, "配置值无法解析，使用默认值");
                    Ok(default)
                }
            },
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// 解析逗号分隔的星期列表 ("Sat,Sun")；空串表示无休息日
fn parse_weekdays(raw: &str) -> Option<Vec<Weekday>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Weekday>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn make_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_load_defaults_when_empty() {
        let manager = make_manager();
        let config = manager.load_planner_config().unwrap();
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let manager = make_manager();
        manager.set_config_value(config_keys::HORIZON_DAYS, "14").unwrap();
        manager
            .set_config_value(config_keys::HORIZON_POLICY, "truncate")
            .unwrap();
        manager.set_config_value(config_keys::BATCH_BONUS, "abc").unwrap();
        manager
            .set_config_value(config_keys::NON_WORKING_WEEKDAYS, "Sun")
            .unwrap();

        let config = manager.load_planner_config().unwrap();
        assert_eq!(config.horizon_days, 14);
        assert_eq!(config.horizon_policy, HorizonPolicy::Truncate);
        assert_eq!(config.batch_bonus, PlannerConfig::default().batch_bonus);
        assert_eq!(config.non_working_weekdays, vec![Weekday::Sun]);
    }

    #[test]
    fn test_config_snapshot_is_sorted_json() {
        let manager = make_manager();
        manager.set_config_value("b_key", "2").unwrap();
        manager.set_config_value("a_key", "1").unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();
        assert_eq!(snapshot, r#"{"a_key":"1","b_key":"2"}"#);
    }

    #[test]
    fn test_parse_weekdays() {
        assert_eq!(parse_weekdays("Sat, Sun"), Some(vec![Weekday::Sat, Weekday::Sun]));
        assert_eq!(parse_weekdays(""), Some(vec![]));
        assert_eq!(parse_weekdays("Sat,Funday"), None);
    }
}
