// ==========================================
// 玻璃深加工排产系统 - 节假日数据仓储
// ==========================================

use crate::engine::sources::HolidaySource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct HolidayRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HolidayRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn add_holiday(&self, date: NaiveDate, description: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO holidays (holiday_date, description) VALUES (?1, ?2)
            ON CONFLICT(holiday_date) DO UPDATE SET description = excluded.description
            "#,
            params![date.format(DATE_FORMAT).to_string(), description],
        )?;
        Ok(())
    }

    pub fn remove_holiday(&self, date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM holidays WHERE holiday_date = ?1",
            params![date.format(DATE_FORMAT).to_string()],
        )?;
        Ok(affected > 0)
    }
}

impl HolidaySource for HolidayRepository {
    fn is_holiday(&self, date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM holidays WHERE holiday_date = ?1",
            params![date.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 单次查询（不设上限）
    fn holidays_from(&self, start: NaiveDate) -> RepositoryResult<BTreeSet<NaiveDate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT holiday_date FROM holidays WHERE holiday_date >= ?1 ORDER BY holiday_date",
        )?;
        let raw = stmt
            .query_map(params![start.format(DATE_FORMAT).to_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parse_dates(raw))
    }

    /// 单次区间查询
    fn holidays_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<BTreeSet<NaiveDate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT holiday_date FROM holidays WHERE holiday_date BETWEEN ?1 AND ?2 ORDER BY holiday_date",
        )?;
        let raw = stmt
            .query_map(
                params![
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parse_dates(raw))
    }
}

fn parse_dates(raw: Vec<String>) -> BTreeSet<NaiveDate> {
    raw.into_iter()
        .filter_map(|s| match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(holiday_date = %s, "节假日日期格式错误，已忽略");
                None
            }
        })
        .collect()
}
