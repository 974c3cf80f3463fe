// ==========================================
// 玻璃深加工排产系统 - 工作日历
// ==========================================
// 职责: 判定某日是否工作日（周末规则 + 节假日覆盖）
// 红线: 无法判定的日期按工作日处理，避免仿真停滞
// ==========================================

use crate::engine::sources::HolidaySource;
use crate::repository::error::RepositoryResult;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

// ==========================================
// WorkCalendar - 工作日历
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCalendar {
    non_working_weekdays: Vec<Weekday>,
    holidays: BTreeSet<NaiveDate>,
}

impl WorkCalendar {
    pub fn new(non_working_weekdays: Vec<Weekday>) -> Self {
        Self {
            non_working_weekdays,
            holidays: BTreeSet::new(),
        }
    }

    /// 周六、周日休息
    pub fn standard() -> Self {
        Self::new(vec![Weekday::Sat, Weekday::Sun])
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(mut self, holidays: I) -> Self {
        self.holidays.extend(holidays);
        self
    }

    /// 从节假日数据源预加载 start 之后的全部节假日（单次批量读取）
    pub fn load(
        non_working_weekdays: Vec<Weekday>,
        source: &dyn HolidaySource,
        start: NaiveDate,
    ) -> RepositoryResult<Self> {
        let holidays = source.holidays_from(start)?;
        Ok(Self::new(non_working_weekdays).with_holidays(holidays))
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.non_working_weekdays.contains(&date.weekday()) && !self.holidays.contains(&date)
    }

    /// 以 today 为第 0 天的偏移日是否工作日（日期溢出时按工作日处理）
    pub fn is_working_offset(&self, today: NaiveDate, day_index: usize) -> bool {
        i64::try_from(day_index)
            .ok()
            .and_then(|d| today.checked_add_signed(Duration::days(d)))
            .map(|date| self.is_working_day(date))
            .unwrap_or(true)
    }

    /// 窗口内每天是否工作日
    pub fn working_day_flags(&self, today: NaiveDate, days: usize) -> Vec<bool> {
        (0..days)
            .map(|d| self.is_working_offset(today, d))
            .collect()
    }

    pub fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::standard()
    }
}
