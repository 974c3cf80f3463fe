// ==========================================
// 玻璃深加工排产系统 - 引擎层数据源接口
// ==========================================
// 职责: 定义引擎所需的只读数据源 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Repository 层实现（SQLite），
//       测试与调用方可使用内存快照实现
// ==========================================

use crate::domain::order::Order;
use crate::domain::station::{Station, ThicknessCoefficient};
use crate::domain::types::OrderStatus;
use crate::repository::error::RepositoryResult;
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// 订单 → 工位 → 已完成片数
pub type ProgressMap = HashMap<String, HashMap<String, u32>>;

// ==========================================
// 数据源 trait
// ==========================================

/// 订单数据源
pub trait OrderSource: Send + Sync {
    /// 获取指定状态的订单（按录入顺序）
    fn get_active_orders(&self, statuses: &[OrderStatus]) -> RepositoryResult<Vec<Order>>;
}

/// 工位与产能数据源
pub trait StationSource: Send + Sync {
    /// 获取全部工位
    fn get_stations(&self) -> RepositoryResult<Vec<Station>>;

    /// 获取厚度系数表
    fn get_thickness_coefficients(&self) -> RepositoryResult<Vec<ThicknessCoefficient>>;

    /// 工位 → 基准日产能
    fn get_capacities(&self) -> RepositoryResult<BTreeMap<String, f64>> {
        Ok(self
            .get_stations()?
            .into_iter()
            .map(|s| (s.name, s.daily_capacity_m2))
            .collect())
    }
}

/// 生产进度数据源
pub trait ProgressSource: Send + Sync {
    /// 批量获取订单各工位完成数（必须是单次批量查询）
    fn get_completed_progress(&self, order_ids: &[String]) -> RepositoryResult<ProgressMap>;
}

/// 节假日数据源
pub trait HolidaySource: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> RepositoryResult<bool>;

    /// start 及之后的全部节假日（单次批量读取）
    ///
    /// 仿真推进不设日期上限，预加载必须覆盖其可能到达的每一天
    fn holidays_from(&self, start: NaiveDate) -> RepositoryResult<BTreeSet<NaiveDate>>;

    /// 区间内全部节假日 [start, end]
    fn holidays_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<BTreeSet<NaiveDate>> {
        let mut holidays = self.holidays_from(start)?;
        holidays.retain(|d| *d <= end);
        Ok(holidays)
    }
}

/// 时钟（"今天"可注入，便于测试）
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

// ==========================================
// 时钟实现
// ==========================================

/// 系统本地时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// 固定日期时钟
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// ==========================================
// StaticSources - 内存快照数据源
// ==========================================
// 用于调用方已持有数据的场景（以及单元测试）
#[derive(Debug, Clone, Default)]
pub struct StaticSources {
    pub orders: Vec<Order>,
    pub stations: Vec<Station>,
    pub coefficients: Vec<ThicknessCoefficient>,
    pub progress: ProgressMap,
    pub holidays: BTreeSet<NaiveDate>,
}

impl StaticSources {
    pub fn new(orders: Vec<Order>, stations: Vec<Station>) -> Self {
        Self {
            orders,
            stations,
            coefficients: ThicknessCoefficient::defaults(),
            progress: ProgressMap::new(),
            holidays: BTreeSet::new(),
        }
    }

    pub fn with_progress(mut self, order_id: &str, station: &str, completed_qty: u32) -> Self {
        self.progress
            .entry(order_id.to_string())
            .or_default()
            .insert(station.to_string(), completed_qty);
        self
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }
}

impl OrderSource for StaticSources {
    fn get_active_orders(&self, statuses: &[OrderStatus]) -> RepositoryResult<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| statuses.contains(&o.status))
            .cloned()
            .collect())
    }
}

impl StationSource for StaticSources {
    fn get_stations(&self) -> RepositoryResult<Vec<Station>> {
        Ok(self.stations.clone())
    }

    fn get_thickness_coefficients(&self) -> RepositoryResult<Vec<ThicknessCoefficient>> {
        Ok(self.coefficients.clone())
    }
}

impl ProgressSource for StaticSources {
    fn get_completed_progress(&self, order_ids: &[String]) -> RepositoryResult<ProgressMap> {
        Ok(order_ids
            .iter()
            .filter_map(|id| self.progress.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }
}

impl HolidaySource for StaticSources {
    fn is_holiday(&self, date: NaiveDate) -> RepositoryResult<bool> {
        Ok(self.holidays.contains(&date))
    }

    fn holidays_from(&self, start: NaiveDate) -> RepositoryResult<BTreeSet<NaiveDate>> {
        Ok(self.holidays.range(start..).copied().collect())
    }
}
