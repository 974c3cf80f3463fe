// ==========================================
// 玻璃深加工排产系统 - 产能预测结果模型
// ==========================================
// 职责: 仿真输出（负荷网格、明细网格、完工时间）及派生视图
// 说明: 所有映射使用 BTreeMap，保证输出顺序确定
// ==========================================

use crate::domain::order::Order;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// JobAnnotation - 工位日明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnnotation {
    pub order_id: String,
    pub customer_name: String,
    pub product_type: String,
    pub thickness_mm: Option<u32>,
    pub area_m2: f64, // 当日在该工位加工的面积
}

// ==========================================
// StationRun - 单订单单工位的排程区间
// ==========================================
// 时间单位: 自 today 零点起的天数（小数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRun {
    pub order_id: String,
    pub station: String,
    pub start: f64,
    pub end: f64,
    pub duration_days: f64, // 有效工作日数（不含非工作日）
    pub effective_capacity_m2: f64,
    pub area_m2: f64,
}

/// 未在逐日推进中完成的作业（命中迭代上限，或在窗口边界被截断）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedJob {
    pub order_id: String,
    pub station: String,
    pub remaining_days: f64,
    pub horizon_truncated: bool,
}

// ==========================================
// ForecastResult - 仿真结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub today: NaiveDate,
    pub horizon_days: usize,
    /// 窗口内每天是否工作日
    pub working_days: Vec<bool>,
    /// 工位 → 每日负荷百分比
    pub forecast_grid: BTreeMap<String, Vec<f64>>,
    /// 工位 → 每日加工面积 (m²)
    pub load_grid: BTreeMap<String, Vec<f64>>,
    /// 工位 → 每日作业明细
    pub details_grid: BTreeMap<String, Vec<Vec<JobAnnotation>>>,
    /// 订单 → 完工时间（自 today 起的天数）
    pub finish_times: BTreeMap<String, f64>,
    pub station_runs: Vec<StationRun>,
    pub capped_jobs: Vec<CappedJob>,
}

/// 订单预计完工日期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEstimate {
    pub order_id: String,
    pub finish_days: f64,
    pub completion_date: NaiveDate,
}

/// 预计延误订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateOrder {
    pub order_id: String,
    pub delivery_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub late_days: i64,
}

/// 工位负荷汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationUtilization {
    pub station: String,
    pub average_load_pct: f64, // 工作日平均负荷
    pub peak_day: Option<usize>,
    pub peak_load_pct: f64,
    pub total_area_m2: f64,
}

impl ForecastResult {
    /// 空结果（工位网格按给定工位初始化为 0）
    pub fn empty(today: NaiveDate, horizon_days: usize, working_days: Vec<bool>) -> Self {
        Self {
            today,
            horizon_days,
            working_days,
            forecast_grid: BTreeMap::new(),
            load_grid: BTreeMap::new(),
            details_grid: BTreeMap::new(),
            finish_times: BTreeMap::new(),
            station_runs: Vec::new(),
            capped_jobs: Vec::new(),
        }
    }

    /// 将完工时间换算为日历日期: today + floor(finish)
    pub fn completion_date(&self, finish_days: f64) -> NaiveDate {
        let whole = if finish_days.is_finite() {
            finish_days.max(0.0).floor().min(i32::MAX as f64) as i64
        } else {
            i32::MAX as i64
        };
        self.today
            .checked_add_signed(Duration::days(whole))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 所有订单的预计完工日期
    pub fn completion_estimates(&self) -> Vec<CompletionEstimate> {
        self.finish_times
            .iter()
            .map(|(order_id, &finish_days)| CompletionEstimate {
                order_id: order_id.clone(),
                finish_days,
                completion_date: self.completion_date(finish_days),
            })
            .collect()
    }

    /// 预计完工晚于交期的订单（延误天数降序）
    pub fn late_orders(&self, orders: &[Order]) -> Vec<LateOrder> {
        let mut late: Vec<LateOrder> = orders
            .iter()
            .filter_map(|order| {
                let delivery_date = order.delivery_date?;
                let finish = *self.finish_times.get(&order.order_id)?;
                let completion_date = self.completion_date(finish);
                if completion_date > delivery_date {
                    Some(LateOrder {
                        order_id: order.order_id.clone(),
                        delivery_date,
                        completion_date,
                        late_days: (completion_date - delivery_date).num_days(),
                    })
                } else {
                    None
                }
            })
            .collect();
        late.sort_by(|a, b| {
            b.late_days
                .cmp(&a.late_days)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        late
    }

    /// 工位负荷汇总（按工位名排序）
    pub fn station_utilization(&self) -> Vec<StationUtilization> {
        let working_count = self.working_days.iter().filter(|w| **w).count();

        self.forecast_grid
            .iter()
            .map(|(station, loads)| {
                let working_sum: f64 = loads
                    .iter()
                    .zip(self.working_days.iter())
                    .filter(|(_, working)| **working)
                    .map(|(load, _)| *load)
                    .sum();
                let average_load_pct = if working_count > 0 {
                    working_sum / working_count as f64
                } else {
                    0.0
                };

                let (peak_day, peak_load_pct) = loads
                    .iter()
                    .enumerate()
                    .filter(|(_, load)| **load > 0.0)
                    .fold((None, 0.0_f64), |(best_day, best), (day, load)| {
                        if *load > best {
                            (Some(day), *load)
                        } else {
                            (best_day, best)
                        }
                    });

                let total_area_m2 = self
                    .load_grid
                    .get(station)
                    .map(|row| row.iter().sum())
                    .unwrap_or(0.0);

                StationUtilization {
                    station: station.clone(),
                    average_load_pct,
                    peak_day,
                    peak_load_pct,
                    total_area_m2,
                }
            })
            .collect()
    }

    /// 瓶颈工位（平均负荷最高；并列取名称靠前者）
    pub fn bottleneck(&self) -> Option<StationUtilization> {
        self.station_utilization()
            .into_iter()
            .filter(|u| u.total_area_m2 > 0.0)
            .fold(None, |best: Option<StationUtilization>, u| match best {
                Some(b) if b.average_load_pct >= u.average_load_pct => Some(b),
                _ => Some(u),
            })
    }
}
