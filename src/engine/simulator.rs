// ==========================================
// 玻璃深加工排产系统 - 产能仿真引擎
// ==========================================
// 职责: 按排序后的订单逐工位、逐日消耗产能
// 输入: 排序后订单 + 产能表 + 工作日历 + 进度快照
// 输出: 负荷网格(%) + 面积网格(m²) + 明细网格 + 完工时间
// ==========================================
// 时间模型:
// - 时间单位为"天"，today 零点为 0，允许小数（半天开工/半天完工）
// - 每个工位单服务台: 开工 = max(订单就绪, 工位空闲)
// - 同一订单工位间严格串行（上一工位完工后下一工位才可开工）
// - 非工作日时间流逝但不产出
// 红线: 仿真只读快照，不回写任何数据
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::forecast::{CappedJob, ForecastResult, JobAnnotation, StationRun};
use crate::domain::order::Order;
use crate::domain::types::HorizonPolicy;
use crate::engine::calendar::WorkCalendar;
use crate::engine::capacity::CapacityTable;
use crate::engine::sources::ProgressMap;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// 剩余工期判零阈值（天）
const DURATION_EPSILON: f64 = 1e-9;

/// 单工位推进结果
#[derive(Debug, Clone, Copy)]
struct AdvanceOutcome {
    end: f64,
    remaining: f64,
    capped: bool,
    truncated: bool,
}

// ==========================================
// SimulationState - 单次仿真的临时状态
// ==========================================
// 每次 simulate 新建，结束即销毁
struct SimulationState {
    horizon_days: usize,
    station_free_time: HashMap<String, f64>,
    result: ForecastResult,
}

impl SimulationState {
    fn new(today: NaiveDate, horizon_days: usize, working_days: Vec<bool>) -> Self {
        Self {
            horizon_days,
            station_free_time: HashMap::new(),
            result: ForecastResult::empty(today, horizon_days, working_days),
        }
    }

    fn free_time(&self, station: &str) -> f64 {
        self.station_free_time.get(station).copied().unwrap_or(0.0)
    }

    /// 确保工位网格行存在（全 0）
    fn ensure_station(&mut self, station: &str) {
        if self.result.forecast_grid.contains_key(station) {
            return;
        }
        let days = self.horizon_days;
        self.result
            .forecast_grid
            .insert(station.to_string(), vec![0.0; days]);
        self.result
            .load_grid
            .insert(station.to_string(), vec![0.0; days]);
        self.result
            .details_grid
            .insert(station.to_string(), vec![Vec::new(); days]);
    }

    /// 记录 (工位, 日) 的负荷与明细；同一订单同日明细合并
    fn record(&mut self, station: &str, day: usize, work_days: f64, capacity_m2: f64, order: &Order) {
        if day >= self.horizon_days {
            return;
        }
        self.ensure_station(station);

        let area = work_days * capacity_m2;
        if let Some(row) = self.result.forecast_grid.get_mut(station) {
            row[day] += work_days * 100.0;
        }
        if let Some(row) = self.result.load_grid.get_mut(station) {
            row[day] += area;
        }
        if let Some(row) = self.result.details_grid.get_mut(station) {
            let cell = &mut row[day];
            match cell.iter_mut().find(|a| a.order_id == order.order_id) {
                Some(existing) => existing.area_m2 += area,
                None => cell.push(JobAnnotation {
                    order_id: order.order_id.clone(),
                    customer_name: order.customer_name.clone(),
                    product_type: order.product_type.clone(),
                    thickness_mm: order.thickness_mm,
                    area_m2: area,
                }),
            }
        }
    }
}

// ==========================================
// ForecastSimulator - 产能仿真引擎
// ==========================================
pub struct ForecastSimulator<'a> {
    capacity: &'a CapacityTable,
    calendar: &'a WorkCalendar,
    horizon_days: usize,
    horizon_policy: HorizonPolicy,
    iteration_cap: usize,
    canonicalize_routes: bool,
}

impl<'a> ForecastSimulator<'a> {
    pub fn new(capacity: &'a CapacityTable, calendar: &'a WorkCalendar, config: &PlannerConfig) -> Self {
        Self {
            capacity,
            calendar,
            horizon_days: config.horizon_days,
            horizon_policy: config.horizon_policy,
            iteration_cap: config.iteration_cap(),
            canonicalize_routes: config.canonicalize_routes,
        }
    }

    /// 覆盖配置中的窗口策略
    pub fn with_policy(mut self, policy: HorizonPolicy) -> Self {
        self.horizon_policy = policy;
        self
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行仿真
    ///
    /// # 参数
    /// - `sequenced_orders`: 已排序订单（顺序即工位排队顺序）
    /// - `progress`: 批量预取的进度快照（订单 → 工位 → 完成片数）
    /// - `today`: 仿真起点（第 0 天）
    #[instrument(skip(self, sequenced_orders, progress), fields(
        order_count = sequenced_orders.len(),
        horizon_days = self.horizon_days,
        policy = %self.horizon_policy
    ))]
    pub fn simulate(
        &self,
        sequenced_orders: &[Order],
        progress: &ProgressMap,
        today: NaiveDate,
    ) -> ForecastResult {
        let working_days = self.calendar.working_day_flags(today, self.horizon_days);
        let mut state = SimulationState::new(today, self.horizon_days, working_days);

        for station in self.capacity.station_names() {
            state.ensure_station(station);
        }

        for order in sequenced_orders {
            let finish = self.simulate_order(&mut state, order, progress, today);
            state.result.finish_times.insert(order.order_id.clone(), finish);
        }

        info!(
            orders = state.result.finish_times.len(),
            runs = state.result.station_runs.len(),
            capped = state.result.capped_jobs.len(),
            "产能仿真完成"
        );

        state.result
    }

    /// 单订单沿路线推进，返回完工时间
    fn simulate_order(
        &self,
        state: &mut SimulationState,
        order: &Order,
        progress: &ProgressMap,
        today: NaiveDate,
    ) -> f64 {
        let route = if self.canonicalize_routes {
            self.capacity.canonicalize_route(&order.route)
        } else {
            order.route.clone()
        };

        if route.is_empty() {
            warn!(order_id = %order.order_id, "订单工艺路线为空");
        }

        let area = order.area_m2();
        let order_progress = progress.get(&order.order_id);
        let mut ready_time = 0.0_f64;

        for route_station in route.stations() {
            let station = self.capacity.resolve_station(route_station);

            // 1. 已完成工位跳过（替代工位的进度同样计入）
            let done_qty = order_progress
                .map(|p| {
                    let original = p.get(route_station.as_str()).copied().unwrap_or(0);
                    let substitute = p.get(station).copied().unwrap_or(0);
                    original.max(substitute)
                })
                .unwrap_or(0);
            let remaining_ratio = order.remaining_ratio(done_qty);
            if remaining_ratio <= 0.0 {
                debug!(order_id = %order.order_id, station = station, "工位已完成，跳过");
                continue;
            }

            // 2. 有效产能与工期
            let capacity_m2 = self.capacity.effective_capacity(station, order.thickness_mm);
            let mut remaining_area = area * remaining_ratio;
            if let Some(lot) = self.capacity.lot_size_m2(station) {
                remaining_area = (remaining_area / lot).ceil() * lot;
            }
            let duration_days = remaining_area / capacity_m2;

            // 3. 开工 = max(订单就绪, 工位空闲)
            let start = ready_time.max(state.free_time(station));
            let outcome = self.advance(state, order, station, start, duration_days, capacity_m2, today);

            if outcome.capped || outcome.truncated {
                if outcome.capped {
                    warn!(
                        order_id = %order.order_id,
                        station = station,
                        remaining_days = outcome.remaining,
                        "逐日推进命中迭代上限"
                    );
                }
                state.result.capped_jobs.push(CappedJob {
                    order_id: order.order_id.clone(),
                    station: station.to_string(),
                    remaining_days: outcome.remaining,
                    horizon_truncated: outcome.truncated,
                });
            }

            state.result.station_runs.push(StationRun {
                order_id: order.order_id.clone(),
                station: station.to_string(),
                start,
                end: outcome.end,
                duration_days,
                effective_capacity_m2: capacity_m2,
                area_m2: remaining_area,
            });

            // 4. 工位占用与订单就绪时间同步推进
            state
                .station_free_time
                .insert(station.to_string(), outcome.end);
            ready_time = outcome.end;
        }

        ready_time
    }

    /// 自 start 起逐日消耗工期
    ///
    /// - 工作日: 消耗当日剩余时段，写入网格（仅窗口内）
    /// - 非工作日: 直接跳到次日零点
    /// - 命中迭代上限: Continue 策略把剩余工期直接累加到完工时间（工位保持占用）
    /// - Truncate 策略: 到达窗口边界即停止
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        state: &mut SimulationState,
        order: &Order,
        station: &str,
        start: f64,
        duration_days: f64,
        capacity_m2: f64,
        today: NaiveDate,
    ) -> AdvanceOutcome {
        let mut current = start;
        let mut remaining = duration_days;
        let mut iterations = 0usize;
        let horizon = self.horizon_days as f64;

        while remaining > DURATION_EPSILON {
            if iterations >= self.iteration_cap {
                let end = match self.horizon_policy {
                    HorizonPolicy::Continue => current + remaining,
                    HorizonPolicy::Truncate => current,
                };
                return AdvanceOutcome {
                    end,
                    remaining,
                    capped: true,
                    truncated: false,
                };
            }
            iterations += 1;

            let day_start = current.floor();
            if self.horizon_policy == HorizonPolicy::Truncate && day_start >= horizon {
                return AdvanceOutcome {
                    end: current,
                    remaining,
                    capped: false,
                    truncated: true,
                };
            }

            let day_end = day_start + 1.0;
            let day = day_start as usize;
            if !self.calendar.is_working_offset(today, day) {
                current = day_end;
                continue;
            }

            let available = day_end - current;
            let work = if remaining >= available {
                current = day_end;
                remaining -= available;
                available
            } else {
                current += remaining;
                let work = remaining;
                remaining = 0.0;
                work
            };

            state.record(station, day, work, capacity_m2, order);
        }

        AdvanceOutcome {
            end: current,
            remaining: 0.0,
            capped: false,
            truncated: false,
        }
    }
}
