// ==========================================
// 玻璃深加工排产系统 - 排产编排器
// ==========================================
// 用途: 协调 数据源 → 排序 → 产能仿真 / 影响分析 的执行顺序
// ==========================================
// 流程:
// 1) 读取活动订单、工位、厚度系数（批量）
// 2) 排序策略生成总序
// 3) 批量预取进度 + 节假日
// 4) 产能仿真
// ==========================================
// 降级: 预测流程中任一数据源失败 → 使用空/默认数据继续，
//       结果携带降级清单，以区分"数据源失败"与"无订单"
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::forecast::ForecastResult;
use crate::domain::impact::ImpactReport;
use crate::domain::order::Order;
use crate::domain::station::{Station, ThicknessCoefficient};
use crate::domain::types::{OrderStatus, Priority};
use crate::engine::calendar::WorkCalendar;
use crate::engine::capacity::{CapacityTable, RouteIssue};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::impact::ImpactAnalyzer;
use crate::engine::sequencing::SequencingPolicy;
use crate::engine::simulator::ForecastSimulator;
use crate::engine::sources::{
    Clock, HolidaySource, OrderSource, ProgressMap, ProgressSource, StaticSources, StationSource,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// PlannerSources - 数据源集合
// ==========================================
#[derive(Clone)]
pub struct PlannerSources {
    pub orders: Arc<dyn OrderSource>,
    pub stations: Arc<dyn StationSource>,
    pub progress: Arc<dyn ProgressSource>,
    pub holidays: Arc<dyn HolidaySource>,
}

impl PlannerSources {
    pub fn new(
        orders: Arc<dyn OrderSource>,
        stations: Arc<dyn StationSource>,
        progress: Arc<dyn ProgressSource>,
        holidays: Arc<dyn HolidaySource>,
    ) -> Self {
        Self {
            orders,
            stations,
            progress,
            holidays,
        }
    }

    /// 四类数据源均由同一内存快照提供
    pub fn from_static(sources: StaticSources) -> Self {
        let shared = Arc::new(sources);
        Self {
            orders: shared.clone(),
            stations: shared.clone(),
            progress: shared.clone(),
            holidays: shared,
        }
    }
}

/// 数据源降级记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataDegradation {
    OrdersUnavailable(String),
    StationsUnavailable(String),
    ThicknessCoefficientsUnavailable(String),
    ProgressUnavailable(String),
    HolidaysUnavailable(String),
}

// ==========================================
// ForecastRun - 一次预测运行的完整输出
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRun {
    /// 仿真使用的订单序列
    pub orders: Vec<Order>,
    pub result: ForecastResult,
    pub route_issues: BTreeMap<String, Vec<RouteIssue>>,
    pub degradations: Vec<DataDegradation>,
}

impl ForecastRun {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// 订单源正常且确实无活动订单
    pub fn has_no_orders(&self) -> bool {
        self.orders.is_empty()
            && !self
                .degradations
                .iter()
                .any(|d| matches!(d, DataDegradation::OrdersUnavailable(_)))
    }
}

/// 仿真上下文（产能表 + 日历 + 进度）
struct SimulationContext {
    capacity: CapacityTable,
    calendar: WorkCalendar,
    progress: ProgressMap,
}

// ==========================================
// ProductionPlanner - 排产编排器
// ==========================================
pub struct ProductionPlanner {
    sources: PlannerSources,
    config: PlannerConfig,
    clock: Arc<dyn Clock>,
}

impl ProductionPlanner {
    pub fn new(sources: PlannerSources, config: PlannerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sources,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ==========================================
    // 产能预测
    // ==========================================

    /// 预测当前活动订单的工位负荷与完工时间（尽力而为，不返回错误）
    #[instrument(skip(self), fields(horizon_days = self.config.horizon_days))]
    pub fn forecast(&self) -> ForecastRun {
        let today = self.today();
        let mut degradations = Vec::new();

        // 1. 活动订单 → 总序
        let orders = match self.sources.orders.get_active_orders(&OrderStatus::ACTIVE) {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "订单数据源不可用，按空订单继续");
                degradations.push(DataDegradation::OrdersUnavailable(e.to_string()));
                Vec::new()
            }
        };
        let sequenced = SequencingPolicy::new(&self.config).sequence(orders, today);

        // 2. 仿真
        let (result, route_issues) = self.run_simulation(&sequenced, today, &mut degradations);

        info!(
            orders = sequenced.len(),
            degraded = degradations.len(),
            late = result.late_orders(&sequenced).len(),
            "产能预测完成"
        );

        ForecastRun {
            orders: sequenced,
            result,
            route_issues,
            degradations,
        }
    }

    /// 对调用方给定的序列执行仿真（不重新排序）
    pub fn simulate_orders(&self, sequenced_orders: &[Order]) -> ForecastRun {
        let today = self.today();
        let mut degradations = Vec::new();
        let (result, route_issues) =
            self.run_simulation(sequenced_orders, today, &mut degradations);
        ForecastRun {
            orders: sequenced_orders.to_vec(),
            result,
            route_issues,
            degradations,
        }
    }

    // ==========================================
    // 排序与影响分析
    // ==========================================

    /// 当前活动订单的确定性总序（数据源失败时返回错误）
    pub fn sequence_backlog(&self) -> EngineResult<Vec<Order>> {
        let orders = self.sources.orders.get_active_orders(&OrderStatus::ACTIVE)?;
        Ok(SequencingPolicy::new(&self.config).sequence(orders, self.today()))
    }

    pub fn analyze_reorder(&self, order_id: &str, new_position: usize) -> EngineResult<ImpactReport> {
        let backlog = self.sequence_backlog()?;
        ImpactAnalyzer::new(&self.config).analyze_reorder(&backlog, order_id, new_position, self.today())
    }

    pub fn analyze_priority_change(
        &self,
        order_id: &str,
        new_priority: Priority,
    ) -> EngineResult<ImpactReport> {
        let backlog = self.sequence_backlog()?;
        ImpactAnalyzer::new(&self.config).analyze_priority_change(
            &backlog,
            order_id,
            new_priority,
            self.today(),
        )
    }

    pub fn analyze_insertion(&self, new_order: Order, position: usize) -> EngineResult<ImpactReport> {
        let backlog = self.sequence_backlog()?;
        ImpactAnalyzer::new(&self.config).analyze_insertion(&backlog, new_order, position, self.today())
    }

    /// 以完整产能仿真（而非简化估算）评估调序影响
    #[instrument(skip(self))]
    pub fn analyze_reorder_simulated(
        &self,
        order_id: &str,
        new_position: usize,
    ) -> EngineResult<ImpactReport> {
        let today = self.today();
        let backlog = self.sequence_backlog()?;
        let analyzer = ImpactAnalyzer::new(&self.config);

        // 先用估算器完成位置校验与报告骨架
        let mut report = analyzer.analyze_reorder(&backlog, order_id, new_position, today)?;

        let mut reordered = backlog.clone();
        let moved = reordered.remove(report.old_position.ok_or_else(|| {
            EngineError::InvalidInput(format!("调序报告缺少原位置: {}", order_id))
        })?);
        reordered.insert(report.new_position, moved);

        let mut degradations = Vec::new();
        let (before, _) = self.run_simulation(&backlog, today, &mut degradations);
        let (after, _) = self.run_simulation(&reordered, today, &mut degradations);
        if !degradations.is_empty() {
            warn!(count = degradations.len(), "仿真影响分析使用了降级数据");
        }

        let affected =
            analyzer.compare_completion_maps(&backlog, &before.finish_times, &after.finish_times, today);
        report.set_affected_orders(affected);
        Ok(report)
    }

    // ==========================================
    // 内部流程
    // ==========================================

    fn run_simulation(
        &self,
        orders: &[Order],
        today: NaiveDate,
        degradations: &mut Vec<DataDegradation>,
    ) -> (ForecastResult, BTreeMap<String, Vec<RouteIssue>>) {
        let context = self.load_context(orders, today, degradations);

        let route_issues: BTreeMap<String, Vec<RouteIssue>> = orders
            .iter()
            .filter_map(|order| {
                let issues = context.capacity.validate_route(&order.route);
                if issues.is_empty() {
                    None
                } else {
                    warn!(order_id = %order.order_id, issues = ?issues, "工艺路线数据质量问题");
                    Some((order.order_id.clone(), issues))
                }
            })
            .collect();

        let simulator = ForecastSimulator::new(&context.capacity, &context.calendar, &self.config);
        let result = simulator.simulate(orders, &context.progress, today);
        (result, route_issues)
    }

    /// 批量加载仿真所需数据（失败项降级为空/默认值）
    fn load_context(
        &self,
        orders: &[Order],
        today: NaiveDate,
        degradations: &mut Vec<DataDegradation>,
    ) -> SimulationContext {
        let stations: Vec<Station> = self.sources.stations.get_stations().unwrap_or_else(|e| {
            warn!(error = %e, "工位数据源不可用，全部工位按默认产能计算");
            degradations.push(DataDegradation::StationsUnavailable(e.to_string()));
            Vec::new()
        });

        let coefficients = self
            .sources
            .stations
            .get_thickness_coefficients()
            .unwrap_or_else(|e| {
                warn!(error = %e, "厚度系数不可用，使用内置系数表");
                degradations.push(DataDegradation::ThicknessCoefficientsUnavailable(e.to_string()));
                ThicknessCoefficient::defaults()
            });

        let order_ids: Vec<String> = orders.iter().map(|o| o.order_id.clone()).collect();
        let progress = if order_ids.is_empty() {
            ProgressMap::new()
        } else {
            self.sources
                .progress
                .get_completed_progress(&order_ids)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "进度数据源不可用，按未开工计算");
                    degradations.push(DataDegradation::ProgressUnavailable(e.to_string()));
                    ProgressMap::new()
                })
        };

        // 工位空闲时间可推进到任意远的日期，节假日不设上限
        let calendar = WorkCalendar::load(
            self.config.non_working_weekdays.clone(),
            self.sources.holidays.as_ref(),
            today,
        )
        .unwrap_or_else(|e| {
            warn!(error = %e, "节假日数据源不可用，仅按周休日计算");
            degradations.push(DataDegradation::HolidaysUnavailable(e.to_string()));
            WorkCalendar::new(self.config.non_working_weekdays.clone())
        });

        SimulationContext {
            capacity: CapacityTable::new(stations, coefficients, &self.config),
            calendar,
            progress,
        }
    }
}
