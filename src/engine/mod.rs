// ==========================================
// 玻璃深加工排产系统 - 引擎层
// ==========================================
// 职责: 实现排序、产能仿真、影响分析等业务规则
// 红线: Engine 不拼 SQL，数据经 sources 中的 trait 注入
// ==========================================

pub mod calendar;
pub mod capacity;
pub mod error;
pub mod impact;
pub mod planner;
pub mod sequencing;
pub mod simulator;
pub mod sources;

// 重导出核心引擎
pub use calendar::WorkCalendar;
pub use capacity::{CapacityTable, RouteIssue, MIN_EFFECTIVE_CAPACITY_M2};
pub use error::{EngineError, EngineResult};
pub use impact::ImpactAnalyzer;
pub use planner::{DataDegradation, ForecastRun, PlannerSources, ProductionPlanner};
pub use sequencing::{compare_priority_then_delivery, Batch, SequencePlan, SequencingPolicy, Tier};
pub use simulator::ForecastSimulator;
pub use sources::{
    Clock, FixedClock, HolidaySource, OrderSource, ProgressMap, ProgressSource, StaticSources,
    StationSource, SystemClock,
};
