// ==========================================
// 玻璃深加工排产系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、结果模型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod forecast;
pub mod impact;
pub mod order;
pub mod station;
pub mod types;

// 重导出核心类型
pub use forecast::{
    CappedJob, CompletionEstimate, ForecastResult, JobAnnotation, LateOrder, StationRun,
    StationUtilization,
};
pub use impact::{AffectedOrder, ImpactReport, InsertedOrderEstimate};
pub use order::{parse_delivery_date, parse_thickness_mm, Order, Route, FAR_FUTURE};
pub use station::{Station, ThicknessCoefficient, REFERENCE_THICKNESS_MM};
pub use types::{HorizonPolicy, OrderStatus, Priority, Severity, StationGroup};
