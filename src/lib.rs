// ==========================================
// 玻璃深加工排产系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 产能预测与排序决策支持 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 排产参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{HorizonPolicy, OrderStatus, Priority, Severity, StationGroup};

// 领域实体
pub use domain::{
    AffectedOrder, ForecastResult, ImpactReport, JobAnnotation, Order, Route, Station,
    ThicknessCoefficient,
};

// 引擎
pub use engine::{
    CapacityTable, EngineError, EngineResult, ForecastRun, ForecastSimulator, ImpactAnalyzer,
    PlannerSources, ProductionPlanner, SequencingPolicy, WorkCalendar,
};

// 配置
pub use config::PlannerConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "玻璃深加工排产系统";
