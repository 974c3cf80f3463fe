// ==========================================
// 玻璃深加工排产系统 - 排产参数
// ==========================================
// 职责: 仿真/排序/影响分析的全部可调参数及默认值
// ==========================================

use crate::domain::types::HorizonPolicy;
use chrono::Weekday;
use serde::{Deserialize, Serialize};

// ==========================================
// PlannerConfig - 排产参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    // ===== 仿真 =====
    pub horizon_days: usize,           // 预测窗口: 30天
    pub horizon_policy: HorizonPolicy, // 窗口外时间游标策略
    pub iteration_cap_factor: usize,   // 单工位逐日迭代上限 = factor × horizon
    pub default_station_capacity_m2: f64, // 未配置工位的日产能
    pub default_thickness_factor: f64, // 未登记厚度的保守系数
    pub canonicalize_routes: bool,     // 是否按工位排序号规范化路线

    // ===== 排序 =====
    pub lookahead_days: i64,        // 近期层窗口: 30天
    pub urgent_threshold_days: i64, // 距交期 < N 天进入紧急层
    pub batch_bonus: f64,           // 同规格批次加分

    // ===== 影响分析 =====
    pub impact_throughput_m2_per_day: f64, // 简化估算: 每天约 50 m²
    pub impact_critical_days: f64,         // 延误 > N 天判为严重

    // ===== 日历 =====
    pub non_working_weekdays: Vec<Weekday>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            horizon_policy: HorizonPolicy::Continue,
            iteration_cap_factor: 2,
            default_station_capacity_m2: 500.0,
            default_thickness_factor: 0.70,
            canonicalize_routes: false,
            lookahead_days: 30,
            urgent_threshold_days: 2,
            batch_bonus: 10.0,
            impact_throughput_m2_per_day: 50.0,
            impact_critical_days: 3.0,
            non_working_weekdays: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

impl PlannerConfig {
    /// 单个订单-工位组合的逐日迭代上限
    pub fn iteration_cap(&self) -> usize {
        self.iteration_cap_factor.max(1) * self.horizon_days.max(1)
    }
}
