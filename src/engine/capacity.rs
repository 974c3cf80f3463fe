// ==========================================
// 玻璃深加工排产系统 - 产能表
// ==========================================
// 职责: 工位基准日产能 × 厚度系数 = 有效日产能
//       路线校验、规范化、停用工位替代
// 红线: 有效产能下限为 1 m²/天（防止除零与死循环）
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::order::Route;
use crate::domain::station::{Station, ThicknessCoefficient, REFERENCE_THICKNESS_MM};
use crate::domain::types::StationGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// 有效产能下限 (m²/天)
pub const MIN_EFFECTIVE_CAPACITY_M2: f64 = 1.0;

/// 路线数据质量问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteIssue {
    EmptyRoute,
    FirstStationNotCutting { station: String },
    UnknownStation { station: String },
}

// ==========================================
// CapacityTable - 产能表
// ==========================================
#[derive(Debug, Clone)]
pub struct CapacityTable {
    stations: BTreeMap<String, Station>,
    coefficients: BTreeMap<u32, f64>,
    default_capacity_m2: f64,
    default_thickness_factor: f64,
}

impl CapacityTable {
    pub fn new(
        stations: Vec<Station>,
        coefficients: Vec<ThicknessCoefficient>,
        config: &PlannerConfig,
    ) -> Self {
        Self {
            stations: stations.into_iter().map(|s| (s.name.clone(), s)).collect(),
            coefficients: coefficients
                .into_iter()
                .map(|c| (c.thickness_mm, c.factor))
                .collect(),
            default_capacity_m2: config.default_station_capacity_m2,
            default_thickness_factor: config.default_thickness_factor,
        }
    }

    pub fn station(&self, name: &str) -> Option<&Station> {
        self.stations.get(name)
    }

    /// 已登记工位名（有序）
    pub fn station_names(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    /// 基准日产能；未登记工位使用默认产能
    pub fn base_capacity(&self, station: &str) -> f64 {
        match self.stations.get(station) {
            Some(s) => s.daily_capacity_m2,
            None => {
                warn!(station = station, default = self.default_capacity_m2, "工位未登记产能，使用默认值");
                self.default_capacity_m2
            }
        }
    }

    /// 厚度系数
    ///
    /// - 厚度缺失/非法 → 按基准 4mm 处理 (1.0)
    /// - 已登记厚度 → 表中系数
    /// - 未登记厚度 → 保守默认系数
    pub fn thickness_factor(&self, thickness_mm: Option<u32>) -> f64 {
        let thickness = match thickness_mm {
            Some(t) if t > 0 => t,
            _ => return 1.0,
        };

        let factor = match self.coefficients.get(&thickness) {
            Some(f) => *f,
            None if thickness == REFERENCE_THICKNESS_MM => 1.0,
            None => self.default_thickness_factor,
        };

        if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            warn!(thickness_mm = thickness, factor = factor, "厚度系数非法，使用默认值");
            self.default_thickness_factor
        }
    }

    /// 有效日产能 = 基准产能 × 厚度系数，下限 1
    pub fn effective_capacity(&self, station: &str, thickness_mm: Option<u32>) -> f64 {
        let effective = self.base_capacity(station) * self.thickness_factor(thickness_mm);
        if effective.is_finite() && effective >= MIN_EFFECTIVE_CAPACITY_M2 {
            return effective;
        }
        warn!(
            station = station,
            effective = effective,
            "有效产能过低，按下限处理（数据质量告警）"
        );
        MIN_EFFECTIVE_CAPACITY_M2
    }

    /// 批次型工位的单炉面积
    pub fn lot_size_m2(&self, station: &str) -> Option<f64> {
        self.stations.get(station).and_then(Station::lot_size_m2)
    }

    /// 解析实际加工工位：停用工位替换为第一个启用的替代工位
    pub fn resolve_station<'a>(&'a self, name: &'a str) -> &'a str {
        let station = match self.stations.get(name) {
            Some(s) if !s.active => s,
            _ => return name,
        };

        let substitute = station.alternatives.iter().find(|alt| {
            self.stations
                .get(alt.as_str())
                .map(|s| s.active)
                .unwrap_or(false)
        });

        match substitute {
            Some(alt) => alt.as_str(),
            None => {
                warn!(station = name, "工位已停用且无可用替代工位，仍按原工位计算");
                name
            }
        }
    }

    /// 按工位排序号规范化路线（稳定排序，未登记工位保持相对顺序排在最后）
    pub fn canonicalize_route(&self, route: &Route) -> Route {
        let mut indexed: Vec<(i64, &String)> = route
            .stations()
            .iter()
            .map(|name| {
                let key = self
                    .stations
                    .get(name)
                    .map(|s| s.sort_index as i64)
                    .unwrap_or(i64::MAX);
                (key, name)
            })
            .collect();
        indexed.sort_by_key(|(key, _)| *key);
        Route::from_stations(indexed.into_iter().map(|(_, name)| name.clone()))
    }

    /// 路线校验（仅报告问题，不阻断仿真）
    pub fn validate_route(&self, route: &Route) -> Vec<RouteIssue> {
        let first = match route.first() {
            Some(first) => first,
            None => return vec![RouteIssue::EmptyRoute],
        };

        let mut issues = Vec::new();
        if let Some(station) = self.stations.get(first) {
            if station.group != StationGroup::Cutting {
                issues.push(RouteIssue::FirstStationNotCutting {
                    station: first.to_string(),
                });
            }
        }
        for name in route.stations() {
            if !self.stations.contains_key(name) {
                issues.push(RouteIssue::UnknownStation {
                    station: name.clone(),
                });
            }
        }
        issues
    }
}
