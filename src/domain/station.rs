// ==========================================
// 玻璃深加工排产系统 - 工位领域模型
// ==========================================
// 职责: 工位实体、厚度系数
// 红线: 仿真使用的产能必须 > 0（配置错误时下限为 1）
// ==========================================

use crate::domain::types::StationGroup;
use serde::{Deserialize, Serialize};

/// 产能基准厚度 (mm)
pub const REFERENCE_THICKNESS_MM: u32 = 4;

/// 默认厚度系数表（相对 4mm 的产能倍率）
pub const DEFAULT_THICKNESS_COEFFICIENTS: [(u32, f64); 10] = [
    (2, 1.10),
    (3, 1.05),
    (4, 1.00),
    (5, 0.95),
    (6, 0.90),
    (8, 0.75),
    (10, 0.60),
    (12, 0.50),
    (15, 0.40),
    (19, 0.30),
];

// ==========================================
// Station - 工位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub group: StationGroup,
    pub daily_capacity_m2: f64, // 基准厚度下的日产能
    pub sort_index: i32,        // 路线规范化排序用
    pub active: bool,
    pub alternatives: Vec<String>, // 替代工位名（按优先顺序）

    // ===== 批次型工位 (钢化炉) =====
    pub is_batch_station: bool,
    pub batch_lot_m2: Option<f64>, // 单炉装载面积，None = 连续处理
}

impl Station {
    pub fn new(name: impl Into<String>, group: StationGroup, daily_capacity_m2: f64) -> Self {
        Self {
            name: name.into(),
            group,
            daily_capacity_m2,
            sort_index: 0,
            active: true,
            alternatives: Vec::new(),
            is_batch_station: false,
            batch_lot_m2: None,
        }
    }

    /// 有效的批次装载面积（仅批次型工位且面积为正时）
    pub fn lot_size_m2(&self) -> Option<f64> {
        if !self.is_batch_station {
            return None;
        }
        self.batch_lot_m2.filter(|lot| lot.is_finite() && *lot > 0.0)
    }
}

// ==========================================
// ThicknessCoefficient - 厚度系数
// ==========================================
// 厚玻璃在同一设备上加工更慢
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThicknessCoefficient {
    pub thickness_mm: u32,
    pub factor: f64,
}

impl ThicknessCoefficient {
    pub fn defaults() -> Vec<ThicknessCoefficient> {
        DEFAULT_THICKNESS_COEFFICIENTS
            .iter()
            .map(|&(thickness_mm, factor)| ThicknessCoefficient {
                thickness_mm,
                factor,
            })
            .collect()
    }
}
