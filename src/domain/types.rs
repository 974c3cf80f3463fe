// ==========================================
// 玻璃深加工排产系统 - 领域类型定义
// ==========================================
// 职责: 订单优先级、订单状态、工位分组、影响等级等枚举
// 约定: 序列化格式 SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 归一化外部字符串：去空白、转小写、去掉土耳其语大写 İ 转小写后残留的组合点
fn normalize_token(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace('\u{307}', "")
        .replace(['_', '-'], " ")
}

// ==========================================
// 订单优先级 (Priority)
// ==========================================
// 排序等级: Critical < VeryUrgent < Urgent < Normal (rank 越小越优先)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Normal,     // 正常
    Urgent,     // Acil
    VeryUrgent, // Çok Acil
    Critical,   // Kritik
}

impl Priority {
    /// 排序等级（越小越优先）
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::VeryUrgent => 1,
            Priority::Urgent => 2,
            Priority::Normal => 3,
        }
    }

    /// 是否直接进入紧急层（不看交期）
    pub fn forces_urgent_tier(&self) -> bool {
        matches!(self, Priority::Critical | Priority::VeryUrgent)
    }

    /// 解析外部优先级字符串（支持土耳其语原始取值与英文取值）
    ///
    /// 未知取值返回 None，由调用方决定回落策略
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "normal" => Some(Priority::Normal),
            "acil" | "urgent" => Some(Priority::Urgent),
            "çok acil" | "cok acil" | "very urgent" | "veryurgent" => Some(Priority::VeryUrgent),
            "kritik" | "critical" => Some(Priority::Critical),
            _ => None,
        }
    }

    /// 解析优先级，未知取值按 Normal 处理
    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or(Priority::Normal)
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Normal => "NORMAL",
            Priority::Urgent => "URGENT",
            Priority::VeryUrgent => "VERY_URGENT",
            Priority::Critical => "CRITICAL",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 生命周期: Waiting → InProduction → Completed → Shipped
// 仿真只读取状态，不做状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Waiting,      // Beklemede
    InProduction, // Üretimde
    Completed,    // Tamamlandı
    Shipped,      // Sevk Edildi
}

impl OrderStatus {
    /// 参与仿真的活动状态
    pub const ACTIVE: [OrderStatus; 2] = [OrderStatus::Waiting, OrderStatus::InProduction];

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "waiting" | "beklemede" => Some(OrderStatus::Waiting),
            "in production" | "inproduction" | "üretimde" | "uretimde" => {
                Some(OrderStatus::InProduction)
            }
            "completed" | "tamamlandı" | "tamamlandi" => Some(OrderStatus::Completed),
            "shipped" | "sevk edildi" => Some(OrderStatus::Shipped),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Waiting => "WAITING",
            OrderStatus::InProduction => "IN_PRODUCTION",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Shipped => "SHIPPED",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 工位分组 (Station Group)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationGroup {
    Cutting,          // 切割
    Machining,        // 磨边/钻孔
    SurfaceTreatment, // 表面处理 (丝印/镀膜)
    Tempering,        // 钢化
    Assembly,         // 中空/夹胶合片
    Shipping,         // 发货
}

impl StationGroup {
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "cutting" | "kesim" => Some(StationGroup::Cutting),
            "machining" | "işleme" | "isleme" => Some(StationGroup::Machining),
            "surface treatment" | "surfacetreatment" | "yüzey işlem" => {
                Some(StationGroup::SurfaceTreatment)
            }
            "tempering" | "temper" => Some(StationGroup::Tempering),
            "assembly" | "montaj" => Some(StationGroup::Assembly),
            "shipping" | "sevkiyat" => Some(StationGroup::Shipping),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StationGroup::Cutting => "CUTTING",
            StationGroup::Machining => "MACHINING",
            StationGroup::SurfaceTreatment => "SURFACE_TREATMENT",
            StationGroup::Tempering => "TEMPERING",
            StationGroup::Assembly => "ASSEMBLY",
            StationGroup::Shipping => "SHIPPING",
        }
    }
}

impl fmt::Display for StationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 影响等级 (Impact Severity)
// ==========================================
// 输出顺序: Critical < Warning < Improved < Neutral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical, // 超交期 或 延误 > 阈值
    Warning,  // 轻度延误
    Improved, // 提前
    Neutral,  // 无变化
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Improved => 2,
            Severity::Neutral => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Improved => write!(f, "IMPROVED"),
            Severity::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

// ==========================================
// 预测窗口策略 (Horizon Policy)
// ==========================================
// Continue: 超出窗口后继续推进工位时间游标（不写入网格）
// Truncate: 逐日推进到窗口边界即停止（工位占用被截断）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizonPolicy {
    Continue,
    Truncate,
}

impl HorizonPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CONTINUE" => Some(HorizonPolicy::Continue),
            "TRUNCATE" => Some(HorizonPolicy::Truncate),
            _ => None,
        }
    }
}

impl Default for HorizonPolicy {
    fn default() -> Self {
        HorizonPolicy::Continue
    }
}

impl fmt::Display for HorizonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HorizonPolicy::Continue => write!(f, "CONTINUE"),
            HorizonPolicy::Truncate => write!(f, "TRUNCATE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_turkish_and_english() {
        assert_eq!(Priority::parse("Kritik"), Some(Priority::Critical));
        assert_eq!(Priority::parse("KRİTİK"), Some(Priority::Critical));
        assert_eq!(Priority::parse("Çok Acil"), Some(Priority::VeryUrgent));
        assert_eq!(Priority::parse("very_urgent"), Some(Priority::VeryUrgent));
        assert_eq!(Priority::parse(" acil "), Some(Priority::Urgent));
        assert_eq!(Priority::parse("Normal"), Some(Priority::Normal));
        assert_eq!(Priority::parse("???"), None);
        assert_eq!(Priority::from_str("???"), Priority::Normal);
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Critical.rank() < Priority::VeryUrgent.rank());
        assert!(Priority::VeryUrgent.rank() < Priority::Urgent.rank());
        assert!(Priority::Urgent.rank() < Priority::Normal.rank());
    }

    #[test]
    fn test_order_status_parse() {
        assert_eq!(OrderStatus::parse("Beklemede"), Some(OrderStatus::Waiting));
        assert_eq!(OrderStatus::parse("IN_PRODUCTION"), Some(OrderStatus::InProduction));
        assert_eq!(OrderStatus::parse("shipped"), Some(OrderStatus::Shipped));
        assert!(OrderStatus::InProduction.is_active());
        assert!(!OrderStatus::Completed.is_active());
    }

    #[test]
    fn test_station_group_roundtrip_db_str() {
        for g in [
            StationGroup::Cutting,
            StationGroup::Machining,
            StationGroup::SurfaceTreatment,
            StationGroup::Tempering,
            StationGroup::Assembly,
            StationGroup::Shipping,
        ] {
            assert_eq!(StationGroup::parse(g.to_db_str()), Some(g));
        }
    }
}
