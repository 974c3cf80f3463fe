// ==========================================
// 玻璃深加工排产系统 - 订单领域模型
// ==========================================
// 职责: 订单实体、工艺路线、边界字段解析
// 红线: 仿真只读订单，不修改状态与进度
// ==========================================

use crate::domain::types::{OrderStatus, Priority};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 交期缺失时的排序哨兵（最远未来）
pub const FAR_FUTURE: NaiveDate = NaiveDate::MAX;

/// 支持的交期格式
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

// ==========================================
// Route - 工艺路线
// ==========================================
// 有序工位名列表，数据库中以逗号分隔存储
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Route(Vec<String>);

impl Route {
    /// 从逗号分隔字符串解析（去空白、丢弃空段）
    pub fn parse(raw: &str) -> Self {
        Route(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_stations<I, S>(stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Route(stations.into_iter().map(Into::into).collect())
    }

    pub fn stations(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

// ==========================================
// Order - 生产订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // ===== 主键 =====
    pub order_id: String, // 订单编号（创建后不可变）

    // ===== 客户与产品 =====
    pub customer_name: String,
    pub product_type: String,
    pub thickness_mm: Option<u32>, // None = 缺失或格式错误

    // ===== 数量与面积 =====
    pub quantity: u32,              // 片数
    pub total_area_m2: Option<f64>, // 申报总面积
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,

    // ===== 交期与优先级 =====
    pub delivery_date: Option<NaiveDate>, // None = 缺失或无法解析
    pub priority: Priority,

    // ===== 工艺 =====
    pub route: Route,
    pub notes: Option<String>,
    pub status: OrderStatus,
}

impl Order {
    /// 以最少字段创建订单，其余字段取默认值
    pub fn new(order_id: impl Into<String>, area_m2: f64, route: &str) -> Self {
        Self {
            order_id: order_id.into(),
            customer_name: String::new(),
            product_type: String::new(),
            thickness_mm: Some(4),
            quantity: 1,
            total_area_m2: Some(area_m2),
            width_cm: None,
            height_cm: None,
            delivery_date: None,
            priority: Priority::Normal,
            route: Route::parse(route),
            notes: None,
            status: OrderStatus::Waiting,
        }
    }

    /// 订单总面积 (m²)
    ///
    /// 优先使用申报面积；否则按 宽(cm) × 高(cm) × 片数 / 10000 推导；都缺失时为 0
    pub fn area_m2(&self) -> f64 {
        if let Some(area) = self.total_area_m2.filter(|a| a.is_finite() && *a > 0.0) {
            return area;
        }
        match (self.width_cm, self.height_cm) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => w * h * self.quantity as f64 / 10_000.0,
            _ => 0.0,
        }
    }

    /// 排序用交期（缺失时为最远未来）
    pub fn delivery_or_far_future(&self) -> NaiveDate {
        self.delivery_date.unwrap_or(FAR_FUTURE)
    }

    /// 距交期天数（缺失时为 i64::MAX）
    pub fn days_until_delivery(&self, today: NaiveDate) -> i64 {
        self.delivery_date
            .map(|d| (d - today).num_days())
            .unwrap_or(i64::MAX)
    }

    /// 工位剩余比例 = 1 - 完成数/目标数，限定在 [0, 1]
    ///
    /// 完成数超过目标数时按目标数截断
    pub fn remaining_ratio(&self, done_qty: u32) -> f64 {
        if self.quantity == 0 {
            return if done_qty > 0 { 0.0 } else { 1.0 };
        }
        let done = done_qty.min(self.quantity) as f64;
        (1.0 - done / self.quantity as f64).clamp(0.0, 1.0)
    }

    // ===== builder 风格修改器 =====

    pub fn with_delivery(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_thickness(mut self, thickness_mm: u32) -> Self {
        self.thickness_mm = Some(thickness_mm);
        self
    }

    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = product_type.into();
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }
}

// ==========================================
// 边界字段解析
// ==========================================

/// 解析交期字符串，无法解析返回 None
pub fn parse_delivery_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // 兼容带时间部分的 "2026-01-15 00:00:00"
    let date_part = s.split_whitespace().next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// 解析厚度字符串 ("4", "4mm", "6.0 mm")，无法解析或非正数返回 None
pub fn parse_thickness_mm(raw: &str) -> Option<u32> {
    let s = raw.trim().to_lowercase();
    let digits = s.trim_end_matches("mm").trim().replace(',', ".");
    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(value.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_route_parse_trims_and_skips_empty() {
        let route = Route::parse(" Kesim , ,Rodaj,Temper ");
        assert_eq!(route.stations(), &["Kesim", "Rodaj", "Temper"]);
        assert_eq!(route.first(), Some("Kesim"));
        assert_eq!(route.to_string(), "Kesim,Rodaj,Temper");
        assert!(Route::parse(" , ").is_empty());
    }

    #[test]
    fn test_area_prefers_declared_then_dimensions() {
        let mut order = Order::new("O1", 12.5, "CUT");
        assert_eq!(order.area_m2(), 12.5);

        order.total_area_m2 = None;
        order.width_cm = Some(100.0);
        order.height_cm = Some(200.0);
        order.quantity = 5;
        assert!((order.area_m2() - 10.0).abs() < 1e-9);

        order.width_cm = None;
        assert_eq!(order.area_m2(), 0.0);
    }

    #[test]
    fn test_remaining_ratio_clamps_overcompletion() {
        let order = Order::new("O1", 10.0, "CUT").with_quantity(10);
        assert_eq!(order.remaining_ratio(0), 1.0);
        assert!((order.remaining_ratio(4) - 0.6).abs() < 1e-9);
        assert_eq!(order.remaining_ratio(10), 0.0);
        assert_eq!(order.remaining_ratio(25), 0.0);
    }

    #[test]
    fn test_days_until_delivery_missing_is_max() {
        let today = make_date(2026, 3, 2);
        let order = Order::new("O1", 10.0, "CUT");
        assert_eq!(order.days_until_delivery(today), i64::MAX);
        assert_eq!(order.delivery_or_far_future(), FAR_FUTURE);

        let order = order.with_delivery(make_date(2026, 3, 5));
        assert_eq!(order.days_until_delivery(today), 3);
    }

    #[test]
    fn test_parse_delivery_date_formats() {
        assert_eq!(parse_delivery_date("2026-01-15"), Some(make_date(2026, 1, 15)));
        assert_eq!(parse_delivery_date("15.01.2026"), Some(make_date(2026, 1, 15)));
        assert_eq!(parse_delivery_date("2026-01-15 00:00:00"), Some(make_date(2026, 1, 15)));
        assert_eq!(parse_delivery_date(""), None);
        assert_eq!(parse_delivery_date("yarın"), None);
    }

    #[test]
    fn test_parse_thickness() {
        assert_eq!(parse_thickness_mm("4"), Some(4));
        assert_eq!(parse_thickness_mm("10mm"), Some(10));
        assert_eq!(parse_thickness_mm(" 6,0 mm "), Some(6));
        assert_eq!(parse_thickness_mm("0"), None);
        assert_eq!(parse_thickness_mm("kalın"), None);
    }
}
