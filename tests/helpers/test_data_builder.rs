// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use glass_planner::domain::{Order, OrderStatus, Priority, Route};

// ==========================================
// Order 构建器
// ==========================================

pub struct OrderBuilder {
    order_id: String,
    customer_name: String,
    product_type: String,
    thickness_mm: Option<u32>,
    quantity: u32,
    total_area_m2: Option<f64>,
    width_cm: Option<f64>,
    height_cm: Option<f64>,
    delivery_date: Option<NaiveDate>,
    priority: Priority,
    route: String,
    status: OrderStatus,
}

impl OrderBuilder {
    pub fn new(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            customer_name: "Test Cam".to_string(),
            product_type: "Temperli".to_string(),
            thickness_mm: Some(4),
            quantity: 10,
            total_area_m2: Some(100.0),
            width_cm: None,
            height_cm: None,
            delivery_date: None,
            priority: Priority::Normal,
            route: "CUT,TEMPER".to_string(),
            status: OrderStatus::Waiting,
        }
    }

    pub fn customer(mut self, name: &str) -> Self {
        self.customer_name = name.to_string();
        self
    }

    pub fn product(mut self, product_type: &str) -> Self {
        self.product_type = product_type.to_string();
        self
    }

    pub fn thickness(mut self, thickness_mm: u32) -> Self {
        self.thickness_mm = Some(thickness_mm);
        self
    }

    pub fn no_thickness(mut self) -> Self {
        self.thickness_mm = None;
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn area(mut self, area_m2: f64) -> Self {
        self.total_area_m2 = Some(area_m2);
        self
    }

    /// 按尺寸推导面积（清除申报面积）
    pub fn dimensions(mut self, width_cm: f64, height_cm: f64) -> Self {
        self.total_area_m2 = None;
        self.width_cm = Some(width_cm);
        self.height_cm = Some(height_cm);
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn route(mut self, route: &str) -> Self {
        self.route = route.to_string();
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Order {
        Order {
            order_id: self.order_id,
            customer_name: self.customer_name,
            product_type: self.product_type,
            thickness_mm: self.thickness_mm,
            quantity: self.quantity,
            total_area_m2: self.total_area_m2,
            width_cm: self.width_cm,
            height_cm: self.height_cm,
            delivery_date: self.delivery_date,
            priority: self.priority,
            route: Route::parse(&self.route),
            notes: None,
            status: self.status,
        }
    }
}

/// 顺序编号的一批同规格订单
pub fn numbered_orders(prefix: &str, count: usize, area_m2: f64, route: &str) -> Vec<Order> {
    (0..count)
        .map(|i| {
            OrderBuilder::new(&format!("{}{:03}", prefix, i))
                .area(area_m2)
                .route(route)
                .build()
        })
        .collect()
}
