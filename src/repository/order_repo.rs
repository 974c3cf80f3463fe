// ==========================================
// 玻璃深加工排产系统 - 订单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 边界归一化: 状态/优先级/厚度/交期的外部字符串在此转换为强类型
// ==========================================

use crate::domain::order::{parse_delivery_date, parse_thickness_mm, Order, Route};
use crate::domain::types::{OrderStatus, Priority};
use crate::engine::sources::OrderSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::warn;

const ORDER_COLUMNS: &str = r#"
    order_id, customer_name, product_type, thickness, quantity,
    total_area_m2, width_cm, height_cm, delivery_date, priority,
    route, notes, status
"#;

/// 数据库原始行（未归一化）
struct OrderRow {
    order_id: String,
    customer_name: String,
    product_type: String,
    thickness: Option<String>,
    quantity: i64,
    total_area_m2: Option<f64>,
    width_cm: Option<f64>,
    height_cm: Option<f64>,
    delivery_date: Option<String>,
    priority: String,
    route: String,
    notes: Option<String>,
    status: String,
}

impl OrderRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            order_id: row.get(0)?,
            customer_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            product_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            thickness: row.get(3)?,
            quantity: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            total_area_m2: row.get(5)?,
            width_cm: row.get(6)?,
            height_cm: row.get(7)?,
            delivery_date: row.get(8)?,
            priority: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            route: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
            notes: row.get(11)?,
            status: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
        })
    }

    /// 转换为领域订单；状态无法识别时返回 None
    fn into_order(self) -> Option<Order> {
        let status = match OrderStatus::parse(&self.status) {
            Some(status) => status,
            None => {
                warn!(order_id = %self.order_id, status = %self.status, "未知订单状态，跳过该订单");
                return None;
            }
        };

        let priority = Priority::parse(&self.priority).unwrap_or_else(|| {
            if !self.priority.trim().is_empty() {
                warn!(order_id = %self.order_id, priority = %self.priority, "未知优先级，按 Normal 处理");
            }
            Priority::Normal
        });

        let thickness_mm = self.thickness.as_deref().and_then(|raw| {
            let parsed = parse_thickness_mm(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                warn!(order_id = %self.order_id, thickness = raw, "厚度格式错误，按基准厚度处理");
            }
            parsed
        });

        let delivery_date = self.delivery_date.as_deref().and_then(|raw| {
            let parsed = parse_delivery_date(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                warn!(order_id = %self.order_id, delivery_date = raw, "交期格式错误，按交期缺失处理");
            }
            parsed
        });

        Some(Order {
            order_id: self.order_id,
            customer_name: self.customer_name,
            product_type: self.product_type,
            thickness_mm,
            quantity: self.quantity.clamp(0, u32::MAX as i64) as u32,
            total_area_m2: self.total_area_m2,
            width_cm: self.width_cm,
            height_cm: self.height_cm,
            delivery_date,
            priority,
            route: Route::parse(&self.route),
            notes: self.notes,
            status,
        })
    }
}

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增订单
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 订单编号已存在
    pub fn insert_order(&self, order: &Order) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO orders (
                order_id, customer_name, product_type, thickness, quantity,
                total_area_m2, width_cm, height_cm, delivery_date, priority,
                route, notes, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                order.order_id,
                order.customer_name,
                order.product_type,
                order.thickness_mm.map(|t| t.to_string()),
                order.quantity,
                order.total_area_m2,
                order.width_cm,
                order.height_cm,
                order.delivery_date.map(|d| d.format("%Y-%m-%d").to_string()),
                order.priority.to_db_str(),
                order.route.to_string(),
                order.notes,
                order.status.to_db_str(),
            ],
        )?;
        Ok(())
    }

    /// 批量新增（单事务）
    pub fn insert_orders(&self, orders: &[Order]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO orders (
                    order_id, customer_name, product_type, thickness, quantity,
                    total_area_m2, width_cm, height_cm, delivery_date, priority,
                    route, notes, status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;
            for order in orders {
                stmt.execute(params![
                    order.order_id,
                    order.customer_name,
                    order.product_type,
                    order.thickness_mm.map(|t| t.to_string()),
                    order.quantity,
                    order.total_area_m2,
                    order.width_cm,
                    order.height_cm,
                    order.delivery_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    order.priority.to_db_str(),
                    order.route.to_string(),
                    order.notes,
                    order.status.to_db_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(orders.len())
    }

    /// 按编号查询（状态无法识别的订单视为不存在）
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM orders WHERE order_id = ?1", ORDER_COLUMNS);
        let row = conn
            .query_row(&sql, params![order_id], OrderRow::from_row)
            .optional()?;
        Ok(row.and_then(OrderRow::into_order))
    }

    /// 更新订单状态
    pub fn update_status(&self, order_id: &str, status: OrderStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE orders SET status = ?1 WHERE order_id = ?2",
            params![status.to_db_str(), order_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Order".to_string(),
                id: order_id.to_string(),
            });
        }
        Ok(())
    }

    /// 全部订单（按录入顺序）
    fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM orders ORDER BY created_at, rowid",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], OrderRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().filter_map(OrderRow::into_order).collect())
    }
}

impl OrderSource for OrderRepository {
    /// 状态字符串存在多种写法，归一化后在内存中过滤
    fn get_active_orders(&self, statuses: &[OrderStatus]) -> RepositoryResult<Vec<Order>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|o| statuses.contains(&o.status))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::NaiveDate;

    fn make_repo() -> OrderRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        OrderRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_insert_and_find_roundtrip_fields() {
        let repo = make_repo();
        let order = Order::new("A-1", 12.5, "CUT,TEMPER")
            .with_thickness(6)
            .with_priority(Priority::VeryUrgent)
            .with_delivery(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        repo.insert_order(&order).unwrap();

        let found = repo.find_by_id("A-1").unwrap().unwrap();
        assert_eq!(found, order);
        assert!(repo.find_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_unique_violation() {
        let repo = make_repo();
        let order = Order::new("A-1", 1.0, "CUT");
        repo.insert_order(&order).unwrap();
        let err = repo.insert_order(&order).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_raw_strings_normalized_at_boundary() {
        let repo = make_repo();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute_batch(
                r#"
                INSERT INTO orders (order_id, thickness, quantity, total_area_m2, delivery_date, priority, route, status)
                VALUES ('T1', '10mm', 5, 20.0, '15.03.2026', 'Çok Acil', 'CUT, TEMPER', 'Beklemede');
                INSERT INTO orders (order_id, thickness, quantity, total_area_m2, delivery_date, priority, route, status)
                VALUES ('T2', 'abc', 5, 20.0, 'soon', 'whatever', 'CUT', 'Üretimde');
                INSERT INTO orders (order_id, quantity, route, status)
                VALUES ('T3', 1, 'CUT', 'Arşiv');
                INSERT INTO orders (order_id, quantity, route, status)
                VALUES ('T4', 1, 'CUT', 'Tamamlandı');
                "#,
            )
            .unwrap();
        }

        let active = repo.get_active_orders(&OrderStatus::ACTIVE).unwrap();
        let ids: Vec<&str> = active.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2"]);

        assert_eq!(active[0].thickness_mm, Some(10));
        assert_eq!(active[0].priority, Priority::VeryUrgent);
        assert_eq!(active[0].delivery_date, NaiveDate::from_ymd_opt(2026, 3, 15));
        assert_eq!(active[0].route.stations(), ["CUT", "TEMPER"]);

        assert_eq!(active[1].thickness_mm, None);
        assert_eq!(active[1].priority, Priority::Normal);
        assert_eq!(active[1].delivery_date, None);
        assert_eq!(active[1].status, OrderStatus::InProduction);
    }

    #[test]
    fn test_update_status() {
        let repo = make_repo();
        repo.insert_order(&Order::new("A", 1.0, "CUT")).unwrap();
        repo.update_status("A", OrderStatus::Shipped).unwrap();
        assert!(repo.get_active_orders(&OrderStatus::ACTIVE).unwrap().is_empty());
        assert!(matches!(
            repo.update_status("B", OrderStatus::Shipped),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
