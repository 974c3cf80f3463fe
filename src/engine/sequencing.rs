// ==========================================
// 玻璃深加工排产系统 - 排序策略引擎
// ==========================================
// 职责: 订单分层 + 同规格批次合并 → 确定性总序
// 输入: 活动订单列表 + today
// 输出: 排序后的订单列表
// ==========================================
// 分层:
// 1) 紧急层: 距交期 < N 天 或 优先级 ∈ {Kritik, Çok Acil}
// 2) 近期层: 交期在前瞻窗口内，按 (厚度, 产品类型) 合批
// 3) 远期层: 其他（含交期缺失）
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::order::Order;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// 排序分层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Urgent,
    Near,
    Far,
}

/// 近期层同规格批次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub thickness_mm: Option<u32>,
    pub product_type: String,
    pub score: f64,
    pub orders: Vec<Order>,
}

/// 分层排序结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePlan {
    pub urgent: Vec<Order>,
    pub batches: Vec<Batch>,
    pub far: Vec<Order>,
}

impl SequencePlan {
    /// 紧急层 ++ 批次(按分数) ++ 远期层
    pub fn into_sequence(self) -> Vec<Order> {
        let mut sequence = self.urgent;
        sequence.extend(self.batches.into_iter().flat_map(|b| b.orders));
        sequence.extend(self.far);
        sequence
    }
}

// ==========================================
// SequencingPolicy - 排序策略
// ==========================================
#[derive(Debug, Clone)]
pub struct SequencingPolicy {
    lookahead_days: i64,
    urgent_threshold_days: i64,
    batch_bonus: f64,
}

impl SequencingPolicy {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            lookahead_days: config.lookahead_days,
            urgent_threshold_days: config.urgent_threshold_days,
            batch_bonus: config.batch_bonus,
        }
    }

    /// 判定订单所在层
    pub fn classify(&self, order: &Order, today: NaiveDate) -> Tier {
        let days = order.days_until_delivery(today);
        if days < self.urgent_threshold_days || order.priority.forces_urgent_tier() {
            Tier::Urgent
        } else if days <= self.lookahead_days {
            Tier::Near
        } else {
            Tier::Far
        }
    }

    /// 生成确定性总序
    pub fn sequence(&self, orders: Vec<Order>, today: NaiveDate) -> Vec<Order> {
        self.plan(orders, today).into_sequence()
    }

    /// 分层排序（保留批次结构与分数）
    #[instrument(skip(self, orders), fields(count = orders.len(), today = %today))]
    pub fn plan(&self, orders: Vec<Order>, today: NaiveDate) -> SequencePlan {
        let mut urgent = Vec::new();
        let mut near = Vec::new();
        let mut far = Vec::new();

        for order in orders {
            match self.classify(&order, today) {
                Tier::Urgent => urgent.push(order),
                Tier::Near => near.push(order),
                Tier::Far => far.push(order),
            }
        }

        // 1. 紧急层: 优先级等级 → 交期
        urgent.sort_by(compare_priority_then_delivery);

        // 2. 近期层: 合批打分
        let batches = self.build_batches(near, today);

        // 3. 远期层: 交期 → 订单号
        far.sort_by(compare_delivery_then_id);

        debug!(
            urgent = urgent.len(),
            batches = batches.len(),
            far = far.len(),
            "订单分层完成"
        );

        SequencePlan {
            urgent,
            batches,
            far,
        }
    }

    /// 近期层按 (厚度, 产品类型) 合批，批次分数降序
    ///
    /// score = 订单数 × 合批加分 − 平均距交期天数 × 2
    fn build_batches(&self, near: Vec<Order>, today: NaiveDate) -> Vec<Batch> {
        let mut grouped: BTreeMap<(Option<u32>, String), Vec<Order>> = BTreeMap::new();
        for order in near {
            grouped
                .entry((order.thickness_mm, order.product_type.clone()))
                .or_default()
                .push(order);
        }

        let mut batches: Vec<Batch> = grouped
            .into_iter()
            .map(|((thickness_mm, product_type), mut orders)| {
                orders.sort_by(compare_delivery_then_id);
                let avg_days = orders
                    .iter()
                    .map(|o| o.days_until_delivery(today) as f64)
                    .sum::<f64>()
                    / orders.len() as f64;
                let score = orders.len() as f64 * self.batch_bonus - avg_days * 2.0;
                Batch {
                    thickness_mm,
                    product_type,
                    score,
                    orders,
                }
            })
            .collect();

        // 分数降序；并列时最早交期优先（分组键已保证其余顺序确定）
        batches.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| {
                let earliest_a = a.orders.first().map(Order::delivery_or_far_future);
                let earliest_b = b.orders.first().map(Order::delivery_or_far_future);
                earliest_a.cmp(&earliest_b)
            })
        });

        batches
    }
}

/// 优先级等级升序 → 交期升序 → 订单号
///
/// 紧急层排序与影响分析的优先级调整共用此比较器
pub fn compare_priority_then_delivery(a: &Order, b: &Order) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| compare_delivery_then_id(a, b))
}

/// 交期升序 → 订单号（保证总序，与输入顺序无关）
fn compare_delivery_then_id(a: &Order, b: &Order) -> Ordering {
    a.delivery_or_far_future()
        .cmp(&b.delivery_or_far_future())
        .then_with(|| a.order_id.cmp(&b.order_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Priority;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        make_date(2026, 3, 2)
    }

    fn order(id: &str, due_in_days: Option<i64>) -> Order {
        let o = Order::new(id, 10.0, "CUT");
        match due_in_days {
            Some(d) => o.with_delivery(today() + chrono::Duration::days(d)),
            None => o,
        }
    }

    fn ids(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|o| o.order_id.as_str()).collect()
    }

    #[test]
    fn test_classify_tiers() {
        let policy = SequencingPolicy::new(&PlannerConfig::default());
        assert_eq!(policy.classify(&order("A", Some(1)), today()), Tier::Urgent);
        assert_eq!(policy.classify(&order("A", Some(-3)), today()), Tier::Urgent);
        assert_eq!(policy.classify(&order("A", Some(2)), today()), Tier::Near);
        assert_eq!(policy.classify(&order("A", Some(30)), today()), Tier::Near);
        assert_eq!(policy.classify(&order("A", Some(31)), today()), Tier::Far);
        assert_eq!(policy.classify(&order("A", None), today()), Tier::Far);
        assert_eq!(
            policy.classify(
                &order("A", None).with_priority(Priority::Critical),
                today()
            ),
            Tier::Urgent
        );
        assert_eq!(
            policy.classify(&order("A", Some(40)).with_priority(Priority::Urgent), today()),
            Tier::Far
        );
    }

    #[test]
    fn test_urgent_tier_sorted_by_rank_then_date() {
        let policy = SequencingPolicy::new(&PlannerConfig::default());
        let orders = vec![
            order("late_normal", Some(0)),
            order("very", Some(20)).with_priority(Priority::VeryUrgent),
            order("crit_late", Some(9)).with_priority(Priority::Critical),
            order("crit_early", Some(5)).with_priority(Priority::Critical),
        ];
        let sequence = policy.sequence(orders, today());
        assert_eq!(
            ids(&sequence),
            vec!["crit_early", "crit_late", "very", "late_normal"]
        );
    }

    #[test]
    fn test_near_tier_batches_by_score() {
        let policy = SequencingPolicy::new(&PlannerConfig::default());
        // 批次 (6mm, Temperli): 3单, 平均10天 → 3*10 - 20 = 10
        // 批次 (4mm, Float): 1单, 3天 → 10 - 6 = 4
        let orders = vec![
            order("f1", Some(3)).with_thickness(4).with_product_type("Float"),
            order("t1", Some(12)).with_thickness(6).with_product_type("Temperli"),
            order("t2", Some(8)).with_thickness(6).with_product_type("Temperli"),
            order("t3", Some(10)).with_thickness(6).with_product_type("Temperli"),
        ];
        let plan = policy.plan(orders, today());
        assert_eq!(plan.batches.len(), 2);
        assert!((plan.batches[0].score - 10.0).abs() < 1e-9);
        assert!((plan.batches[1].score - 4.0).abs() < 1e-9);
        assert_eq!(ids(&plan.batches[0].orders), vec!["t2", "t3", "t1"]);
        assert_eq!(ids(&plan.into_sequence()), vec!["t2", "t3", "t1", "f1"]);
    }

    #[test]
    fn test_far_tier_missing_date_sorts_last() {
        let policy = SequencingPolicy::new(&PlannerConfig::default());
        let orders = vec![order("none", None), order("d60", Some(60)), order("d45", Some(45))];
        assert_eq!(
            ids(&policy.sequence(orders, today())),
            vec!["d45", "d60", "none"]
        );
    }

    #[test]
    fn test_equal_delivery_breaks_ties_by_order_id() {
        let policy = SequencingPolicy::new(&PlannerConfig::default());
        let forward = vec![order("A", Some(45)), order("B", Some(45))];
        let reversed = vec![order("B", Some(45)), order("A", Some(45))];
        assert_eq!(ids(&policy.sequence(forward, today())), vec!["A", "B"]);
        assert_eq!(ids(&policy.sequence(reversed, today())), vec!["A", "B"]);
    }
}
