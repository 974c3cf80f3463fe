// ==========================================
// 玻璃深加工排产系统 - 影响分析引擎
// ==========================================
// 职责: 评估调序/调优先级/插单对其他订单完工时间的影响
// 输入: 当前序列 + 操作参数
// 输出: ImpactReport（临时对象，不落库）
// ==========================================
// 估算模型: 按序累计面积 / 日通量 → 完工天数
// - 单调、确定，不与产能仿真逐位一致
// - 仅用于快速"如果...会怎样"判断
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::impact::{AffectedOrder, ImpactReport, InsertedOrderEstimate};
use crate::domain::order::Order;
use crate::domain::types::{Priority, Severity};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::sequencing::compare_priority_then_delivery;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use uuid::Uuid;

/// 完工时间差判等阈值（天）
const DIFF_EPSILON: f64 = 1e-9;

/// 日通量下限 (m²/天)
const MIN_THROUGHPUT_M2: f64 = 1.0;

// ==========================================
// ImpactAnalyzer - 影响分析引擎
// ==========================================
// 无状态，可重复调用
#[derive(Debug, Clone)]
pub struct ImpactAnalyzer {
    throughput_m2_per_day: f64,
    critical_days: f64,
}

impl ImpactAnalyzer {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            throughput_m2_per_day: config
                .impact_throughput_m2_per_day
                .max(MIN_THROUGHPUT_M2),
            critical_days: config.impact_critical_days,
        }
    }

    /// 按序估算完工时间: 每单在前一单完工后开始，耗时 面积 / 日通量
    pub fn estimate_completion(&self, orders: &[Order]) -> BTreeMap<String, f64> {
        let mut cumulative = 0.0;
        orders
            .iter()
            .map(|order| {
                cumulative += order.area_m2() / self.throughput_m2_per_day;
                (order.order_id.clone(), cumulative)
            })
            .collect()
    }

    // ==========================================
    // 调序分析
    // ==========================================

    /// 把订单移动到 new_position（越界时贴到末尾）后的影响
    #[instrument(skip(self, orders), fields(count = orders.len()))]
    pub fn analyze_reorder(
        &self,
        orders: &[Order],
        moved_order_id: &str,
        new_position: usize,
        today: NaiveDate,
    ) -> EngineResult<ImpactReport> {
        let old_position = position_of(orders, moved_order_id)?;

        let mut reordered = orders.to_vec();
        let moved = reordered.remove(old_position);
        let new_position = new_position.min(reordered.len());
        reordered.insert(new_position, moved);

        let before = self.estimate_completion(orders);
        let after = self.estimate_completion(&reordered);
        let affected = self.compare_completion_maps(orders, &before, &after, today);

        debug!(
            order_id = moved_order_id,
            old_position = old_position,
            new_position = new_position,
            affected = affected.len(),
            "调序影响分析完成"
        );

        Ok(build_report(
            today,
            moved_order_id,
            Some(old_position),
            new_position,
            affected,
            None,
        ))
    }

    /// 调整订单优先级后的影响
    ///
    /// 以新优先级按 (优先级等级, 交期) 重排副本，取该订单的新位置后按调序分析
    pub fn analyze_priority_change(
        &self,
        orders: &[Order],
        order_id: &str,
        new_priority: Priority,
        today: NaiveDate,
    ) -> EngineResult<ImpactReport> {
        let index = position_of(orders, order_id)?;

        let mut resorted = orders.to_vec();
        resorted[index].priority = new_priority;
        resorted.sort_by(compare_priority_then_delivery);

        let new_position = position_of(&resorted, order_id)?;
        self.analyze_reorder(orders, order_id, new_position, today)
    }

    /// 在 position（越界时贴到末尾）插入新订单后的影响
    ///
    /// 新订单不计入受影响列表，单独给出其预计完工
    #[instrument(skip(self, orders, new_order), fields(count = orders.len(), order_id = %new_order.order_id))]
    pub fn analyze_insertion(
        &self,
        orders: &[Order],
        new_order: Order,
        position: usize,
        today: NaiveDate,
    ) -> EngineResult<ImpactReport> {
        if orders.iter().any(|o| o.order_id == new_order.order_id) {
            return Err(EngineError::DuplicateOrder(new_order.order_id));
        }

        let position = position.min(orders.len());
        let subject_id = new_order.order_id.clone();
        let days_left = new_order.days_until_delivery(today);

        let mut inserted = orders.to_vec();
        inserted.insert(position, new_order);

        let before = self.estimate_completion(orders);
        let after = self.estimate_completion(&inserted);
        let affected = self.compare_completion_maps(orders, &before, &after, today);

        let inserted_order = after.get(&subject_id).map(|&finish_days| InsertedOrderEstimate {
            order_id: subject_id.clone(),
            position,
            finish_days,
            deadline_exceeded: exceeds_deadline(finish_days, days_left),
        });

        Ok(build_report(
            today,
            &subject_id,
            None,
            position,
            affected,
            inserted_order,
        ))
    }

    // ==========================================
    // 前后对比
    // ==========================================

    /// 对比调整前后完工时间，返回已排序的受影响订单
    ///
    /// 仅比较 orders 中、且两侧映射都存在的订单；完工时间未变的订单不列出
    pub fn compare_completion_maps(
        &self,
        orders: &[Order],
        before: &BTreeMap<String, f64>,
        after: &BTreeMap<String, f64>,
        today: NaiveDate,
    ) -> Vec<AffectedOrder> {
        let mut affected: Vec<AffectedOrder> = orders
            .iter()
            .filter_map(|order| {
                let old_finish = *before.get(&order.order_id)?;
                let new_finish = *after.get(&order.order_id)?;
                let diff = new_finish - old_finish;
                if diff.abs() <= DIFF_EPSILON {
                    return None;
                }

                let deadline_exceeded =
                    diff > 0.0 && exceeds_deadline(new_finish, order.days_until_delivery(today));
                let severity = self.classify(diff, deadline_exceeded);

                Some(AffectedOrder {
                    order_id: order.order_id.clone(),
                    customer_name: order.customer_name.clone(),
                    old_finish_days: old_finish,
                    new_finish_days: new_finish,
                    diff_days: diff,
                    severity,
                    delivery_date: order.delivery_date,
                    deadline_exceeded,
                })
            })
            .collect();

        affected.sort_by(|a, b| {
            a.severity
                .rank()
                .cmp(&b.severity.rank())
                .then_with(|| b.diff_days.abs().total_cmp(&a.diff_days.abs()))
                .then_with(|| a.order_id.cmp(&b.order_id))
        });

        affected
    }

    fn classify(&self, diff: f64, deadline_exceeded: bool) -> Severity {
        if deadline_exceeded || diff > self.critical_days {
            Severity::Critical
        } else if diff > 0.0 {
            Severity::Warning
        } else if diff < 0.0 {
            Severity::Improved
        } else {
            Severity::Neutral
        }
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn position_of(orders: &[Order], order_id: &str) -> EngineResult<usize> {
    orders
        .iter()
        .position(|o| o.order_id == order_id)
        .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))
}

/// 完工日（整天）晚于交期
fn exceeds_deadline(finish_days: f64, days_until_delivery: i64) -> bool {
    days_until_delivery != i64::MAX && (finish_days.floor() as i64) > days_until_delivery
}

fn build_report(
    today: NaiveDate,
    subject_order_id: &str,
    old_position: Option<usize>,
    new_position: usize,
    affected_orders: Vec<AffectedOrder>,
    inserted_order: Option<InsertedOrderEstimate>,
) -> ImpactReport {
    let mut report = ImpactReport {
        report_id: Uuid::new_v4().to_string(),
        today,
        subject_order_id: subject_order_id.to_string(),
        old_position,
        new_position,
        affected_orders: Vec::new(),
        inserted_order,
        total_affected: 0,
        delayed_count: 0,
        improved_count: 0,
        deadline_exceeded_count: 0,
    };
    report.set_affected_orders(affected_orders);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    /// 每单 100 m² → 2 天
    fn backlog() -> Vec<Order> {
        ["A", "B", "C", "D"]
            .iter()
            .map(|id| Order::new(*id, 100.0, "CUT"))
            .collect()
    }

    #[test]
    fn test_estimate_is_cumulative() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let map = analyzer.estimate_completion(&backlog());
        assert_eq!(map["A"], 2.0);
        assert_eq!(map["D"], 8.0);
    }

    #[test]
    fn test_move_to_own_position_has_no_effect() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let report = analyzer.analyze_reorder(&backlog(), "C", 2, today()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_affected, 0);
    }

    #[test]
    fn test_move_to_front_delays_predecessors() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let report = analyzer.analyze_reorder(&backlog(), "D", 0, today()).unwrap();

        // D: 8 → 2 (improved), A/B/C 各 +2 (warning)
        assert_eq!(report.total_affected, 4);
        assert_eq!(report.delayed_count, 3);
        assert_eq!(report.improved_count, 1);
        let ids: Vec<&str> = report.affected_orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        assert_eq!(report.affected_orders[3].severity, Severity::Improved);
        assert!((report.affected_orders[3].diff_days + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadline_breach_is_critical() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let mut orders = backlog();
        orders[0] = orders[0].clone().with_delivery(today() + Duration::days(3));

        let report = analyzer.analyze_reorder(&orders, "D", 0, today()).unwrap();
        let a = report.affected_orders.iter().find(|o| o.order_id == "A").unwrap();
        assert!(a.deadline_exceeded);
        assert_eq!(a.severity, Severity::Critical);
        assert_eq!(report.affected_orders[0].order_id, "A");
        assert_eq!(report.deadline_exceeded_count, 1);
    }

    #[test]
    fn test_unknown_order_is_error() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let err = analyzer.analyze_reorder(&backlog(), "Z", 0, today()).unwrap_err();
        assert!(matches!(err, EngineError::OrderNotFound(id) if id == "Z"));
    }

    #[test]
    fn test_priority_change_moves_order_forward() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let report = analyzer
            .analyze_priority_change(&backlog(), "C", Priority::Critical, today())
            .unwrap();
        assert_eq!(report.old_position, Some(2));
        assert_eq!(report.new_position, 0);
    }

    #[test]
    fn test_insertion_reports_new_order_separately() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let report = analyzer
            .analyze_insertion(&backlog(), Order::new("NEW", 50.0, "CUT"), 1, today())
            .unwrap();

        assert_eq!(report.total_affected, 3);
        assert!(report.affected_orders.iter().all(|o| o.order_id != "NEW"));
        let inserted = report.inserted_order.unwrap();
        assert_eq!(inserted.position, 1);
        assert!((inserted.finish_days - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_insertion_rejects_duplicate_id() {
        let analyzer = ImpactAnalyzer::new(&PlannerConfig::default());
        let err = analyzer
            .analyze_insertion(&backlog(), Order::new("B", 50.0, "CUT"), 0, today())
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateOrder(_)));
    }
}
