// ==========================================
// SequencingPolicy 集成测试
// ==========================================
// 职责: 验证分层、合批打分与总序确定性
// ==========================================

mod helpers;

use glass_planner::config::PlannerConfig;
use glass_planner::domain::{Order, Priority};
use glass_planner::engine::{SequencingPolicy, Tier};
use helpers::test_data_builder::OrderBuilder;
use test_helpers::{days_from, monday};

fn ids(orders: &[Order]) -> Vec<String> {
    orders.iter().map(|o| o.order_id.clone()).collect()
}

fn mixed_backlog() -> Vec<Order> {
    let today = monday();
    vec![
        OrderBuilder::new("FAR-NODATE").build(),
        OrderBuilder::new("NEAR-6A").thickness(6).due(days_from(today, 10)).build(),
        OrderBuilder::new("URG-DUE").due(days_from(today, 1)).build(),
        OrderBuilder::new("FAR-45").due(days_from(today, 45)).build(),
        OrderBuilder::new("NEAR-6B").thickness(6).due(days_from(today, 6)).build(),
        OrderBuilder::new("CRIT").priority(Priority::Critical).due(days_from(today, 20)).build(),
        OrderBuilder::new("NEAR-8").thickness(8).due(days_from(today, 3)).build(),
        OrderBuilder::new("OVERDUE").due(days_from(today, -4)).build(),
    ]
}

#[test]
fn test_urgent_orders_precede_everything_else() {
    let policy = SequencingPolicy::new(&PlannerConfig::default());
    let today = monday();
    let sequence = policy.sequence(mixed_backlog(), today);

    let first_non_urgent = sequence
        .iter()
        .position(|o| policy.classify(o, today) != Tier::Urgent)
        .unwrap();
    assert!(sequence[first_non_urgent..]
        .iter()
        .all(|o| policy.classify(o, today) != Tier::Urgent));
    assert_eq!(
        ids(&sequence[..first_non_urgent]),
        vec!["CRIT", "OVERDUE", "URG-DUE"]
    );
}

#[test]
fn test_full_sequence_layout() {
    let policy = SequencingPolicy::new(&PlannerConfig::default());
    let sequence = policy.sequence(mixed_backlog(), monday());

    // 批次 (6mm): 2 单，平均 8 天 → 20 - 16 = 4
    // 批次 (8mm): 1 单，3 天 → 10 - 6 = 4，并列时最早交期优先
    assert_eq!(
        ids(&sequence),
        vec![
            "CRIT", "OVERDUE", "URG-DUE", "NEAR-8", "NEAR-6B", "NEAR-6A", "FAR-45", "FAR-NODATE"
        ]
    );
}

#[test]
fn test_sequence_is_a_permutation_and_deterministic() {
    let policy = SequencingPolicy::new(&PlannerConfig::default());
    let a = policy.sequence(mixed_backlog(), monday());
    let b = policy.sequence(mixed_backlog(), monday());
    assert_eq!(a, b);

    let mut sorted_in = ids(&mixed_backlog());
    let mut sorted_out = ids(&a);
    sorted_in.sort();
    sorted_out.sort();
    assert_eq!(sorted_in, sorted_out);
}

#[test]
fn test_sequence_is_independent_of_input_order() {
    let policy = SequencingPolicy::new(&PlannerConfig::default());
    let today = monday();
    let mut backlog = mixed_backlog();
    // 各层均制造交期并列
    backlog.push(OrderBuilder::new("FAR-45-TWIN").due(days_from(today, 45)).build());
    backlog.push(OrderBuilder::new("AA-NODATE").build());
    backlog.push(OrderBuilder::new("NEAR-6C").thickness(6).due(days_from(today, 6)).build());
    backlog.push(OrderBuilder::new("CRIT-TWIN").priority(Priority::Critical).due(days_from(today, 20)).build());

    let expected = ids(&policy.sequence(backlog.clone(), today));

    let mut reversed = backlog.clone();
    reversed.reverse();
    assert_eq!(ids(&policy.sequence(reversed, today)), expected);

    let mut rotated = backlog;
    rotated.rotate_left(5);
    assert_eq!(ids(&policy.sequence(rotated, today)), expected);

    let pos = |id: &str| expected.iter().position(|x| x == id).unwrap();
    assert!(pos("AA-NODATE") < pos("FAR-NODATE"));
    assert!(pos("FAR-45") < pos("FAR-45-TWIN"));
    assert!(pos("NEAR-6B") < pos("NEAR-6C"));
    assert!(pos("CRIT") < pos("CRIT-TWIN"));
}

#[test]
fn test_batch_bonus_pulls_larger_batches_forward() {
    let today = monday();
    let mut orders: Vec<Order> = (0..4)
        .map(|i| {
            OrderBuilder::new(&format!("BIG{}", i))
                .thickness(10)
                .product("Lamine")
                .due(days_from(today, 20))
                .build()
        })
        .collect();
    orders.push(OrderBuilder::new("SOLO").thickness(4).due(days_from(today, 5)).build());

    let policy = SequencingPolicy::new(&PlannerConfig::default());
    let plan = policy.plan(orders, today);

    // BIG: 4×10 - 40 = 0; SOLO: 10 - 10 = 0 → 并列，SOLO 交期更早
    assert_eq!(plan.batches[0].product_type, "Temperli");
    assert_eq!(plan.batches[1].orders.len(), 4);

    let bigger_bonus = PlannerConfig {
        batch_bonus: 20.0,
        ..PlannerConfig::default()
    };
    let plan = SequencingPolicy::new(&bigger_bonus).plan(plan.into_sequence(), today);
    assert_eq!(plan.batches[0].orders.len(), 4);
}

#[test]
fn test_urgent_threshold_is_configurable() {
    let today = monday();
    let order = OrderBuilder::new("X").due(days_from(today, 4)).build();

    assert_eq!(
        SequencingPolicy::new(&PlannerConfig::default()).classify(&order, today),
        Tier::Near
    );
    let strict = PlannerConfig {
        urgent_threshold_days: 5,
        ..PlannerConfig::default()
    };
    assert_eq!(SequencingPolicy::new(&strict).classify(&order, today), Tier::Urgent);
}
