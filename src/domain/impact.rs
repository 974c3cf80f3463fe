// ==========================================
// 玻璃深加工排产系统 - 影响分析报告模型
// ==========================================
// 用途: Impact Analyzer 输出格式（每次分析新建，不落库）
// ==========================================

use crate::domain::types::Severity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// AffectedOrder - 受影响订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedOrder {
    pub order_id: String,
    pub customer_name: String,
    pub old_finish_days: f64,       // 调整前完工时间（天）
    pub new_finish_days: f64,       // 调整后完工时间（天）
    pub diff_days: f64,             // new - old，正数为延误
    pub severity: Severity,
    pub delivery_date: Option<NaiveDate>,
    pub deadline_exceeded: bool,    // 调整后超出自身交期
}

impl AffectedOrder {
    pub fn is_delayed(&self) -> bool {
        self.diff_days > 0.0
    }

    pub fn is_improved(&self) -> bool {
        self.diff_days < 0.0
    }
}

/// 插单分析中新订单自身的预计完工
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertedOrderEstimate {
    pub order_id: String,
    pub position: usize,
    pub finish_days: f64,
    pub deadline_exceeded: bool,
}

// ==========================================
// ImpactReport - 影响分析报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub report_id: String,
    pub today: NaiveDate,

    // ===== 操作描述 =====
    pub subject_order_id: String, // 被移动/调整/插入的订单
    pub old_position: Option<usize>,
    pub new_position: usize,

    // ===== 明细 (已排序: 严重度 → |diff| 降序) =====
    pub affected_orders: Vec<AffectedOrder>,
    pub inserted_order: Option<InsertedOrderEstimate>,

    // ===== 汇总 =====
    pub total_affected: usize,
    pub delayed_count: usize,
    pub improved_count: usize,
    pub deadline_exceeded_count: usize,
}

impl ImpactReport {
    /// 替换受影响明细并重算汇总计数（两种报告构建路径共用）
    pub fn set_affected_orders(&mut self, affected_orders: Vec<AffectedOrder>) {
        self.total_affected = affected_orders.len();
        self.delayed_count = affected_orders.iter().filter(|o| o.is_delayed()).count();
        self.improved_count = affected_orders.iter().filter(|o| o.is_improved()).count();
        self.deadline_exceeded_count = affected_orders
            .iter()
            .filter(|o| o.deadline_exceeded)
            .count();
        self.affected_orders = affected_orders;
    }

    /// 是否无任何影响
    pub fn is_empty(&self) -> bool {
        self.affected_orders.is_empty()
    }

    /// 指定严重度的订单
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &AffectedOrder> {
        self.affected_orders
            .iter()
            .filter(move |o| o.severity == severity)
    }

    /// 生成可读描述
    pub fn describe(&self) -> String {
        let mut parts = vec![format!(
            "订单{}: 位置{}→{}",
            self.subject_order_id,
            self.old_position
                .map(|p| p.to_string())
                .unwrap_or_else(|| "新增".to_string()),
            self.new_position
        )];

        if self.affected_orders.is_empty() {
            parts.push("无影响".to_string());
            return parts.join("; ");
        }

        parts.push(format!("影响{}个订单", self.total_affected));
        if self.delayed_count > 0 {
            parts.push(format!("延误{}个", self.delayed_count));
        }
        if self.improved_count > 0 {
            parts.push(format!("提前{}个", self.improved_count));
        }
        if self.deadline_exceeded_count > 0 {
            parts.push(format!("超交期{}个", self.deadline_exceeded_count));
        }
        if let Some(worst) = self.affected_orders.first() {
            parts.push(format!(
                "最严重: {} ({:+.1}天, {})",
                worst.order_id, worst.diff_days, worst.severity
            ));
        }

        parts.join("; ")
    }
}
