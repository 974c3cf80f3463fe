// ==========================================
// 玻璃深加工排产系统 - 命令行入口
// ==========================================
// 用途: 对当前数据库执行一次产能预测，输出 JSON 摘要
// ==========================================

use anyhow::Context;
use glass_planner::app::{get_default_db_path, AppState};
use glass_planner::logging;
use serde_json::json;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 产能预测", glass_planner::APP_NAME);
    tracing::info!("系统版本: {}", glass_planner::VERSION);
    tracing::info!("==================================================");

    // 命令行第一个参数可覆盖数据库路径
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).context("无法初始化AppState")?;
    let run = state.planner.forecast();

    if run.has_no_orders() {
        tracing::info!("当前无活动订单");
    }
    if run.is_degraded() {
        tracing::warn!(degradations = ?run.degradations, "预测使用了降级数据");
    }

    let summary = json!({
        "today": run.result.today,
        "horizon_days": run.result.horizon_days,
        "order_count": run.orders.len(),
        "completion": run.result.completion_estimates(),
        "late_orders": run.result.late_orders(&run.orders),
        "utilization": run.result.station_utilization(),
        "bottleneck": run.result.bottleneck(),
        "capped_jobs": run.result.capped_jobs,
        "route_issues": run.route_issues,
        "degradations": run.degradations,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("序列化预测摘要失败")?
    );
    Ok(())
}
