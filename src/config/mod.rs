// ==========================================
// 玻璃深加工排产系统 - 配置层
// ==========================================
// 职责: 排产参数定义与加载
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod planner_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use planner_config::PlannerConfig;
