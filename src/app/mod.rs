// ==========================================
// 玻璃深加工排产系统 - 应用层
// ==========================================
// 职责: 组装数据库、配置、仓储与引擎
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
