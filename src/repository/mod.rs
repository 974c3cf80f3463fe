// ==========================================
// 玻璃深加工排产系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 实现引擎层数据源 trait，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod calendar_repo;
pub mod error;
pub mod order_repo;
pub mod progress_repo;
pub mod station_repo;

// 重导出核心仓储
pub use calendar_repo::HolidayRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::OrderRepository;
pub use progress_repo::ProgressRepository;
pub use station_repo::StationRepository;
