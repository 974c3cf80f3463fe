// ==========================================
// 玻璃深加工排产系统 - 应用状态
// ==========================================
// 职责: 打开数据库、加载配置、装配仓储与排产编排器
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::{ConfigManager, PlannerConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{Clock, PlannerSources, ProductionPlanner, SystemClock};
use crate::repository::{
    HolidayRepository, OrderRepository, ProgressRepository, RepositoryError, RepositoryResult,
    StationRepository,
};

/// 应用状态
///
/// 持有共享连接上的全部仓储，以及以其为数据源的排产编排器
pub struct AppState {
    pub db_path: String,
    pub config_manager: Arc<ConfigManager>,
    pub order_repo: Arc<OrderRepository>,
    pub station_repo: Arc<StationRepository>,
    pub progress_repo: Arc<ProgressRepository>,
    pub holiday_repo: Arc<HolidayRepository>,
    pub planner: ProductionPlanner,
}

impl AppState {
    /// 使用系统时钟创建
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        Self::with_clock(db_path, Arc::new(SystemClock))
    }

    /// 使用指定时钟创建
    ///
    /// 1. 打开数据库并建表
    /// 2. 从 config_kv 加载排产参数
    /// 3. 装配仓储与编排器
    pub fn with_clock(db_path: String, clock: Arc<dyn Clock>) -> RepositoryResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| RepositoryError::Open {
            path: db_path.clone(),
            message: e.to_string(),
        })?;
        init_schema(&conn)?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let config: PlannerConfig = config_manager.load_planner_config()?;

        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let station_repo = Arc::new(StationRepository::from_connection(conn.clone()));
        let progress_repo = Arc::new(ProgressRepository::from_connection(conn.clone()));
        let holiday_repo = Arc::new(HolidayRepository::from_connection(conn));

        let sources = PlannerSources::new(
            order_repo.clone(),
            station_repo.clone(),
            progress_repo.clone(),
            holiday_repo.clone(),
        );
        let planner = ProductionPlanner::new(sources, config, clock);

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config_manager,
            order_repo,
            station_repo,
            progress_repo,
            holiday_repo,
            planner,
        })
    }

    /// 重新从 config_kv 加载参数并重建编排器（仓储不变）
    pub fn reload_config(&mut self, clock: Arc<dyn Clock>) -> RepositoryResult<()> {
        let config = self.config_manager.load_planner_config()?;
        let sources = PlannerSources::new(
            self.order_repo.clone(),
            self.station_repo.clone(),
            self.progress_repo.clone(),
            self.holiday_repo.clone(),
        );
        self.planner = ProductionPlanner::new(sources, config, clock);
        Ok(())
    }
}

/// 默认数据库路径
///
/// 优先使用环境变量 GLASS_PLANNER_DB_PATH，否则放在用户数据目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("GLASS_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./glass_planner.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("glass-planner");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("glass_planner.db");
        }
    }

    path.to_string_lossy().to_string()
}
