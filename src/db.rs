// ==========================================
// 玻璃深加工排产系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（不做迁移）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建排产引擎读取的全部表（已存在则跳过）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            order_id TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL DEFAULT '',
            product_type TEXT NOT NULL DEFAULT '',
            thickness TEXT,
            quantity INTEGER NOT NULL DEFAULT 0,
            total_area_m2 REAL,
            width_cm REAL,
            height_cm REAL,
            delivery_date TEXT,
            priority TEXT NOT NULL DEFAULT 'Normal',
            route TEXT NOT NULL DEFAULT '',
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'WAITING',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS production_progress (
            order_id TEXT NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
            station_name TEXT NOT NULL,
            completed_qty INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (order_id, station_name)
        );

        CREATE TABLE IF NOT EXISTS stations (
            name TEXT PRIMARY KEY,
            station_group TEXT NOT NULL,
            daily_capacity_m2 REAL NOT NULL,
            sort_index INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            alternatives TEXT NOT NULL DEFAULT '',
            is_batch_station INTEGER NOT NULL DEFAULT 0,
            batch_lot_m2 REAL
        );

        CREATE TABLE IF NOT EXISTS thickness_coefficients (
            thickness_mm INTEGER PRIMARY KEY,
            factor REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS holidays (
            holiday_date TEXT PRIMARY KEY,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
        "#,
    )
}
