// ==========================================
// 玻璃深加工排产系统 - 生产进度数据仓储
// ==========================================
// 红线: 仿真前单次批量预取，禁止逐订单逐工位查询
// ==========================================

use crate::engine::sources::{ProgressMap, ProgressSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// SQLite 单语句绑定参数上限
const MAX_BIND_PARAMS: usize = 32_766;

pub struct ProgressRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/覆盖某订单某工位的完成片数
    pub fn upsert_progress(
        &self,
        order_id: &str,
        station_name: &str,
        completed_qty: u32,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_progress (order_id, station_name, completed_qty, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(order_id, station_name) DO UPDATE SET
                completed_qty = excluded.completed_qty,
                updated_at = excluded.updated_at
            "#,
            params![order_id, station_name, completed_qty],
        )?;
        Ok(())
    }
}

impl ProgressSource for ProgressRepository {
    fn get_completed_progress(&self, order_ids: &[String]) -> RepositoryResult<ProgressMap> {
        let mut progress = ProgressMap::new();
        if order_ids.is_empty() {
            return Ok(progress);
        }

        let conn = self.get_conn()?;
        // 超出绑定上限时才分段，常规规模为单次查询
        for chunk in order_ids.chunks(MAX_BIND_PARAMS) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT order_id, station_name, completed_qty FROM production_progress WHERE order_id IN ({})",
                placeholders
            );
            let values: Vec<Value> = chunk.iter().map(|id| Value::from(id.clone())).collect();

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (order_id, station, qty) in rows {
                progress
                    .entry(order_id)
                    .or_default()
                    .insert(station, qty.clamp(0, u32::MAX as i64) as u32);
            }
        }

        debug!(orders = order_ids.len(), with_progress = progress.len(), "进度批量预取完成");
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::order::Order;
    use crate::repository::order_repo::OrderRepository;

    #[test]
    fn test_bulk_fetch_and_upsert() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let orders = OrderRepository::from_connection(conn.clone());
        orders.insert_order(&Order::new("A", 1.0, "CUT")).unwrap();
        orders.insert_order(&Order::new("B", 1.0, "CUT")).unwrap();

        let repo = ProgressRepository::from_connection(conn);
        repo.upsert_progress("A", "CUT", 3).unwrap();
        repo.upsert_progress("A", "CUT", 5).unwrap();
        repo.upsert_progress("B", "TEMPER", 1).unwrap();

        let ids = vec!["A".to_string(), "C".to_string()];
        let progress = repo.get_completed_progress(&ids).unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress["A"]["CUT"], 5);

        assert!(repo.get_completed_progress(&[]).unwrap().is_empty());
    }
}
