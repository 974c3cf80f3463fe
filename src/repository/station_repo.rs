// ==========================================
// 玻璃深加工排产系统 - 工位与厚度系数数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::station::{Station, ThicknessCoefficient};
use crate::domain::types::StationGroup;
use crate::engine::sources::StationSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

pub struct StationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StationRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或覆盖工位
    pub fn upsert_station(&self, station: &Station) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO stations (
                name, station_group, daily_capacity_m2, sort_index, active,
                alternatives, is_batch_station, batch_lot_m2
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(name) DO UPDATE SET
                station_group = excluded.station_group,
                daily_capacity_m2 = excluded.daily_capacity_m2,
                sort_index = excluded.sort_index,
                active = excluded.active,
                alternatives = excluded.alternatives,
                is_batch_station = excluded.is_batch_station,
                batch_lot_m2 = excluded.batch_lot_m2
            "#,
            params![
                station.name,
                station.group.to_db_str(),
                station.daily_capacity_m2,
                station.sort_index,
                station.active,
                station.alternatives.join(","),
                station.is_batch_station,
                station.batch_lot_m2,
            ],
        )?;
        Ok(())
    }

    /// 新增或覆盖厚度系数
    pub fn upsert_coefficient(&self, coefficient: &ThicknessCoefficient) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO thickness_coefficients (thickness_mm, factor) VALUES (?1, ?2)
            ON CONFLICT(thickness_mm) DO UPDATE SET factor = excluded.factor
            "#,
            params![coefficient.thickness_mm, coefficient.factor],
        )?;
        Ok(())
    }
}

impl StationSource for StationRepository {
    /// 按排序号、名称返回；分组无法识别的工位跳过
    fn get_stations(&self) -> RepositoryResult<Vec<Station>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name, station_group, daily_capacity_m2, sort_index, active,
                   alternatives, is_batch_station, batch_lot_m2
            FROM stations
            ORDER BY sort_index, name
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let stations = rows
            .into_iter()
            .filter_map(
                |(name, group, capacity, sort_index, active, alternatives, is_batch, lot)| {
                    let group = match StationGroup::parse(&group) {
                        Some(g) => g,
                        None => {
                            warn!(station = %name, group = %group, "未知工位分组，跳过该工位");
                            return None;
                        }
                    };
                    Some(Station {
                        name,
                        group,
                        daily_capacity_m2: capacity,
                        sort_index,
                        active,
                        alternatives: alternatives
                            .unwrap_or_default()
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect(),
                        is_batch_station: is_batch,
                        batch_lot_m2: lot,
                    })
                },
            )
            .collect();

        Ok(stations)
    }

    /// 表为空时返回内置系数表
    fn get_thickness_coefficients(&self) -> RepositoryResult<Vec<ThicknessCoefficient>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT thickness_mm, factor FROM thickness_coefficients ORDER BY thickness_mm")?;
        let coefficients = stmt
            .query_map([], |row| {
                Ok(ThicknessCoefficient {
                    thickness_mm: row.get(0)?,
                    factor: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if coefficients.is_empty() {
            return Ok(ThicknessCoefficient::defaults());
        }
        Ok(coefficients)
    }
}
