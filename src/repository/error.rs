// ==========================================
// 玻璃深加工排产系统 - 仓储层错误类型
// ==========================================

use thiserror::Error;

/// 仓储层错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("无法打开数据库 {path}: {message}")]
    Open { path: String, message: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("SQLite 错误: {0}")]
    Sqlite(String),

    #[error("配置快照序列化失败: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// 外部数据源（非 SQLite 实现）暂不可用
    #[error("数据源不可用: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::ForeignKeyViolation(msg)
            }
            other => RepositoryError::Sqlite(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_sqlite_constraint_errors_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY);
             CREATE TABLE child (pid TEXT NOT NULL REFERENCES parent(id));
             INSERT INTO parent (id) VALUES ('a');",
        )
        .unwrap();

        let dup: RepositoryError = conn
            .execute("INSERT INTO parent (id) VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(dup, RepositoryError::UniqueConstraintViolation(_)));

        let orphan: RepositoryError = conn
            .execute("INSERT INTO child (pid) VALUES ('missing')", [])
            .unwrap_err()
            .into();
        assert!(matches!(orphan, RepositoryError::ForeignKeyViolation(_)));

        let bad_sql: RepositoryError = conn.execute("SELECT * FROM nope", []).unwrap_err().into();
        assert!(matches!(bad_sql, RepositoryError::Sqlite(_)));
    }
}
