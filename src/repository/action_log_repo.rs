// ==========================================
// 图书馆管理系统 - 操作日志仓储
// ==========================================
// 职责: 管理 action_log 表（审计追踪）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS action_log (
              action_id TEXT PRIMARY KEY,
              action_type TEXT NOT NULL,
              entity TEXT NOT NULL,
              entity_id TEXT NOT NULL,
              actor TEXT NOT NULL,
              detail TEXT,
              action_ts TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_action_log_ts
              ON action_log(action_ts DESC);
            CREATE INDEX IF NOT EXISTS idx_action_log_entity
              ON action_log(entity, entity_id);
            "#,
        )?;
        Ok(())
    }

    fn log_from_row(row: &Row<'_>) -> rusqlite::Result<ActionLog> {
        Ok(ActionLog {
            action_id: row.get(0)?,
            action_type: row.get(1)?,
            entity: row.get(2)?,
            entity_id: row.get(3)?,
            actor: row.get(4)?,
            detail: row.get(5)?,
            action_ts: row.get(6)?,
        })
    }

    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO action_log \
             (action_id, action_type, entity, entity_id, actor, detail, action_ts) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.action_id,
                log.action_type,
                log.entity,
                log.entity_id,
                log.actor,
                log.detail,
                log.action_ts,
            ],
        )?;
        Ok(())
    }

    /// 最近的操作日志（审计页用）
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT action_id, action_type, entity, entity_id, actor, detail, action_ts \
             FROM action_log ORDER BY action_ts DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], Self::log_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
