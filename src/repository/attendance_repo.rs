// ==========================================
// 图书馆管理系统 - 到馆登记仓储
// ==========================================
// 职责: 管理 attendance 表（访客签到/签退）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::attendance::{Attendance, NewAttendance};
use crate::domain::types::Gender;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct AttendanceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AttendanceRepository {
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
            CREATE TABLE IF NOT EXISTS attendance (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              gender TEXT NOT NULL,
              email TEXT,
              address TEXT,
              purpose_of_visit TEXT NOT NULL,
              time_in TEXT NOT NULL,
              time_out TEXT,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_attendance_time_in
              ON attendance(time_in DESC);
            "#,
        )?;
        Ok(())
    }

    fn attendance_from_row(row: &Row<'_>) -> rusqlite::Result<Attendance> {
        let gender_str: String = row.get(2)?;
        let gender: Gender = gender_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(Attendance {
            id: row.get(0)?,
            name: row.get(1)?,
            gender,
            email: row.get(3)?,
            address: row.get(4)?,
            purpose_of_visit: row.get(5)?,
            time_in: row.get(6)?,
            time_out: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    const ATTENDANCE_COLUMNS: &'static str =
        "id, name, gender, email, address, purpose_of_visit, time_in, time_out, created_at";

    // ==========================================
    // 写入
    // ==========================================

    /// 签到（新建记录并记录 time_in）
    pub fn insert(
        &self,
        new: &NewAttendance,
        time_in: DateTime<Utc>,
    ) -> RepositoryResult<Attendance> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO attendance \
             (name, gender, email, address, purpose_of_visit, time_in, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.name,
                new.gender.as_str(),
                new.email,
                new.address,
                new.purpose_of_visit,
                time_in,
                time_in,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::find_with(&conn, id)
    }

    /// 签退（已签退的记录拒绝重复签退）
    pub fn time_out(&self, id: i64, time_out: DateTime<Utc>) -> RepositoryResult<Attendance> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE attendance SET time_out = ?1 WHERE id = ?2 AND time_out IS NULL",
            params![time_out, id],
        )?;
        if changed == 0 {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT id FROM attendance WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match exists {
                None => RepositoryError::NotFound {
                    entity: "Attendance".to_string(),
                    id: id.to_string(),
                },
                Some(_) => RepositoryError::BusinessRuleViolation(format!(
                    "到馆记录已签退: id={}",
                    id
                )),
            });
        }
        Self::find_with(&conn, id)
    }

    // ==========================================
    // 查询
    // ==========================================

    fn find_with(conn: &Connection, id: i64) -> RepositoryResult<Attendance> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE id = ?1",
            Self::ATTENDANCE_COLUMNS
        );
        conn.query_row(&sql, params![id], Self::attendance_from_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Attendance".to_string(),
                id: id.to_string(),
            })
    }

    /// 全部登记记录，最新在前
    pub fn list(&self) -> RepositoryResult<Vec<Attendance>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM attendance ORDER BY time_in DESC, id DESC",
            Self::ATTENDANCE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::attendance_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 当日登记记录（按 time_in 的日期归并）
    pub fn list_today(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Attendance>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM attendance WHERE date(time_in) = date(?1) \
             ORDER BY time_in DESC, id DESC",
            Self::ATTENDANCE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![now], Self::attendance_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
