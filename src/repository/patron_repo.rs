// ==========================================
// 图书馆管理系统 - 读者仓储
// ==========================================
// 职责: 管理 patrons 表
// 约束: patron_id（对外证号）与 email 唯一
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::patron::{NewPatron, Patron, PatronUpdate};
use crate::domain::types::PatronStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct PatronRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PatronRepository {
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
            CREATE TABLE IF NOT EXISTS patrons (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              patron_id TEXT NOT NULL UNIQUE,
              first_name TEXT NOT NULL,
              middle_name TEXT,
              last_name TEXT NOT NULL,
              suffix TEXT,
              email TEXT NOT NULL UNIQUE,
              barangay TEXT,
              city TEXT NOT NULL,
              province TEXT NOT NULL,
              number TEXT,
              age INTEGER,
              gender TEXT,
              notes TEXT,
              status TEXT NOT NULL DEFAULT 'Active',
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_patrons_status
              ON patrons(status);
            "#,
        )?;
        Ok(())
    }

    fn patron_from_row(row: &Row<'_>) -> rusqlite::Result<Patron> {
        let status_str: String = row.get(14)?;
        let status: PatronStatus = status_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(14, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(Patron {
            id: row.get(0)?,
            patron_id: row.get(1)?,
            first_name: row.get(2)?,
            middle_name: row.get(3)?,
            last_name: row.get(4)?,
            suffix: row.get(5)?,
            email: row.get(6)?,
            barangay: row.get(7)?,
            city: row.get(8)?,
            province: row.get(9)?,
            number: row.get(10)?,
            age: row.get(11)?,
            gender: row.get(12)?,
            notes: row.get(13)?,
            status,
            created_at: row.get(15)?,
        })
    }

    const PATRON_COLUMNS: &'static str = "id, patron_id, first_name, middle_name, last_name, \
         suffix, email, barangay, city, province, number, age, gender, notes, status, created_at";

    // ==========================================
    // 写入
    // ==========================================

    pub fn insert(
        &self,
        new: &NewPatron,
        patron_id: &str,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<Patron> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO patrons \
             (patron_id, first_name, middle_name, last_name, suffix, email, barangay, city, \
              province, number, age, gender, notes, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                patron_id,
                new.first_name,
                new.middle_name,
                new.last_name,
                new.suffix,
                new.email,
                new.barangay,
                new.city,
                new.province,
                new.number,
                new.age,
                new.gender,
                new.notes,
                PatronStatus::Active.as_str(),
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::find_with(&conn, id)
    }

    /// 部分字段更新（None 表示不修改）
    pub fn update(&self, id: i64, update: &PatronUpdate) -> RepositoryResult<Patron> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE patrons SET \
               first_name  = COALESCE(?1, first_name), \
               middle_name = COALESCE(?2, middle_name), \
               last_name   = COALESCE(?3, last_name), \
               suffix      = COALESCE(?4, suffix), \
               email       = COALESCE(?5, email), \
               barangay    = COALESCE(?6, barangay), \
               city        = COALESCE(?7, city), \
               province    = COALESCE(?8, province), \
               number      = COALESCE(?9, number), \
               age         = COALESCE(?10, age), \
               gender      = COALESCE(?11, gender), \
               notes       = COALESCE(?12, notes) \
             WHERE id = ?13",
            params![
                update.first_name,
                update.middle_name,
                update.last_name,
                update.suffix,
                update.email,
                update.barangay,
                update.city,
                update.province,
                update.number,
                update.age,
                update.gender,
                update.notes,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Patron".to_string(),
                id: id.to_string(),
            });
        }
        Self::find_with(&conn, id)
    }

    pub fn set_status(&self, id: i64, status: PatronStatus) -> RepositoryResult<Patron> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE patrons SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Patron".to_string(),
                id: id.to_string(),
            });
        }
        Self::find_with(&conn, id)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute("DELETE FROM patrons WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Patron".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    fn find_with(conn: &Connection, id: i64) -> RepositoryResult<Patron> {
        let sql = format!("SELECT {} FROM patrons WHERE id = ?1", Self::PATRON_COLUMNS);
        conn.query_row(&sql, params![id], Self::patron_from_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Patron".to_string(),
                id: id.to_string(),
            })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Patron> {
        let conn = self.get_conn()?;
        Self::find_with(&conn, id)
    }

    /// 按对外证号查读者（借书入口用）
    pub fn find_by_public_id(&self, patron_id: &str) -> RepositoryResult<Patron> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM patrons WHERE patron_id = ?1",
            Self::PATRON_COLUMNS
        );
        conn.query_row(&sql, params![patron_id], Self::patron_from_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Patron".to_string(),
                id: patron_id.to_string(),
            })
    }

    pub fn list(&self) -> RepositoryResult<Vec<Patron>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM patrons ORDER BY id", Self::PATRON_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::patron_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 生成下一个对外证号（P + 5位补零，取当前最大号续号）
    ///
    /// patron_id 列带唯一约束，并发注册撞号时由约束兜底报错。
    pub fn next_patron_id(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let max_suffix: i64 = conn.query_row(
            "SELECT COALESCE(MAX(CAST(SUBSTR(patron_id, 2) AS INTEGER)), 0) \
             FROM patrons WHERE patron_id LIKE 'P%'",
            [],
            |row| row.get(0),
        )?;
        Ok(format!("P{:05}", max_suffix + 1))
    }
}
