// ==========================================
// 图书馆管理系统 - 流通记录仓储
// ==========================================
// 职责: 管理 circulations 表，并在同一事务内完成副本状态的条件变更
// 红线: 同一副本任一时刻至多一条 status='borrowed' 的流通记录
//       （条件 UPDATE + 局部唯一索引双重保障）
// 红线: 借出/归还/续借/遗失的两表变更必须同事务提交，失败全量回滚
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::circulation::{
    Circulation, CirculationReport, CirculationSummary, PatronStats, PatronTransactionRow,
};
use crate::domain::types::{CirculationStatus, CopyStatus, SortOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct CirculationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CirculationRepository {
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
            CREATE TABLE IF NOT EXISTS circulations (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              book_copy_id INTEGER NOT NULL REFERENCES book_copies(id),
              patron_id INTEGER NOT NULL REFERENCES patrons(id),
              issue_date TEXT NOT NULL,
              due_date TEXT NOT NULL,
              renewal_date TEXT,
              renewal_count INTEGER NOT NULL DEFAULT 0,
              overdue_by INTEGER NOT NULL DEFAULT 0,
              fine REAL NOT NULL DEFAULT 0,
              date_returned TEXT,
              status TEXT NOT NULL DEFAULT 'borrowed'
            );

            CREATE INDEX IF NOT EXISTS idx_circulations_copy
              ON circulations(book_copy_id);
            CREATE INDEX IF NOT EXISTS idx_circulations_patron
              ON circulations(patron_id);
            CREATE INDEX IF NOT EXISTS idx_circulations_status
              ON circulations(status);
            CREATE INDEX IF NOT EXISTS idx_circulations_issue_date
              ON circulations(issue_date DESC);

            -- 数据库级兜底：同一副本至多一条借出中的流通记录
            CREATE UNIQUE INDEX IF NOT EXISTS idx_circulations_copy_borrowed
              ON circulations(book_copy_id) WHERE status = 'borrowed';
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn circulation_from_row(row: &Row<'_>) -> rusqlite::Result<Circulation> {
        let status_str: String = row.get(10)?;
        let status: CirculationStatus = status_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(Circulation {
            id: row.get(0)?,
            book_copy_id: row.get(1)?,
            patron_id: row.get(2)?,
            issue_date: row.get(3)?,
            due_date: row.get(4)?,
            renewal_date: row.get(5)?,
            renewal_count: row.get(6)?,
            overdue_by: row.get(7)?,
            fine: row.get(8)?,
            date_returned: row.get(9)?,
            status,
        })
    }

    const CIRCULATION_COLUMNS: &'static str = "id, book_copy_id, patron_id, issue_date, due_date, \
         renewal_date, renewal_count, overdue_by, fine, date_returned, status";

    fn find_with(conn: &Connection, id: i64) -> RepositoryResult<Circulation> {
        let sql = format!(
            "SELECT {} FROM circulations WHERE id = ?1",
            Self::CIRCULATION_COLUMNS
        );
        conn.query_row(&sql, params![id], Self::circulation_from_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Circulation".to_string(),
                id: id.to_string(),
            })
    }

    /// 读取流通记录当前状态（事务内区分"不存在"与"状态不符"用）
    fn current_status(conn: &Connection, id: i64) -> RepositoryResult<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT status FROM circulations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Circulation> {
        let conn = self.get_conn()?;
        Self::find_with(&conn, id)
    }

    /// 全部流通记录（含书目/读者摘要），最新借出在前
    pub fn list_summaries(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<CirculationSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.book_copy_id, c.patron_id, c.issue_date, c.due_date,
                   c.renewal_date, c.renewal_count, c.overdue_by, c.fine, c.date_returned, c.status,
                   b.title, b.call_number, bc.copy_number, bc.barcode,
                   p.patron_id, p.first_name, p.last_name
            FROM circulations c
            JOIN book_copies bc ON bc.id = c.book_copy_id
            JOIN books b ON b.id = bc.book_id
            JOIN patrons p ON p.id = c.patron_id
            ORDER BY c.issue_date DESC, c.id DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let circulation = Self::circulation_from_row(row)?;
            let first_name: String = row.get(16)?;
            let last_name: String = row.get(17)?;
            Ok(CirculationSummary {
                display_status: circulation.display_status(now).to_string(),
                circulation,
                book_title: row.get(11)?,
                call_number: row.get(12)?,
                copy_number: row.get(13)?,
                barcode: row.get(14)?,
                patron_public_id: row.get(15)?,
                patron_name: format!("{} {}", first_name, last_name),
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 流通统计（borrowed / returned / lost 计数 + 派生 overdue 计数）
    pub fn count_report(&self, now: DateTime<Utc>) -> RepositoryResult<CirculationReport> {
        let conn = self.get_conn()?;

        let count_by = |status: CirculationStatus| -> RepositoryResult<i64> {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM circulations WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )?)
        };

        let borrowed = count_by(CirculationStatus::Borrowed)?;
        let returned = count_by(CirculationStatus::Returned)?;
        let lost = count_by(CirculationStatus::Lost)?;

        // 派生口径：借出中且已过应还时间
        let overdue = conn.query_row(
            "SELECT COUNT(*) FROM circulations WHERE status = ?1 AND due_date < ?2",
            params![CirculationStatus::Borrowed.as_str(), now],
            |row| row.get(0),
        )?;

        Ok(CirculationReport {
            borrowed,
            returned,
            lost,
            overdue,
        })
    }

    /// 读者借阅记录（扁平化行，按借出时间排序，方向可切换）
    pub fn find_patron_transactions(
        &self,
        patron_db_id: i64,
        order: SortOrder,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<PatronTransactionRow>> {
        let conn = self.get_conn()?;
        let direction = match order {
            SortOrder::Newest => "DESC",
            SortOrder::Oldest => "ASC",
        };
        let sql = format!(
            r#"
            SELECT c.id, c.book_copy_id, c.patron_id, c.issue_date, c.due_date,
                   c.renewal_date, c.renewal_count, c.overdue_by, c.fine, c.date_returned, c.status,
                   b.title, b.call_number, bc.copy_number
            FROM circulations c
            JOIN book_copies bc ON bc.id = c.book_copy_id
            JOIN books b ON b.id = bc.book_id
            WHERE c.patron_id = ?1
            ORDER BY c.issue_date {direction}, c.id {direction}
            "#
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![patron_db_id], |row| {
            let circulation = Self::circulation_from_row(row)?;
            Ok(PatronTransactionRow {
                circulation_id: circulation.id,
                book_title: row.get(11)?,
                call_number: row.get(12)?,
                copy_number: row.get(13)?,
                status: circulation.display_status(now).to_string(),
                date_issued: circulation.issue_date,
                due_date: circulation.due_date,
                return_date: circulation.date_returned,
                fine: circulation.fine,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 读者借阅统计
    pub fn patron_stats(
        &self,
        patron_db_id: i64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<PatronStats> {
        let (borrowed_books, returned_books, total_fine, overdue_books) = {
            let conn = self.get_conn()?;

            let borrowed_books: i64 = conn.query_row(
                "SELECT COUNT(*) FROM circulations WHERE patron_id = ?1",
                params![patron_db_id],
                |row| row.get(0),
            )?;
            let returned_books: i64 = conn.query_row(
                "SELECT COUNT(*) FROM circulations WHERE patron_id = ?1 AND status = ?2",
                params![patron_db_id, CirculationStatus::Returned.as_str()],
                |row| row.get(0),
            )?;
            let total_fine: f64 = conn.query_row(
                "SELECT COALESCE(SUM(fine), 0) FROM circulations WHERE patron_id = ?1",
                params![patron_db_id],
                |row| row.get(0),
            )?;
            let overdue_books: i64 = conn.query_row(
                "SELECT COUNT(*) FROM circulations \
                 WHERE patron_id = ?1 AND status = ?2 AND due_date < ?3",
                params![patron_db_id, CirculationStatus::Borrowed.as_str(), now],
                |row| row.get(0),
            )?;

            (borrowed_books, returned_books, total_fine, overdue_books)
        };

        let history = self.find_patron_transactions(patron_db_id, SortOrder::Newest, now)?;

        Ok(PatronStats {
            borrowed_books,
            returned_books,
            overdue_books,
            total_fine,
            history,
        })
    }

    // ==========================================
    // 状态变更（均为单事务）
    // ==========================================

    /// 借出：占用副本 + 新建流通记录
    ///
    /// 副本可用性检查与占用在同一条条件 UPDATE 中完成，
    /// 两个并发借出请求至多一个能命中 status='available' 的行。
    pub fn insert_borrow(
        &self,
        book_copy_id: i64,
        patron_db_id: i64,
        issue_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> RepositoryResult<Circulation> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let occupied = tx.execute(
            "UPDATE book_copies SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![
                CopyStatus::Borrowed.as_str(),
                book_copy_id,
                CopyStatus::Available.as_str()
            ],
        )?;
        if occupied == 0 {
            // 区分"副本不存在"与"副本不可借"；事务随 drop 回滚
            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM book_copies WHERE id = ?1",
                    params![book_copy_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match current {
                None => RepositoryError::NotFound {
                    entity: "BookCopy".to_string(),
                    id: book_copy_id.to_string(),
                },
                Some(from) => RepositoryError::InvalidStateTransition {
                    entity: "BookCopy".to_string(),
                    from,
                    to: CopyStatus::Borrowed.as_str().to_string(),
                },
            });
        }

        tx.execute(
            "INSERT INTO circulations \
             (book_copy_id, patron_id, issue_date, due_date, renewal_count, overdue_by, fine, status) \
             VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5)",
            params![
                book_copy_id,
                patron_db_id,
                issue_date,
                due_date,
                CirculationStatus::Borrowed.as_str()
            ],
        )?;
        let id = tx.last_insert_rowid();
        let circulation = Self::find_with(&tx, id)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(circulation)
    }

    /// 归还：结清流通记录 + 仅本副本恢复可借
    pub fn apply_return(
        &self,
        id: i64,
        date_returned: DateTime<Utc>,
        overdue_by: i64,
        fine: f64,
    ) -> RepositoryResult<Circulation> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let updated = tx.execute(
            "UPDATE circulations \
             SET status = ?1, date_returned = ?2, overdue_by = ?3, fine = ?4 \
             WHERE id = ?5 AND status = ?6",
            params![
                CirculationStatus::Returned.as_str(),
                date_returned,
                overdue_by,
                fine,
                id,
                CirculationStatus::Borrowed.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(Self::not_borrowed_error(&tx, id, CirculationStatus::Returned)?);
        }

        tx.execute(
            "UPDATE book_copies SET status = ?1 \
             WHERE id = (SELECT book_copy_id FROM circulations WHERE id = ?2)",
            params![CopyStatus::Available.as_str(), id],
        )?;
        let circulation = Self::find_with(&tx, id)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(circulation)
    }

    /// 续借：顺延应还时间，累加罚金与续借次数
    pub fn apply_renewal(
        &self,
        id: i64,
        renewal_date: DateTime<Utc>,
        new_due_date: DateTime<Utc>,
        overdue_by: i64,
        added_fine: f64,
    ) -> RepositoryResult<Circulation> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let updated = tx.execute(
            "UPDATE circulations \
             SET due_date = ?1, renewal_date = ?2, renewal_count = renewal_count + 1, \
                 overdue_by = ?3, fine = fine + ?4 \
             WHERE id = ?5 AND status = ?6",
            params![
                new_due_date,
                renewal_date,
                overdue_by,
                added_fine,
                id,
                CirculationStatus::Borrowed.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(Self::not_borrowed_error(&tx, id, CirculationStatus::Borrowed)?);
        }
        let circulation = Self::find_with(&tx, id)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(circulation)
    }

    /// 标记遗失：流通记录与副本同时置为 lost
    pub fn apply_mark_lost(&self, id: i64) -> RepositoryResult<Circulation> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let updated = tx.execute(
            "UPDATE circulations SET status = ?1 WHERE id = ?2 AND status = ?3",
            params![
                CirculationStatus::Lost.as_str(),
                id,
                CirculationStatus::Borrowed.as_str()
            ],
        )?;
        if updated == 0 {
            return Err(Self::not_borrowed_error(&tx, id, CirculationStatus::Lost)?);
        }

        tx.execute(
            "UPDATE book_copies SET status = ?1 \
             WHERE id = (SELECT book_copy_id FROM circulations WHERE id = ?2)",
            params![CopyStatus::Lost.as_str(), id],
        )?;
        let circulation = Self::find_with(&tx, id)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(circulation)
    }

    /// 条件更新未命中时的错误归因：记录不存在 or 状态不符
    fn not_borrowed_error(
        conn: &Connection,
        id: i64,
        attempted: CirculationStatus,
    ) -> RepositoryResult<RepositoryError> {
        Ok(match Self::current_status(conn, id)? {
            None => RepositoryError::NotFound {
                entity: "Circulation".to_string(),
                id: id.to_string(),
            },
            Some(from) => RepositoryError::InvalidStateTransition {
                entity: "Circulation".to_string(),
                from,
                to: attempted.as_str().to_string(),
            },
        })
    }
}
