// ==========================================
// 图书馆管理系统 - 图书/馆藏副本仓储
// ==========================================
// 职责: 管理 books / book_copies 表
// 约束: 登录号全馆单调递增（5位补零），副本号按书目内递增
// 约束: 书目与初始副本在同一事务内入藏
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::book::{Book, BookCopy, BookWithCopies, CopyWithBook, NewBook};
use crate::domain::types::CopyStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

pub struct BookRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BookRepository {
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
            CREATE TABLE IF NOT EXISTS books (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              title TEXT NOT NULL,
              author TEXT,
              edition TEXT,
              publisher TEXT,
              place_of_publication TEXT,
              copyright TEXT,
              isbn TEXT,
              class_section TEXT NOT NULL,
              dewey_decimal TEXT NOT NULL,
              author_number TEXT,
              call_number TEXT NOT NULL,
              source TEXT NOT NULL,
              source_person TEXT,
              location_of_book TEXT,
              material_type TEXT,
              notes TEXT,
              created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS book_copies (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
              copy_number INTEGER NOT NULL,
              accession_number TEXT NOT NULL UNIQUE,
              barcode TEXT NOT NULL UNIQUE,
              status TEXT NOT NULL DEFAULT 'available',
              date_added TEXT NOT NULL,
              UNIQUE(book_id, copy_number)
            );

            CREATE INDEX IF NOT EXISTS idx_book_copies_book
              ON book_copies(book_id);
            CREATE INDEX IF NOT EXISTS idx_book_copies_status
              ON book_copies(status);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            edition: row.get(3)?,
            publisher: row.get(4)?,
            place_of_publication: row.get(5)?,
            copyright: row.get(6)?,
            isbn: row.get(7)?,
            class_section: row.get(8)?,
            dewey_decimal: row.get(9)?,
            author_number: row.get(10)?,
            call_number: row.get(11)?,
            source: row.get(12)?,
            source_person: row.get(13)?,
            location_of_book: row.get(14)?,
            material_type: row.get(15)?,
            notes: row.get(16)?,
            created_at: row.get(17)?,
        })
    }

    fn copy_from_row(row: &Row<'_>) -> rusqlite::Result<BookCopy> {
        let status_str: String = row.get(5)?;
        let status: CopyStatus = status_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(BookCopy {
            id: row.get(0)?,
            book_id: row.get(1)?,
            copy_number: row.get(2)?,
            accession_number: row.get(3)?,
            barcode: row.get(4)?,
            status,
            date_added: row.get(6)?,
        })
    }

    const BOOK_COLUMNS: &'static str = "id, title, author, edition, publisher, \
         place_of_publication, copyright, isbn, class_section, dewey_decimal, author_number, \
         call_number, source, source_person, location_of_book, material_type, notes, created_at";

    const COPY_COLUMNS: &'static str =
        "id, book_id, copy_number, accession_number, barcode, status, date_added";

    // ==========================================
    // 编目入藏
    // ==========================================

    /// 新建书目并入藏 N 个副本（同一事务）
    ///
    /// - copy_number: 书目内续号（从已有副本数 + 1 起）
    /// - accession_number: 全馆最大登录号续号，5位补零
    /// - barcode: BC + UUID（唯一）
    pub fn create_with_copies(
        &self,
        new_book: &NewBook,
        call_number: &str,
        copy_count: i64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<BookWithCopies> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO books \
             (title, author, edition, publisher, place_of_publication, copyright, isbn, \
              class_section, dewey_decimal, author_number, call_number, source, source_person, \
              location_of_book, material_type, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                new_book.title,
                new_book.author,
                new_book.edition,
                new_book.publisher,
                new_book.place_of_publication,
                new_book.copyright,
                new_book.isbn,
                new_book.class_section,
                new_book.dewey_decimal,
                new_book.author_number,
                call_number,
                new_book.source,
                new_book.source_person,
                new_book.location_of_book,
                new_book.material_type,
                new_book.notes,
                now,
            ],
        )?;
        let book_id = tx.last_insert_rowid();

        // 全馆登录号与书目内副本号均在事务内取号，避免并发编目取到相同号段
        let accession_start: i64 = tx.query_row(
            "SELECT COALESCE(MAX(CAST(accession_number AS INTEGER)), 0) FROM book_copies",
            [],
            |row| row.get(0),
        )?;
        let existing_copies: i64 = tx.query_row(
            "SELECT COUNT(*) FROM book_copies WHERE book_id = ?1",
            params![book_id],
            |row| row.get(0),
        )?;

        for i in 1..=copy_count {
            let accession_number = format!("{:05}", accession_start + i);
            let barcode = format!("BC{}", Uuid::new_v4().simple());
            tx.execute(
                "INSERT INTO book_copies \
                 (book_id, copy_number, accession_number, barcode, status, date_added) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    book_id,
                    existing_copies + i,
                    accession_number,
                    barcode,
                    CopyStatus::Available.as_str(),
                    now.date_naive(),
                ],
            )?;
        }

        let book = Self::find_book_with(&tx, book_id)?;
        let copies = Self::copies_of_with(&tx, book_id)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(BookWithCopies { book, copies })
    }

    // ==========================================
    // 查询
    // ==========================================

    fn find_book_with(conn: &Connection, id: i64) -> RepositoryResult<Book> {
        let sql = format!("SELECT {} FROM books WHERE id = ?1", Self::BOOK_COLUMNS);
        conn.query_row(&sql, params![id], Self::book_from_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Book".to_string(),
                id: id.to_string(),
            })
    }

    fn copies_of_with(conn: &Connection, book_id: i64) -> RepositoryResult<Vec<BookCopy>> {
        let sql = format!(
            "SELECT {} FROM book_copies WHERE book_id = ?1 ORDER BY copy_number",
            Self::COPY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![book_id], Self::copy_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn list_with_copies(&self) -> RepositoryResult<Vec<BookWithCopies>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM books ORDER BY id", Self::BOOK_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let books = stmt
            .query_map([], Self::book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = Vec::with_capacity(books.len());
        for book in books {
            let copies = Self::copies_of_with(&conn, book.id)?;
            result.push(BookWithCopies { book, copies });
        }
        Ok(result)
    }

    pub fn find_with_copies(&self, id: i64) -> RepositoryResult<BookWithCopies> {
        let conn = self.get_conn()?;
        let book = Self::find_book_with(&conn, id)?;
        let copies = Self::copies_of_with(&conn, id)?;
        Ok(BookWithCopies { book, copies })
    }

    /// 按内部 ID 查副本（流通引擎的副本状态依赖仅此一处）
    pub fn find_copy(&self, id: i64) -> RepositoryResult<BookCopy> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM book_copies WHERE id = ?1", Self::COPY_COLUMNS);
        conn.query_row(&sql, params![id], Self::copy_from_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "BookCopy".to_string(),
                id: id.to_string(),
            })
    }

    /// 按条码查副本（借还台扫码入口）
    pub fn find_copy_by_barcode(&self, barcode: &str) -> RepositoryResult<CopyWithBook> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT bc.id, bc.book_id, bc.copy_number, bc.accession_number, bc.barcode, \
                    bc.status, bc.date_added, b.title, b.call_number \
             FROM book_copies bc \
             JOIN books b ON b.id = bc.book_id \
             WHERE bc.barcode = ?1",
            params![barcode],
            |row| {
                let copy = Self::copy_from_row(row)?;
                Ok(CopyWithBook {
                    copy,
                    book_title: row.get(7)?,
                    call_number: row.get(8)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "BookCopy".to_string(),
            id: barcode.to_string(),
        })
    }
}
