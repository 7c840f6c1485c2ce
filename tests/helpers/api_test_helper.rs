// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;
use tempfile::NamedTempFile;

use library_ms::api::{AttendanceApi, BookApi, CirculationApi, PatronApi, SettingsApi};
use library_ms::config::PolicyManager;
use library_ms::db::open_sqlite_connection;
use library_ms::domain::book::{BookWithCopies, NewBook};
use library_ms::domain::patron::{NewPatron, PatronView};
use library_ms::repository::{
    ActionLogRepository, AttendanceRepository, BookRepository, CirculationRepository,
    PatronRepository,
};

// ==========================================
// 时间基准
// ==========================================

/// 测试时间轴: 基准日 + n 天（09:00 UTC）
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::days(n)
}

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖（共享一个临时数据库连接）
pub struct ApiTestEnv {
    pub db_path: String,

    pub book_api: Arc<BookApi>,
    pub patron_api: Arc<PatronApi>,
    pub circulation_api: Arc<CirculationApi>,
    pub settings_api: Arc<SettingsApi>,
    pub attendance_api: Arc<AttendanceApi>,

    // Repository层（用于测试数据准备）
    pub book_repo: Arc<BookRepository>,
    pub patron_repo: Arc<PatronRepository>,
    pub circulation_repo: Arc<CirculationRepository>,
    pub attendance_repo: Arc<AttendanceRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
    pub policy: Arc<PolicyManager>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件
    /// - 初始化所有Repository和API（建表）
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let book_repo = Arc::new(
            BookRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建BookRepository: {}", e))?,
        );
        let patron_repo = Arc::new(
            PatronRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建PatronRepository: {}", e))?,
        );
        let circulation_repo = Arc::new(
            CirculationRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建CirculationRepository: {}", e))?,
        );
        let attendance_repo = Arc::new(
            AttendanceRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建AttendanceRepository: {}", e))?,
        );
        let action_log_repo = Arc::new(
            ActionLogRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ActionLogRepository: {}", e))?,
        );
        let policy = Arc::new(
            PolicyManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建PolicyManager: {}", e))?,
        );

        let book_api = Arc::new(BookApi::new(book_repo.clone(), action_log_repo.clone()));
        let patron_api = Arc::new(PatronApi::new(
            patron_repo.clone(),
            policy.clone(),
            action_log_repo.clone(),
        ));
        let circulation_api = Arc::new(CirculationApi::new(
            policy.clone(),
            circulation_repo.clone(),
            patron_repo.clone(),
            action_log_repo.clone(),
        ));
        let settings_api = Arc::new(SettingsApi::new(policy.clone(), action_log_repo.clone()));
        let attendance_api = Arc::new(AttendanceApi::new(attendance_repo.clone()));

        Ok(Self {
            db_path,
            book_api,
            patron_api,
            circulation_api,
            settings_api,
            attendance_api,
            book_repo,
            patron_repo,
            circulation_repo,
            attendance_repo,
            action_log_repo,
            policy,
            _temp_file: temp_file,
        })
    }

    /// 打开一条独立连接（直接 SQL 数据准备/断言用）
    pub fn raw_connection(&self) -> Connection {
        open_sqlite_connection(&self.db_path).expect("无法打开测试数据库")
    }

    // ==========================================
    // 测试数据准备
    // ==========================================

    /// 编目一本书（含 N 个副本）
    pub fn create_book(&self, title: &str, copies: i64) -> BookWithCopies {
        self.book_api
            .create_book(&new_book(title, copies), "tester", day(0))
            .expect("编目失败")
    }

    /// 注册一个读者
    pub fn register_patron(&self, first: &str, last: &str, email: &str) -> PatronView {
        self.patron_api
            .register(&new_patron(first, last, email), "tester", day(0))
            .expect("注册失败")
    }
}

/// 最小编目入参
pub fn new_book(title: &str, copies: i64) -> NewBook {
    NewBook {
        title: title.to_string(),
        author: Some("Test Author".to_string()),
        edition: None,
        publisher: None,
        place_of_publication: None,
        copyright: Some("2020".to_string()),
        isbn: None,
        class_section: "Gen. Circulation".to_string(),
        dewey_decimal: "005.1".to_string(),
        author_number: Some("T32".to_string()),
        source: "library".to_string(),
        source_person: None,
        location_of_book: None,
        material_type: None,
        notes: None,
        copies,
    }
}

/// 最小注册入参
pub fn new_patron(first: &str, last: &str, email: &str) -> NewPatron {
    NewPatron {
        patron_id: None,
        first_name: first.to_string(),
        middle_name: None,
        last_name: last.to_string(),
        suffix: None,
        email: email.to_string(),
        barangay: None,
        city: "Iloilo City".to_string(),
        province: "Iloilo".to_string(),
        number: None,
        age: Some(20),
        gender: None,
        notes: None,
    }
}
