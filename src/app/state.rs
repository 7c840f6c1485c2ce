// ==========================================
// 图书馆管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储与政策管理器共享同一个 SQLite 连接，
//       写操作经由该连接上的事务串行化
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AttendanceApi, BookApi, CirculationApi, PatronApi, SettingsApi};
use crate::config::PolicyManager;
use crate::db::open_sqlite_connection;
use crate::repository::{
    ActionLogRepository, AttendanceRepository, BookRepository, CirculationRepository,
    PatronRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
/// 在 HTTP 服务中作为全局状态管理
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 编目API
    pub book_api: Arc<BookApi>,

    /// 读者API
    pub patron_api: Arc<PatronApi>,

    /// 流通API
    pub circulation_api: Arc<CirculationApi>,

    /// 政策设置API
    pub settings_api: Arc<SettingsApi>,

    /// 到馆登记API
    pub attendance_api: Arc<AttendanceApi>,

    /// 操作日志仓储（审计页用）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接（统一 PRAGMA）
    /// 2. 初始化所有Repository（建表）
    /// 3. 创建政策管理器与所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        // 编目先建表：circulations 的外键引用 books / book_copies / patrons
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

        // ==========================================
        // 初始化政策管理器
        // ==========================================
        let policy = Arc::new(
            PolicyManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建PolicyManager: {}", e))?,
        );

        // ==========================================
        // 创建API实例
        // ==========================================
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

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            book_api,
            patron_api,
            circulation_api,
            settings_api,
            attendance_api,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("LIBRARY_MS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖
    let mut path = PathBuf::from("./library_ms.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("library-ms-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("library-ms");
        }

        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!("无法创建数据目录 {:?}: {}", path, e);
            return "./library_ms.db".to_string();
        }
        path = path.join("library_ms.db");
    }

    path.to_string_lossy().to_string()
}
