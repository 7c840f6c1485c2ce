// ==========================================
// 图书馆管理系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 馆藏流通与读者服务的记录系统
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 流通业务规则
pub mod engine;

// 配置层 - 流通政策
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// HTTP 服务层
pub mod server;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CirculationStatus, CopyStatus, Gender, PatronStatus, SortOrder};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Attendance, Book, BookCopy, BookWithCopies, Circulation,
    CirculationReport, CirculationSummary, Patron, PatronStats, PatronTransactionRow, PatronView,
};

// 引擎
pub use engine::{CirculationCore, CirculationEngine, EngineError};

// 配置
pub use config::{PolicyManager, PolicyReader};

// API
pub use api::{
    ApiError, ApiResult, AttendanceApi, BookApi, CirculationApi, PatronApi, SettingsApi,
};

// 应用
pub use app::{get_default_db_path, AppState};

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
