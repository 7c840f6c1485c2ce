// ==========================================
// 图书馆管理系统 - 应用层
// ==========================================
// 职责: 共享状态装配，连接 HTTP 服务与后端
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
