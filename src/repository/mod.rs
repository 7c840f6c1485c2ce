// ==========================================
// 图书馆管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务规则（状态守卫除外）
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 借出/归还/续借的两表变更必须同事务提交
// ==========================================

pub mod action_log_repo;
pub mod attendance_repo;
pub mod book_repo;
pub mod circulation_repo;
pub mod error;
pub mod patron_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use attendance_repo::AttendanceRepository;
pub use book_repo::BookRepository;
pub use circulation_repo::CirculationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use patron_repo::PatronRepository;
