// ==========================================
// 图书馆管理系统 - 领域层
// ==========================================
// 职责: 实体与类型定义，不含持久化与业务编排
// ==========================================

pub mod action_log;
pub mod attendance;
pub mod book;
pub mod circulation;
pub mod patron;
pub mod types;

// 重导出核心实体
pub use action_log::{ActionLog, ActionType};
pub use attendance::{Attendance, NewAttendance};
pub use book::{Book, BookCopy, BookWithCopies, CopyWithBook, NewBook};
pub use circulation::{
    Circulation, CirculationReport, CirculationSummary, PatronStats, PatronTransactionRow,
};
pub use patron::{NewPatron, Patron, PatronUpdate, PatronView};
pub use types::{CirculationStatus, CopyStatus, Gender, PatronStatus, SortOrder};
