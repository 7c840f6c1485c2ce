// ==========================================
// 图书馆管理系统 - 引擎层
// ==========================================
// 职责: 流通业务规则（资格判定、时间与金额派生）
// 红线: 引擎只计算，不持久化
// ==========================================

pub mod circulation;
pub mod circulation_core;

pub use circulation::{
    CirculationEngine, EngineError, LoanTerms, RenewalAssessment, ReturnAssessment,
};
pub use circulation_core::CirculationCore;
