// ==========================================
// 图书馆管理系统 - 配置层
// ==========================================
// 职责: 流通政策项（借阅天数/罚金/续借上限/证件年限）的存取
// ==========================================

pub mod policy;

pub use policy::{defaults, keys, ranges, PolicyManager, PolicyReader};
