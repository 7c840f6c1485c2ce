// ==========================================
// 图书馆管理系统 - 到馆登记领域模型
// ==========================================
// 用途: 访客签到/签退表
// ==========================================

use crate::domain::types::Gender;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Attendance - 到馆登记记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub name: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub address: Option<String>,
    pub purpose_of_visit: String,

    // ===== 时间信息 =====
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewAttendance - 签到入参
// ==========================================
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub name: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub address: Option<String>,
    pub purpose_of_visit: String,
}
