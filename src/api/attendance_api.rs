// ==========================================
// 图书馆管理系统 - 到馆登记 API
// ==========================================
// 职责: 访客签到/签退与登记查询
// ==========================================

use crate::domain::attendance::{Attendance, NewAttendance};
use crate::api::error::{ApiError, ApiResult};
use crate::repository::AttendanceRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;

// ==========================================
// AttendanceApi - 到馆登记 API
// ==========================================
pub struct AttendanceApi {
    attendance_repo: Arc<AttendanceRepository>,
}

impl AttendanceApi {
    /// 创建新的AttendanceApi实例
    pub fn new(attendance_repo: Arc<AttendanceRepository>) -> Self {
        Self { attendance_repo }
    }

    /// 签到
    pub fn time_in(&self, new: &NewAttendance, now: DateTime<Utc>) -> ApiResult<Attendance> {
        if new.name.trim().is_empty() {
            return Err(ApiError::ValidationError("name 不能为空".to_string()));
        }
        if new.purpose_of_visit.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "purpose_of_visit 不能为空".to_string(),
            ));
        }
        Ok(self.attendance_repo.insert(new, now)?)
    }

    /// 签退（重复签退报错）
    pub fn time_out(&self, id: i64, now: DateTime<Utc>) -> ApiResult<Attendance> {
        Ok(self.attendance_repo.time_out(id, now)?)
    }

    /// 全部登记记录，最新在前
    pub fn list(&self) -> ApiResult<Vec<Attendance>> {
        Ok(self.attendance_repo.list()?)
    }

    /// 当日登记记录
    pub fn today(&self, now: DateTime<Utc>) -> ApiResult<Vec<Attendance>> {
        Ok(self.attendance_repo.list_today(now)?)
    }
}
