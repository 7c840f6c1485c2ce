// ==========================================
// 图书馆管理系统 - 到馆登记相关路由
// ==========================================

use crate::api::ApiError;
use crate::app::AppState;
use crate::domain::attendance::{Attendance, NewAttendance};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

/// GET /attendances - 全部登记记录（最新在前）
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    Ok(Json(state.attendance_api.list()?))
}

/// POST /attendances - 访客签到
pub async fn time_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewAttendance>,
) -> Result<(StatusCode, Json<Attendance>), ApiError> {
    let attendance = state.attendance_api.time_in(&req, Utc::now())?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

/// POST /attendances/{id}/timeout - 访客签退
pub async fn time_out(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Attendance>, ApiError> {
    Ok(Json(state.attendance_api.time_out(id, Utc::now())?))
}

/// GET /attendances/today - 当日登记
pub async fn today(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
    Ok(Json(state.attendance_api.today(Utc::now())?))
}
