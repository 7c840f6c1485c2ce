// ==========================================
// 图书馆管理系统 - 流通相关路由
// ==========================================

use crate::api::ApiError;
use crate::app::AppState;
use crate::domain::circulation::{
    Circulation, CirculationReport, CirculationSummary, PatronStats,
};
use crate::i18n::t;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::operator_from;

#[derive(Deserialize)]
pub struct BorrowRequest {
    pub book_copy_id: i64,
    /// 读者对外证号
    pub patron_id: String,
}

#[derive(Serialize)]
pub struct CirculationResponse {
    pub message: String,
    pub circulation: Circulation,
}

/// POST /circulations/borrow - 借出副本
pub async fn borrow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<CirculationResponse>), ApiError> {
    let operator = operator_from(&headers);
    let circulation = state
        .circulation_api
        .borrow(req.book_copy_id, &req.patron_id, &operator, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CirculationResponse {
            message: t("circulation.borrowed"),
            circulation,
        }),
    ))
}

/// PUT /circulations/{id}/return - 归还副本
pub async fn return_copy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CirculationResponse>, ApiError> {
    let operator = operator_from(&headers);
    let circulation = state
        .circulation_api
        .return_copy(id, &operator, Utc::now())
        .await?;

    Ok(Json(CirculationResponse {
        message: t("circulation.returned"),
        circulation,
    }))
}

/// PUT /circulations/{id}/renew - 续借副本
pub async fn renew(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CirculationResponse>, ApiError> {
    let operator = operator_from(&headers);
    let circulation = state
        .circulation_api
        .renew(id, &operator, Utc::now())
        .await?;

    Ok(Json(CirculationResponse {
        message: t("circulation.renewed"),
        circulation,
    }))
}

/// PUT /circulations/{id}/mark-lost - 标记遗失
pub async fn mark_lost(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<CirculationResponse>, ApiError> {
    let operator = operator_from(&headers);
    let circulation = state.circulation_api.mark_lost(id, &operator)?;

    Ok(Json(CirculationResponse {
        message: t("circulation.marked_lost"),
        circulation,
    }))
}

/// GET /circulations - 全部流通记录（含书目/读者摘要）
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CirculationSummary>>, ApiError> {
    Ok(Json(state.circulation_api.list(Utc::now())?))
}

/// GET /circulations/{id} - 单条流通记录
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Circulation>, ApiError> {
    Ok(Json(state.circulation_api.get(id)?))
}

/// GET /circulations/reports - 流通统计
pub async fn reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CirculationReport>, ApiError> {
    Ok(Json(state.circulation_api.reports(Utc::now())?))
}

/// GET /patrons/{id}/stats 的实现挂在读者路由模块，聚合数据仍来自流通层
pub(crate) fn patron_stats(state: &AppState, patron_db_id: i64) -> Result<PatronStats, ApiError> {
    state.circulation_api.patron_stats(patron_db_id, Utc::now())
}
