// ==========================================
// 图书馆管理系统 - 读者相关路由
// ==========================================

use crate::api::ApiError;
use crate::app::AppState;
use crate::domain::circulation::{PatronStats, PatronTransactionRow};
use crate::domain::patron::{NewPatron, PatronUpdate, PatronView};
use crate::domain::types::SortOrder;
use crate::i18n::t;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::operator_from;

#[derive(Serialize)]
pub struct PatronResponse {
    pub message: String,
    pub patron: PatronView,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct GeneratedIdResponse {
    pub patron_id: String,
}

#[derive(Deserialize)]
pub struct TransactionsQuery {
    /// newest（默认）| oldest
    #[serde(default)]
    pub order: SortOrder,
}

/// GET /patrons - 全部读者（含派生到期日）
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PatronView>>, ApiError> {
    Ok(Json(state.patron_api.list()?))
}

/// POST /patrons - 注册读者
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewPatron>,
) -> Result<(StatusCode, Json<PatronResponse>), ApiError> {
    let operator = operator_from(&headers);
    let patron = state.patron_api.register(&req, &operator, Utc::now())?;

    Ok((
        StatusCode::CREATED,
        Json(PatronResponse {
            message: t("patron.registered"),
            patron,
        }),
    ))
}

/// GET /patrons/{id} - 单个读者
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PatronView>, ApiError> {
    Ok(Json(state.patron_api.get(id)?))
}

/// GET /patrons/by-id/{patron_id} - 按对外证号查读者
pub async fn by_public_id(
    State(state): State<Arc<AppState>>,
    Path(patron_id): Path<String>,
) -> Result<Json<PatronView>, ApiError> {
    Ok(Json(state.patron_api.get_by_public_id(&patron_id)?))
}

/// PUT /patrons/{id} - 更新读者
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<PatronUpdate>,
) -> Result<Json<PatronResponse>, ApiError> {
    let patron = state.patron_api.update(id, &req)?;

    Ok(Json(PatronResponse {
        message: t("patron.updated"),
        patron,
    }))
}

/// DELETE /patrons/{id} - 删除读者
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.patron_api.delete(id)?;

    Ok(Json(MessageResponse {
        message: t("patron.deleted"),
    }))
}

/// PATCH /patrons/{id}/deactivate - 停用读者账户
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<PatronResponse>, ApiError> {
    let operator = operator_from(&headers);
    let patron = state.patron_api.deactivate(id, &operator)?;

    Ok(Json(PatronResponse {
        message: t("patron.deactivated"),
        patron,
    }))
}

/// GET /patrons/generate-id - 预生成读者证号
pub async fn generate_id(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GeneratedIdResponse>, ApiError> {
    Ok(Json(GeneratedIdResponse {
        patron_id: state.patron_api.generate_patron_id()?,
    }))
}

/// GET /patrons/{id}/stats - 读者借阅统计
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PatronStats>, ApiError> {
    Ok(Json(super::circulation::patron_stats(&state, id)?))
}

/// GET /patrons/{id}/transactions - 读者借阅记录
pub async fn transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<PatronTransactionRow>>, ApiError> {
    Ok(Json(state.circulation_api.patron_transactions(
        id,
        query.order,
        Utc::now(),
    )?))
}
