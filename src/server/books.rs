// ==========================================
// 图书馆管理系统 - 编目相关路由
// ==========================================

use crate::api::ApiError;
use crate::app::AppState;
use crate::domain::book::{BookWithCopies, CopyWithBook, NewBook};
use crate::i18n::t;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::operator_from;

#[derive(Serialize)]
pub struct BookResponse {
    pub message: String,
    pub book: BookWithCopies,
}

/// GET /books - 全部书目（含副本）
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookWithCopies>>, ApiError> {
    Ok(Json(state.book_api.list()?))
}

/// POST /books - 编目入藏（书目 + 初始副本）
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewBook>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let operator = operator_from(&headers);
    let book = state.book_api.create_book(&req, &operator, Utc::now())?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            message: t("book.created"),
            book,
        }),
    ))
}

/// GET /books/{id} - 书目详情（含副本）
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<BookWithCopies>, ApiError> {
    Ok(Json(state.book_api.get(id)?))
}

/// GET /books/copy/{barcode} - 按条码查副本
pub async fn by_barcode(
    State(state): State<Arc<AppState>>,
    Path(barcode): Path<String>,
) -> Result<Json<CopyWithBook>, ApiError> {
    Ok(Json(state.book_api.get_copy_by_barcode(&barcode)?))
}
