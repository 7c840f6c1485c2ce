// ==========================================
// 图书馆管理系统 - HTTP 服务层
// ==========================================
// 职责: axum 路由装配 + API 错误到 HTTP 状态码的映射
// 口径: 业务错误原样携带消息返回；内部错误只返回通用消息并记录日志
// ==========================================

pub mod attendance;
pub mod books;
pub mod circulation;
pub mod patrons;
pub mod settings;

use crate::api::ApiError;
use crate::app::AppState;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

// ==========================================
// 错误响应
// ==========================================

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PatronIneligible(_) => StatusCode::FORBIDDEN,
            ApiError::CopyUnavailable(_)
            | ApiError::NotCurrentlyBorrowed(_)
            | ApiError::RenewalLimitReached(_)
            | ApiError::BusinessRuleViolation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            e @ (ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "未预期的内部错误"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "内部错误".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

// ==========================================
// 调用方身份
// ==========================================

/// 从请求头提取操作人身份
///
/// 鉴权由上游代理完成（非本系统目标），这里只取经过认证的
/// X-Operator 头作为显式调用方身份，缺失时记为前台默认身份。
pub(crate) fn operator_from(headers: &HeaderMap) -> String {
    headers
        .get("x-operator")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("staff")
        .to_string()
}

// ==========================================
// 路由装配
// ==========================================

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // 编目
        .route("/books", get(books::list).post(books::create))
        .route("/books/:id", get(books::show))
        .route("/books/copy/:barcode", get(books::by_barcode))
        // 读者
        .route("/patrons", get(patrons::list).post(patrons::register))
        .route("/patrons/generate-id", get(patrons::generate_id))
        .route("/patrons/by-id/:patron_id", get(patrons::by_public_id))
        .route(
            "/patrons/:id",
            get(patrons::show)
                .put(patrons::update)
                .delete(patrons::destroy),
        )
        .route("/patrons/:id/stats", get(patrons::stats))
        .route("/patrons/:id/deactivate", patch(patrons::deactivate))
        .route("/patrons/:id/transactions", get(patrons::transactions))
        // 流通
        .route("/circulations", get(circulation::list))
        .route("/circulations/reports", get(circulation::reports))
        .route("/circulations/borrow", post(circulation::borrow))
        .route("/circulations/:id", get(circulation::show))
        .route("/circulations/:id/return", put(circulation::return_copy))
        .route("/circulations/:id/renew", put(circulation::renew))
        .route("/circulations/:id/mark-lost", put(circulation::mark_lost))
        // 政策设置
        .route(
            "/settings/loan-days",
            get(settings::get_loan_days).post(settings::update_loan_days),
        )
        .route(
            "/settings/fine-per-day",
            get(settings::get_fine_per_day).post(settings::update_fine_per_day),
        )
        .route(
            "/settings/renewal-limit",
            get(settings::get_renewal_limit).post(settings::update_renewal_limit),
        )
        .route(
            "/settings/expiration-years",
            get(settings::get_expiration_years).post(settings::update_expiration_years),
        )
        // 到馆登记
        .route(
            "/attendances",
            get(attendance::list).post(attendance::time_in),
        )
        .route("/attendances/today", get(attendance::today))
        .route("/attendances/:id/timeout", post(attendance::time_out))
        .layer(cors)
        .with_state(state)
}
