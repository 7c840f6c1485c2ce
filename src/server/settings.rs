// ==========================================
// 图书馆管理系统 - 政策设置相关路由
// ==========================================
// 口径: GET 返回当前值（缺失时为默认值）；POST 范围校验后落库
// ==========================================

use crate::api::ApiError;
use crate::app::AppState;
use crate::i18n::t;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::operator_from;

// ==========================================
// 借阅天数
// ==========================================

#[derive(Serialize)]
pub struct LoanDaysValue {
    pub loan_days: i64,
}

#[derive(Deserialize)]
pub struct LoanDaysRequest {
    pub loan_days: i64,
}

#[derive(Serialize)]
pub struct LoanDaysUpdated {
    pub message: String,
    pub loan_days: i64,
}

/// GET /settings/loan-days
pub async fn get_loan_days(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LoanDaysValue>, ApiError> {
    Ok(Json(LoanDaysValue {
        loan_days: state.settings_api.get_loan_days()?,
    }))
}

/// POST /settings/loan-days
pub async fn update_loan_days(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoanDaysRequest>,
) -> Result<Json<LoanDaysUpdated>, ApiError> {
    let operator = operator_from(&headers);
    let value = state.settings_api.update_loan_days(req.loan_days, &operator)?;

    Ok(Json(LoanDaysUpdated {
        message: t("settings.loan_days_updated"),
        loan_days: value,
    }))
}

// ==========================================
// 每日罚金
// ==========================================

#[derive(Serialize)]
pub struct FinePerDayValue {
    pub fine_per_day: i64,
}

#[derive(Deserialize)]
pub struct FinePerDayRequest {
    pub fine_per_day: i64,
}

#[derive(Serialize)]
pub struct FinePerDayUpdated {
    pub message: String,
    pub fine_per_day: i64,
}

/// GET /settings/fine-per-day
pub async fn get_fine_per_day(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FinePerDayValue>, ApiError> {
    Ok(Json(FinePerDayValue {
        fine_per_day: state.settings_api.get_fine_per_day()?,
    }))
}

/// POST /settings/fine-per-day
pub async fn update_fine_per_day(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<FinePerDayRequest>,
) -> Result<Json<FinePerDayUpdated>, ApiError> {
    let operator = operator_from(&headers);
    let value = state
        .settings_api
        .update_fine_per_day(req.fine_per_day, &operator)?;

    Ok(Json(FinePerDayUpdated {
        message: t("settings.fine_per_day_updated"),
        fine_per_day: value,
    }))
}

// ==========================================
// 续借次数上限
// ==========================================

#[derive(Serialize)]
pub struct RenewalLimitValue {
    pub renewal_limit: i64,
}

#[derive(Deserialize)]
pub struct RenewalLimitRequest {
    pub renewal_limit: i64,
}

#[derive(Serialize)]
pub struct RenewalLimitUpdated {
    pub message: String,
    pub renewal_limit: i64,
}

/// GET /settings/renewal-limit
pub async fn get_renewal_limit(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RenewalLimitValue>, ApiError> {
    Ok(Json(RenewalLimitValue {
        renewal_limit: state.settings_api.get_renewal_limit()?,
    }))
}

/// POST /settings/renewal-limit
pub async fn update_renewal_limit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RenewalLimitRequest>,
) -> Result<Json<RenewalLimitUpdated>, ApiError> {
    let operator = operator_from(&headers);
    let value = state
        .settings_api
        .update_renewal_limit(req.renewal_limit, &operator)?;

    Ok(Json(RenewalLimitUpdated {
        message: t("settings.renewal_limit_updated"),
        renewal_limit: value,
    }))
}

// ==========================================
// 读者证有效年限
// ==========================================

#[derive(Serialize)]
pub struct ExpirationYearsValue {
    pub expiration_years: i64,
}

#[derive(Deserialize)]
pub struct ExpirationYearsRequest {
    pub expiration_years: i64,
}

#[derive(Serialize)]
pub struct ExpirationYearsUpdated {
    pub message: String,
    pub expiration_years: i64,
}

/// GET /settings/expiration-years
pub async fn get_expiration_years(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExpirationYearsValue>, ApiError> {
    Ok(Json(ExpirationYearsValue {
        expiration_years: state.settings_api.get_expiration_years()?,
    }))
}

/// POST /settings/expiration-years
pub async fn update_expiration_years(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ExpirationYearsRequest>,
) -> Result<Json<ExpirationYearsUpdated>, ApiError> {
    let operator = operator_from(&headers);
    let value = state
        .settings_api
        .update_expiration_years(req.expiration_years, &operator)?;

    Ok(Json(ExpirationYearsUpdated {
        message: t("settings.expiration_years_updated"),
        expiration_years: value,
    }))
}
