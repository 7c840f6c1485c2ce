// ==========================================
// 图书馆管理系统 - 政策设置 API
// ==========================================
// 职责: 四项流通政策的查询与更新
// 红线: 范围校验在写入边界完成；读取永不失败（默认值兜底在政策层）
// ==========================================

use crate::config::{keys, ranges, PolicyManager};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::api::error::{ApiError, ApiResult};
use crate::repository::ActionLogRepository;
use std::sync::Arc;

// ==========================================
// SettingsApi - 政策设置 API
// ==========================================
pub struct SettingsApi {
    policy: Arc<PolicyManager>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl SettingsApi {
    /// 创建新的SettingsApi实例
    pub fn new(policy: Arc<PolicyManager>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            policy,
            action_log_repo,
        }
    }

    /// 闭区间范围校验（写入边界）
    fn validate_range(field: &str, value: i64, (min, max): (i64, i64)) -> ApiResult<()> {
        if value < min || value > max {
            return Err(ApiError::ValidationError(format!(
                "{} 必须在 [{}, {}] 范围内，收到 {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    fn update(&self, key: &str, value: i64, operator: &str) -> ApiResult<()> {
        self.policy
            .set_value(key, &value.to_string())
            .map_err(ApiError::Other)?;

        let log = ActionLog::new(
            ActionType::UpdateSetting,
            "Setting",
            key,
            operator,
            Some(format!("value={}", value)),
        );
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("操作日志写入失败(设置已更新): {}", e);
        }

        tracing::info!(key, value, operator, "政策项更新");
        Ok(())
    }

    // ==========================================
    // 借阅天数
    // ==========================================

    pub fn get_loan_days(&self) -> ApiResult<i64> {
        self.policy.loan_days_sync().map_err(ApiError::Other)
    }

    pub fn update_loan_days(&self, value: i64, operator: &str) -> ApiResult<i64> {
        Self::validate_range("loan_days", value, ranges::LOAN_DAYS)?;
        self.update(keys::DEFAULT_LOAN_DAYS, value, operator)?;
        Ok(value)
    }

    // ==========================================
    // 每日罚金
    // ==========================================

    pub fn get_fine_per_day(&self) -> ApiResult<i64> {
        self.policy.fine_per_day_sync().map_err(ApiError::Other)
    }

    pub fn update_fine_per_day(&self, value: i64, operator: &str) -> ApiResult<i64> {
        Self::validate_range("fine_per_day", value, ranges::FINE_PER_DAY)?;
        self.update(keys::FINE_PER_DAY, value, operator)?;
        Ok(value)
    }

    // ==========================================
    // 续借次数上限
    // ==========================================

    pub fn get_renewal_limit(&self) -> ApiResult<i64> {
        self.policy.renewal_limit_sync().map_err(ApiError::Other)
    }

    pub fn update_renewal_limit(&self, value: i64, operator: &str) -> ApiResult<i64> {
        Self::validate_range("renewal_limit", value, ranges::RENEWAL_LIMIT)?;
        self.update(keys::RENEWAL_LIMIT, value, operator)?;
        Ok(value)
    }

    // ==========================================
    // 读者证有效年限
    // ==========================================

    pub fn get_expiration_years(&self) -> ApiResult<i64> {
        self.policy.expiration_years_sync().map_err(ApiError::Other)
    }

    pub fn update_expiration_years(&self, value: i64, operator: &str) -> ApiResult<i64> {
        Self::validate_range("expiration_years", value, ranges::EXPIRATION_YEARS)?;
        self.update(keys::PATRON_EXPIRATION_YEARS, value, operator)?;
        Ok(value)
    }
}
