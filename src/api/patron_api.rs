// ==========================================
// 图书馆管理系统 - 读者 API
// ==========================================
// 职责: 读者注册、查询、更新、停用、删除
// 说明: 读者证到期日在每次读取时按政策派生，不落库
// ==========================================

use crate::config::PolicyManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::patron::{NewPatron, PatronUpdate, PatronView};
use crate::domain::types::PatronStatus;
use crate::api::error::{ApiError, ApiResult};
use crate::repository::{ActionLogRepository, PatronRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;

// ==========================================
// PatronApi - 读者 API
// ==========================================
pub struct PatronApi {
    patron_repo: Arc<PatronRepository>,
    policy: Arc<PolicyManager>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl PatronApi {
    /// 创建新的PatronApi实例
    pub fn new(
        patron_repo: Arc<PatronRepository>,
        policy: Arc<PolicyManager>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            patron_repo,
            policy,
            action_log_repo,
        }
    }

    fn expiration_years(&self) -> ApiResult<i64> {
        self.policy.expiration_years_sync().map_err(ApiError::Other)
    }

    fn log_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("操作日志写入失败: {}", e);
        }
    }

    fn validate_new(new: &NewPatron) -> ApiResult<()> {
        if new.first_name.trim().is_empty() {
            return Err(ApiError::ValidationError("first_name 不能为空".to_string()));
        }
        if new.last_name.trim().is_empty() {
            return Err(ApiError::ValidationError("last_name 不能为空".to_string()));
        }
        if !new.email.contains('@') {
            return Err(ApiError::ValidationError(format!(
                "email 格式错误: {}",
                new.email
            )));
        }
        if new.city.trim().is_empty() {
            return Err(ApiError::ValidationError("city 不能为空".to_string()));
        }
        if new.province.trim().is_empty() {
            return Err(ApiError::ValidationError("province 不能为空".to_string()));
        }
        Ok(())
    }

    // ==========================================
    // 注册
    // ==========================================

    /// 注册读者
    ///
    /// patron_id 为空时自动生成（P + 5位补零续号）。
    /// email / patron_id 的唯一性由数据库约束兜底。
    pub fn register(
        &self,
        new: &NewPatron,
        operator: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<PatronView> {
        Self::validate_new(new)?;

        let patron_id = match &new.patron_id {
            Some(pid) if !pid.trim().is_empty() => pid.trim().to_string(),
            _ => self.patron_repo.next_patron_id()?,
        };

        let patron = self.patron_repo.insert(new, &patron_id, now)?;

        tracing::info!(patron_id = %patron.patron_id, "读者注册");
        self.log_action(ActionLog::new(
            ActionType::RegisterPatron,
            "Patron",
            patron.id,
            operator,
            Some(format!("patron_id={}", patron.patron_id)),
        ));

        Ok(PatronView::derive(patron, self.expiration_years()?))
    }

    /// 预生成下一个读者证号（注册表单用）
    pub fn generate_patron_id(&self) -> ApiResult<String> {
        Ok(self.patron_repo.next_patron_id()?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn list(&self) -> ApiResult<Vec<PatronView>> {
        let years = self.expiration_years()?;
        let patrons = self.patron_repo.list()?;
        Ok(patrons
            .into_iter()
            .map(|p| PatronView::derive(p, years))
            .collect())
    }

    pub fn get(&self, id: i64) -> ApiResult<PatronView> {
        let patron = self.patron_repo.find_by_id(id)?;
        Ok(PatronView::derive(patron, self.expiration_years()?))
    }

    pub fn get_by_public_id(&self, patron_id: &str) -> ApiResult<PatronView> {
        let patron = self.patron_repo.find_by_public_id(patron_id)?;
        Ok(PatronView::derive(patron, self.expiration_years()?))
    }

    // ==========================================
    // 更新 / 停用 / 删除
    // ==========================================

    pub fn update(&self, id: i64, update: &PatronUpdate) -> ApiResult<PatronView> {
        if let Some(email) = &update.email {
            if !email.contains('@') {
                return Err(ApiError::ValidationError(format!(
                    "email 格式错误: {}",
                    email
                )));
            }
        }
        let patron = self.patron_repo.update(id, update)?;
        Ok(PatronView::derive(patron, self.expiration_years()?))
    }

    /// 停用读者账户（停用后不可借阅）
    pub fn deactivate(&self, id: i64, operator: &str) -> ApiResult<PatronView> {
        let patron = self.patron_repo.set_status(id, PatronStatus::Deactivated)?;

        tracing::info!(patron_id = %patron.patron_id, "读者停用");
        self.log_action(ActionLog::new(
            ActionType::DeactivatePatron,
            "Patron",
            id,
            operator,
            None,
        ));

        Ok(PatronView::derive(patron, self.expiration_years()?))
    }

    pub fn delete(&self, id: i64) -> ApiResult<()> {
        Ok(self.patron_repo.delete(id)?)
    }
}
