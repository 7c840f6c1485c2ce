// ==========================================
// 图书馆管理系统 - 流通 API
// ==========================================
// 职责: 借出/归还/续借/遗失的编排 + 流通查询与统计
// 编排口径: API 加载数据 → 引擎评估 → 仓储在事务内落库
// 红线: 仓储层的状态守卫是并发下的最终裁决，引擎前置检查只用于快速失败
// ==========================================

use crate::config::PolicyManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::circulation::{
    Circulation, CirculationReport, CirculationSummary, PatronStats, PatronTransactionRow,
};
use crate::domain::types::SortOrder;
use crate::engine::CirculationEngine;
use crate::api::error::{ApiError, ApiResult};
use crate::repository::error::RepositoryError;
use crate::repository::{ActionLogRepository, CirculationRepository, PatronRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;

// ==========================================
// CirculationApi - 流通 API
// ==========================================

/// 流通API
///
/// 职责：
/// 1. 借出 / 归还 / 续借 / 标记遗失
/// 2. 流通记录查询（列表、单条）
/// 3. 流通统计与读者借阅记录
pub struct CirculationApi {
    engine: CirculationEngine<PolicyManager>,
    circulation_repo: Arc<CirculationRepository>,
    patron_repo: Arc<PatronRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl CirculationApi {
    /// 创建新的CirculationApi实例
    pub fn new(
        policy: Arc<PolicyManager>,
        circulation_repo: Arc<CirculationRepository>,
        patron_repo: Arc<PatronRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            engine: CirculationEngine::new(policy),
            circulation_repo,
            patron_repo,
            action_log_repo,
        }
    }

    /// 审计日志为尽力而为：失败只告警，不回滚已提交的流通操作
    fn log_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("操作日志写入失败(流通操作已完成): {}", e);
        }
    }

    // ==========================================
    // 借出
    // ==========================================

    /// 借出副本
    ///
    /// # 参数
    /// - book_copy_id: 副本内部ID
    /// - patron_public_id: 读者对外证号
    /// - operator: 操作人（显式调用方身份）
    /// - now: 借出时刻
    ///
    /// # 前置
    /// - 读者存在且状态为 Active（否则 PatronIneligible）
    /// - 副本存在且状态为 available（否则 CopyUnavailable）
    ///
    /// # 效果（原子）
    /// - 新建流通记录（status=borrowed）+ 副本置为 borrowed，同事务提交
    pub async fn borrow(
        &self,
        book_copy_id: i64,
        patron_public_id: &str,
        operator: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Circulation> {
        if patron_public_id.trim().is_empty() {
            return Err(ApiError::ValidationError("读者证号不能为空".to_string()));
        }

        // 借出前置：读者不存在与状态不符同归因为"不可借阅"
        let patron = self
            .patron_repo
            .find_by_public_id(patron_public_id)
            .map_err(|e| match e {
                RepositoryError::NotFound { .. } => ApiError::PatronIneligible(format!(
                    "读者不存在: patron_id={}",
                    patron_public_id
                )),
                other => other.into(),
            })?;
        self.engine.check_patron_eligibility(&patron)?;

        let terms = self.engine.open_loan(now).await?;

        // 副本不存在与不可借同归因为 CopyUnavailable（借出语境下的统一口径）
        let circulation = self
            .circulation_repo
            .insert_borrow(book_copy_id, patron.id, terms.issue_date, terms.due_date)
            .map_err(|e| match e {
                RepositoryError::NotFound { entity, id } if entity == "BookCopy" => {
                    ApiError::CopyUnavailable(format!("副本不存在: id={}", id))
                }
                other => other.into(),
            })?;

        tracing::info!(
            circulation_id = circulation.id,
            book_copy_id,
            patron_id = %patron.patron_id,
            due_date = %circulation.due_date,
            "副本借出"
        );
        self.log_action(ActionLog::new(
            ActionType::Borrow,
            "Circulation",
            circulation.id,
            operator,
            Some(format!(
                "copy={} patron={} due={}",
                book_copy_id, patron.patron_id, circulation.due_date
            )),
        ));

        Ok(circulation)
    }

    // ==========================================
    // 归还
    // ==========================================

    /// 归还副本
    ///
    /// # 计算
    /// - overdue_by = max(0, 应还→归还整天数)
    /// - fine = overdue_by × 每日罚金
    ///
    /// # 效果（原子）
    /// - 结清流通记录（status=returned）+ 仅本副本恢复 available
    pub async fn return_copy(
        &self,
        id: i64,
        operator: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Circulation> {
        let circulation = self.circulation_repo.find_by_id(id)?;
        let assessment = self.engine.assess_return(&circulation, now).await?;

        let updated = self.circulation_repo.apply_return(
            id,
            assessment.date_returned,
            assessment.overdue_by,
            assessment.fine,
        )?;

        tracing::info!(
            circulation_id = id,
            overdue_by = assessment.overdue_by,
            fine = assessment.fine,
            "副本归还"
        );
        self.log_action(ActionLog::new(
            ActionType::Return,
            "Circulation",
            id,
            operator,
            Some(format!(
                "overdue_by={} fine={}",
                assessment.overdue_by, assessment.fine
            )),
        ));

        Ok(updated)
    }

    // ==========================================
    // 续借
    // ==========================================

    /// 续借副本
    ///
    /// # 前置
    /// - 借出状态（否则 NotCurrentlyBorrowed）
    /// - renewal_count < 续借上限（否则 RenewalLimitReached）
    ///
    /// # 计算
    /// - 已逾期: 罚金累加，应还日期从续借时刻重新起算
    /// - 未逾期: 应还日期从原应还日期顺延
    pub async fn renew(
        &self,
        id: i64,
        operator: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Circulation> {
        let circulation = self.circulation_repo.find_by_id(id)?;
        let assessment = self.engine.assess_renewal(&circulation, now).await?;

        let updated = self.circulation_repo.apply_renewal(
            id,
            assessment.renewal_date,
            assessment.new_due_date,
            assessment.overdue_by,
            assessment.added_fine,
        )?;

        tracing::info!(
            circulation_id = id,
            renewal_count = updated.renewal_count,
            new_due_date = %updated.due_date,
            added_fine = assessment.added_fine,
            "副本续借"
        );
        self.log_action(ActionLog::new(
            ActionType::Renew,
            "Circulation",
            id,
            operator,
            Some(format!(
                "renewal_count={} new_due={} added_fine={}",
                updated.renewal_count, updated.due_date, assessment.added_fine
            )),
        ));

        Ok(updated)
    }

    // ==========================================
    // 标记遗失
    // ==========================================

    /// 标记遗失：流通记录与副本同时置为 lost
    ///
    /// 罚金保留已累计金额；该副本不再回到可借池。
    pub fn mark_lost(&self, id: i64, operator: &str) -> ApiResult<Circulation> {
        let circulation = self.circulation_repo.find_by_id(id)?;
        self.engine.check_currently_borrowed(&circulation)?;

        let updated = self.circulation_repo.apply_mark_lost(id)?;

        tracing::info!(circulation_id = id, "副本标记遗失");
        self.log_action(ActionLog::new(
            ActionType::MarkLost,
            "Circulation",
            id,
            operator,
            Some(format!("copy={}", updated.book_copy_id)),
        ));

        Ok(updated)
    }

    // ==========================================
    // 查询与统计
    // ==========================================

    pub fn get(&self, id: i64) -> ApiResult<Circulation> {
        Ok(self.circulation_repo.find_by_id(id)?)
    }

    /// 全部流通记录（含书目/读者摘要与派生 overdue 展示状态）
    pub fn list(&self, now: DateTime<Utc>) -> ApiResult<Vec<CirculationSummary>> {
        Ok(self.circulation_repo.list_summaries(now)?)
    }

    /// 流通统计（只读计数，无副作用）
    pub fn reports(&self, now: DateTime<Utc>) -> ApiResult<CirculationReport> {
        Ok(self.circulation_repo.count_report(now)?)
    }

    /// 读者借阅记录（按借出时间排序，方向可切换）
    pub fn patron_transactions(
        &self,
        patron_db_id: i64,
        order: SortOrder,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<PatronTransactionRow>> {
        // 读者不存在按 404 处理
        self.patron_repo.find_by_id(patron_db_id)?;
        Ok(self
            .circulation_repo
            .find_patron_transactions(patron_db_id, order, now)?)
    }

    /// 读者借阅统计
    pub fn patron_stats(&self, patron_db_id: i64, now: DateTime<Utc>) -> ApiResult<PatronStats> {
        self.patron_repo.find_by_id(patron_db_id)?;
        Ok(self.circulation_repo.patron_stats(patron_db_id, now)?)
    }
}
