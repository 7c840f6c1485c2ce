// ==========================================
// 图书馆管理系统 - 流通引擎
// ==========================================
// 职责: 借出/归还/续借的资格判定与金额、时间派生
// 红线: 不直接写库，只计算和返回评估结果；持久化由仓储层在事务内完成
// 红线: 政策在每次操作开始时读取（显式注入，禁止隐藏单例）
// ==========================================

use crate::config::PolicyReader;
use crate::domain::circulation::Circulation;
use crate::domain::patron::Patron;
use crate::domain::types::{CirculationStatus, PatronStatus};
use crate::engine::circulation_core::CirculationCore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

// ==========================================
// EngineError - 流通引擎错误
// ==========================================
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("读者不可借阅: patron_id={patron_id}, status={status}")]
    PatronIneligible {
        patron_id: String,
        status: PatronStatus,
    },

    #[error("流通记录不在借出状态: id={circulation_id}, status={status}")]
    NotCurrentlyBorrowed {
        circulation_id: i64,
        status: CirculationStatus,
    },

    #[error("已达续借次数上限: id={circulation_id}, renewal_count={renewal_count}, renewal_limit={renewal_limit}")]
    RenewalLimitReached {
        circulation_id: i64,
        renewal_count: i64,
        renewal_limit: i64,
    },

    #[error(transparent)]
    Policy(#[from] anyhow::Error),
}

// ==========================================
// 评估结果
// ==========================================

/// 借出条款（新流通记录的时间字段）
#[derive(Debug, Clone)]
pub struct LoanTerms {
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// 归还结算
#[derive(Debug, Clone)]
pub struct ReturnAssessment {
    pub date_returned: DateTime<Utc>,
    pub overdue_by: i64,
    pub fine: f64,
}

/// 续借评估
#[derive(Debug, Clone)]
pub struct RenewalAssessment {
    pub renewal_date: DateTime<Utc>,
    pub new_due_date: DateTime<Utc>,
    pub overdue_by: i64,
    /// 本次续借新增罚金（累加到已有罚金上，不清零）
    pub added_fine: f64,
}

// ==========================================
// CirculationEngine - 流通引擎
// ==========================================
pub struct CirculationEngine<P>
where
    P: PolicyReader,
{
    policy: Arc<P>,
}

impl<P> CirculationEngine<P>
where
    P: PolicyReader,
{
    /// 创建新的 CirculationEngine 实例
    ///
    /// # 参数
    /// - policy: 政策读取器
    pub fn new(policy: Arc<P>) -> Self {
        Self { policy }
    }

    /// 借阅资格判定：仅 Active 读者可借
    pub fn check_patron_eligibility(&self, patron: &Patron) -> Result<(), EngineError> {
        if patron.status != PatronStatus::Active {
            return Err(EngineError::PatronIneligible {
                patron_id: patron.patron_id.clone(),
                status: patron.status,
            });
        }
        Ok(())
    }

    /// 流通记录必须在借出状态（归还/续借/遗失的共同前置）
    pub fn check_currently_borrowed(&self, circulation: &Circulation) -> Result<(), EngineError> {
        if circulation.status != CirculationStatus::Borrowed {
            return Err(EngineError::NotCurrentlyBorrowed {
                circulation_id: circulation.id,
                status: circulation.status,
            });
        }
        Ok(())
    }

    /// 评估借出条款
    ///
    /// # 参数
    /// - now: 借出时刻
    ///
    /// # 返回
    /// - LoanTerms: issue_date = now, due_date = now + 借阅天数
    #[instrument(skip(self))]
    pub async fn open_loan(&self, now: DateTime<Utc>) -> Result<LoanTerms, EngineError> {
        let loan_days = self.policy.loan_days().await?;
        Ok(LoanTerms {
            issue_date: now,
            due_date: CirculationCore::due_date_from(now, loan_days),
        })
    }

    /// 评估归还结算
    ///
    /// overdue_by = max(0, 应还→归还的整天数)
    /// fine = overdue_by × 每日罚金
    #[instrument(skip(self, circulation), fields(circulation_id = circulation.id))]
    pub async fn assess_return(
        &self,
        circulation: &Circulation,
        now: DateTime<Utc>,
    ) -> Result<ReturnAssessment, EngineError> {
        self.check_currently_borrowed(circulation)?;

        let fine_per_day = self.policy.fine_per_day().await?;
        let overdue_by = CirculationCore::overdue_days(circulation.due_date, now);

        Ok(ReturnAssessment {
            date_returned: now,
            overdue_by,
            fine: CirculationCore::fine_for(overdue_by, fine_per_day),
        })
    }

    /// 评估续借
    ///
    /// 前置: 借出状态且 renewal_count < 续借上限。
    /// 已逾期的续借会累加逾期罚金，且从续借时刻重新起算应还日期；
    /// 未逾期的续借从原应还日期顺延。
    #[instrument(skip(self, circulation), fields(circulation_id = circulation.id))]
    pub async fn assess_renewal(
        &self,
        circulation: &Circulation,
        now: DateTime<Utc>,
    ) -> Result<RenewalAssessment, EngineError> {
        self.check_currently_borrowed(circulation)?;

        let renewal_limit = self.policy.renewal_limit().await?;
        if circulation.renewal_count >= renewal_limit {
            return Err(EngineError::RenewalLimitReached {
                circulation_id: circulation.id,
                renewal_count: circulation.renewal_count,
                renewal_limit,
            });
        }

        let loan_days = self.policy.loan_days().await?;
        let fine_per_day = self.policy.fine_per_day().await?;

        let (new_due_date, overdue_by) =
            CirculationCore::renewal_due_date(circulation.due_date, now, loan_days);

        Ok(RenewalAssessment {
            renewal_date: now,
            new_due_date,
            overdue_by,
            added_fine: CirculationCore::fine_for(overdue_by, fine_per_day),
        })
    }
}
