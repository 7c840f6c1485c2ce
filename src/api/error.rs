// ==========================================
// 图书馆管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/引擎错误为用户可读的业务错误
// 红线: 流通操作的错误必须原样上抛给调用方，不得静默吞掉
// ==========================================

use crate::engine::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("输入校验失败: {0}")]
    ValidationError(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 流通业务错误
    // ==========================================
    /// 读者不存在或状态不是 Active
    #[error("读者不可借阅: {0}")]
    PatronIneligible(String),

    /// 副本不存在或不在可借状态
    #[error("副本不可借出: {0}")]
    CopyUnavailable(String),

    /// 归还/续借/遗失操作的对象不在借出状态
    #[error("流通记录不在借出状态: {0}")]
    NotCurrentlyBorrowed(String),

    /// 续借次数已达政策上限
    #[error("已达续借次数上限: {0}")]
    RenewalLimitReached(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// 说明: 状态守卫未命中时仓储返回 InvalidStateTransition，
//       据 entity 归因到对应的流通业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }

            RepositoryError::InvalidStateTransition { entity, from, to } => match entity.as_str() {
                "BookCopy" => ApiError::CopyUnavailable(format!("副本当前状态为 {}", from)),
                "Circulation" => {
                    ApiError::NotCurrentlyBorrowed(format!("记录当前状态为 {}", from))
                }
                _ => ApiError::BusinessRuleViolation(format!(
                    "无效的状态转换: {} {} -> {}",
                    entity, from, to
                )),
            },

            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),

            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PatronIneligible { patron_id, status } => {
                ApiError::PatronIneligible(format!("patron_id={}, status={}", patron_id, status))
            }
            EngineError::NotCurrentlyBorrowed {
                circulation_id,
                status,
            } => ApiError::NotCurrentlyBorrowed(format!(
                "id={}, status={}",
                circulation_id, status
            )),
            EngineError::RenewalLimitReached {
                circulation_id,
                renewal_count,
                renewal_limit,
            } => ApiError::RenewalLimitReached(format!(
                "id={}, renewal_count={}, renewal_limit={}",
                circulation_id, renewal_count, renewal_limit
            )),
            EngineError::Policy(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
