// ==========================================
// 图书馆管理系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入操作必须记录操作人（显式传入，不依赖隐式"当前用户"）
// 用途: 审计追踪
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Borrow,           // 借出
    Return,           // 归还
    Renew,            // 续借
    MarkLost,         // 标记遗失
    AccessionBook,    // 图书编目入藏
    RegisterPatron,   // 读者注册
    DeactivatePatron, // 读者停用
    UpdateSetting,    // 政策项更新
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::Borrow => "Borrow",
            ActionType::Return => "Return",
            ActionType::Renew => "Renew",
            ActionType::MarkLost => "MarkLost",
            ActionType::AccessionBook => "AccessionBook",
            ActionType::RegisterPatron => "RegisterPatron",
            ActionType::DeactivatePatron => "DeactivatePatron",
            ActionType::UpdateSetting => "UpdateSetting",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String, // UUID
    pub action_type: String,
    pub entity: String,    // 实体类型 (Circulation / Patron / Book / Setting)
    pub entity_id: String, // 实体标识
    pub actor: String,     // 操作人（显式调用方身份）
    pub detail: Option<String>,
    pub action_ts: DateTime<Utc>,
}

impl ActionLog {
    /// 创建新的操作日志（自动生成 UUID 和时间戳）
    pub fn new(
        action_type: ActionType,
        entity: &str,
        entity_id: impl ToString,
        actor: &str,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            actor: actor.to_string(),
            detail,
            action_ts: Utc::now(),
        }
    }
}
