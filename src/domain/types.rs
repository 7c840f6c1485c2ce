// ==========================================
// 图书馆管理系统 - 领域类型定义
// ==========================================
// 状态口径: 与数据库存储的字符串一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 馆藏副本状态 (Copy Status)
// ==========================================
// 红线: 状态只能由流通引擎变更
// 序列化格式: 小写 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Available, // 在架可借
    Borrowed,  // 已借出
    Lost,      // 遗失
    Archived,  // 封存
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::Lost => "lost",
            CopyStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CopyStatus::Available),
            "borrowed" => Ok(CopyStatus::Borrowed),
            "lost" => Ok(CopyStatus::Lost),
            "archived" => Ok(CopyStatus::Archived),
            other => Err(format!("未知的副本状态: {}", other)),
        }
    }
}

// ==========================================
// 读者状态 (Patron Status)
// ==========================================
// 序列化格式: 首字母大写 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatronStatus {
    Active,      // 正常
    Deactivated, // 停用
    Blocked,     // 冻结
}

impl PatronStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatronStatus::Active => "Active",
            PatronStatus::Deactivated => "Deactivated",
            PatronStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for PatronStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PatronStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(PatronStatus::Active),
            "Deactivated" => Ok(PatronStatus::Deactivated),
            "Blocked" => Ok(PatronStatus::Blocked),
            other => Err(format!("未知的读者状态: {}", other)),
        }
    }
}

// ==========================================
// 流通状态 (Circulation Status)
// ==========================================
// 红线: "overdue" 不是存储状态，由 is_overdue 在读取时派生
// 序列化格式: 小写 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CirculationStatus {
    Borrowed, // 借出中
    Returned, // 已归还
    Lost,     // 遗失
}

impl CirculationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CirculationStatus::Borrowed => "borrowed",
            CirculationStatus::Returned => "returned",
            CirculationStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for CirculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CirculationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(CirculationStatus::Borrowed),
            "returned" => Ok(CirculationStatus::Returned),
            "lost" => Ok(CirculationStatus::Lost),
            other => Err(format!("未知的流通状态: {}", other)),
        }
    }
}

// ==========================================
// 性别 (Gender) - 到馆登记用
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("未知的性别: {}", other)),
        }
    }
}

// ==========================================
// 排序方向 (Sort Order) - 读者借阅记录列表用
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Newest, // 最新在前 (issue_date DESC)
    Oldest, // 最早在前 (issue_date ASC)
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_status_roundtrip() {
        for s in ["available", "borrowed", "lost", "archived"] {
            let status: CopyStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("破损".parse::<CopyStatus>().is_err());
    }

    #[test]
    fn test_patron_status_roundtrip() {
        for s in ["Active", "Deactivated", "Blocked"] {
            let status: PatronStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        // 数据库存储为首字母大写，小写不应解析成功
        assert!("active".parse::<PatronStatus>().is_err());
    }

    #[test]
    fn test_circulation_status_serde() {
        let json = serde_json::to_string(&CirculationStatus::Borrowed).unwrap();
        assert_eq!(json, "\"borrowed\"");

        let status: CirculationStatus = serde_json::from_str("\"returned\"").unwrap();
        assert_eq!(status, CirculationStatus::Returned);
    }
}
