// ==========================================
// 图书馆管理系统 - 读者领域模型
// ==========================================
// 红线: expiry_date 为派生字段（注册时间 + 有效年限），不落库
// ==========================================

use crate::domain::types::PatronStatus;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Patron - 读者档案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patron {
    pub id: i64,
    pub patron_id: String, // 对外读者证号 (P#####)

    // ===== 姓名 =====
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,

    // ===== 联系方式 =====
    pub email: String,
    pub barangay: Option<String>,
    pub city: String,
    pub province: String,
    pub number: Option<String>,

    // ===== 基本信息 =====
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub notes: Option<String>,

    // ===== 状态 =====
    pub status: PatronStatus,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
}

/// 读者视图：档案 + 派生的读者证到期日
///
/// 到期日 = created_at + 有效年限（政策项 patron_expiration_years），
/// 每次读取时重新计算，不存储。
#[derive(Debug, Clone, Serialize)]
pub struct PatronView {
    #[serde(flatten)]
    pub patron: Patron,
    pub expiry_date: DateTime<Utc>,
}

impl PatronView {
    pub fn derive(patron: Patron, expiration_years: i64) -> Self {
        let expiry_date = add_years(patron.created_at, expiration_years);
        Self {
            patron,
            expiry_date,
        }
    }
}

/// 注册时间加 N 年
///
/// 闰日（2-29）在目标年不存在时回退到 2-28。
pub fn add_years(ts: DateTime<Utc>, years: i64) -> DateTime<Utc> {
    let target_year = ts.year() + years as i32;
    ts.with_year(target_year).unwrap_or_else(|| {
        ts.with_day(28)
            .and_then(|t| t.with_year(target_year))
            .unwrap_or(ts)
    })
}

// ==========================================
// NewPatron - 注册入参
// ==========================================
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatron {
    /// 为空时自动生成
    pub patron_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email: String,
    pub barangay: Option<String>,
    pub city: String,
    pub province: String,
    pub number: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub notes: Option<String>,
}

// ==========================================
// PatronUpdate - 更新入参（sometimes 语义：None 表示不修改）
// ==========================================
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatronUpdate {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub email: Option<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub number: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_years() {
        let ts = Utc.with_ymd_and_hms(2023, 9, 7, 10, 30, 0).unwrap();
        let expiry = add_years(ts, 3);
        assert_eq!(expiry.year(), 2026);
        assert_eq!(expiry.month(), 9);
        assert_eq!(expiry.day(), 7);
    }

    #[test]
    fn test_add_years_leap_day() {
        // 2024-02-29 + 3年 → 2027-02-28（2027 无闰日）
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap();
        let expiry = add_years(ts, 3);
        assert_eq!(expiry.year(), 2027);
        assert_eq!(expiry.month(), 2);
        assert_eq!(expiry.day(), 28);
    }

    #[test]
    fn test_patron_view_derivation() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let patron = Patron {
            id: 1,
            patron_id: "P00001".to_string(),
            first_name: "Juan".to_string(),
            middle_name: None,
            last_name: "Dela Cruz".to_string(),
            suffix: None,
            email: "juan@example.com".to_string(),
            barangay: None,
            city: "Quezon City".to_string(),
            province: "Metro Manila".to_string(),
            number: None,
            age: Some(21),
            gender: None,
            notes: None,
            status: PatronStatus::Active,
            created_at: ts,
        };

        let view = PatronView::derive(patron, 3);
        assert_eq!(view.expiry_date.year(), 2027);
    }
}
