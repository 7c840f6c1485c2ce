// ==========================================
// 图书馆管理系统 - 流通领域模型
// ==========================================
// Circulation: 一次"借出→归还"流通记录
// 红线: 记录只追加/更新，不删除（形成审计轨迹）
// 红线: "overdue" 由 is_overdue 派生，不作为存储状态
// ==========================================

use crate::domain::types::CirculationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Circulation - 流通记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circulation {
    pub id: i64,
    pub book_copy_id: i64,
    pub patron_id: i64, // patrons.id（内部主键，非对外证号）

    // ===== 时间信息 =====
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub date_returned: Option<DateTime<Utc>>,

    // ===== 计费信息 =====
    pub renewal_count: i64, // ≥0
    pub overdue_by: i64,    // 逾期整天数，≥0
    pub fine: f64,          // 累计罚金，≥0，续借不清零

    // ===== 状态 =====
    pub status: CirculationStatus,
}

impl Circulation {
    /// 读取时派生的逾期判定
    ///
    /// 借出中且已过应还日期 → 逾期。已归还/遗失记录不再逾期。
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == CirculationStatus::Borrowed && self.due_date < now
    }

    /// 展示状态：borrowed / returned / lost / overdue（派生）
    pub fn display_status(&self, now: DateTime<Utc>) -> &'static str {
        if self.is_overdue(now) {
            "overdue"
        } else {
            self.status.as_str()
        }
    }
}

// ==========================================
// CirculationSummary - 流通记录 + 书目/读者摘要
// ==========================================
// 用途: GET /circulations 列表
#[derive(Debug, Clone, Serialize)]
pub struct CirculationSummary {
    #[serde(flatten)]
    pub circulation: Circulation,
    pub book_title: String,
    pub call_number: String,
    pub copy_number: i64,
    pub barcode: String,
    pub patron_public_id: String,
    pub patron_name: String,
    /// 展示状态（含派生的 overdue）
    pub display_status: String,
}

// ==========================================
// PatronTransactionRow - 读者借阅记录行
// ==========================================
// 用途: GET /patrons/{id}/transactions（扁平化行）
#[derive(Debug, Clone, Serialize)]
pub struct PatronTransactionRow {
    pub circulation_id: i64,
    pub book_title: String,
    pub call_number: String,
    pub copy_number: i64,
    pub status: String, // 展示状态（含派生的 overdue）
    pub date_issued: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine: f64,
}

// ==========================================
// CirculationReport - 流通统计
// ==========================================
// 用途: GET /circulations/reports（只读计数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirculationReport {
    pub borrowed: i64,
    pub returned: i64,
    pub lost: i64,
    /// 借出中且已过应还日期（派生口径，非存储状态）
    pub overdue: i64,
}

// ==========================================
// PatronStats - 读者借阅统计
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct PatronStats {
    pub borrowed_books: i64, // 历史借阅总数
    pub returned_books: i64,
    pub overdue_books: i64, // 派生口径
    pub total_fine: f64,
    pub history: Vec<PatronTransactionRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn circulation(status: CirculationStatus, due: DateTime<Utc>) -> Circulation {
        Circulation {
            id: 1,
            book_copy_id: 1,
            patron_id: 1,
            issue_date: due - Duration::days(5),
            due_date: due,
            renewal_date: None,
            date_returned: None,
            renewal_count: 0,
            overdue_by: 0,
            fine: 0.0,
            status,
        }
    }

    #[test]
    fn test_is_overdue_borrowed_past_due() {
        let due = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let c = circulation(CirculationStatus::Borrowed, due);

        assert!(c.is_overdue(due + Duration::days(1)));
        assert!(!c.is_overdue(due - Duration::hours(1)));
        assert_eq!(c.display_status(due + Duration::days(1)), "overdue");
    }

    #[test]
    fn test_returned_record_never_overdue() {
        let due = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let c = circulation(CirculationStatus::Returned, due);

        assert!(!c.is_overdue(due + Duration::days(30)));
        assert_eq!(c.display_status(due + Duration::days(30)), "returned");
    }
}
