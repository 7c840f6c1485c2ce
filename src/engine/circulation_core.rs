// ==========================================
// 图书馆管理系统 - 流通计算核心
// ==========================================
// 红线: 纯计算，不读库不写库
// 职责: 应还日期 / 逾期天数 / 罚金 / 续借顺延规则
// ==========================================

use chrono::{DateTime, Duration, Utc};

pub struct CirculationCore;

impl CirculationCore {
    /// 应还日期 = 起算时刻 + 借阅天数
    pub fn due_date_from(start: DateTime<Utc>, loan_days: i64) -> DateTime<Utc> {
        start + Duration::days(loan_days)
    }

    /// 逾期整天数（不足一天不计），未逾期为 0
    pub fn overdue_days(due_date: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        (at - due_date).num_days().max(0)
    }

    /// 罚金 = 逾期天数 × 每日罚金
    pub fn fine_for(overdue_days: i64, fine_per_day: i64) -> f64 {
        (overdue_days * fine_per_day) as f64
    }

    /// 续借顺延规则
    ///
    /// - 已逾期：从续借时刻重新起算（逾期窗口不并入新周期），并返回逾期天数
    /// - 未逾期：从原应还日期顺延，逾期天数为 0
    ///
    /// 两种口径的不对称是沿用的既有政策，见 DESIGN.md。
    ///
    /// # 返回
    /// - (新应还日期, 本次评估的逾期天数)
    pub fn renewal_due_date(
        current_due: DateTime<Utc>,
        now: DateTime<Utc>,
        loan_days: i64,
    ) -> (DateTime<Utc>, i64) {
        if now > current_due {
            let overdue_by = Self::overdue_days(current_due, now);
            (Self::due_date_from(now, loan_days), overdue_by)
        } else {
            (Self::due_date_from(current_due, loan_days), 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_due_date_from() {
        assert_eq!(CirculationCore::due_date_from(day(0), 5), day(5));
    }

    #[test]
    fn test_overdue_days_clamped_at_zero() {
        assert_eq!(CirculationCore::overdue_days(day(5), day(3)), 0);
        assert_eq!(CirculationCore::overdue_days(day(5), day(5)), 0);
    }

    #[test]
    fn test_overdue_days_whole_days_only() {
        assert_eq!(CirculationCore::overdue_days(day(5), day(8)), 3);
        // 不足一天不计
        assert_eq!(
            CirculationCore::overdue_days(day(5), day(5) + Duration::hours(23)),
            0
        );
        assert_eq!(
            CirculationCore::overdue_days(day(5), day(6) + Duration::hours(1)),
            1
        );
    }

    #[test]
    fn test_fine_for() {
        assert_eq!(CirculationCore::fine_for(3, 10), 30.0);
        assert_eq!(CirculationCore::fine_for(0, 10), 0.0);
    }

    #[test]
    fn test_renewal_on_time_extends_from_due_date() {
        // 第3天续借（未逾期）→ 原应还日第5天 + 5 = 第10天，无逾期
        let (new_due, overdue_by) = CirculationCore::renewal_due_date(day(5), day(3), 5);
        assert_eq!(new_due, day(10));
        assert_eq!(overdue_by, 0);
    }

    #[test]
    fn test_renewal_overdue_restarts_from_now() {
        // 第7天续借（逾期2天）→ 从第7天重新起算 = 第12天
        let (new_due, overdue_by) = CirculationCore::renewal_due_date(day(5), day(7), 5);
        assert_eq!(new_due, day(12));
        assert_eq!(overdue_by, 2);
    }
}
