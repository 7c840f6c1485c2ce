// ==========================================
// AttendanceApi 集成测试
// ==========================================
// 测试范围: 签到/签退/重复签退/当日列表
// ==========================================

mod helpers;

use chrono::Duration;
use helpers::api_test_helper::*;
use library_ms::api::ApiError;
use library_ms::domain::attendance::NewAttendance;
use library_ms::domain::types::Gender;

fn visitor(name: &str) -> NewAttendance {
    NewAttendance {
        name: name.to_string(),
        gender: Gender::Female,
        email: None,
        address: None,
        purpose_of_visit: "research".to_string(),
    }
}

#[test]
fn test_签到() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let record = env
        .attendance_api
        .time_in(&visitor("Ana Reyes"), day(0))
        .expect("签到失败");

    assert_eq!(record.name, "Ana Reyes");
    assert_eq!(record.time_in, day(0));
    assert_eq!(record.time_out, None);
}

#[test]
fn test_签到_入参校验() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut v = visitor("  ");
    assert!(matches!(
        env.attendance_api.time_in(&v, day(0)).unwrap_err(),
        ApiError::ValidationError(_)
    ));

    v = visitor("Ana Reyes");
    v.purpose_of_visit = "".to_string();
    assert!(env.attendance_api.time_in(&v, day(0)).is_err());
}

#[test]
fn test_签退_与重复签退() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let record = env
        .attendance_api
        .time_in(&visitor("Ana Reyes"), day(0))
        .unwrap();

    let out_time = day(0) + Duration::hours(2);
    let updated = env
        .attendance_api
        .time_out(record.id, out_time)
        .expect("签退失败");
    assert_eq!(updated.time_out, Some(out_time));

    // 重复签退被拒
    let err = env
        .attendance_api
        .time_out(record.id, out_time + Duration::hours(1))
        .unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    // 不存在的记录
    assert!(matches!(
        env.attendance_api.time_out(9999, out_time).unwrap_err(),
        ApiError::NotFound(_)
    ));
}

#[test]
fn test_列表_最新在前() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.attendance_api
        .time_in(&visitor("First Visitor"), day(0))
        .unwrap();
    env.attendance_api
        .time_in(&visitor("Second Visitor"), day(1))
        .unwrap();

    let all = env.attendance_api.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "Second Visitor");
}

#[test]
fn test_当日列表() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.attendance_api
        .time_in(&visitor("Yesterday Visitor"), day(0))
        .unwrap();
    env.attendance_api
        .time_in(&visitor("Today Visitor"), day(1))
        .unwrap();
    env.attendance_api
        .time_in(&visitor("Today Visitor 2"), day(1) + Duration::hours(3))
        .unwrap();

    let today = env.attendance_api.today(day(1)).unwrap();
    assert_eq!(today.len(), 2);
    assert!(today.iter().all(|r| r.name.starts_with("Today")));
}
