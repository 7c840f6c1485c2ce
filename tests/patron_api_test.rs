// ==========================================
// PatronApi 集成测试
// ==========================================
// 测试范围:
// 1. 注册: 证号生成、入参校验、唯一约束
// 2. 到期日派生（随政策变化）
// 3. 更新/停用/删除
// ==========================================

mod helpers;

use chrono::Datelike;
use helpers::api_test_helper::*;
use library_ms::api::ApiError;
use library_ms::domain::types::PatronStatus;

#[test]
fn test_注册_自动生成证号() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let first = env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    let second = env.register_patron("Maria", "Santos", "maria@example.com");

    assert_eq!(first.patron.patron_id, "P00001");
    assert_eq!(second.patron.patron_id, "P00002");
    assert_eq!(first.patron.status, PatronStatus::Active);
}

#[test]
fn test_注册_显式证号优先() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut req = new_patron("Juan", "Dela Cruz", "juan@example.com");
    req.patron_id = Some("P00777".to_string());

    let view = env
        .patron_api
        .register(&req, "tester", day(0))
        .expect("注册失败");
    assert_eq!(view.patron.patron_id, "P00777");

    // 后续自动生成的证号从最大号续号
    let next = env.register_patron("Maria", "Santos", "maria@example.com");
    assert_eq!(next.patron.patron_id, "P00778");
}

#[test]
fn test_注册_入参校验() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut req = new_patron("Juan", "Dela Cruz", "bad-email");
    assert!(matches!(
        env.patron_api.register(&req, "tester", day(0)).unwrap_err(),
        ApiError::ValidationError(_)
    ));

    req = new_patron("", "Dela Cruz", "juan@example.com");
    assert!(env.patron_api.register(&req, "tester", day(0)).is_err());

    req = new_patron("Juan", "Dela Cruz", "juan@example.com");
    req.city = "".to_string();
    assert!(env.patron_api.register(&req, "tester", day(0)).is_err());
}

#[test]
fn test_注册_邮箱唯一() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    let req = new_patron("Pedro", "Reyes", "juan@example.com");
    let err = env.patron_api.register(&req, "tester", day(0)).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
}

#[test]
fn test_到期日随政策派生() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let view = env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    // 默认3年
    assert_eq!(view.expiry_date.year(), day(0).year() + 3);

    // 调整政策后，读取时重新派生（不落库）
    env.settings_api.update_expiration_years(5, "admin").unwrap();
    let reread = env.patron_api.get(view.patron.id).unwrap();
    assert_eq!(reread.expiry_date.year(), day(0).year() + 5);
}

#[test]
fn test_按证号查询() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let view = env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    let found = env
        .patron_api
        .get_by_public_id(&view.patron.patron_id)
        .unwrap();
    assert_eq!(found.patron.id, view.patron.id);

    assert!(matches!(
        env.patron_api.get_by_public_id("P99999").unwrap_err(),
        ApiError::NotFound(_)
    ));
}

#[test]
fn test_更新_部分字段() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let view = env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    let update = library_ms::domain::patron::PatronUpdate {
        city: Some("Bacolod".to_string()),
        ..Default::default()
    };
    let updated = env.patron_api.update(view.patron.id, &update).unwrap();

    assert_eq!(updated.patron.city, "Bacolod");
    // 未指定字段保持不变
    assert_eq!(updated.patron.first_name, "Juan");
    assert_eq!(updated.patron.email, "juan@example.com");
}

#[test]
fn test_停用() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let view = env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    let deactivated = env.patron_api.deactivate(view.patron.id, "admin").unwrap();
    assert_eq!(deactivated.patron.status, PatronStatus::Deactivated);
}

#[test]
fn test_删除() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let view = env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    env.patron_api.delete(view.patron.id).unwrap();
    assert!(matches!(
        env.patron_api.get(view.patron.id).unwrap_err(),
        ApiError::NotFound(_)
    ));

    // 重复删除
    assert!(env.patron_api.delete(view.patron.id).is_err());
}

#[test]
fn test_预生成证号不占号() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    assert_eq!(env.patron_api.generate_patron_id().unwrap(), "P00001");
    // 未注册前重复调用返回同一候选号
    assert_eq!(env.patron_api.generate_patron_id().unwrap(), "P00001");

    env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    assert_eq!(env.patron_api.generate_patron_id().unwrap(), "P00002");
}
