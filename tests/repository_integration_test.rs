// ==========================================
// 仓储层集成测试
// ==========================================
// 测试范围:
// 1. 流通仓储的状态守卫（条件更新未命中时的错误归因）
// 2. 借出中记录的局部唯一索引兜底
// 3. 操作日志读写
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use library_ms::domain::action_log::{ActionLog, ActionType};
use library_ms::repository::RepositoryError;

#[test]
fn test_insert_borrow_副本状态守卫() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.create_book("Noli Me Tangere", 1);
    let patron = env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    let copy_id = book.copies[0].id;

    // 首次借出成功
    env.circulation_repo
        .insert_borrow(copy_id, patron.patron.id, day(0), day(5))
        .expect("借出失败");

    // 再次借出: 状态守卫拒绝
    let err = env
        .circulation_repo
        .insert_borrow(copy_id, patron.patron.id, day(1), day(6))
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InvalidStateTransition { ref entity, .. } if entity == "BookCopy"
    ));

    // 不存在的副本: NotFound
    let err = env
        .circulation_repo
        .insert_borrow(9999, patron.patron.id, day(0), day(5))
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound { ref entity, .. } if entity == "BookCopy"
    ));
}

#[test]
fn test_借出中记录唯一索引兜底() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.create_book("Noli Me Tangere", 1);
    let patron = env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    let copy_id = book.copies[0].id;

    let circulation = env
        .circulation_repo
        .insert_borrow(copy_id, patron.patron.id, day(0), day(5))
        .unwrap();

    // 绕过仓储直接插入第二条借出中记录 → 局部唯一索引拒绝
    let conn = env.raw_connection();
    let result = conn.execute(
        "INSERT INTO circulations \
         (book_copy_id, patron_id, issue_date, due_date, renewal_count, overdue_by, fine, status) \
         VALUES (?1, ?2, ?3, ?4, 0, 0, 0, 'borrowed')",
        rusqlite::params![copy_id, patron.patron.id, day(1), day(6)],
    );
    assert!(result.is_err(), "同一副本的第二条借出中记录必须被索引拒绝");

    // 已归还的历史记录不受索引限制
    env.circulation_repo
        .apply_return(circulation.id, day(2), 0, 0.0)
        .expect("归还失败");
    env.circulation_repo
        .insert_borrow(copy_id, patron.patron.id, day(3), day(8))
        .expect("归还后的副本应可再次借出");
}

#[test]
fn test_apply_return_状态守卫() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.create_book("Noli Me Tangere", 1);
    let patron = env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    let circulation = env
        .circulation_repo
        .insert_borrow(book.copies[0].id, patron.patron.id, day(0), day(5))
        .unwrap();

    env.circulation_repo
        .apply_return(circulation.id, day(3), 0, 0.0)
        .unwrap();

    // 重复归还: 守卫拒绝
    let err = env
        .circulation_repo
        .apply_return(circulation.id, day(4), 0, 0.0)
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::InvalidStateTransition { ref entity, ref from, .. }
            if entity == "Circulation" && from == "returned"
    ));

    // 不存在的记录
    let err = env
        .circulation_repo
        .apply_return(9999, day(4), 0, 0.0)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_apply_renewal_字段累加() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.create_book("Noli Me Tangere", 1);
    let patron = env.register_patron("Juan", "Dela Cruz", "juan@example.com");

    let circulation = env
        .circulation_repo
        .insert_borrow(book.copies[0].id, patron.patron.id, day(0), day(5))
        .unwrap();

    let renewed = env
        .circulation_repo
        .apply_renewal(circulation.id, day(7), day(12), 2, 20.0)
        .unwrap();
    assert_eq!(renewed.renewal_count, 1);
    assert_eq!(renewed.fine, 20.0);

    // 罚金与次数在既有值上累加
    let renewed = env
        .circulation_repo
        .apply_renewal(circulation.id, day(13), day(18), 1, 10.0)
        .unwrap();
    assert_eq!(renewed.renewal_count, 2);
    assert_eq!(renewed.fine, 30.0);
}

#[test]
fn test_操作日志读写() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    env.action_log_repo
        .insert(&ActionLog::new(
            ActionType::Borrow,
            "Circulation",
            1,
            "librarian-a",
            Some("copy=1".to_string()),
        ))
        .unwrap();
    env.action_log_repo
        .insert(&ActionLog::new(
            ActionType::UpdateSetting,
            "Setting",
            "default_loan_days",
            "admin",
            None,
        ))
        .unwrap();

    let logs = env.action_log_repo.list_recent(10).unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().any(|l| l.action_type == "Borrow"));
    assert!(logs.iter().any(|l| l.actor == "admin"));
}

#[test]
fn test_证号续号跳过空洞() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut req = new_patron("Juan", "Dela Cruz", "juan@example.com");
    req.patron_id = Some("P00041".to_string());
    env.patron_api.register(&req, "tester", day(0)).unwrap();

    // 从当前最大号续号，而不是从1开始补洞
    assert_eq!(env.patron_repo.next_patron_id().unwrap(), "P00042");
}
