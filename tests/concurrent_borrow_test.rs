// ==========================================
// 并发借出测试
// ==========================================
// 不变量: 同一副本任一时刻至多一条借出中的流通记录
// 手段: 借出事务内的条件 UPDATE（占用）+ 局部唯一索引兜底
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use library_ms::api::ApiError;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_并发借出同一副本_仅一个成功() {
    let env = Arc::new(ApiTestEnv::new().expect("无法创建测试环境"));
    let book = env.create_book("Noli Me Tangere", 1);
    let juan = env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    let maria = env.register_patron("Maria", "Santos", "maria@example.com");
    let copy_id = book.copies[0].id;

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();

    for patron_id in [juan.patron.patron_id.clone(), maria.patron.patron_id.clone()] {
        let env = env.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("无法创建运行时");
            barrier.wait();
            runtime.block_on(env.circulation_api.borrow(copy_id, &patron_id, "tester", day(0)))
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("线程执行失败"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "同一副本的并发借出只能成功一个");

    // 失败方收到 CopyUnavailable
    let failure = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        failure.as_ref().unwrap_err(),
        ApiError::CopyUnavailable(_)
    ));

    // 数据库中只有一条借出中记录
    let report = env.circulation_api.reports(day(0)).unwrap();
    assert_eq!(report.borrowed, 1);
}

#[test]
fn test_归还后可再次借出() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.create_book("Noli Me Tangere", 1);
    let juan = env.register_patron("Juan", "Dela Cruz", "juan@example.com");
    let maria = env.register_patron("Maria", "Santos", "maria@example.com");
    let copy_id = book.copies[0].id;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let first = runtime
        .block_on(env.circulation_api.borrow(copy_id, &juan.patron.patron_id, "tester", day(0)))
        .unwrap();
    runtime
        .block_on(env.circulation_api.return_copy(first.id, "tester", day(2)))
        .unwrap();

    // 归还后同一副本可再次借出（形成第二条流通记录）
    let second = runtime
        .block_on(env.circulation_api.borrow(copy_id, &maria.patron.patron_id, "tester", day(3)))
        .expect("归还后的副本应可再次借出");
    assert_ne!(second.id, first.id);

    let report = env.circulation_api.reports(day(3)).unwrap();
    assert_eq!(report.borrowed, 1);
    assert_eq!(report.returned, 1);
}
