// ==========================================
// BookApi 集成测试
// ==========================================
// 测试范围:
// 1. 编目入藏: 副本号/登录号/条码/索书号生成
// 2. 登录号全馆单调递增
// 3. 入参校验
// 4. 查询（列表/详情/条码）
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use library_ms::api::ApiError;
use library_ms::domain::types::CopyStatus;
use std::collections::HashSet;

#[test]
fn test_编目入藏_副本编号与登录号() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let book = env.create_book("Noli Me Tangere", 3);

    assert_eq!(book.copies.len(), 3);
    // 书目内副本号 1,2,3
    let copy_numbers: Vec<i64> = book.copies.iter().map(|c| c.copy_number).collect();
    assert_eq!(copy_numbers, vec![1, 2, 3]);
    // 登录号全馆递增，5位补零
    let accessions: Vec<&str> = book
        .copies
        .iter()
        .map(|c| c.accession_number.as_str())
        .collect();
    assert_eq!(accessions, vec!["00001", "00002", "00003"]);
    // 初始状态均可借
    assert!(book.copies.iter().all(|c| c.status == CopyStatus::Available));
}

#[test]
fn test_登录号跨书目连续() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let first = env.create_book("Noli Me Tangere", 2);
    let second = env.create_book("El Filibusterismo", 2);

    assert_eq!(first.copies[1].accession_number, "00002");
    // 第二本书的登录号从全馆最大值续号
    assert_eq!(second.copies[0].accession_number, "00003");
    assert_eq!(second.copies[1].accession_number, "00004");
    // 第二本书的副本号重新从1开始
    assert_eq!(second.copies[0].copy_number, 1);
}

#[test]
fn test_条码唯一且带前缀() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let book = env.create_book("Noli Me Tangere", 5);

    let barcodes: HashSet<&str> = book.copies.iter().map(|c| c.barcode.as_str()).collect();
    assert_eq!(barcodes.len(), 5, "条码必须唯一");
    assert!(book.copies.iter().all(|c| c.barcode.starts_with("BC")));
}

#[test]
fn test_索书号派生() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut req = new_book("Noli Me Tangere", 1);
    req.class_section = "Filipiniana".to_string();
    req.dewey_decimal = "899.211".to_string();
    req.author_number = Some("R58".to_string());
    req.copyright = Some("1887".to_string());

    let book = env
        .book_api
        .create_book(&req, "tester", day(0))
        .expect("编目失败");

    assert_eq!(book.book.call_number, "FIL\n899.211\nR58\n1887");
}

#[test]
fn test_编目入参校验() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    // 标题为空
    let mut req = new_book("", 1);
    req.title = "  ".to_string();
    assert!(matches!(
        env.book_api.create_book(&req, "tester", day(0)).unwrap_err(),
        ApiError::ValidationError(_)
    ));

    // 副本数 < 1
    let req = new_book("Valid Title", 0);
    assert!(env.book_api.create_book(&req, "tester", day(0)).is_err());

    // 未知馆藏区
    let mut req = new_book("Valid Title", 1);
    req.class_section = "Fiction".to_string();
    assert!(env.book_api.create_book(&req, "tester", day(0)).is_err());

    // 非法来源
    let mut req = new_book("Valid Title", 1);
    req.source = "purchased".to_string();
    assert!(env.book_api.create_book(&req, "tester", day(0)).is_err());

    // 校验失败不落库
    assert!(env.book_api.list().unwrap().is_empty());
}

#[test]
fn test_查询() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let created = env.create_book("Noli Me Tangere", 2);

    // 列表
    let all = env.book_api.list().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].copies.len(), 2);

    // 详情
    let detail = env.book_api.get(created.book.id).unwrap();
    assert_eq!(detail.book.title, "Noli Me Tangere");

    // 不存在的书目
    assert!(matches!(
        env.book_api.get(9999).unwrap_err(),
        ApiError::NotFound(_)
    ));
}

#[test]
fn test_按条码查副本() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let created = env.create_book("Noli Me Tangere", 2);
    let barcode = &created.copies[1].barcode;

    let found = env.book_api.get_copy_by_barcode(barcode).unwrap();
    assert_eq!(found.copy.id, created.copies[1].id);
    assert_eq!(found.book_title, "Noli Me Tangere");
    assert_eq!(found.copy.copy_number, 2);

    // 未知条码
    assert!(matches!(
        env.book_api.get_copy_by_barcode("BC-unknown").unwrap_err(),
        ApiError::NotFound(_)
    ));
}
