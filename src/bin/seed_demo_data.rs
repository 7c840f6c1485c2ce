// ==========================================
// 图书馆管理系统 - 演示数据生成
// ==========================================
// 用途: 向指定数据库写入少量演示数据（书目/读者/一条借出记录）
// 用法: LIBRARY_MS_DB_PATH=./demo.db cargo run --bin seed_demo_data
// ==========================================

use chrono::Utc;
use library_ms::app::{get_default_db_path, AppState};
use library_ms::domain::book::NewBook;
use library_ms::domain::patron::NewPatron;
use library_ms::logging;

#[tokio::main]
async fn main() {
    logging::init();

    let db_path = get_default_db_path();
    tracing::info!("演示数据写入目标: {}", db_path);

    let state = AppState::new(db_path).expect("无法初始化AppState");
    let operator = "seeder";
    let now = Utc::now();

    // ===== 书目 =====
    let books = [
        ("Noli Me Tangere", "Jose Rizal", "Filipiniana", "899.211", 3),
        ("El Filibusterismo", "Jose Rizal", "Filipiniana", "899.211", 2),
        ("Introduction to Algorithms", "Thomas H. Cormen", "Gen. Circulation", "005.1", 2),
    ];
    let mut first_copy_id = None;
    for (title, author, section, dewey, copies) in books {
        let created = state
            .book_api
            .create_book(
                &NewBook {
                    title: title.to_string(),
                    author: Some(author.to_string()),
                    edition: None,
                    publisher: None,
                    place_of_publication: None,
                    copyright: None,
                    isbn: None,
                    class_section: section.to_string(),
                    dewey_decimal: dewey.to_string(),
                    author_number: None,
                    source: "library".to_string(),
                    source_person: None,
                    location_of_book: None,
                    material_type: None,
                    notes: None,
                    copies,
                },
                operator,
                now,
            )
            .expect("书目写入失败");
        tracing::info!(title, copies = created.copies.len(), "书目已写入");
        first_copy_id.get_or_insert(created.copies[0].id);
    }

    // ===== 读者 =====
    let patrons = [
        ("Juan", "Dela Cruz", "juan@example.com"),
        ("Maria", "Santos", "maria@example.com"),
    ];
    let mut first_patron_public_id = None;
    for (first, last, email) in patrons {
        let view = state
            .patron_api
            .register(
                &NewPatron {
                    patron_id: None,
                    first_name: first.to_string(),
                    middle_name: None,
                    last_name: last.to_string(),
                    suffix: None,
                    email: email.to_string(),
                    barangay: None,
                    city: "Iloilo City".to_string(),
                    province: "Iloilo".to_string(),
                    number: None,
                    age: None,
                    gender: None,
                    notes: None,
                },
                operator,
                now,
            )
            .expect("读者写入失败");
        tracing::info!(patron_id = %view.patron.patron_id, "读者已注册");
        first_patron_public_id.get_or_insert(view.patron.patron_id);
    }

    // ===== 一条借出记录 =====
    let copy_id = first_copy_id.expect("缺少副本");
    let patron_public_id = first_patron_public_id.expect("缺少读者");
    let circulation = state
        .circulation_api
        .borrow(copy_id, &patron_public_id, operator, now)
        .await
        .expect("借出失败");
    tracing::info!(
        circulation_id = circulation.id,
        due_date = %circulation.due_date,
        "演示借出记录已写入"
    );

    tracing::info!("演示数据写入完成");
}
