// ==========================================
// 图书馆管理系统 - HTTP 服务入口
// ==========================================
// 技术栈: axum + Rust + SQLite
// ==========================================

use std::sync::Arc;

use library_ms::app::{get_default_db_path, AppState};
use library_ms::{logging, server};

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("图书馆管理系统 - 馆藏流通与读者服务");
    tracing::info!("系统版本: {}", library_ms::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::new(db_path).expect("无法初始化AppState");
    let app_state = Arc::new(app_state);

    // 监听地址（默认 0.0.0.0:8080，可用 LIBRARY_MS_LISTEN 覆盖）
    let listen = std::env::var("LIBRARY_MS_LISTEN").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let router = server::router(app_state);
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .unwrap_or_else(|e| panic!("无法监听 {}: {}", listen, e));

    tracing::info!("HTTP 服务已启动: http://{}", listen);
    axum::serve(listener, router)
        .await
        .expect("HTTP 服务异常退出");
}
