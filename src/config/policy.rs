// ==========================================
// 图书馆管理系统 - 流通政策管理器
// ==========================================
// 职责: 政策项加载、查询、覆写管理
// 存储: library_setting 表 (key-value)
// 红线: 读取永不失败——键缺失时回退到硬编码默认值
// 红线: 范围校验在写入边界（SettingsApi）完成，本层只负责存取
// ==========================================

use crate::db::open_sqlite_connection;
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// 政策键
// ==========================================
pub mod keys {
    /// 默认借阅天数
    pub const DEFAULT_LOAN_DAYS: &str = "default_loan_days";
    /// 每日罚金
    pub const FINE_PER_DAY: &str = "fine_per_day";
    /// 续借次数上限
    pub const RENEWAL_LIMIT: &str = "renewal_limit";
    /// 读者证有效年限
    pub const PATRON_EXPIRATION_YEARS: &str = "patron_expiration_years";
}

// ==========================================
// 硬编码默认值（键缺失时的回退口径）
// ==========================================
pub mod defaults {
    pub const LOAN_DAYS: i64 = 5;
    pub const FINE_PER_DAY: i64 = 5;
    pub const RENEWAL_LIMIT: i64 = 2;
    pub const EXPIRATION_YEARS: i64 = 3;
}

// ==========================================
// 合法取值范围（闭区间，写入边界校验用）
// ==========================================
pub mod ranges {
    pub const LOAN_DAYS: (i64, i64) = (1, 60);
    pub const FINE_PER_DAY: (i64, i64) = (1, 100);
    pub const RENEWAL_LIMIT: (i64, i64) = (1, 10);
    pub const EXPIRATION_YEARS: (i64, i64) = (1, 10);
}

// ==========================================
// PolicyReader - 流通引擎的政策依赖
// ==========================================
// 政策显式注入引擎，禁止隐藏单例
#[async_trait]
pub trait PolicyReader: Send + Sync {
    /// 借阅天数
    async fn loan_days(&self) -> Result<i64>;
    /// 每日罚金
    async fn fine_per_day(&self) -> Result<i64>;
    /// 续借次数上限
    async fn renewal_limit(&self) -> Result<i64>;
    /// 读者证有效年限
    async fn expiration_years(&self) -> Result<i64>;
}

// ==========================================
// PolicyManager - 政策管理器
// ==========================================
pub struct PolicyManager {
    conn: Arc<Mutex<Connection>>,
}

impl PolicyManager {
    /// 创建新的 PolicyManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 从已有连接创建 PolicyManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    fn get_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))
    }

    fn ensure_table(&self) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS library_setting (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 通用存取
    // ==========================================

    /// 读取政策值
    ///
    /// # 返回
    /// - Some(String): 政策值
    /// - None: 键不存在
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT value FROM library_setting WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(result)
    }

    /// 写入政策值（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO library_setting (key, value, updated_at) \
             VALUES (?1, ?2, datetime('now')) \
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取整型政策值，键缺失或值损坏时回退默认值
    ///
    /// 读取永不失败是政策层的口径：损坏值记录告警后按默认值执行。
    fn get_i64_or_default(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(key, raw = %raw, default, "政策值无法解析为整数，回退默认值");
                    Ok(default)
                }
            },
        }
    }

    // ==========================================
    // 类型化读取（同步，API 层用）
    // ==========================================

    pub fn loan_days_sync(&self) -> Result<i64> {
        self.get_i64_or_default(keys::DEFAULT_LOAN_DAYS, defaults::LOAN_DAYS)
    }

    pub fn fine_per_day_sync(&self) -> Result<i64> {
        self.get_i64_or_default(keys::FINE_PER_DAY, defaults::FINE_PER_DAY)
    }

    pub fn renewal_limit_sync(&self) -> Result<i64> {
        self.get_i64_or_default(keys::RENEWAL_LIMIT, defaults::RENEWAL_LIMIT)
    }

    pub fn expiration_years_sync(&self) -> Result<i64> {
        self.get_i64_or_default(keys::PATRON_EXPIRATION_YEARS, defaults::EXPIRATION_YEARS)
    }
}

// 引擎侧的异步读取统一走 PolicyReader，政策在每次操作开始时读取
#[async_trait]
impl PolicyReader for PolicyManager {
    async fn loan_days(&self) -> Result<i64> {
        self.loan_days_sync()
    }

    async fn fine_per_day(&self) -> Result<i64> {
        self.fine_per_day_sync()
    }

    async fn renewal_limit(&self) -> Result<i64> {
        self.renewal_limit_sync()
    }

    async fn expiration_years(&self) -> Result<i64> {
        self.expiration_years_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PolicyManager {
        let conn = Connection::open_in_memory().unwrap();
        PolicyManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_default_fallback_when_absent() {
        let m = manager();
        assert_eq!(m.loan_days_sync().unwrap(), defaults::LOAN_DAYS);
        assert_eq!(m.fine_per_day_sync().unwrap(), defaults::FINE_PER_DAY);
        assert_eq!(m.renewal_limit_sync().unwrap(), defaults::RENEWAL_LIMIT);
        assert_eq!(
            m.expiration_years_sync().unwrap(),
            defaults::EXPIRATION_YEARS
        );
    }

    #[test]
    fn test_set_then_get() {
        let m = manager();
        m.set_value(keys::DEFAULT_LOAN_DAYS, "14").unwrap();
        assert_eq!(m.loan_days_sync().unwrap(), 14);

        // 覆盖写
        m.set_value(keys::DEFAULT_LOAN_DAYS, "7").unwrap();
        assert_eq!(m.loan_days_sync().unwrap(), 7);
    }

    #[test]
    fn test_corrupt_value_falls_back() {
        let m = manager();
        m.set_value(keys::FINE_PER_DAY, "abc").unwrap();
        assert_eq!(m.fine_per_day_sync().unwrap(), defaults::FINE_PER_DAY);
    }
}
