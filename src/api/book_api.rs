// ==========================================
// 图书馆管理系统 - 编目 API
// ==========================================
// 职责: 图书编目入藏（书目 + 初始副本）与馆藏查询
// 说明: 流通引擎只依赖副本状态，编目属协作方，不做深度业务
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::book::{
    derive_call_number, section_abbreviation, BookWithCopies, CopyWithBook, NewBook,
};
use crate::api::error::{ApiError, ApiResult};
use crate::repository::{ActionLogRepository, BookRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;

// ==========================================
// BookApi - 编目 API
// ==========================================
pub struct BookApi {
    book_repo: Arc<BookRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl BookApi {
    /// 创建新的BookApi实例
    pub fn new(book_repo: Arc<BookRepository>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            book_repo,
            action_log_repo,
        }
    }

    fn validate_new(new: &NewBook) -> ApiResult<&'static str> {
        if new.title.trim().is_empty() {
            return Err(ApiError::ValidationError("title 不能为空".to_string()));
        }
        if new.dewey_decimal.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "dewey_decimal 不能为空".to_string(),
            ));
        }
        if new.copies < 1 {
            return Err(ApiError::ValidationError(format!(
                "copies 必须 ≥ 1，收到 {}",
                new.copies
            )));
        }
        if new.source != "library" && new.source != "donated" {
            return Err(ApiError::ValidationError(format!(
                "source 必须为 library 或 donated，收到 {}",
                new.source
            )));
        }
        section_abbreviation(&new.class_section).ok_or_else(|| {
            ApiError::ValidationError(format!("未知的馆藏区: {}", new.class_section))
        })
    }

    // ==========================================
    // 编目入藏
    // ==========================================

    /// 新建书目并入藏初始副本
    ///
    /// - 索书号在本层派生（馆藏区缩写 / 杜威分类号 / 著者号 / 版权年）
    /// - 副本号、登录号、条码由仓储在同一事务内取号生成
    pub fn create_book(
        &self,
        new: &NewBook,
        operator: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<BookWithCopies> {
        let section_abbr = Self::validate_new(new)?;
        let call_number = derive_call_number(
            section_abbr,
            &new.dewey_decimal,
            new.author_number.as_deref(),
            new.copyright.as_deref(),
        );

        let created = self
            .book_repo
            .create_with_copies(new, &call_number, new.copies, now)?;

        tracing::info!(
            book_id = created.book.id,
            copies = created.copies.len(),
            "图书编目入藏"
        );
        let log = ActionLog::new(
            ActionType::AccessionBook,
            "Book",
            created.book.id,
            operator,
            Some(format!("title={} copies={}", created.book.title, new.copies)),
        );
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("操作日志写入失败(编目已完成): {}", e);
        }

        Ok(created)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn list(&self) -> ApiResult<Vec<BookWithCopies>> {
        Ok(self.book_repo.list_with_copies()?)
    }

    pub fn get(&self, id: i64) -> ApiResult<BookWithCopies> {
        Ok(self.book_repo.find_with_copies(id)?)
    }

    /// 借还台扫码：按条码查副本（含书目摘要）
    pub fn get_copy_by_barcode(&self, barcode: &str) -> ApiResult<CopyWithBook> {
        if barcode.trim().is_empty() {
            return Err(ApiError::ValidationError("barcode 不能为空".to_string()));
        }
        Ok(self.book_repo.find_copy_by_barcode(barcode)?)
    }
}
