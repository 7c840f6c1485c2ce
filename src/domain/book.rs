// ==========================================
// 图书馆管理系统 - 图书领域模型
// ==========================================
// Book: 书目记录（编目信息）
// BookCopy: 馆藏副本（条码/登录号唯一标识的实体书）
// ==========================================

use crate::domain::types::CopyStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Book - 书目记录
// ==========================================
// 用途: 编目层写入，流通层只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,

    // ===== 著录信息 =====
    pub title: String,
    pub author: Option<String>,
    pub edition: Option<String>,
    pub publisher: Option<String>,
    pub place_of_publication: Option<String>,
    pub copyright: Option<String>,
    pub isbn: Option<String>,

    // ===== 分类信息 =====
    pub class_section: String,          // 馆藏区 (Filipiniana / Gen. Circulation / Gen. Reference)
    pub dewey_decimal: String,          // 杜威十进制分类号
    pub author_number: Option<String>,  // 著者号
    pub call_number: String,            // 索书号（创建时派生，见 derive_call_number）

    // ===== 来源信息 =====
    pub source: String,                 // library / donated
    pub source_person: Option<String>,
    pub location_of_book: Option<String>,
    pub material_type: Option<String>,
    pub notes: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
}

// ==========================================
// BookCopy - 馆藏副本
// ==========================================
// 红线: status 只能经由流通引擎变更
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCopy {
    pub id: i64,
    pub book_id: i64,
    pub copy_number: i64,         // 本书内序号 (1,2,3...)
    pub accession_number: String, // 全馆递增登录号（5位补零）
    pub barcode: String,          // 唯一条码
    pub status: CopyStatus,
    pub date_added: NaiveDate,
}

/// 书目 + 其全部副本（列表/详情接口的返回形态）
#[derive(Debug, Clone, Serialize)]
pub struct BookWithCopies {
    #[serde(flatten)]
    pub book: Book,
    pub copies: Vec<BookCopy>,
}

/// 按条码检索副本时，附带书目摘要
#[derive(Debug, Clone, Serialize)]
pub struct CopyWithBook {
    #[serde(flatten)]
    pub copy: BookCopy,
    pub book_title: String,
    pub call_number: String,
}

// ==========================================
// NewBook - 编目入参
// ==========================================
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub edition: Option<String>,
    pub publisher: Option<String>,
    pub place_of_publication: Option<String>,
    pub copyright: Option<String>,
    pub isbn: Option<String>,
    pub class_section: String,
    pub dewey_decimal: String,
    pub author_number: Option<String>,
    pub source: String,
    pub source_person: Option<String>,
    pub location_of_book: Option<String>,
    pub material_type: Option<String>,
    pub notes: Option<String>,
    /// 初始副本数（≥1）
    pub copies: i64,
}

/// 馆藏区缩写映射
///
/// # 返回
/// - Some(缩写): 已知馆藏区
/// - None: 未知馆藏区（编目入参校验会拒绝）
pub fn section_abbreviation(section: &str) -> Option<&'static str> {
    match section {
        "Filipiniana" => Some("FIL"),
        "Gen. Circulation" => Some("GC"),
        "Gen. Reference" => Some("REF"),
        _ => None,
    }
}

/// 派生索书号
///
/// 格式: 馆藏区缩写 / 杜威分类号 / 著者号 / 版权年，换行连接。
/// 缺失的可选字段以空串占位，保持行数稳定。
pub fn derive_call_number(
    section_abbr: &str,
    dewey_decimal: &str,
    author_number: Option<&str>,
    copyright: Option<&str>,
) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        section_abbr,
        dewey_decimal,
        author_number.unwrap_or(""),
        copyright.unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_abbreviation() {
        assert_eq!(section_abbreviation("Filipiniana"), Some("FIL"));
        assert_eq!(section_abbreviation("Gen. Circulation"), Some("GC"));
        assert_eq!(section_abbreviation("Gen. Reference"), Some("REF"));
        assert_eq!(section_abbreviation("Fiction"), None);
    }

    #[test]
    fn test_derive_call_number() {
        let call = derive_call_number("GC", "813.54", Some("A12"), Some("2001"));
        assert_eq!(call, "GC\n813.54\nA12\n2001");

        // 可选字段缺失时仍保持4行
        let call = derive_call_number("FIL", "900", None, None);
        assert_eq!(call.lines().count(), 4);
    }
}
