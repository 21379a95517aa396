//! 文档处理上下文
//!
//! 封装"我正在处理哪份作业"这一信息，只用于日志

use std::fmt::Display;
use uuid::Uuid;

use crate::models::document::Document;
use crate::models::subject::Subject;

#[derive(Debug, Clone)]
pub struct DocumentCtx {
    pub document_id: Uuid,

    pub subject: Subject,

    /// 原始图片位置（通常是文件名）
    pub source: String,
}

impl DocumentCtx {
    pub fn new(document: &Document) -> Self {
        Self {
            document_id: document.id,
            subject: document.subject,
            source: document.raw_image_uri.clone(),
        }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文档 #{} 科目#{} 来源#{}]",
            self.document_id, self.subject, self.source
        )
    }
}
