//! 上传的作业文档及其处理状态机

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::extraction::{ExtractionResult, QualityReport, StructuredContent};
use crate::models::profile::LearningProfile;
use crate::models::subject::Subject;

/// 文档处理状态
///
/// `pending → processing → {completed | error}`，两个终态不再自动迁移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Error)
    }

    pub fn can_transition_to(self, next: ProcessingStatus) -> bool {
        matches!(
            (self, next),
            (ProcessingStatus::Pending, ProcessingStatus::Processing)
                | (ProcessingStatus::Processing, ProcessingStatus::Completed)
                | (ProcessingStatus::Processing, ProcessingStatus::Error)
        )
    }

    /// 进度百分比（派生值，不存储）
    pub fn progress_percentage(self) -> u8 {
        match self {
            ProcessingStatus::Pending => 0,
            ProcessingStatus::Processing => 50,
            ProcessingStatus::Completed => 100,
            ProcessingStatus::Error => 0,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已生成内容的引用，按类型分组
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContentRefs {
    pub games: Vec<Uuid>,
    pub quizzes: Vec<Uuid>,
    pub review_materials: Vec<Uuid>,
}

/// 作业文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: Subject,
    /// 原始图片存储位置
    pub raw_image_uri: String,
    pub ocr_data: Option<ExtractionResult>,
    pub processing_quality: Option<QualityReport>,
    pub structured_content: Option<StructuredContent>,
    pub analysis_results: Option<LearningProfile>,
    pub generated_content: GeneratedContentRefs,
    pub processing_status: ProcessingStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// 上传时创建，状态为 pending
    pub fn new(user_id: Uuid, subject: Subject, raw_image_uri: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            subject,
            raw_image_uri: raw_image_uri.into(),
            ocr_data: None,
            processing_quality: None,
            structured_content: None,
            analysis_results: None,
            generated_content: GeneratedContentRefs::default(),
            processing_status: ProcessingStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 推进状态，拒绝回退或跳跃
    pub fn transition(&mut self, next: ProcessingStatus) -> Result<(), PipelineError> {
        if !self.processing_status.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.processing_status.to_string(),
                to: next.to_string(),
            });
        }
        self.processing_status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 提取出的原始文本（未处理时为空）
    pub fn raw_text(&self) -> &str {
        self.ocr_data
            .as_ref()
            .map(|ocr| ocr.raw_text.as_str())
            .unwrap_or("")
    }
}

/// 文档状态查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatusReport {
    pub status: ProcessingStatus,
    pub progress_percentage: u8,
    pub estimated_time_seconds: u32,
    pub error_message: Option<String>,
}

impl From<&Document> for DocumentStatusReport {
    fn from(document: &Document) -> Self {
        let progress = document.processing_status.progress_percentage();
        Self {
            status: document.processing_status,
            progress_percentage: progress,
            estimated_time_seconds: if progress < 100 { 10 } else { 0 },
            error_message: document.error_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_advances_forward() {
        let mut doc = Document::new(Uuid::new_v4(), Subject::English, "uploads/a.png");
        assert!(doc.transition(ProcessingStatus::Completed).is_err());
        doc.transition(ProcessingStatus::Processing).unwrap();
        doc.transition(ProcessingStatus::Completed).unwrap();
        assert!(doc.transition(ProcessingStatus::Processing).is_err());
        assert!(doc.transition(ProcessingStatus::Error).is_err());
        assert_eq!(doc.processing_status, ProcessingStatus::Completed);
    }

    #[test]
    fn progress_is_derived_from_status() {
        assert_eq!(ProcessingStatus::Pending.progress_percentage(), 0);
        assert_eq!(ProcessingStatus::Processing.progress_percentage(), 50);
        assert_eq!(ProcessingStatus::Completed.progress_percentage(), 100);
        assert_eq!(ProcessingStatus::Error.progress_percentage(), 0);
    }

    #[test]
    fn status_report_estimates_remaining_time() {
        let mut doc = Document::new(Uuid::new_v4(), Subject::Hebrew, "uploads/b.png");
        assert_eq!(DocumentStatusReport::from(&doc).estimated_time_seconds, 10);
        doc.transition(ProcessingStatus::Processing).unwrap();
        doc.transition(ProcessingStatus::Completed).unwrap();
        let report = DocumentStatusReport::from(&doc);
        assert_eq!(report.progress_percentage, 100);
        assert_eq!(report.estimated_time_seconds, 0);
    }
}
