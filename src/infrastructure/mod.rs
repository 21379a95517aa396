//! 基础设施层（Infrastructure Layer）
//!
//! 持久化协作者：按 id 读写文档、生成内容和提交记录，
//! 参与度计数的读改写在存储内部原子完成。

pub mod memory_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::artifact::{ContentKind, Engagement, GeneratedArtifact};
use crate::models::document::Document;
use crate::models::submission::SubmissionResult;

pub use memory_store::MemoryStore;

/// 存储能力
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_document(&self, document: Document) -> Result<(), StoreError>;

    async fn get_document(&self, id: Uuid) -> Result<Document, StoreError>;

    /// 整体替换已有文档
    async fn update_document(&self, document: &Document) -> Result<(), StoreError>;

    async fn list_documents(&self, user_id: Uuid) -> Vec<Document>;

    /// 把生成内容的 id 追加到文档的 `generated_content`
    async fn attach_artifact(
        &self,
        document_id: Uuid,
        kind: ContentKind,
        artifact_id: Uuid,
    ) -> Result<(), StoreError>;

    async fn insert_artifact(&self, artifact: GeneratedArtifact) -> Result<(), StoreError>;

    async fn get_artifact(&self, id: Uuid) -> Result<GeneratedArtifact, StoreError>;

    async fn list_artifacts(&self, document_id: Uuid) -> Vec<GeneratedArtifact>;

    /// 浏览次数 +1，返回更新后的内容
    async fn record_view(&self, id: Uuid) -> Result<GeneratedArtifact, StoreError>;

    /// 记录一次完成并更新平均分、完成率，返回更新后的统计
    async fn record_completion(&self, id: Uuid, final_score: f64) -> Result<Engagement, StoreError>;

    async fn insert_submission(&self, submission: SubmissionResult) -> Result<(), StoreError>;

    async fn list_submissions(&self, user_id: Uuid) -> Vec<SubmissionResult>;
}
