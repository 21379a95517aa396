//! 内存存储
//!
//! 每个集合一把 `tokio::sync::Mutex`，所有读改写都在锁内完成，
//! 因此同一内容的浏览计数与完成统计不会互相覆盖。

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::infrastructure::Store;
use crate::models::artifact::{ContentKind, Engagement, GeneratedArtifact};
use crate::models::document::Document;
use crate::models::submission::SubmissionResult;

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<Uuid, Document>>,
    artifacts: Mutex<HashMap<Uuid, GeneratedArtifact>>,
    submissions: Mutex<Vec<SubmissionResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        self.documents.lock().await.insert(document.id, document);
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Document, StoreError> {
        self.documents
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("document", id))
    }

    async fn update_document(&self, document: &Document) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        let slot = documents
            .get_mut(&document.id)
            .ok_or(StoreError::not_found("document", document.id))?;
        *slot = document.clone();
        Ok(())
    }

    async fn list_documents(&self, user_id: Uuid) -> Vec<Document> {
        let mut documents: Vec<Document> = self
            .documents
            .lock()
            .await
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        documents.sort_by_key(|d| d.created_at);
        documents
    }

    async fn attach_artifact(
        &self,
        document_id: Uuid,
        kind: ContentKind,
        artifact_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .get_mut(&document_id)
            .ok_or(StoreError::not_found("document", document_id))?;
        let refs = &mut document.generated_content;
        match kind {
            ContentKind::Game => refs.games.push(artifact_id),
            ContentKind::Quiz => refs.quizzes.push(artifact_id),
            ContentKind::Review => refs.review_materials.push(artifact_id),
        }
        Ok(())
    }

    async fn insert_artifact(&self, artifact: GeneratedArtifact) -> Result<(), StoreError> {
        self.artifacts.lock().await.insert(artifact.id, artifact);
        Ok(())
    }

    async fn get_artifact(&self, id: Uuid) -> Result<GeneratedArtifact, StoreError> {
        self.artifacts
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("artifact", id))
    }

    async fn list_artifacts(&self, document_id: Uuid) -> Vec<GeneratedArtifact> {
        let mut artifacts: Vec<GeneratedArtifact> = self
            .artifacts
            .lock()
            .await
            .values()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect();
        artifacts.sort_by_key(|a| a.created_at);
        artifacts
    }

    async fn record_view(&self, id: Uuid) -> Result<GeneratedArtifact, StoreError> {
        let mut artifacts = self.artifacts.lock().await;
        let artifact = artifacts
            .get_mut(&id)
            .ok_or(StoreError::not_found("artifact", id))?;
        artifact.engagement.record_view();
        Ok(artifact.clone())
    }

    async fn record_completion(&self, id: Uuid, final_score: f64) -> Result<Engagement, StoreError> {
        let mut artifacts = self.artifacts.lock().await;
        let artifact = artifacts
            .get_mut(&id)
            .ok_or(StoreError::not_found("artifact", id))?;
        artifact.engagement.record_completion(final_score);
        Ok(artifact.engagement)
    }

    async fn insert_submission(&self, submission: SubmissionResult) -> Result<(), StoreError> {
        self.submissions.lock().await.push(submission);
        Ok(())
    }

    async fn list_submissions(&self, user_id: Uuid) -> Vec<SubmissionResult> {
        self.submissions
            .lock()
            .await
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}
