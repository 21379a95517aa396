#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use homework_pipeline::clients::{ReasoningBackend, TextDetection, VisionBackend};
use homework_pipeline::error::{BackendError, StoreError};
use homework_pipeline::infrastructure::{MemoryStore, Store};
use homework_pipeline::models::artifact::{ContentKind, Engagement, GeneratedArtifact};
use homework_pipeline::models::document::{Document, ProcessingStatus};
use homework_pipeline::models::extraction::{PageText, TextBlock};
use homework_pipeline::models::submission::SubmissionResult;
use homework_pipeline::workflow::Upload;

/// 按顺序返回预设结果的推理后端，用完后返回 Unavailable
#[derive(Default)]
pub struct ScriptedReasoning {
    responses: Mutex<VecDeque<Result<String, BackendError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoning {
    pub fn new(responses: Vec<Result<String, BackendError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedReasoning {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(BackendError::Unavailable { backend: "llm" }))
    }
}

pub enum VisionReply {
    Text(&'static str, f64),
    RateLimited,
    Internal(&'static str),
}

/// 返回固定结果的视觉后端，并记录收到的图片字节
pub struct ScriptedVision {
    reply: VisionReply,
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedVision {
    pub fn new(reply: VisionReply) -> Self {
        Self {
            reply,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &'static str, confidence: f64) -> Self {
        Self::new(VisionReply::Text(text, confidence))
    }

    pub fn rate_limited() -> Self {
        Self::new(VisionReply::RateLimited)
    }

    pub fn internal(message: &'static str) -> Self {
        Self::new(VisionReply::Internal(message))
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionBackend for ScriptedVision {
    async fn detect_text(&self, image: &[u8]) -> Result<TextDetection, BackendError> {
        self.payloads.lock().unwrap().push(image.to_vec());
        match &self.reply {
            VisionReply::Text(text, confidence) => Ok(TextDetection {
                full_text: text.to_string(),
                pages: vec![PageText {
                    width: 32,
                    height: 32,
                    blocks: vec![TextBlock {
                        text: text.to_string(),
                        confidence: *confidence,
                    }],
                }],
            }),
            VisionReply::RateLimited => Err(BackendError::RateLimited {
                backend: "vision",
                retry_after: Some(1),
            }),
            VisionReply::Internal(message) => Err(BackendError::Internal {
                backend: "vision",
                message: message.to_string(),
            }),
        }
    }
}

/// 记录文档每次写入时状态的存储
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    statuses: Mutex<Vec<ProcessingStatus>>,
    reject_completions: AtomicBool,
}

impl RecordingStore {
    pub fn statuses(&self) -> Vec<ProcessingStatus> {
        self.statuses.lock().unwrap().clone()
    }

    /// 之后的参与度更新都返回 NotFound
    pub fn reject_completions(&self) {
        self.reject_completions.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        self.statuses
            .lock()
            .unwrap()
            .push(document.processing_status);
        self.inner.insert_document(document).await
    }

    async fn get_document(&self, id: Uuid) -> Result<Document, StoreError> {
        self.inner.get_document(id).await
    }

    async fn update_document(&self, document: &Document) -> Result<(), StoreError> {
        {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.last() != Some(&document.processing_status) {
                statuses.push(document.processing_status);
            }
        }
        self.inner.update_document(document).await
    }

    async fn list_documents(&self, user_id: Uuid) -> Vec<Document> {
        self.inner.list_documents(user_id).await
    }

    async fn attach_artifact(
        &self,
        document_id: Uuid,
        kind: ContentKind,
        artifact_id: Uuid,
    ) -> Result<(), StoreError> {
        self.inner
            .attach_artifact(document_id, kind, artifact_id)
            .await
    }

    async fn insert_artifact(&self, artifact: GeneratedArtifact) -> Result<(), StoreError> {
        self.inner.insert_artifact(artifact).await
    }

    async fn get_artifact(&self, id: Uuid) -> Result<GeneratedArtifact, StoreError> {
        self.inner.get_artifact(id).await
    }

    async fn list_artifacts(&self, document_id: Uuid) -> Vec<GeneratedArtifact> {
        self.inner.list_artifacts(document_id).await
    }

    async fn record_view(&self, id: Uuid) -> Result<GeneratedArtifact, StoreError> {
        self.inner.record_view(id).await
    }

    async fn record_completion(&self, id: Uuid, final_score: f64) -> Result<Engagement, StoreError> {
        if self.reject_completions.load(Ordering::SeqCst) {
            return Err(StoreError::NotFound {
                kind: "artifact",
                id,
            });
        }
        self.inner.record_completion(id, final_score).await
    }

    async fn insert_submission(&self, submission: SubmissionResult) -> Result<(), StoreError> {
        self.inner.insert_submission(submission).await
    }

    async fn list_submissions(&self, user_id: Uuid) -> Vec<SubmissionResult> {
        self.inner.list_submissions(user_id).await
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::new(32, 32);
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn upload(user_id: Uuid, subject: &str) -> Upload {
    Upload {
        user_id,
        subject: subject.to_string(),
        file_name: "uploads/homework.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: png_bytes(),
    }
}

pub fn vision(v: ScriptedVision) -> Option<Arc<dyn VisionBackend>> {
    Some(Arc::new(v))
}

pub fn reasoning(r: Arc<ScriptedReasoning>) -> Option<Arc<dyn ReasoningBackend>> {
    Some(r)
}
