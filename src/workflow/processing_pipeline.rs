//! 文档处理流程 - 流程层
//!
//! 核心职责：定义"一份作业"的完整处理流程
//!
//! 流程顺序：
//! 1. 上传校验 → 创建文档（pending）
//! 2. 文本提取 → 内容分析（processing）
//! 3. completed / error
//! 4. 按需生成游戏、测验、复习资料（要求 completed）

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clients::{LlmClient, ReasoningBackend, VisionBackend, VisionClient};
use crate::config::Config;
use crate::error::{AppResult, BackendError, ValidationError};
use crate::infrastructure::Store;
use crate::models::artifact::{
    ArtifactBody, ArtifactMetadata, Difficulty, Engagement, GameType, GeneratedArtifact,
};
use crate::models::document::{Document, DocumentStatusReport, ProcessingStatus};
use crate::models::extraction::ExtractionReport;
use crate::models::profile::LearningProfile;
use crate::models::subject::Subject;
use crate::services::{ContentAnalyzer, ContentGenerator, TextExtractor};
use crate::workflow::document_ctx::DocumentCtx;

const GAME_DURATION_MINUTES: u32 = 10;

/// 一次上传
#[derive(Debug, Clone)]
pub struct Upload {
    pub user_id: Uuid,
    pub subject: String,
    pub file_name: String,
    /// MIME 类型，例如 `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// 文档处理流程
///
/// - 驱动文档状态机
/// - 决定何时提取、何时分析、何时进入终态
/// - 只依赖业务能力（services）和存储
pub struct ProcessingPipeline {
    store: Arc<dyn Store>,
    extractor: TextExtractor,
    analyzer: ContentAnalyzer,
    generator: ContentGenerator,
    grade_level: String,
    max_upload_size: usize,
}

impl ProcessingPipeline {
    pub fn new(
        config: &Config,
        store: Arc<dyn Store>,
        reasoning: Option<Arc<dyn ReasoningBackend>>,
        vision: Option<Arc<dyn VisionBackend>>,
    ) -> Self {
        Self {
            store,
            extractor: TextExtractor::from_config(vision, config),
            analyzer: ContentAnalyzer::new(reasoning.clone()),
            generator: ContentGenerator::new(reasoning),
            grade_level: config.grade_level.clone(),
            max_upload_size: config.max_upload_size,
        }
    }

    /// 根据配置创建真实后端；未配置的后端走兜底
    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Self {
        let reasoning = LlmClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn ReasoningBackend>);
        let vision =
            VisionClient::from_config(config).map(|client| Arc::new(client) as Arc<dyn VisionBackend>);

        if reasoning.is_none() {
            warn!("⚠️ 未配置 LLM_API_KEY，分析与生成将使用兜底内容");
        }
        if vision.is_none() {
            warn!("⚠️ 未配置 VISION_API_KEY，文本提取将使用兜底结果");
        }

        Self::new(config, store, reasoning, vision)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// 校验上传并创建 pending 文档
    ///
    /// 校验失败时不会创建任何记录。
    pub async fn upload(&self, upload: &Upload) -> AppResult<Document> {
        if upload.bytes.is_empty() {
            return Err(ValidationError::EmptyUpload.into());
        }
        if !upload.content_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage {
                content_type: upload.content_type.clone(),
            }
            .into());
        }
        if upload.bytes.len() > self.max_upload_size {
            return Err(ValidationError::UploadTooLarge {
                size: upload.bytes.len(),
                max: self.max_upload_size,
            }
            .into());
        }
        let subject =
            Subject::parse(&upload.subject).ok_or_else(|| ValidationError::UnsupportedSubject {
                subject: upload.subject.clone(),
            })?;

        let document = Document::new(upload.user_id, subject, upload.file_name.clone());
        self.store.insert_document(document.clone()).await?;

        info!("{} 📤 上传完成 ({} 字节)", DocumentCtx::new(&document), upload.bytes.len());
        Ok(document)
    }

    /// 上传并立即处理
    pub async fn submit(&self, upload: &Upload) -> AppResult<Document> {
        let document = self.upload(upload).await?;
        self.run(document.id, &upload.bytes).await
    }

    /// 处理一份 pending 文档，直到进入终态
    ///
    /// 后端不可用不会让文档进入 error；只有非预期错误才会。
    pub async fn run(&self, document_id: Uuid, image: &[u8]) -> AppResult<Document> {
        let mut document = self.store.get_document(document_id).await?;
        let ctx = DocumentCtx::new(&document);

        document.transition(ProcessingStatus::Processing)?;
        self.store.update_document(&document).await?;
        info!("{} 🚀 开始处理", ctx);

        match self.extract_and_analyze(&document, image).await {
            Ok((report, profile)) => {
                document.ocr_data = Some(report.ocr_data);
                document.processing_quality = Some(report.processing_quality);
                document.structured_content = Some(report.content);
                document.analysis_results = Some(profile);
                document.transition(ProcessingStatus::Completed)?;
                info!("{} ✓ 处理完成", ctx);
            }
            Err(e) => {
                error!("{} ❌ 处理失败: {}", ctx, e);
                document.error_message = Some(e.to_string());
                document.transition(ProcessingStatus::Error)?;
            }
        }

        self.store.update_document(&document).await?;
        Ok(document)
    }

    async fn extract_and_analyze(
        &self,
        document: &Document,
        image: &[u8],
    ) -> Result<(ExtractionReport, LearningProfile), BackendError> {
        let report = self.extractor.process(image).await?;
        if !report.processing_quality.validated {
            warn!(
                "{} ⚠️ 提取质量问题: {:?}",
                DocumentCtx::new(document),
                report.processing_quality.issues_detected
            );
        }

        let profile = self
            .analyzer
            .analyze(&report.ocr_data.raw_text, document.subject, &self.grade_level)
            .await?;
        Ok((report, profile))
    }

    /// 查询处理进度
    pub async fn status(&self, document_id: Uuid) -> AppResult<DocumentStatusReport> {
        let document = self.store.get_document(document_id).await?;
        Ok(DocumentStatusReport::from(&document))
    }

    /// 生成游戏，`game_type` 为空或 `auto` 时由生成器选择
    pub async fn generate_game(
        &self,
        document_id: Uuid,
        game_type: &str,
    ) -> AppResult<GeneratedArtifact> {
        let game_type = GameType::parse_request(game_type)?;
        let (document, profile) = self.completed_document(document_id).await?;

        let game = self
            .generator
            .generate_game(document.raw_text(), document.subject, &profile, game_type)
            .await?;

        let description = game.description.clone();
        let metadata = ArtifactMetadata {
            estimated_duration_minutes: GAME_DURATION_MINUTES,
            learning_objectives: profile.learning_objectives.clone(),
            topics: profile.topics.clone(),
        };
        self.save_artifact(&document, ArtifactBody::Game(game), description, metadata)
            .await
    }

    /// 生成测验
    pub async fn generate_quiz(
        &self,
        document_id: Uuid,
        difficulty: &str,
    ) -> AppResult<GeneratedArtifact> {
        let difficulty = Difficulty::parse(difficulty)?;
        let (document, profile) = self.completed_document(document_id).await?;

        let quiz = self
            .generator
            .generate_quiz(document.raw_text(), document.subject, &profile, difficulty)
            .await?;

        let metadata = ArtifactMetadata {
            estimated_duration_minutes: quiz.estimated_duration_minutes,
            learning_objectives: profile.learning_objectives.clone(),
            topics: profile.topics.clone(),
        };
        self.save_artifact(
            &document,
            ArtifactBody::Quiz(quiz),
            "Test your knowledge with this interactive quiz".to_string(),
            metadata,
        )
        .await
    }

    /// 生成复习资料，未指定主题时使用学习画像中的主题
    pub async fn generate_review(
        &self,
        document_id: Uuid,
        topics: &[String],
    ) -> AppResult<GeneratedArtifact> {
        let (document, profile) = self.completed_document(document_id).await?;
        let topics = if topics.is_empty() {
            profile.topics.clone()
        } else {
            topics.to_vec()
        };

        let review = self
            .generator
            .generate_review(document.raw_text(), document.subject, &topics)
            .await?;

        let metadata = ArtifactMetadata {
            estimated_duration_minutes: review.estimated_study_time_minutes,
            learning_objectives: profile.learning_objectives.clone(),
            topics,
        };
        self.save_artifact(
            &document,
            ArtifactBody::Review(review),
            "Comprehensive study guide for review".to_string(),
            metadata,
        )
        .await
    }

    /// 为题目生成提示（不落库）
    pub async fn generate_hints(
        &self,
        question: &str,
        subject: Subject,
        difficulty: f64,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .generator
            .generate_hints(question, subject, difficulty)
            .await?)
    }

    /// 打开内容，浏览次数 +1
    pub async fn open_artifact(&self, artifact_id: Uuid) -> AppResult<GeneratedArtifact> {
        Ok(self.store.record_view(artifact_id).await?)
    }

    pub async fn list_artifacts(&self, document_id: Uuid) -> AppResult<Vec<GeneratedArtifact>> {
        self.store.get_document(document_id).await?;
        Ok(self.store.list_artifacts(document_id).await)
    }

    async fn completed_document(&self, document_id: Uuid) -> AppResult<(Document, LearningProfile)> {
        let document = self.store.get_document(document_id).await?;
        if document.processing_status != ProcessingStatus::Completed {
            return Err(ValidationError::DocumentNotReady {
                document_id,
                status: document.processing_status.to_string(),
            }
            .into());
        }
        let profile = document
            .analysis_results
            .clone()
            .unwrap_or_else(|| ContentAnalyzer::fallback_profile(document.subject));
        Ok((document, profile))
    }

    async fn save_artifact(
        &self,
        document: &Document,
        body: ArtifactBody,
        description: String,
        metadata: ArtifactMetadata,
    ) -> AppResult<GeneratedArtifact> {
        let artifact = GeneratedArtifact {
            id: Uuid::new_v4(),
            document_id: document.id,
            user_id: document.user_id,
            subject: document.subject,
            title: body.title().to_string(),
            description,
            body,
            metadata,
            engagement: Engagement::default(),
            created_at: Utc::now(),
        };

        self.store.insert_artifact(artifact.clone()).await?;
        self.store
            .attach_artifact(document.id, artifact.kind(), artifact.id)
            .await?;

        info!(
            "{} ✓ 已生成{}: {}",
            DocumentCtx::new(document),
            artifact.kind().as_str(),
            artifact.title
        );
        Ok(artifact)
    }
}
