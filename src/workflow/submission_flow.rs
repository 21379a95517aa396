//! 答题提交流程 - 流程层
//!
//! 评分 → 保存提交记录 → 更新内容参与度

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::clients::ReasoningBackend;
use crate::error::{AppResult, ValidationError};
use crate::infrastructure::Store;
use crate::models::dashboard::DashboardReport;
use crate::models::submission::{ProgressSubmit, SubmissionResult};
use crate::services::{dashboard, ScoringEngine};

pub struct SubmissionFlow {
    store: Arc<dyn Store>,
    scoring: ScoringEngine,
}

impl SubmissionFlow {
    pub fn new(store: Arc<dyn Store>, reasoning: Option<Arc<dyn ReasoningBackend>>) -> Self {
        Self {
            store,
            scoring: ScoringEngine::new(reasoning),
        }
    }

    /// 提交答案
    ///
    /// 内容没有可评分题目时直接返回校验错误，不产生任何写入。
    /// 先更新参与度再保存提交记录：参与度更新失败时不会留下提交记录。
    pub async fn submit(
        &self,
        user_id: Uuid,
        submission: &ProgressSubmit,
    ) -> AppResult<SubmissionResult> {
        let artifact = self.store.get_artifact(submission.content_id).await?;
        let questions = artifact.body.scorable_questions();
        if questions.is_empty() {
            return Err(ValidationError::EmptyQuestionSet {
                content_id: artifact.id,
            }
            .into());
        }

        let result = self.scoring.score(user_id, &questions, submission).await?;

        let engagement = self
            .store
            .record_completion(artifact.id, result.score)
            .await?;
        self.store.insert_submission(result.clone()).await?;

        info!(
            "✓ [{}] 提交完成: 得分 {:.1}, 完成 {} 次, 平均分 {:.1}",
            artifact.title, result.score, engagement.completions, engagement.average_score
        );
        Ok(result)
    }

    /// 学习者概览
    pub async fn dashboard(&self, user_id: Uuid) -> AppResult<DashboardReport> {
        let documents = self.store.list_documents(user_id).await;
        let submissions = self.store.list_submissions(user_id).await;

        let mut artifacts = HashMap::new();
        for submission in &submissions {
            if artifacts.contains_key(&submission.content_id) {
                continue;
            }
            if let Ok(artifact) = self.store.get_artifact(submission.content_id).await {
                artifacts.insert(artifact.id, artifact);
            }
        }

        Ok(dashboard::summarize(documents.len(), &submissions, &artifacts))
    }
}
