//! 内容分析服务 - 业务能力层
//!
//! 只负责"文本 → 学习画像"能力，不关心流程顺序

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::ReasoningBackend;
use crate::error::BackendError;
use crate::models::profile::{
    Importance, Intervention, InterventionType, KnowledgeGap, LearningObjective, LearningProfile,
    Priority,
};
use crate::models::subject::Subject;
use crate::services::prompts::{analysis_prompt, SYSTEM_PROMPT};
use crate::services::response_parser::parse_json_response;
use crate::utils::logging::truncate_text;

const ANALYSIS_MAX_TOKENS: u32 = 2048;

/// 内容分析服务
///
/// 推理后端未配置时直接返回按科目生成的兜底画像，保证后续生成总有可用输入。
pub struct ContentAnalyzer {
    backend: Option<Arc<dyn ReasoningBackend>>,
}

impl ContentAnalyzer {
    pub fn new(backend: Option<Arc<dyn ReasoningBackend>>) -> Self {
        Self { backend }
    }

    /// 分析作业文本，生成学习画像
    ///
    /// 可恢复的后端错误被转换为兜底画像，只有 `Internal` 错误会返回。
    pub async fn analyze(
        &self,
        text: &str,
        subject: Subject,
        grade_level: &str,
    ) -> Result<LearningProfile, BackendError> {
        let Some(backend) = &self.backend else {
            warn!("⚠️ 推理后端未配置，使用兜底学习画像 ({})", subject);
            return Ok(Self::fallback_profile(subject));
        };

        debug!("分析文本: {}", truncate_text(text, 80));
        let prompt = analysis_prompt(text, subject, grade_level);

        let result = backend
            .complete(SYSTEM_PROMPT, &prompt, ANALYSIS_MAX_TOKENS)
            .await
            .and_then(|response| parse_json_response::<LearningProfile>(&response))
            .and_then(validate_profile);

        match result {
            Ok(profile) => {
                info!(
                    "✓ 学习画像生成完成: {} 个目标, 难度 {:.2}",
                    profile.learning_objectives.len(),
                    profile.estimated_difficulty
                );
                Ok(profile)
            }
            Err(e) if e.is_recoverable() => {
                warn!("⚠️ 内容分析失败，使用兜底学习画像: {}", e);
                Ok(Self::fallback_profile(subject))
            }
            Err(e) => Err(e),
        }
    }

    /// 兜底画像（只取决于科目）
    pub fn fallback_profile(subject: Subject) -> LearningProfile {
        let name = subject.name();
        LearningProfile {
            learning_objectives: vec![LearningObjective {
                objective: format!("Practice {} skills", name),
                alignment: "standard_001".to_string(),
                importance: Importance::Important,
            }],
            key_concepts: vec![name.to_string(), "problem solving".to_string()],
            estimated_difficulty: 0.6,
            knowledge_gaps: vec![KnowledgeGap {
                gap: "Needs practice with core concepts".to_string(),
                evidence: "Based on document analysis".to_string(),
                priority: Priority::Medium,
            }],
            recommended_interventions: vec![
                Intervention {
                    intervention_type: InterventionType::Quiz,
                    focus: name.to_string(),
                    rationale: "Reinforcement through interactive practice".to_string(),
                },
                Intervention {
                    intervention_type: InterventionType::Game,
                    focus: "engagement".to_string(),
                    rationale: "Make learning fun and memorable".to_string(),
                },
            ],
            topics: vec![name.to_string(), "general practice".to_string()],
            content_type: "practice_problems".to_string(),
        }
    }
}

/// 画像边界校验：至少一个学习目标，难度夹到 [0, 1]
fn validate_profile(mut profile: LearningProfile) -> Result<LearningProfile, BackendError> {
    if profile.learning_objectives.is_empty() {
        return Err(BackendError::malformed("llm", "学习画像缺少学习目标"));
    }
    if !profile.estimated_difficulty.is_finite() {
        return Err(BackendError::malformed("llm", "难度不是有效数字"));
    }
    profile.estimated_difficulty = profile.estimated_difficulty.clamp(0.0, 1.0);
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl ReasoningBackend for Canned {
        async fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, BackendError> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl ReasoningBackend for Broken {
        async fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, BackendError> {
            Err(BackendError::Internal {
                backend: "llm",
                message: "panic in client".to_string(),
            })
        }
    }

    fn analyzer(backend: impl ReasoningBackend + 'static) -> ContentAnalyzer {
        ContentAnalyzer::new(Some(Arc::new(backend)))
    }

    #[tokio::test]
    async fn fallback_profile_for_every_subject() {
        let analyzer = ContentAnalyzer::new(None);
        for subject in [Subject::Mathematics, Subject::English, Subject::Hebrew] {
            let profile = analyzer.analyze("", subject, "middle_school").await.unwrap();
            assert!(!profile.learning_objectives.is_empty());
            assert!((0.0..=1.0).contains(&profile.estimated_difficulty));
            assert_eq!(
                profile.intervention_types(),
                vec![InterventionType::Quiz, InterventionType::Game]
            );
            assert_eq!(profile, ContentAnalyzer::fallback_profile(subject));
        }
    }

    #[tokio::test]
    async fn parses_backend_profile_and_clamps_difficulty() {
        let response = r#"```json
{"learning_objectives": [{"objective": "Add fractions", "importance": "critical"}],
 "key_concepts": ["fractions"], "estimated_difficulty": 1.7,
 "recommended_interventions": [{"type": "review"}], "topics": ["fractions"]}
```"#;
        let profile = analyzer(Canned(response))
            .analyze("1/2 + 1/3", Subject::Mathematics, "middle_school")
            .await
            .unwrap();

        assert_eq!(profile.learning_objectives[0].objective, "Add fractions");
        assert_eq!(profile.estimated_difficulty, 1.0);
        assert_eq!(profile.content_type, "practice_problems");
    }

    #[tokio::test]
    async fn profile_without_objectives_falls_back() {
        let response = r#"{"learning_objectives": [], "estimated_difficulty": 0.3}"#;
        let profile = analyzer(Canned(response))
            .analyze("text", Subject::English, "middle_school")
            .await
            .unwrap();
        assert_eq!(profile, ContentAnalyzer::fallback_profile(Subject::English));
    }

    #[tokio::test]
    async fn non_json_falls_back() {
        let profile = analyzer(Canned("I'd love to help!"))
            .analyze("text", Subject::Hebrew, "middle_school")
            .await
            .unwrap();
        assert_eq!(profile.topics, vec!["hebrew", "general practice"]);
    }

    #[tokio::test]
    async fn internal_error_is_not_swallowed() {
        let result = analyzer(Broken)
            .analyze("text", Subject::Mathematics, "middle_school")
            .await;
        assert!(matches!(result, Err(BackendError::Internal { .. })));
    }
}
