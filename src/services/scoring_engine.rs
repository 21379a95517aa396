//! 评分服务 - 业务能力层
//!
//! 只负责"答案 → 分数 + 反馈"，不修改内容的参与度统计（由 workflow 负责）。

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::ReasoningBackend;
use crate::error::{AppError, BackendError, ValidationError};
use crate::models::artifact::ScorableQuestion;
use crate::models::submission::{
    AnswerOutcome, AnswerSubmission, Feedback, ProgressSubmit, SubmissionResult,
    SubmissionSummary,
};
use crate::services::prompts::{feedback_prompt, SYSTEM_PROMPT};
use crate::services::response_parser::parse_json_response;

const FEEDBACK_MAX_TOKENS: u32 = 512;

/// 答案归一化：去掉首尾空白并转小写
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// 判断答案是否正确（任一标准答案匹配即可）
pub fn is_correct(question: &ScorableQuestion, user_answer: &str) -> bool {
    let answer = normalize(user_answer);
    question
        .correct_answers
        .iter()
        .any(|expected| normalize(expected) == answer)
}

/// 得分百分比，总分为 0 时记 0 分
pub fn final_score(earned_points: u64, total_points: u64) -> f64 {
    if total_points == 0 {
        return 0.0;
    }
    earned_points as f64 / total_points as f64 * 100.0
}

/// 评分服务
pub struct ScoringEngine {
    backend: Option<Arc<dyn ReasoningBackend>>,
}

impl ScoringEngine {
    pub fn new(backend: Option<Arc<dyn ReasoningBackend>>) -> Self {
        Self { backend }
    }

    /// 对一次提交评分
    ///
    /// 找不到对应题目的答案直接忽略；题目集合为空属于调用方错误。
    pub async fn score(
        &self,
        user_id: Uuid,
        questions: &[ScorableQuestion],
        submission: &ProgressSubmit,
    ) -> Result<SubmissionResult, AppError> {
        if questions.is_empty() {
            return Err(ValidationError::EmptyQuestionSet {
                content_id: submission.content_id,
            }
            .into());
        }

        let matched: Vec<(&AnswerSubmission, &ScorableQuestion, bool)> = submission
            .answers
            .iter()
            .filter_map(|answer| {
                let question = questions.iter().find(|q| q.id == answer.question_id);
                if question.is_none() {
                    debug!("忽略未知题目的答案: {}", answer.question_id);
                }
                question.map(|q| (answer, q, is_correct(q, &answer.user_answer)))
            })
            .collect();

        // 按 u64 累加，单题分值上限为 u32
        let total_points: u64 = matched.iter().map(|(_, q, _)| u64::from(q.points)).sum();
        let earned_points: u64 = matched
            .iter()
            .filter(|(_, _, correct)| *correct)
            .map(|(_, q, _)| u64::from(q.points))
            .sum();
        let correct_count = matched.iter().filter(|(_, _, correct)| *correct).count();
        let score = final_score(earned_points, total_points);

        let feedbacks = join_all(
            matched
                .iter()
                .map(|(answer, question, correct)| self.feedback(question, answer, *correct)),
        )
        .await;

        let answers = matched
            .iter()
            .zip(feedbacks)
            .map(|((answer, question, correct), feedback)| -> Result<_, BackendError> {
                Ok(AnswerOutcome {
                    question_id: answer.question_id.clone(),
                    user_answer: answer.user_answer.clone(),
                    correct_answer: question.expected_answer().to_string(),
                    is_correct: *correct,
                    time_spent_seconds: answer.time_spent_seconds,
                    feedback: feedback?,
                })
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        info!(
            "📊 评分完成: {}/{} 正确, 得分 {:.1}",
            correct_count,
            answers.len(),
            score
        );

        Ok(SubmissionResult {
            id: Uuid::new_v4(),
            user_id,
            content_id: submission.content_id,
            status: "completed".to_string(),
            score,
            time_spent_seconds: submission.total_time_spent,
            answers,
            feedback_provided: SubmissionSummary {
                overall_score: score,
                correct_answers: correct_count,
                total_questions: questions.len(),
                message: SubmissionSummary::message_for(score).to_string(),
            },
            completed_at: Utc::now(),
        })
    }

    /// 生成单题反馈，后端不可用时使用模板反馈
    async fn feedback(
        &self,
        question: &ScorableQuestion,
        answer: &AnswerSubmission,
        correct: bool,
    ) -> Result<Feedback, BackendError> {
        let Some(backend) = &self.backend else {
            return Ok(fallback_feedback(correct, question.expected_answer()));
        };

        let prompt = feedback_prompt(
            &question.prompt,
            &answer.user_answer,
            question.expected_answer(),
            correct,
        );
        let generated = backend
            .complete(SYSTEM_PROMPT, &prompt, FEEDBACK_MAX_TOKENS)
            .await
            .and_then(|response| parse_json_response::<Feedback>(&response));

        match generated {
            Ok(feedback) => Ok(feedback),
            Err(e) if e.is_recoverable() => {
                warn!("⚠️ 题目 {} 反馈生成失败，使用模板反馈: {}", question.id, e);
                Ok(fallback_feedback(correct, question.expected_answer()))
            }
            Err(e) => Err(e),
        }
    }
}

/// 模板反馈
pub fn fallback_feedback(correct: bool, correct_answer: &str) -> Feedback {
    if correct {
        Feedback {
            message: "Great job! Your answer is correct!".to_string(),
            explanation: "You demonstrated good understanding of the concept.".to_string(),
            encouragement: Some("Keep up the excellent work!".to_string()),
            next_steps: None,
        }
    } else {
        Feedback {
            message: "Not quite right, but good effort!".to_string(),
            explanation: format!("The correct answer is: {}", correct_answer),
            encouragement: None,
            next_steps: Some("Review the concept and try a similar problem.".to_string()),
        }
    }
}
