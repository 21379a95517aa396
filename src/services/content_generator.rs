//! 内容生成服务 - 业务能力层
//!
//! 负责把作业文本和学习画像转换成游戏、测验、复习资料和提示。
//! 后端返回的内容在这里做结构校验，校验不通过与后端不可用一样走兜底内容。

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::ReasoningBackend;
use crate::error::BackendError;
use crate::models::artifact::{
    AnswerType, Difficulty, GameAssets, GameFeedbackMessages, GameQuestion, GameScoring, GameSpec,
    GameType, QuestionType, QuickReviewQuestion, QuizFeedbackMessages, QuizQuestion, QuizScoring,
    QuizSpec, ReviewSection, ReviewSpec, WorkedExample,
};
use crate::models::profile::LearningProfile;
use crate::models::subject::Subject;
use crate::services::prompts::{
    game_prompt, hints_prompt, quiz_prompt, review_prompt, SYSTEM_PROMPT,
};
use crate::services::response_parser::parse_json_response;

const GAME_MAX_TOKENS: u32 = 3072;
const QUIZ_MAX_TOKENS: u32 = 3072;
const REVIEW_MAX_TOKENS: u32 = 2048;
const HINTS_MAX_TOKENS: u32 = 512;

const QUIZ_MIN_QUESTIONS: usize = 5;
const QUIZ_MAX_QUESTIONS: usize = 8;
const HINT_COUNT: usize = 3;

/// 单题分值上限
const MAX_QUESTION_POINTS: u32 = 100;

/// 内容生成服务
pub struct ContentGenerator {
    backend: Option<Arc<dyn ReasoningBackend>>,
}

impl ContentGenerator {
    pub fn new(backend: Option<Arc<dyn ReasoningBackend>>) -> Self {
        Self { backend }
    }

    /// 生成学习游戏，`game_type` 为 None 时由模型选择
    pub async fn generate_game(
        &self,
        text: &str,
        subject: Subject,
        profile: &LearningProfile,
        game_type: Option<GameType>,
    ) -> Result<GameSpec, BackendError> {
        let prompt = game_prompt(text, subject, profile, game_type);
        let generated = self
            .request(&prompt, GAME_MAX_TOKENS, |response| {
                parse_json_response::<GameSpec>(response).and_then(validate_game)
            })
            .await;

        self.settle("游戏", generated, || Self::fallback_game(subject, game_type))
    }

    /// 生成 5-8 题的测验
    pub async fn generate_quiz(
        &self,
        text: &str,
        subject: Subject,
        profile: &LearningProfile,
        difficulty: Difficulty,
    ) -> Result<QuizSpec, BackendError> {
        let prompt = quiz_prompt(text, subject, profile, difficulty);
        let generated = self
            .request(&prompt, QUIZ_MAX_TOKENS, |response| {
                parse_json_response::<QuizSpec>(response).and_then(validate_quiz)
            })
            .await;

        self.settle("测验", generated, || Self::fallback_quiz(subject, difficulty))
    }

    /// 生成复习资料
    pub async fn generate_review(
        &self,
        text: &str,
        subject: Subject,
        topics: &[String],
    ) -> Result<ReviewSpec, BackendError> {
        let prompt = review_prompt(text, subject, topics);
        let generated = self
            .request(&prompt, REVIEW_MAX_TOKENS, |response| {
                parse_json_response::<ReviewSpec>(response).and_then(validate_review)
            })
            .await;

        self.settle("复习资料", generated, || Self::fallback_review(subject, topics))
    }

    /// 为单个题目生成 3 条递进提示
    pub async fn generate_hints(
        &self,
        question: &str,
        subject: Subject,
        difficulty: f64,
    ) -> Result<Vec<String>, BackendError> {
        let prompt = hints_prompt(question, subject, difficulty.clamp(0.0, 1.0));
        let generated = self
            .request(&prompt, HINTS_MAX_TOKENS, |response| {
                let hints: Vec<String> = parse_json_response(response)?;
                let hints: Vec<String> = hints
                    .into_iter()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .take(HINT_COUNT)
                    .collect();
                if hints.is_empty() {
                    return Err(BackendError::malformed("llm", "提示列表为空"));
                }
                Ok(hints)
            })
            .await;

        self.settle("提示", generated, Self::fallback_hints)
    }

    /// 调用后端并解析；后端未配置时返回 `Unavailable`
    async fn request<T>(
        &self,
        prompt: &str,
        max_tokens: u32,
        parse: impl FnOnce(&str) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(BackendError::Unavailable { backend: "llm" })?;
        let response = backend.complete(SYSTEM_PROMPT, prompt, max_tokens).await?;
        parse(&response)
    }

    /// 可恢复错误换成兜底内容，`Internal` 原样返回
    fn settle<T>(
        &self,
        label: &str,
        generated: Result<T, BackendError>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, BackendError> {
        match generated {
            Ok(content) => {
                info!("✓ {}生成完成", label);
                Ok(content)
            }
            Err(e) if e.is_recoverable() => {
                warn!("⚠️ {}生成失败，使用兜底内容: {}", label, e);
                Ok(fallback())
            }
            Err(e) => Err(e),
        }
    }

    // ========== 兜底内容 ==========

    pub fn fallback_quiz(subject: Subject, difficulty: Difficulty) -> QuizSpec {
        let name = subject.name();
        let questions = vec![
            quiz_question(
                "q1",
                QuestionType::MultipleChoice,
                format!("What is a key concept in {}?", name),
                &["Concept A", "Concept B", "Concept C", "All of the above"],
                "All of the above",
                &["Think about what you learned", "All options might be relevant"],
                "These are all important concepts to understand",
            ),
            quiz_question(
                "q2",
                QuestionType::TrueFalse,
                format!("Practice is important in {}.", name),
                &["True", "False"],
                "True",
                &["Consider how skills are developed"],
                "Regular practice is essential for mastery",
            ),
            quiz_question(
                "q3",
                QuestionType::MultipleChoice,
                "What should you do first when you start a problem?".to_string(),
                &[
                    "Read the question carefully",
                    "Write down any answer",
                    "Skip to the next question",
                    "Guess",
                ],
                "Read the question carefully",
                &["Good answers start with understanding the question"],
                "Understanding what is asked is the first step to solving it",
            ),
            quiz_question(
                "q4",
                QuestionType::TrueFalse,
                "Checking your work helps you find mistakes.".to_string(),
                &["True", "False"],
                "True",
                &["Think about what happens when you review an answer"],
                "Reviewing your answer is how most mistakes are caught",
            ),
            quiz_question(
                "q5",
                QuestionType::ShortAnswer,
                format!("In one word, what makes you better at {}?", name),
                &[],
                "Practice",
                &["Look back at question 2"],
                "Regular practice builds skill and confidence",
            ),
        ];
        let total_points = questions.iter().map(|q| q.points).sum();

        QuizSpec {
            quiz_type: "comprehensive_review".to_string(),
            title: format!("{} Practice Quiz", subject.title()),
            learning_objective: format!("Review and practice {} concepts", name),
            difficulty,
            estimated_duration_minutes: 10,
            questions,
            scoring: QuizScoring {
                total_points,
                passing_score: total_points * 7 / 10,
                time_bonus: true,
            },
            feedback_messages: QuizFeedbackMessages {
                excellent: "Outstanding work! You've mastered these concepts!".to_string(),
                good: "Great job! You're on the right track!".to_string(),
                needs_improvement: "Keep practicing, you'll get there!".to_string(),
            },
        }
    }

    pub fn fallback_game(subject: Subject, game_type: Option<GameType>) -> GameSpec {
        let name = subject.name();
        let game_type = game_type.unwrap_or(GameType::Matching);
        GameSpec {
            game_type,
            title: format!("{} {} Challenge", subject.title(), game_type.label()),
            description: "Match concepts with their definitions".to_string(),
            learning_objective: format!("Reinforce {} vocabulary and concepts", name),
            rules: vec![
                "Match each term with its correct definition".to_string(),
                "You have 3 chances per question".to_string(),
                "Earn bonus points for quick correct answers".to_string(),
            ],
            difficulty: Difficulty::Medium,
            questions: vec![GameQuestion {
                id: "q1".to_string(),
                prompt: "Match: Basic Concept".to_string(),
                answer_type: AnswerType::Choice,
                correct_answers: vec!["Definition of basic concept".to_string()],
                options: to_strings(&[
                    "Definition of basic concept",
                    "Another definition",
                    "Different concept",
                    "Unrelated term",
                ]),
                hints: to_strings(&["Think about the fundamentals", "Review your notes"]),
                explanation: "The definition describes the basic concept itself".to_string(),
                points: 15,
            }],
            scoring: GameScoring {
                points_per_question: 15,
                bonus_multiplier: 1.5,
                time_bonus: true,
                streak_bonus: true,
            },
            feedback_messages: GameFeedbackMessages {
                correct: "Perfect match! You're doing great!".to_string(),
                incorrect: "Not quite, but good try! Let's review this concept.".to_string(),
                completion: "Excellent work! You've completed the matching game!".to_string(),
            },
            assets: GameAssets::default(),
        }
    }

    pub fn fallback_review(subject: Subject, topics: &[String]) -> ReviewSpec {
        let name = subject.name();
        let topic = topics
            .iter()
            .find(|t| !t.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| name.to_string());

        ReviewSpec {
            title: format!("{} Study Guide", subject.title()),
            subject: name.to_string(),
            sections: vec![ReviewSection {
                topic,
                summary: format!("Key concepts and principles in {}", name),
                key_points: to_strings(&[
                    "Understanding the fundamentals",
                    "Applying concepts to problems",
                    "Practice makes perfect",
                ]),
                examples: vec![WorkedExample {
                    problem: "Sample problem".to_string(),
                    solution: "Step 1: Identify what you know\nStep 2: Apply the concept\nStep 3: Verify your answer".to_string(),
                    explanation: "This approach helps you systematically solve problems"
                        .to_string(),
                }],
                common_mistakes: to_strings(&[
                    "Rushing through problems",
                    "Not showing your work",
                    "Forgetting to check answers",
                ]),
                memory_aids: to_strings(&[
                    "Break problems into smaller steps",
                    "Draw diagrams when possible",
                ]),
            }],
            quick_review_questions: vec![QuickReviewQuestion {
                question: format!("What is the most important thing to remember about {}?", name),
                answer: "Practice regularly and understand the core concepts".to_string(),
            }],
            estimated_study_time_minutes: 15,
        }
    }

    pub fn fallback_hints() -> Vec<String> {
        to_strings(&[
            "Think about what you know about this topic",
            "Break the problem into smaller steps",
            "Review similar examples you've seen before",
        ])
    }
}

// ========== 边界校验 ==========

fn validate_quiz(mut quiz: QuizSpec) -> Result<QuizSpec, BackendError> {
    let count = quiz.questions.len();
    if !(QUIZ_MIN_QUESTIONS..=QUIZ_MAX_QUESTIONS).contains(&count) {
        return Err(BackendError::malformed(
            "llm",
            format!("测验题目数量 {} 不在 5-8 之间", count),
        ));
    }
    ensure_unique_ids(quiz.questions.iter().map(|q| q.id.as_str()))?;

    for question in &mut quiz.questions {
        ensure_points(&question.id, question.points)?;
        match question.question_type {
            QuestionType::ShortAnswer => question.options.clear(),
            QuestionType::MultipleChoice if question.options.is_empty() => {
                return Err(BackendError::malformed(
                    "llm",
                    format!("选择题 {} 缺少选项", question.id),
                ));
            }
            QuestionType::MultipleChoice
                if !has_option(&question.options, &question.correct_answer) =>
            {
                return Err(BackendError::malformed(
                    "llm",
                    format!("选择题 {} 的正确答案不在选项中", question.id),
                ));
            }
            _ => {}
        }
    }

    if quiz.scoring.total_points == 0 {
        quiz.scoring.total_points = quiz.questions.iter().map(|q| q.points).sum();
    }
    Ok(quiz)
}

fn validate_game(game: GameSpec) -> Result<GameSpec, BackendError> {
    if game.questions.is_empty() {
        return Err(BackendError::malformed("llm", "游戏没有题目"));
    }
    ensure_unique_ids(game.questions.iter().map(|q| q.id.as_str()))?;

    for question in &game.questions {
        if question.correct_answers.iter().all(|a| a.trim().is_empty()) {
            return Err(BackendError::malformed(
                "llm",
                format!("游戏题目 {} 缺少正确答案", question.id),
            ));
        }
        ensure_points(&question.id, question.points)?;
    }
    Ok(game)
}

fn validate_review(review: ReviewSpec) -> Result<ReviewSpec, BackendError> {
    if review.sections.is_empty() {
        return Err(BackendError::malformed("llm", "复习资料没有章节"));
    }
    if let Some(section) = review.sections.iter().find(|s| s.examples.is_empty()) {
        return Err(BackendError::malformed(
            "llm",
            format!("章节 '{}' 缺少例题", section.topic),
        ));
    }
    Ok(review)
}

fn ensure_points(id: &str, points: u32) -> Result<(), BackendError> {
    if !(1..=MAX_QUESTION_POINTS).contains(&points) {
        return Err(BackendError::malformed(
            "llm",
            format!("题目 {} 分值 {} 不在 1-{} 之间", id, points, MAX_QUESTION_POINTS),
        ));
    }
    Ok(())
}

fn has_option(options: &[String], answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    options.iter().any(|o| o.trim().to_lowercase() == answer)
}

fn ensure_unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<(), BackendError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(BackendError::malformed("llm", "题目缺少 id"));
        }
        if !seen.insert(id) {
            return Err(BackendError::malformed("llm", format!("题目 id 重复: {}", id)));
        }
    }
    Ok(())
}

fn quiz_question(
    id: &str,
    question_type: QuestionType,
    question: String,
    options: &[&str],
    correct_answer: &str,
    hints: &[&str],
    explanation: &str,
) -> QuizQuestion {
    QuizQuestion {
        id: id.to_string(),
        question_type,
        question,
        options: to_strings(options),
        correct_answer: correct_answer.to_string(),
        hints: to_strings(hints),
        explanation: explanation.to_string(),
        points: 20,
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
