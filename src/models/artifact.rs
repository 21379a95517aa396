//! 生成的学习内容（游戏 / 测验 / 复习资料）
//!
//! JSON 字段名是与前端交换的格式，不要随意改名。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::profile::LearningObjective;
use crate::models::subject::Subject;

// ========== 测验 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::UnsupportedDifficulty {
                difficulty: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizScoring {
    pub total_points: u32,
    pub passing_score: u32,
    pub time_bonus: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizFeedbackMessages {
    pub excellent: String,
    pub good: String,
    pub needs_improvement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSpec {
    #[serde(default = "default_quiz_type")]
    pub quiz_type: String,
    pub title: String,
    #[serde(default)]
    pub learning_objective: String,
    pub difficulty: Difficulty,
    #[serde(default = "default_duration")]
    pub estimated_duration_minutes: u32,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub scoring: QuizScoring,
    #[serde(default)]
    pub feedback_messages: QuizFeedbackMessages,
}

fn default_quiz_type() -> String {
    "comprehensive_review".to_string()
}

fn default_duration() -> u32 {
    10
}

// ========== 游戏 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    WordPuzzle,
    Matching,
    FillBlank,
    Sequence,
    Memory,
}

impl GameType {
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::WordPuzzle => "word_puzzle",
            GameType::Matching => "matching",
            GameType::FillBlank => "fill_blank",
            GameType::Sequence => "sequence",
            GameType::Memory => "memory",
        }
    }

    /// 用于标题的显示名
    pub fn label(self) -> &'static str {
        match self {
            GameType::WordPuzzle => "Word Puzzle",
            GameType::Matching => "Matching",
            GameType::FillBlank => "Fill in the Blank",
            GameType::Sequence => "Sequence",
            GameType::Memory => "Memory",
        }
    }

    /// 解析请求中的游戏类型，`auto` 表示交给生成器决定
    pub fn parse_request(s: &str) -> Result<Option<Self>, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(None),
            "word_puzzle" => Ok(Some(GameType::WordPuzzle)),
            "matching" => Ok(Some(GameType::Matching)),
            "fill_blank" => Ok(Some(GameType::FillBlank)),
            "sequence" => Ok(Some(GameType::Sequence)),
            "memory" => Ok(Some(GameType::Memory)),
            _ => Err(ValidationError::UnsupportedGameType {
                game_type: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    Text,
    Choice,
    DragDrop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameQuestion {
    pub id: String,
    pub prompt: String,
    pub answer_type: AnswerType,
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameScoring {
    pub points_per_question: u32,
    pub bonus_multiplier: f64,
    pub time_bonus: bool,
    pub streak_bonus: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFeedbackMessages {
    pub correct: String,
    pub incorrect: String,
    pub completion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAssets {
    pub background_color: String,
    pub theme: String,
}

impl Default for GameAssets {
    fn default() -> Self {
        Self {
            background_color: "#4A90E2".to_string(),
            theme: "playful".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSpec {
    pub game_type: GameType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub learning_objective: String,
    #[serde(default)]
    pub rules: Vec<String>,
    pub difficulty: Difficulty,
    pub questions: Vec<GameQuestion>,
    #[serde(default)]
    pub scoring: GameScoring,
    #[serde(default)]
    pub feedback_messages: GameFeedbackMessages,
    #[serde(default)]
    pub assets: GameAssets,
}

// ========== 复习资料 ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkedExample {
    pub problem: String,
    pub solution: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSection {
    pub topic: String,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub examples: Vec<WorkedExample>,
    #[serde(default)]
    pub common_mistakes: Vec<String>,
    #[serde(default)]
    pub memory_aids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickReviewQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSpec {
    pub title: String,
    pub subject: String,
    pub sections: Vec<ReviewSection>,
    #[serde(default)]
    pub quick_review_questions: Vec<QuickReviewQuestion>,
    #[serde(default = "default_study_time")]
    pub estimated_study_time_minutes: u32,
}

fn default_study_time() -> u32 {
    15
}

// ========== 内容主体 ==========

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Game,
    Quiz,
    Review,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Game => "game",
            ContentKind::Quiz => "quiz",
            ContentKind::Review => "review",
        }
    }
}

/// 按内容类型区分的主体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content_type", content = "content_json", rename_all = "lowercase")]
pub enum ArtifactBody {
    Game(GameSpec),
    Quiz(QuizSpec),
    Review(ReviewSpec),
}

/// 可评分的题目视图
#[derive(Debug, Clone, PartialEq)]
pub struct ScorableQuestion {
    pub id: String,
    pub prompt: String,
    /// 任何一个匹配即视为正确，第一个作为标准答案展示
    pub correct_answers: Vec<String>,
    pub points: u32,
}

impl ScorableQuestion {
    pub fn expected_answer(&self) -> &str {
        self.correct_answers.first().map(String::as_str).unwrap_or("")
    }
}

impl ArtifactBody {
    pub fn kind(&self) -> ContentKind {
        match self {
            ArtifactBody::Game(_) => ContentKind::Game,
            ArtifactBody::Quiz(_) => ContentKind::Quiz,
            ArtifactBody::Review(_) => ContentKind::Review,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ArtifactBody::Game(game) => &game.title,
            ArtifactBody::Quiz(quiz) => &quiz.title,
            ArtifactBody::Review(review) => &review.title,
        }
    }

    /// 抽取可评分题目；复习资料没有可评分题目
    pub fn scorable_questions(&self) -> Vec<ScorableQuestion> {
        match self {
            ArtifactBody::Quiz(quiz) => quiz
                .questions
                .iter()
                .map(|q| ScorableQuestion {
                    id: q.id.clone(),
                    prompt: q.question.clone(),
                    correct_answers: vec![q.correct_answer.clone()],
                    points: q.points,
                })
                .collect(),
            ArtifactBody::Game(game) => game
                .questions
                .iter()
                .map(|q| ScorableQuestion {
                    id: q.id.clone(),
                    prompt: q.prompt.clone(),
                    correct_answers: q.correct_answers.clone(),
                    points: q.points,
                })
                .collect(),
            ArtifactBody::Review(_) => Vec::new(),
        }
    }
}

/// 内容元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub estimated_duration_minutes: u32,
    pub learning_objectives: Vec<LearningObjective>,
    pub topics: Vec<String>,
}

/// 参与度统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub views: u64,
    pub completions: u64,
    pub average_score: f64,
    pub completion_rate: f64,
}

impl Engagement {
    /// 记录一次完成：增量更新平均分与完成率
    pub fn record_completion(&mut self, final_score: f64) {
        self.completions += 1;
        let completions = self.completions as f64;
        self.average_score =
            (self.average_score * (completions - 1.0) + final_score) / completions;
        self.completion_rate = completions / self.views.max(1) as f64;
    }

    pub fn record_view(&mut self) {
        self.views += 1;
    }
}

/// 生成的学习内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub subject: Subject,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub body: ArtifactBody,
    pub metadata: ArtifactMetadata,
    #[serde(flatten)]
    pub engagement: Engagement,
    pub created_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }
}
