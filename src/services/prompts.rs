//! 提示词模板

use crate::models::artifact::{Difficulty, GameType};
use crate::models::profile::LearningProfile;
use crate::models::subject::Subject;

pub const SYSTEM_PROMPT: &str = "You are HomeworkAssistant, an expert tutoring system for K-12 students. \
You analyze OCR-extracted homework and turn it into engaging learning activities in Hebrew, English and Mathematics. \
Guide students rather than handing out answers, keep language age-appropriate and content accurate. \
Always answer with a single JSON document and no additional text.";

pub fn analysis_prompt(text: &str, subject: Subject, grade_level: &str) -> String {
    format!(
        r#"Analyze the following homework document and provide a learning profile.

HOMEWORK CONTENT:
{text}

SUBJECT: {subject}
GRADE LEVEL: {grade_level}

JSON structure:
{{
  "learning_objectives": [{{"objective": "...", "alignment": "standard_code", "importance": "critical|important|reinforcement"}}],
  "key_concepts": ["..."],
  "estimated_difficulty": 0.0,
  "knowledge_gaps": [{{"gap": "...", "evidence": "...", "priority": "high|medium|low"}}],
  "recommended_interventions": [{{"type": "game|quiz|review|practice", "focus": "...", "rationale": "..."}}],
  "topics": ["..."],
  "content_type": "practice_problems|reading_comprehension|mixed"
}}"#
    )
}

pub fn quiz_prompt(
    text: &str,
    subject: Subject,
    profile: &LearningProfile,
    difficulty: Difficulty,
) -> String {
    format!(
        r#"Generate a quiz with 5-8 questions for this homework, mixing multiple_choice, true_false and short_answer questions with progressive difficulty.

HOMEWORK CONTENT:
{text}

SUBJECT: {subject}
TOPICS: {topics}
KEY CONCEPTS: {concepts}
DIFFICULTY: {difficulty}

JSON structure:
{{
  "quiz_type": "comprehensive_review",
  "title": "...",
  "learning_objective": "...",
  "difficulty": "{difficulty}",
  "estimated_duration_minutes": 10,
  "questions": [{{"id": "q1", "type": "multiple_choice|true_false|short_answer", "question": "...", "options": ["..."], "correct_answer": "...", "hints": ["..."], "explanation": "...", "points": 10}}],
  "scoring": {{"total_points": 80, "passing_score": 60, "time_bonus": true}},
  "feedback_messages": {{"excellent": "...", "good": "...", "needs_improvement": "..."}}
}}
Short answer questions must have an empty options list."#,
        topics = profile.topics.join(", "),
        concepts = profile.key_concepts.join(", "),
        difficulty = difficulty.as_str(),
    )
}

pub fn game_prompt(
    text: &str,
    subject: Subject,
    profile: &LearningProfile,
    game_type: Option<GameType>,
) -> String {
    let game_type = game_type
        .map(GameType::as_str)
        .unwrap_or("choose the most appropriate");
    format!(
        r##"Design an interactive learning game (5-10 minutes) aligned with this homework.

HOMEWORK CONTENT:
{text}

SUBJECT: {subject}
TOPICS: {topics}
KEY CONCEPTS: {concepts}
GAME TYPE: {game_type}

JSON structure:
{{
  "game_type": "word_puzzle|matching|fill_blank|sequence|memory",
  "title": "...",
  "description": "...",
  "learning_objective": "...",
  "rules": ["..."],
  "difficulty": "easy|medium|hard",
  "questions": [{{"id": "q1", "prompt": "...", "answer_type": "text|choice|drag_drop", "correct_answers": ["..."], "options": ["..."], "hints": ["..."], "explanation": "...", "points": 10}}],
  "scoring": {{"points_per_question": 10, "bonus_multiplier": 1.5, "time_bonus": true, "streak_bonus": true}},
  "feedback_messages": {{"correct": "...", "incorrect": "...", "completion": "..."}},
  "assets": {{"background_color": "#hexcolor", "theme": "colorful|minimalist|playful"}}
}}"##,
        topics = profile.topics.join(", "),
        concepts = profile.key_concepts.join(", "),
    )
}

pub fn review_prompt(text: &str, subject: Subject, topics: &[String]) -> String {
    format!(
        r#"Create a concise study guide for these homework topics: definitions in simple language, 1-2 worked examples per concept, common mistakes, memory aids and quick review questions.

HOMEWORK CONTENT:
{text}

SUBJECT: {subject}
TOPICS: {topics}

JSON structure:
{{
  "title": "...",
  "subject": "{subject}",
  "sections": [{{"topic": "...", "summary": "...", "key_points": ["..."], "examples": [{{"problem": "...", "solution": "...", "explanation": "..."}}], "common_mistakes": ["..."], "memory_aids": ["..."]}}],
  "quick_review_questions": [{{"question": "...", "answer": "..."}}],
  "estimated_study_time_minutes": 15
}}"#,
        topics = topics.join(", "),
    )
}

pub fn hints_prompt(question: &str, subject: Subject, difficulty: f64) -> String {
    format!(
        r#"Generate 3 progressive hints for this {subject} question.

QUESTION: {question}
DIFFICULTY: {difficulty:.2}

The first hint guides thinking, the second gives direction, the third nearly reveals the solution path.
Respond with a JSON array of 3 strings."#
    )
}

pub fn feedback_prompt(
    question: &str,
    user_answer: &str,
    correct_answer: &str,
    is_correct: bool,
) -> String {
    format!(
        r#"Give encouraging, educational feedback on this student answer.

QUESTION: {question}
STUDENT ANSWER: {user_answer}
CORRECT ANSWER: {correct_answer}
IS CORRECT: {is_correct}

JSON structure:
{{"message": "...", "explanation": "...", "encouragement": "...", "next_steps": "..."}}"#
    )
}
